//! Back-office endpoints of the block editor.
//!
//! The editor holds the working copy of the document on the client side.
//! Every operation sends the document along, gets it back transformed
//! together with the re-rendered editing forms, and nothing is stored until
//! the project itself is saved.

use axum::routing::{get, post};
use axum::Json;

use crate::admin::Permission;
use crate::block::{self, BlockId, PaletteEntry};
use crate::editor::{self, EditorEvent};
use crate::render;
use crate::{routes, BlockKind, Document, ErrorKind, Result};

use super::{AdminSession, Router};

pub fn router() -> Router {
    Router::new()
        .route(&format!("{}/palette", routes::ADMIN_EDITOR), get(palette))
        .route(&format!("{}/insert", routes::ADMIN_EDITOR), post(insert))
        .route(&format!("{}/apply", routes::ADMIN_EDITOR), post(apply))
        .route(&format!("{}/patch", routes::ADMIN_EDITOR), post(patch))
        .route(&format!("{}/remove", routes::ADMIN_EDITOR), post(remove))
        .route(&format!("{}/reorder", routes::ADMIN_EDITOR), post(reorder))
        .route(&format!("{}/preview", routes::ADMIN_EDITOR), post(preview))
}

/// Document after an editor operation, along with its editing forms.
#[derive(Debug, Serialize)]
pub struct EditorState {
    pub document: Document,
    pub forms: String,
    /// Block affected by the operation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockId>,
}

impl EditorState {
    fn new(document: Document, block: Option<BlockId>) -> Result<Self> {
        Ok(Self {
            forms: editor::render_forms(&document)?,
            document,
            block,
        })
    }
}

fn missing_block(id: &BlockId) -> crate::Error {
    ErrorKind::NotFound(format!("block {id}")).into()
}

pub async fn palette(session: AdminSession) -> Result<Json<Vec<PaletteEntry>>> {
    session.require(Permission::ManageProjects)?;
    Ok(Json(block::palette()?))
}

#[derive(Debug, Deserialize)]
pub struct Insert {
    pub document: Document,
    #[serde(rename = "type")]
    pub kind: BlockKind,
}

pub async fn insert(session: AdminSession, Json(mut input): Json<Insert>) -> Result<Json<EditorState>> {
    session.require(Permission::ManageProjects)?;
    let id = input.document.insert_block(input.kind);
    Ok(Json(EditorState::new(input.document, Some(id))?))
}

#[derive(Debug, Deserialize)]
pub struct Apply {
    pub document: Document,
    pub block_id: BlockId,
    pub event: EditorEvent,
}

pub async fn apply(session: AdminSession, Json(mut input): Json<Apply>) -> Result<Json<EditorState>> {
    session.require(Permission::ManageProjects)?;
    if !input.document.apply(&input.block_id, input.event)? {
        return Err(missing_block(&input.block_id));
    }
    Ok(Json(EditorState::new(input.document, Some(input.block_id))?))
}

#[derive(Debug, Deserialize)]
pub struct Patch {
    pub document: Document,
    pub block_id: BlockId,
    pub content: serde_json::Map<String, serde_json::Value>,
}

pub async fn patch(session: AdminSession, Json(mut input): Json<Patch>) -> Result<Json<EditorState>> {
    session.require(Permission::ManageProjects)?;
    if !input.document.update_block_payload(&input.block_id, input.content)? {
        return Err(missing_block(&input.block_id));
    }
    Ok(Json(EditorState::new(input.document, Some(input.block_id))?))
}

#[derive(Debug, Deserialize)]
pub struct Remove {
    pub document: Document,
    pub block_id: BlockId,
}

pub async fn remove(session: AdminSession, Json(mut input): Json<Remove>) -> Result<Json<EditorState>> {
    session.require(Permission::ManageProjects)?;
    if !input.document.remove_block(&input.block_id) {
        return Err(missing_block(&input.block_id));
    }
    Ok(Json(EditorState::new(input.document, None)?))
}

#[derive(Debug, Deserialize)]
pub struct Reorder {
    pub document: Document,
    pub from: usize,
    pub to: usize,
}

pub async fn reorder(session: AdminSession, Json(mut input): Json<Reorder>) -> Result<Json<EditorState>> {
    session.require(Permission::ManageProjects)?;
    input.document.reorder(input.from, input.to)?;
    Ok(Json(EditorState::new(input.document, None)?))
}

#[derive(Debug, Deserialize)]
pub struct Preview {
    pub document: Document,
}

/// Renders the working copy the way the public page would show it.
pub async fn preview(session: AdminSession, Json(input): Json<Preview>) -> Result<Json<Vec<render::Fragment>>> {
    session.require(Permission::ManageProjects)?;
    Ok(Json(render::render(&input.document)?))
}
