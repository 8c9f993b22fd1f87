use axum::extract::{Path, Query};
use axum::routing::{get, post};
use axum::{Extension, Json};

use crate::admin::Permission;
use crate::message::{self, MessageId, NewMessage};
use crate::{routes, ActionResult, Message, Result};

use super::{AdminSession, ConfigExt, DbExt, Outcome, Router};

pub fn router() -> Router {
    Router::new()
        .route(routes::CONTACT, post(submit))
        .route(routes::ADMIN_MESSAGES, get(list))
        .route("/admin/messages/:id", get(read).delete(remove))
        .route("/admin/messages/:id/unread", post(mark_unread))
}

/// Public contact, donation and volunteer form submission.
pub async fn submit(
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Json(new): Json<NewMessage>,
) -> Result<Json<ActionResult>> {
    let message = message::submit(&db, new)?;
    if let Err(e) = crate::email::notify_new_message(&message, &config) {
        // The message is stored, a missing notification is not worth
        // failing the submission over.
        tracing::warn!(message = %message.id, "failed queueing notification: {e}");
    }
    Ok(Json(ActionResult::ok("Thank you, we'll get back to you soon")))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub unread: bool,
}

#[derive(Debug, Serialize)]
pub struct Inbox {
    pub unread: usize,
    pub messages: Vec<Message>,
}

pub async fn list(
    session: AdminSession,
    Query(query): Query<ListQuery>,
    Extension(db): DbExt,
) -> Result<Json<Inbox>> {
    session.require(Permission::ManageMessages)?;
    Ok(Json(Inbox {
        unread: message::unread_count(&db)?,
        messages: message::list(&db, query.unread)?,
    }))
}

/// Opens the message, marking it read.
pub async fn read(
    session: AdminSession,
    Path(id): Path<MessageId>,
    Extension(db): DbExt,
) -> Result<Json<Message>> {
    session.require(Permission::ManageMessages)?;
    Ok(Json(message::set_read(&db, id, true)?))
}

pub async fn mark_unread(
    session: AdminSession,
    Path(id): Path<MessageId>,
    Extension(db): DbExt,
) -> Result<Json<Outcome<Message>>> {
    session.require(Permission::ManageMessages)?;
    let message = message::set_read(&db, id, false)?;
    Ok(Json(Outcome::ok("Marked as unread", message)))
}

pub async fn remove(
    session: AdminSession,
    Path(id): Path<MessageId>,
    Extension(db): DbExt,
) -> Result<Json<Outcome<()>>> {
    session.require(Permission::ManageMessages)?;
    message::delete(&db, id)?;
    Ok(Json(Outcome::done("Message deleted")))
}
