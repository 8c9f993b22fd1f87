use askama::Template;
use axum::extract::Path;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json};

use crate::admin::Permission;
use crate::persist::{self, ProjectStore};
use crate::project::ProjectSummary;
use crate::render::{self, Fragment};
use crate::{routes, ErrorKind, Project, ProjectId, Result};

use super::askama::{filters, HtmlTemplate};
use super::{AdminSession, CacheExt, DbExt, Outcome, Router};

pub fn router() -> Router {
    Router::new()
        .route(routes::PROJECTS, get(list))
        .route("/projects/:slug", get(page))
        .route(routes::ADMIN_PROJECTS, get(admin_list).post(save))
        .route("/admin/projects/:id", get(admin_get).delete(remove))
}

#[derive(Template)]
#[template(path = "pages/project.html")]
pub struct ProjectPage {
    pub project: Project,
    pub blocks: Vec<Fragment>,
}

pub async fn list(Extension(db): DbExt, Extension(cache): CacheExt) -> Result<Json<Vec<ProjectSummary>>> {
    Ok(Json(persist::list_published(&*db, &cache)?))
}

pub async fn page(Path(slug): Path<String>, Extension(db): DbExt) -> Result<impl IntoResponse> {
    let project = persist::load_project(&*db, &slug)?;
    let blocks = render::render(&project.content)?;
    Ok(HtmlTemplate(ProjectPage { project, blocks }))
}

pub async fn admin_list(session: AdminSession, Extension(db): DbExt) -> Result<Json<Vec<ProjectSummary>>> {
    session.require(Permission::ManageProjects)?;
    Ok(Json(persist::list_all(&*db)?))
}

pub async fn admin_get(
    session: AdminSession,
    Path(id): Path<ProjectId>,
    Extension(db): DbExt,
) -> Result<Json<Project>> {
    session.require(Permission::ManageProjects)?;
    let project = db
        .get_project(id)?
        .ok_or_else(|| ErrorKind::NotFound(format!("project {id}")))?;
    Ok(Json(project))
}

#[derive(Debug, Deserialize)]
pub struct SaveProject {
    pub project: Project,
    /// Version the operator started editing from. Omitting it means last
    /// write wins.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

pub async fn save(
    session: AdminSession,
    Extension(db): DbExt,
    Extension(cache): CacheExt,
    Json(input): Json<SaveProject>,
) -> Result<Json<Outcome<Project>>> {
    session.require(Permission::ManageProjects)?;
    let project = persist::save_project(&*db, &cache, input.project, input.expected_version)?;
    Ok(Json(Outcome::ok("Project saved", project)))
}

pub async fn remove(
    session: AdminSession,
    Path(id): Path<ProjectId>,
    Extension(db): DbExt,
    Extension(cache): CacheExt,
) -> Result<Json<Outcome<()>>> {
    session.require(Permission::ManageProjects)?;
    persist::delete_project(&*db, &cache, id)?;
    Ok(Json(Outcome::done("Project deleted")))
}
