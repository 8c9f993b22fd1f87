use axum::extract::Path;
use axum::routing::{delete, get, post};
use axum::{Extension, Json};

use crate::admin::{self, AdminView, NewAdmin, Permission};
use crate::{routes, AdminId, ErrorKind, Result, Role};

use super::{AdminSession, DbExt, Outcome, Router};

pub fn router() -> Router {
    Router::new()
        .route(routes::ADMIN_ADMINS, get(list).post(create))
        .route("/admin/admins/:id", delete(remove))
        .route("/admin/admins/:id/role", post(set_role))
        .route("/admin/admins/:id/unlock", post(unlock))
}

pub async fn list(session: AdminSession, Extension(db): DbExt) -> Result<Json<Vec<AdminView>>> {
    session.require(Permission::ManageAdmins)?;
    Ok(Json(admin::list(&db)?.iter().map(AdminView::from).collect()))
}

pub async fn create(
    session: AdminSession,
    Extension(db): DbExt,
    Json(new): Json<NewAdmin>,
) -> Result<Json<Outcome<AdminView>>> {
    session.require(Permission::ManageAdmins)?;
    let admin = admin::create(&db, new)?;
    Ok(Json(Outcome::ok("Admin created", AdminView::from(&admin))))
}

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: Role,
}

pub async fn set_role(
    session: AdminSession,
    Path(id): Path<AdminId>,
    Extension(db): DbExt,
    Json(change): Json<RoleChange>,
) -> Result<Json<Outcome<AdminView>>> {
    session.require(Permission::ManageAdmins)?;
    let admin = admin::set_role(&db, id, change.role)?;
    Ok(Json(Outcome::ok("Role updated", AdminView::from(&admin))))
}

pub async fn unlock(
    session: AdminSession,
    Path(id): Path<AdminId>,
    Extension(db): DbExt,
) -> Result<Json<Outcome<AdminView>>> {
    session.require(Permission::ManageAdmins)?;
    let admin = admin::unlock(&db, id)?;
    Ok(Json(Outcome::ok("Account unlocked", AdminView::from(&admin))))
}

pub async fn remove(
    session: AdminSession,
    Path(id): Path<AdminId>,
    Extension(db): DbExt,
) -> Result<Json<Outcome<()>>> {
    session.require(Permission::ManageAdmins)?;
    if id == session.id {
        return Err(ErrorKind::BadInput("you can't delete your own account".to_string()).into());
    }
    admin::delete(&db, id)?;
    Ok(Json(Outcome::done("Admin deleted")))
}
