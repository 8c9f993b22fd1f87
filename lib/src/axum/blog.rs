use askama::Template;
use axum::extract::Path;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json};

use crate::admin::Permission;
use crate::blog::{self, PostId};
use crate::{routes, BlogPost, Result};

use super::askama::{filters, HtmlTemplate};
use super::{AdminSession, CacheExt, DbExt, Outcome, Router};

pub fn router() -> Router {
    Router::new()
        .route(routes::BLOG, get(list))
        .route("/blog/:slug", get(page))
        .route(routes::ADMIN_BLOG, get(admin_list).post(save))
        .route("/admin/blog/:id", get(admin_get).delete(remove))
}

#[derive(Template)]
#[template(path = "pages/post.html")]
pub struct PostPage {
    pub post: BlogPost,
}

pub async fn list(Extension(db): DbExt, Extension(cache): CacheExt) -> Result<Json<Vec<BlogPost>>> {
    Ok(Json(blog::list_published(&db, &cache)?))
}

pub async fn page(Path(slug): Path<String>, Extension(db): DbExt) -> Result<impl IntoResponse> {
    let mut post = blog::find_published(&db, &slug)?;
    if let Some(views) = blog::record_view(&db, post.id) {
        post.views = views;
    }
    Ok(HtmlTemplate(PostPage { post }))
}

pub async fn admin_list(session: AdminSession, Extension(db): DbExt) -> Result<Json<Vec<BlogPost>>> {
    session.require(Permission::ManageBlog)?;
    Ok(Json(blog::list_all(&db)?))
}

pub async fn admin_get(
    session: AdminSession,
    Path(id): Path<PostId>,
    Extension(db): DbExt,
) -> Result<Json<BlogPost>> {
    session.require(Permission::ManageBlog)?;
    Ok(Json(db.get::<BlogPost>(id)?))
}

pub async fn save(
    session: AdminSession,
    Extension(db): DbExt,
    Extension(cache): CacheExt,
    Json(post): Json<BlogPost>,
) -> Result<Json<Outcome<BlogPost>>> {
    session.require(Permission::ManageBlog)?;
    let post = blog::save_post(&db, &cache, post)?;
    Ok(Json(Outcome::ok("Post saved", post)))
}

pub async fn remove(
    session: AdminSession,
    Path(id): Path<PostId>,
    Extension(db): DbExt,
    Extension(cache): CacheExt,
) -> Result<Json<Outcome<()>>> {
    session.require(Permission::ManageBlog)?;
    blog::delete_post(&db, &cache, id)?;
    Ok(Json(Outcome::done("Post deleted")))
}
