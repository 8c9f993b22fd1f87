use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path};
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::{get, post};
use axum::{Extension, Json};
use http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};

use crate::admin::Permission;
use crate::config::Uploads;
use crate::{routes, upload, Error, ErrorKind, Image, ImageId, Result};

use super::{AdminSession, ConfigExt, DbExt, Outcome, Router};

/// Name of the multipart field carrying the file.
const FILE_FIELD: &str = "file";

pub fn router() -> Router {
    Router::new()
        .route("/image/:id", get(image))
        .route(routes::ADMIN_UPLOAD, post(upload))
}

pub async fn image(Path(id): Path<ImageId>, Extension(db): DbExt) -> Result<impl IntoResponse> {
    let image = db.get::<Image>(id)?;
    Ok((
        AppendHeaders([
            (CONTENT_TYPE, image.content_type),
            // Images are immutable, a new upload gets a new id.
            (CACHE_CONTROL, "public, max-age=31536000, immutable".to_string()),
        ]),
        image.bytes,
    ))
}

fn multipart_error(e: MultipartError, headers: &HeaderMap, limits: &Uploads) -> Error {
    tracing::debug!("failed reading multipart body: {e}");
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let size = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return upload::too_large(size, limits);
    }
    ErrorKind::UploadRejected(format!("failed reading upload: {}", e.body_text())).into()
}

/// Accepts a single image in the `file` field, returning its public url.
pub async fn upload(
    session: AdminSession,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Outcome<String>>> {
    session.require(Permission::UploadImages)?;
    let rejected = |e: MultipartError| multipart_error(e, &headers, &config.uploads);

    while let Some(field) = multipart.next_field().await.map_err(rejected)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(rejected)?;
        let url = upload::upload_image(
            &*db,
            &config.uploads,
            &config.base_url,
            &content_type,
            bytes.to_vec(),
        )?;
        return Ok(Json(Outcome::ok("Image uploaded", url)));
    }

    Err(ErrorKind::UploadRejected("no file was provided".to_string()).into())
}
