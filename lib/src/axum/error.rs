use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Json;
use http::header::SET_COOKIE;
use http::StatusCode;

use crate::{routes, ActionResult, Error, ErrorKind};

impl Error {
    pub fn status(&self) -> StatusCode {
        match &self.kind {
            ErrorKind::Validation(_) | ErrorKind::BadInput(_) | ErrorKind::UploadRejected(_) => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
            ErrorKind::SlugConflict(_)
            | ErrorKind::VersionConflict { .. }
            | ErrorKind::AdminWithEmailAlreadyExists(_) => StatusCode::CONFLICT,
            ErrorKind::InvalidCredentials | ErrorKind::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            ErrorKind::AccountLocked(_) => StatusCode::LOCKED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Turns errors into json action results carrying the public message.
///
/// Backtrace and internal details are never part of the response, they only
/// end up in the application logs.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if let ErrorKind::FailedGettingTokenCookie(target_url) = &self.kind {
            tracing::debug!("{}", self);
            // Remember where the visitor was headed so that login can send
            // them back there.
            return (
                AppendHeaders([(
                    SET_COOKIE,
                    format!("next={};SameSite=Lax;Secure;Path=/", target_url),
                )]),
                Redirect::to(routes::ADMIN_LOGIN),
            )
                .into_response();
        }

        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }
        (status, Json(ActionResult::failed(self.public_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        let status = |kind: ErrorKind| Error::new(kind).status();
        assert_eq!(status(ErrorKind::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(ErrorKind::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status(ErrorKind::VersionConflict { expected: 1, found: 2 }),
            StatusCode::CONFLICT
        );
        assert_eq!(status(ErrorKind::AccountLocked(chrono::Utc::now())), StatusCode::LOCKED);
        assert_eq!(status(ErrorKind::DbError("io".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_cookie_redirects_to_login() {
        let error = Error::new(ErrorKind::FailedGettingTokenCookie("/admin/projects".parse().unwrap()));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], routes::ADMIN_LOGIN);
    }
}
