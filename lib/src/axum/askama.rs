use askama::Template;
use axum::response::{Html, IntoResponse, Response};
use http::StatusCode;

/// Wrapper rendering an askama template into an html response.
pub struct HtmlTemplate<T>(pub T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                tracing::error!("failed rendering template: {e}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Filters shared by the page templates.
pub mod filters {
    pub fn href<T: std::fmt::Display>(s: T) -> ::askama::Result<String> {
        Ok(crate::render::safe_url(&s.to_string()))
    }
}
