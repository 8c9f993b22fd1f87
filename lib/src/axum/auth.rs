use axum::routing::{get, post};
use axum::{Extension, Json};
use axum_extra::extract::{CookieJar, PrivateCookieJar};
use chrono::{DateTime, Utc};
use cookie::Cookie;

use crate::admin::AdminView;
use crate::auth::login::SESSION_COOKIE;
use crate::auth;
use crate::{routes, Result};

use super::{AdminSession, ConfigExt, DbExt, Outcome, Router};

pub fn router() -> Router {
    Router::new()
        .route(routes::ADMIN_LOGIN, post(login))
        .route(routes::ADMIN_LOGOUT, get(logout))
        .route(routes::ADMIN, get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginData {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct LoggedIn {
    /// Bearer token for clients that don't keep cookies.
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub admin: AdminView,
    /// Page the admin was headed to before being sent to log in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Checks credentials and opens a session, stored in a private cookie.
pub async fn login(
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    plain: CookieJar,
    mut cookies: PrivateCookieJar,
    Json(data): Json<LoginData>,
) -> Result<(PrivateCookieJar, Json<Outcome<LoggedIn>>)> {
    let session = auth::login(&db, &config.auth, &data.email, &data.password)?;
    let admin = db.get::<crate::Admin>(session.admin)?;

    // The `next` cookie is a plain one, set while redirecting to login.
    let next = plain
        .get("next")
        .map(|c| c.value().to_string())
        .filter(|next| next.starts_with(routes::ADMIN));

    cookies = cookies.add(auth::login::session_cookie(&session));

    Ok((
        cookies,
        Json(Outcome::ok(
            "Logged in",
            LoggedIn {
                token: session.id.to_string(),
                expires_at: session.expires_at,
                admin: AdminView::from(&admin),
                next,
            },
        )),
    ))
}

/// Ends the current session and removes the session cookie.
pub async fn logout(
    session: AdminSession,
    Extension(db): DbExt,
    mut cookies: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Json<Outcome<()>>)> {
    if let Some(token) = session.token {
        auth::logout(&db, token)?;
    }
    cookies = cookies.remove(Cookie::build(SESSION_COOKIE).path("/"));
    tracing::info!(admin = %session.id, "admin logged out");
    Ok((cookies, Json(Outcome::done("Logged out"))))
}

/// Account of the logged in admin.
pub async fn me(session: AdminSession) -> Json<AdminView> {
    Json(AdminView::from(&session.admin))
}
