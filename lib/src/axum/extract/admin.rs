use std::ops::Deref;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_auth::AuthBearer;
use axum_extra::extract::cookie::Key as CookieKey;
use axum_extra::extract::PrivateCookieJar;

use crate::admin::{self, Admin};
use crate::auth::login::SESSION_COOKIE;
use crate::auth::{self, SessionId};
use crate::error::{Error, ErrorKind};
use crate::{Config, Database};

/// Authenticated admin making the request.
///
/// The session token is looked up in the `Authorization: Bearer` header
/// first, then in the private session cookie.
#[derive(Clone, Debug)]
pub struct AdminSession {
    pub admin: Admin,
    /// Missing when logged in through dev mode autologin.
    pub token: Option<SessionId>,
}

impl Deref for AdminSession {
    type Target = Admin;

    fn deref(&self) -> &Self::Target {
        &self.admin
    }
}

fn extension<T: Send + Sync + 'static>(parts: &Parts, name: &str) -> Result<Arc<T>, Error> {
    parts
        .extensions
        .get::<Arc<T>>()
        .cloned()
        .ok_or_else(|| ErrorKind::Other(format!("{name} extension unavailable")).into())
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminSession
where
    CookieKey: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let db = extension::<Database>(parts, "database")?;
        let config = extension::<Config>(parts, "config")?;

        // autologin functionality for faster development, can be set in config
        if config.dev.enabled {
            if let Some(email) = &config.dev.autologin {
                tracing::debug!("attempting autologin, uri: {}", parts.uri);
                let admin = admin::find_by_email(&db, email)?.ok_or_else(|| {
                    ErrorKind::AuthFailed(format!("autologin: no admin with email {email}"))
                })?;
                return Ok(Self { admin, token: None });
            }
        }

        let token = if let Ok(AuthBearer(token)) = AuthBearer::from_request_parts(parts, state).await
        {
            token
        } else {
            let jar: PrivateCookieJar<CookieKey> =
                PrivateCookieJar::from_request_parts(parts, state).await?;
            let cookie = jar
                .get(SESSION_COOKIE)
                .ok_or_else(|| ErrorKind::FailedGettingTokenCookie(parts.uri.clone()))?;
            cookie.value().to_string()
        };

        let token = SessionId::parse_str(&token)
            .map_err(|_| ErrorKind::AuthFailed("malformed session token".to_string()))?;
        let session = auth::resolve_session(&db, token)?;
        let admin = db
            .get::<Admin>(session.admin)
            .map_err(|_| ErrorKind::AuthFailed("session admin no longer exists".to_string()))?;

        Ok(Self {
            admin,
            token: Some(token),
        })
    }
}
