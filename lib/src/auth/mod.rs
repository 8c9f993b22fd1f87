//! Admin authentication.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::admin::AdminId;
use crate::db::{Collectable, Identifiable};
use crate::error::{ErrorKind, Result};
use crate::Database;

pub mod login;

pub use login::login;

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

pub fn validate_password(password: &[u8], expected_password_hash: &str) -> Result<()> {
    let expected_password_hash = PasswordHash::new(expected_password_hash)
        .map_err(|_| ErrorKind::Other("Failed to parse hash in PHC string format.".to_string()))?;
    Argon2::default()
        .verify_password(password, &expected_password_hash)
        .map_err(|_| ErrorKind::InvalidCredentials)?;
    Ok(())
}

pub type SessionId = Uuid;

/// Logged in admin session. The id doubles as the bearer token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub admin: AdminId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Collectable for Session {
    fn get_collection_name() -> &'static str {
        "session"
    }
}

impl Identifiable for Session {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl Session {
    pub fn new(admin: AdminId, duration: Duration) -> Self {
        let issued_at = Utc::now();
        Self {
            id: SessionId::new_v4(),
            admin,
            issued_at,
            expires_at: issued_at + duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Resolves a session token, deleting it if it has expired.
pub fn resolve_session(db: &Database, token: SessionId) -> Result<Session> {
    let session = db
        .get::<Session>(token)
        .map_err(|_| ErrorKind::AuthFailed("unknown session".into()))?;
    if session.is_expired() {
        db.remove(&session)?;
        return Err(ErrorKind::AuthFailed("session expired".into()).into());
    }
    Ok(session)
}

pub fn logout(db: &Database, token: SessionId) -> Result<()> {
    db.remove_by_id::<Session>(token)?;
    Ok(())
}

/// Removes every session of the admin.
pub fn revoke_sessions(db: &Database, admin: AdminId) -> Result<()> {
    for session in db.get_collection::<Session>()? {
        if session.admin == admin {
            db.remove(&session)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() -> Result<()> {
        let hash = hash_password("correct horse")?;
        assert!(hash.starts_with("$argon2"));
        validate_password(b"correct horse", &hash)?;
        let err = validate_password(b"wrong horse", &hash).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidCredentials));
        Ok(())
    }

    #[test]
    fn expired_sessions_are_dropped() -> Result<()> {
        let db = Database::temporary()?;
        let admin = Uuid::new_v4();

        let live = Session::new(admin, Duration::hours(1));
        db.set(&live)?;
        assert_eq!(resolve_session(&db, live.id)?.admin, admin);

        let stale = Session::new(admin, Duration::seconds(-1));
        db.set(&stale)?;
        assert!(resolve_session(&db, stale.id).is_err());
        assert!(db.get::<Session>(stale.id).is_err());

        revoke_sessions(&db, admin)?;
        assert!(resolve_session(&db, live.id).is_err());
        Ok(())
    }
}
