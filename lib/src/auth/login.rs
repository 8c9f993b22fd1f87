use chrono::{DateTime, Duration, Utc};
use cookie::{Cookie, SameSite};

use crate::admin::{self, Admin};
use crate::config;
use crate::error::{ErrorKind, Result};
use crate::Database;

use super::{validate_password, Session};

/// Name of the private cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Checks admin credentials and opens a session.
///
/// After `max_failed_logins` consecutive failures the account is locked for
/// `lockout_minutes`. A successful login resets the counter. Unknown emails
/// and wrong passwords fail the same way.
pub fn login(db: &Database, auth: &config::Auth, email: &str, password: &str) -> Result<Session> {
    login_at(db, auth, email, password, Utc::now())
}

pub(crate) fn login_at(
    db: &Database,
    auth: &config::Auth,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<Session> {
    let Some(mut admin) = admin::find_by_email(db, email)? else {
        tracing::debug!("login attempt for unknown email");
        return Err(ErrorKind::InvalidCredentials.into());
    };

    if let Some(until) = admin.locked_until {
        if until > now {
            tracing::debug!(admin = %admin.id, "login attempt on locked account");
            return Err(ErrorKind::AccountLocked(until).into());
        }
    }

    if let Err(e) = validate_password(password.as_bytes(), &admin.password_hash) {
        register_failure(db, &mut admin, auth, now)?;
        return Err(e);
    }

    admin.failed_logins = 0;
    admin.locked_until = None;
    admin.last_login = Some(now);
    db.set(&admin)?;

    let session = Session::new(admin.id, Duration::hours(auth.session_hours));
    db.set(&session)?;
    tracing::info!(admin = %admin.id, "admin logged in");
    Ok(session)
}

fn register_failure(
    db: &Database,
    admin: &mut Admin,
    auth: &config::Auth,
    now: DateTime<Utc>,
) -> Result<()> {
    // A lock that ran out starts a fresh count.
    if admin.locked_until.is_some_and(|until| until <= now) {
        admin.failed_logins = 0;
        admin.locked_until = None;
    }
    admin.failed_logins += 1;
    if admin.failed_logins >= auth.max_failed_logins {
        let until = now + Duration::minutes(auth.lockout_minutes);
        tracing::warn!(admin = %admin.id, %until, "account locked after repeated failed logins");
        admin.locked_until = Some(until);
    }
    db.set(admin)
}

/// Builds the cookie storing the session token.
pub fn session_cookie<'c>(session: &Session) -> Cookie<'c> {
    Cookie::build((SESSION_COOKIE, session.id.to_string()))
        .same_site(SameSite::Lax)
        .path("/")
        .secure(true)
        .http_only(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::{NewAdmin, Role};
    use crate::auth::resolve_session;

    fn setup() -> Result<(Database, Admin)> {
        let db = Database::temporary()?;
        let admin = admin::create(
            &db,
            NewAdmin {
                email: "ops@example.org".into(),
                name: "Ops".into(),
                password: "correct horse".into(),
                role: Role::SuperAdmin,
            },
        )?;
        Ok((db, admin))
    }

    #[test]
    fn successful_login_opens_session() -> Result<()> {
        let (db, admin) = setup()?;
        let session = login(&db, &config::Auth::default(), "OPS@example.org", "correct horse")?;
        assert_eq!(session.admin, admin.id);
        assert_eq!(resolve_session(&db, session.id)?.admin, admin.id);
        assert!(db.get::<Admin>(admin.id)?.last_login.is_some());
        Ok(())
    }

    #[test]
    fn unknown_email_is_invalid_credentials() -> Result<()> {
        let (db, _) = setup()?;
        let err = login(&db, &config::Auth::default(), "who@example.org", "x").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidCredentials));
        Ok(())
    }

    #[test]
    fn five_failures_lock_the_account() -> Result<()> {
        let (db, admin) = setup()?;
        let auth = config::Auth::default();
        let now = Utc::now();

        for _ in 0..5 {
            let err = login_at(&db, &auth, "ops@example.org", "nope", now).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::InvalidCredentials));
        }
        let stored = db.get::<Admin>(admin.id)?;
        assert_eq!(stored.failed_logins, 5);
        assert!(stored.is_locked(now));

        // Even the right password is refused while locked.
        let err = login_at(&db, &auth, "ops@example.org", "correct horse", now).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::AccountLocked(_)));

        // Once the window passed, the right password gets in and resets.
        let later = now + Duration::minutes(auth.lockout_minutes + 1);
        login_at(&db, &auth, "ops@example.org", "correct horse", later)?;
        let stored = db.get::<Admin>(admin.id)?;
        assert_eq!(stored.failed_logins, 0);
        assert!(stored.locked_until.is_none());
        Ok(())
    }

    #[test]
    fn success_resets_failure_counter() -> Result<()> {
        let (db, admin) = setup()?;
        let auth = config::Auth::default();
        for _ in 0..4 {
            assert!(login(&db, &auth, "ops@example.org", "nope").is_err());
        }
        login(&db, &auth, "ops@example.org", "correct horse")?;
        assert!(login(&db, &auth, "ops@example.org", "nope").is_err());
        let stored = db.get::<Admin>(admin.id)?;
        assert_eq!(stored.failed_logins, 1);
        assert!(stored.locked_until.is_none());
        Ok(())
    }
}
