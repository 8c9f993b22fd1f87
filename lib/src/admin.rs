//! Back-office accounts.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::hash_password;
use crate::db::{Collectable, Identifiable};
use crate::error::{ErrorKind, Result};
use crate::Database;

pub type AdminId = Uuid;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    #[default]
    ContentManager,
    MessagesManager,
}

/// Actions guarded by role checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum Permission {
    ManageProjects,
    ManageBlog,
    UploadImages,
    ManageMessages,
    ManageAdmins,
}

impl Role {
    pub fn allows(self, permission: Permission) -> bool {
        match self {
            Role::SuperAdmin => true,
            Role::ContentManager => matches!(
                permission,
                Permission::ManageProjects | Permission::ManageBlog | Permission::UploadImages
            ),
            Role::MessagesManager => permission == Permission::ManageMessages,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Admin {
    pub id: AdminId,
    /// Unique among admins, stored lowercase.
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,

    /// Consecutive failed logins since the last successful one.
    pub failed_logins: u32,
    pub locked_until: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Default for Admin {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: String::new(),
            name: String::new(),
            password_hash: String::new(),
            role: Role::default(),
            failed_logins: 0,
            locked_until: None,
            created_at: Utc::now(),
            last_login: None,
        }
    }
}

impl Collectable for Admin {
    fn get_collection_name() -> &'static str {
        "admin"
    }
}

impl Identifiable for Admin {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl Admin {
    pub fn can(&self, permission: Permission) -> bool {
        self.role.allows(permission)
    }

    /// Fails with [`ErrorKind::Forbidden`] unless the admin's role allows
    /// the action.
    pub fn require(&self, permission: Permission) -> Result<()> {
        if self.can(permission) {
            Ok(())
        } else {
            tracing::debug!(admin = %self.id, role = %self.role, %permission, "permission denied");
            Err(ErrorKind::Forbidden.into())
        }
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.locked_until, Some(until) if until > now)
    }
}

/// Public view of an admin account, without credentials.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdminView {
    pub id: AdminId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&Admin> for AdminView {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email.clone(),
            name: admin.name.clone(),
            role: admin.role,
            locked_until: admin.locked_until,
            last_login: admin.last_login,
        }
    }
}

/// Input for creating an admin account.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewAdmin {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn find_by_email(db: &Database, email: &str) -> Result<Option<Admin>> {
    let email = normalize_email(email);
    db.find::<Admin>(|a| a.email == email)
}

/// Creates a new admin account. Emails are unique among admins.
pub fn create(db: &Database, new: NewAdmin) -> Result<Admin> {
    use validator::ValidateEmail;

    let email = normalize_email(&new.email);
    if !email.validate_email() {
        return Err(ErrorKind::Validation(format!("`{email}` is not a valid email address")).into());
    }
    if new.password.chars().count() < 8 {
        return Err(
            ErrorKind::Validation("Password must be at least 8 characters long".into()).into(),
        );
    }
    if find_by_email(db, &email)?.is_some() {
        return Err(ErrorKind::AdminWithEmailAlreadyExists(email).into());
    }

    let admin = Admin {
        email,
        name: new.name.trim().to_string(),
        password_hash: hash_password(&new.password)?,
        role: new.role,
        ..Default::default()
    };
    db.set(&admin)?;
    tracing::info!(admin = %admin.id, role = %admin.role, "admin created");
    Ok(admin)
}

/// Lists admins sorted by email.
pub fn list(db: &Database) -> Result<Vec<Admin>> {
    let mut admins = db.get_collection::<Admin>()?;
    admins.sort_by(|a, b| a.email.cmp(&b.email));
    Ok(admins)
}

fn super_admin_count(db: &Database) -> Result<usize> {
    Ok(db
        .get_collection::<Admin>()?
        .iter()
        .filter(|a| a.role == Role::SuperAdmin)
        .count())
}

/// Changes the role of an admin. The last super admin can't be demoted.
pub fn set_role(db: &Database, id: AdminId, role: Role) -> Result<Admin> {
    let mut admin = db.get::<Admin>(id)?;
    if admin.role == Role::SuperAdmin && role != Role::SuperAdmin && super_admin_count(db)? <= 1 {
        return Err(ErrorKind::BadInput("the last super admin can't be demoted".into()).into());
    }
    admin.role = role;
    db.set(&admin)?;
    Ok(admin)
}

/// Clears a lockout before it expires.
pub fn unlock(db: &Database, id: AdminId) -> Result<Admin> {
    let mut admin = db.get::<Admin>(id)?;
    admin.failed_logins = 0;
    admin.locked_until = None;
    db.set(&admin)?;
    Ok(admin)
}

/// Deletes an admin account together with its sessions. The last super admin
/// can't be deleted.
pub fn delete(db: &Database, id: AdminId) -> Result<()> {
    let admin = db.get::<Admin>(id)?;
    if admin.role == Role::SuperAdmin && super_admin_count(db)? <= 1 {
        return Err(ErrorKind::BadInput("the last super admin can't be deleted".into()).into());
    }
    db.remove(&admin)?;
    crate::auth::revoke_sessions(db, id)?;
    tracing::info!(admin = %id, "admin deleted");
    Ok(())
}

impl FromStr for NewAdmin {
    type Err = crate::Error;

    /// Parses `email:password[:role]`, the form used for seeding admins from
    /// the command line.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        let (Some(email), Some(password)) = (parts.next(), parts.next()) else {
            return Err(ErrorKind::ParsingError(format!("expected email:password, got `{s}`")).into());
        };
        let role = match parts.next() {
            Some(role) => Role::from_str(role)
                .map_err(|_| ErrorKind::ParsingError(format!("unknown role `{role}`")))?,
            None => Role::default(),
        };
        Ok(Self {
            email: email.to_string(),
            name: String::new(),
            password: password.to_string(),
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_admin(email: &str, role: Role) -> NewAdmin {
        NewAdmin {
            email: email.to_string(),
            name: "Test".to_string(),
            password: "correct horse".to_string(),
            role,
        }
    }

    #[test]
    fn role_permissions() {
        assert!(Role::SuperAdmin.allows(Permission::ManageAdmins));
        assert!(Role::ContentManager.allows(Permission::ManageProjects));
        assert!(Role::ContentManager.allows(Permission::UploadImages));
        assert!(!Role::ContentManager.allows(Permission::ManageMessages));
        assert!(Role::MessagesManager.allows(Permission::ManageMessages));
        assert!(!Role::MessagesManager.allows(Permission::ManageBlog));
    }

    #[test]
    fn roles_use_snake_case() {
        assert_eq!(Role::SuperAdmin.to_string(), "super_admin");
        assert_eq!(Role::from_str("messages_manager").unwrap(), Role::MessagesManager);
        assert_eq!(
            serde_json::to_string(&Role::ContentManager).unwrap(),
            r#""content_manager""#
        );
    }

    #[test]
    fn emails_are_unique_case_insensitively() -> Result<()> {
        let db = Database::temporary()?;
        create(&db, new_admin("Ana@Example.org", Role::SuperAdmin))?;
        let err = create(&db, new_admin("ana@example.org ", Role::ContentManager)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::AdminWithEmailAlreadyExists(_)));
        assert!(find_by_email(&db, "ANA@example.org")?.is_some());
        Ok(())
    }

    #[test]
    fn invalid_input_is_rejected() -> Result<()> {
        let db = Database::temporary()?;
        let err = create(&db, new_admin("not-an-email", Role::SuperAdmin)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Validation(_)));

        let mut short = new_admin("a@example.org", Role::SuperAdmin);
        short.password = "short".into();
        let err = create(&db, short).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Validation(_)));
        assert!(list(&db)?.is_empty());
        Ok(())
    }

    #[test]
    fn last_super_admin_is_protected() -> Result<()> {
        let db = Database::temporary()?;
        let root = create(&db, new_admin("root@example.org", Role::SuperAdmin))?;
        let editor = create(&db, new_admin("ed@example.org", Role::ContentManager))?;

        assert!(delete(&db, root.id).is_err());
        assert!(set_role(&db, root.id, Role::ContentManager).is_err());

        set_role(&db, editor.id, Role::SuperAdmin)?;
        set_role(&db, root.id, Role::MessagesManager)?;
        delete(&db, root.id)?;
        assert_eq!(list(&db)?.len(), 1);
        Ok(())
    }

    #[test]
    fn parses_seed_string() {
        let admin: NewAdmin = "a@example.org:secret123:super_admin".parse().unwrap();
        assert_eq!(admin.role, Role::SuperAdmin);
        assert_eq!(admin.password, "secret123");
        assert!("only-email".parse::<NewAdmin>().is_err());
        assert!("a@b.org:pw:janitor".parse::<NewAdmin>().is_err());
    }
}
