//! Inbound contact, donation and volunteer submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::db::{Collectable, Identifiable};
use crate::error::{ErrorKind, Result};
use crate::Database;

pub type MessageId = Uuid;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Contact,
    Donation,
    Volunteer,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub body: String,
    pub read: bool,
    pub received_at: DateTime<Utc>,
}

impl Collectable for Message {
    fn get_collection_name() -> &'static str {
        "message"
    }
}

impl Identifiable for Message {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

/// Submission of one of the public forms.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub body: String,
}

impl NewMessage {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ErrorKind::Validation("Please tell us your name".into()).into());
        }
        if !self.email.trim().validate_email() {
            return Err(ErrorKind::Validation("Please provide a valid email address".into()).into());
        }
        if self.body.trim().is_empty() {
            return Err(ErrorKind::Validation("The message can't be empty".into()).into());
        }
        Ok(())
    }

    fn into_message(self) -> Message {
        Message {
            id: Uuid::new_v4(),
            kind: self.kind,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            body: self.body.trim().to_string(),
            read: false,
            received_at: Utc::now(),
        }
    }
}

/// Validates and stores a submission.
pub fn submit(db: &Database, new: NewMessage) -> Result<Message> {
    new.validate()?;
    let message = new.into_message();
    db.set(&message)?;
    tracing::info!(message = %message.id, kind = %message.kind, "message received");
    Ok(message)
}

/// Messages, newest first, optionally restricted to unread ones.
pub fn list(db: &Database, unread_only: bool) -> Result<Vec<Message>> {
    let mut messages: Vec<Message> = db
        .get_collection::<Message>()?
        .into_iter()
        .filter(|m| !unread_only || !m.read)
        .collect();
    messages.sort_by(|a, b| b.received_at.cmp(&a.received_at));
    Ok(messages)
}

pub fn unread_count(db: &Database) -> Result<usize> {
    Ok(db
        .get_collection::<Message>()?
        .iter()
        .filter(|m| !m.read)
        .count())
}

pub fn set_read(db: &Database, id: MessageId, read: bool) -> Result<Message> {
    let mut message = db.get::<Message>(id)?;
    message.read = read;
    db.set(&message)?;
    Ok(message)
}

pub fn delete(db: &Database, id: MessageId) -> Result<()> {
    if !db.remove_by_id::<Message>(id)? {
        return Err(ErrorKind::NotFound(format!("message {id}")).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str, email: &str, body: &str) -> NewMessage {
        NewMessage {
            kind: MessageKind::Contact,
            name: name.into(),
            email: email.into(),
            phone: String::new(),
            body: body.into(),
        }
    }

    #[test]
    fn submission_is_validated() {
        assert!(contact("Awa", "awa@example.org", "Hello").validate().is_ok());
        for bad in [
            contact("", "awa@example.org", "Hello"),
            contact("Awa", "awa-at-example", "Hello"),
            contact("Awa", "awa@example.org", "  "),
        ] {
            let err = bad.validate().unwrap_err();
            assert!(matches!(err.kind, ErrorKind::Validation(_)));
        }
    }

    #[test]
    fn kind_uses_type_field() {
        let new: NewMessage = serde_json::from_str(
            r#"{ "type": "volunteer", "name": "Awa", "email": "awa@example.org", "body": "Hi" }"#,
        )
        .unwrap();
        assert_eq!(new.kind, MessageKind::Volunteer);
    }

    #[test]
    fn read_flags_and_ordering() -> Result<()> {
        let db = Database::temporary()?;
        let first = submit(&db, contact("One", "one@example.org", "first"))?;
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = submit(&db, contact("Two", "two@example.org", "second"))?;

        let all = list(&db, false)?;
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
        assert_eq!(unread_count(&db)?, 2);

        set_read(&db, first.id, true)?;
        assert_eq!(unread_count(&db)?, 1);
        assert_eq!(list(&db, true)?.len(), 1);

        delete(&db, second.id)?;
        assert!(delete(&db, second.id).is_err());
        assert_eq!(list(&db, false)?.len(), 1);
        Ok(())
    }

    #[test]
    fn invalid_submission_is_not_stored() -> Result<()> {
        let db = Database::temporary()?;
        assert!(submit(&db, contact("", "x@example.org", "Hi")).is_err());
        assert!(list(&db, false)?.is_empty());
        Ok(())
    }
}
