use lettre::{
    address::AddressError, message::SinglePart, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};

use crate::message::Message;
use crate::{Error, ErrorKind, Result};

pub async fn send_async(message: lettre::Message, config: crate::config::Email) -> Result<()> {
    let creds = Credentials::new(config.smtp_user.clone(), config.smtp_password.clone());

    // Open a remote connection to mail server
    let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
        .map_err(|e| Error::new(ErrorKind::Other(e.to_string())))?
        .port(config.smtp_port)
        .credentials(creds)
        .build();

    let response = mailer.send(message).await?;
    if response.is_positive() {
        Ok(())
    } else {
        Err(ErrorKind::EmailBadResponse(response.code().to_string()).into())
    }
}

fn parse_address(addr: &str) -> Result<lettre::message::Mailbox> {
    addr.parse()
        .map_err(|e: AddressError| Error::new(ErrorKind::EmailParseError(e.to_string())))
}

/// Builds the notification about a new inbound message. Replies go straight
/// to the sender.
pub fn new_message_notification(message: &Message, config: &crate::Config) -> Result<lettre::Message> {
    let body = format!(
        "New {} message on {}\n\n\
        From: {} <{}>\n\
        Phone: {}\n\n\
        {}\n",
        message.kind,
        config.domain,
        message.name,
        message.email,
        if message.phone.is_empty() { "-" } else { &message.phone },
        message.body,
    );

    let email = lettre::Message::builder()
        .from(parse_address(&format!("{} <{}>", config.name, config.email.address))?)
        .reply_to(parse_address(&message.email)?)
        .to(parse_address(&config.email.notify)?)
        .subject(format!("[{}] New {} message from {}", config.name, message.kind, message.name))
        .singlepart(SinglePart::plain(body))?;
    Ok(email)
}

/// Sends the notification in the background. Does nothing unless email is
/// enabled in the config.
pub fn notify_new_message(message: &Message, config: &crate::Config) -> Result<()> {
    if !config.email.enabled {
        return Ok(());
    }
    let email = new_message_notification(message, config)?;
    let email_config = config.email.clone();
    let id = message.id;
    tokio::spawn(async move {
        if let Err(e) = send_async(email, email_config).await {
            tracing::error!(message = %id, "failed sending notification: {e}")
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;

    #[test]
    fn notification_replies_to_sender() {
        let mut config = crate::Config::default();
        config.name = "Beacon".into();
        config.domain = "example.org".into();
        config.email.address = "site@example.org".into();
        config.email.notify = "team@example.org".into();

        let message = Message {
            id: uuid::Uuid::new_v4(),
            kind: MessageKind::Donation,
            name: "Awa".into(),
            email: "awa@example.org".into(),
            phone: String::new(),
            body: "I'd like to help".into(),
            read: false,
            received_at: chrono::Utc::now(),
        };
        let email = new_message_notification(&message, &config).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("Reply-To: awa@example.org"));
        assert!(raw.contains("To: team@example.org"));
        assert!(raw.contains("New donation message from Awa"));
    }

    #[test]
    fn disabled_email_is_a_noop() {
        let config = crate::Config::default();
        assert!(!config.email.enabled);
        let message = Message {
            id: uuid::Uuid::new_v4(),
            kind: MessageKind::Contact,
            name: "Awa".into(),
            email: "not even parsed".into(),
            phone: String::new(),
            body: "Hi".into(),
            read: false,
            received_at: chrono::Utc::now(),
        };
        assert!(notify_new_message(&message, &config).is_ok());
    }
}
