use std::backtrace::Backtrace;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use http::Uri;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to operators when the failure carries nothing worth
/// surfacing.
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again";

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub backtrace: Backtrace,
    pub request: Option<Uuid>,
    pub admin: Option<Uuid>,
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
            request: None,
            admin: None,
        }
    }

    pub fn new_with(kind: ErrorKind, request: Option<Uuid>, admin: Option<Uuid>) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
            request,
            admin,
        }
    }

    /// Message suitable for showing to the operator in a banner.
    ///
    /// Validation, upload and persistence failures carry their own message.
    /// Anything internal collapses into [`GENERIC_FAILURE`].
    pub fn public_message(&self) -> String {
        match &self.kind {
            ErrorKind::Validation(_)
            | ErrorKind::BadInput(_)
            | ErrorKind::UploadRejected(_)
            | ErrorKind::NotFound(_)
            | ErrorKind::SlugConflict(_)
            | ErrorKind::VersionConflict { .. }
            | ErrorKind::InvalidCredentials
            | ErrorKind::AccountLocked(_)
            | ErrorKind::Forbidden
            | ErrorKind::AdminWithEmailAlreadyExists(_)
            | ErrorKind::Message(_) => self.kind.to_string(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(admin) = self.admin {
            write!(f, ", admin: {}", admin)?;
        }
        if let Some(request) = self.request {
            write!(f, ", request: {}", request)?;
        }
        if self.backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            write!(f, ", {}", self.backtrace)?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ErrorKind {
    #[error("unexpected error")]
    StdIoError(#[from] std::io::Error),

    #[error("unexpected error")]
    Unexpected,

    #[error("config error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("failed parsing value from string: {0}")]
    ParsingError(String),

    #[error("http error: {0}")]
    HttpError(#[from] http::Error),
    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("lettre email error: {0}")]
    LettreEmailError(#[from] lettre::error::Error),
    #[error("lettre smtp  error: {0}")]
    LettreSmtpError(#[from] lettre::transport::smtp::Error),
    #[error("failed parsing email address: {0}")]
    EmailParseError(String),
    #[error("failed sending email through smtp: {0}")]
    EmailBadResponse(String),

    #[error("other error: {0}")]
    Other(String),
    #[error("{0}")]
    Message(String),

    #[error("bad input: {0}")]
    BadInput(String),
    /// Missing or malformed field on a submitted form.
    #[error("{0}")]
    Validation(String),
    #[error("upload rejected: {0}")]
    UploadRejected(String),

    #[error("not found: {0}")]
    NotFound(String),
    #[error("slug already taken by another record: {0}")]
    SlugConflict(String),
    #[error("record was modified by someone else (expected version {expected}, found {found})")]
    VersionConflict { expected: u64, found: u64 },

    #[error("forbidden")]
    Forbidden,
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account locked until {0}")]
    AccountLocked(DateTime<Utc>),
    /// Happens on unauthenticated visitor trying to access admin routes.
    /// Gets turned into a response redirecting to the login page.
    #[error("failed getting token cookie")]
    FailedGettingTokenCookie(Uri),
    #[error("admin with this email already exists: {0}")]
    AdminWithEmailAlreadyExists(String),

    #[error("db error: {0}")]
    DbError(String),

    #[cfg(feature = "sled")]
    #[error("sled db error: {0}")]
    SledError(#[from] sled::Error),

    #[error("passwordhash error: {0}")]
    PasswordHashError(#[from] argon2::password_hash::Error),

    #[error("json decode error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("yaml decode error: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("pot decode error: {0}")]
    PotError(#[from] pot::Error),

    #[error("template error: {0}")]
    TemplateError(#[from] askama::Error),

    #[error("uuid error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("url parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("infallible?")]
    Infallible(#[from] Infallible),
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Self::new(ErrorKind::Other(e))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::new(ErrorKind::ReqwestError(e))
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(e: argon2::password_hash::Error) -> Self {
        Self::new(ErrorKind::PasswordHashError(e))
    }
}

impl From<uuid::Error> for Error {
    fn from(e: uuid::Error) -> Self {
        Self::new(ErrorKind::UuidError(e))
    }
}

#[cfg(feature = "sled")]
impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Self::new(ErrorKind::SledError(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::new(ErrorKind::JsonError(e))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Self::new(ErrorKind::YamlError(e))
    }
}

impl From<pot::Error> for Error {
    fn from(e: pot::Error) -> Self {
        Self::new(ErrorKind::PotError(e))
    }
}

impl From<askama::Error> for Error {
    fn from(e: askama::Error) -> Self {
        Self::new(ErrorKind::TemplateError(e))
    }
}

impl From<lettre::error::Error> for Error {
    fn from(e: lettre::error::Error) -> Self {
        Self::new(ErrorKind::LettreEmailError(e))
    }
}

impl From<lettre::transport::smtp::Error> for Error {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        Self::new(ErrorKind::LettreSmtpError(e))
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::new(ErrorKind::UrlParseError(e))
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Self::new(ErrorKind::ConfigError(e))
    }
}

impl From<http::Error> for Error {
    fn from(e: http::Error) -> Self {
        Self::new(ErrorKind::HttpError(e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::StdIoError(e))
    }
}

impl From<Infallible> for Error {
    fn from(e: Infallible) -> Self {
        Self::new(ErrorKind::Infallible(e))
    }
}

impl From<ErrorKind> for Error {
    fn from(k: ErrorKind) -> Self {
        Self::new(k)
    }
}
