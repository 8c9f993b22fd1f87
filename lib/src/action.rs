//! Uniform outcome of admin actions.
//!
//! Every admin operation ends at an action boundary where its `Result` is
//! turned into an [`ActionResult`]. The editor shows the message in a
//! dismissable banner next to the form that triggered the action.

use crate::Result;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Converts the result of an action, logging failures on the way out.
    pub fn from_result<T>(result: Result<T>, success_message: &str) -> Self {
        match result {
            Ok(_) => Self::ok(success_message),
            Err(e) => {
                tracing::debug!("action failed: {e}");
                Self::failed(e.public_message())
            }
        }
    }
}

impl<T> From<Result<T>> for ActionResult {
    fn from(result: Result<T>) -> Self {
        Self::from_result(result, "Saved")
    }
}
