//! User-facing registration errors.

use serde::{Deserialize, Serialize};

/// Categorized error shown to the user. `Display` is the message text.
///
/// None of these discard the draft; the state machine keeps the user in the
/// phase where the error happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistrationError {
    #[error("please correct the highlighted fields")]
    InvalidFields { count: usize },

    #[error("verification system unavailable, refresh and retry")]
    VerifierUnavailable,

    #[error("verification expired, refresh and retry")]
    VerifierExpired,

    #[error("the phone number is invalid, check the number and country code")]
    InvalidPhoneNumber,

    #[error("try again later")]
    QuotaExceeded,

    #[error("too many requests, wait before retrying")]
    TooManyRequests,

    #[error("{}", .message.as_deref().unwrap_or("error sending code, try again"))]
    SendFailed { message: Option<String> },

    #[error("enter the valid 6-digit code")]
    CodeIncomplete,

    #[error("invalid code, check and try again")]
    InvalidCode,

    #[error("error verifying code, try again")]
    VerifyUnavailable,

    #[error("error saving data: {detail}")]
    SaveFailed { detail: String },

    #[error("this phone number is already registered")]
    AlreadyRegistered,
}

impl RegistrationError {
    /// Provider failure without a usable message falls back to the generic text.
    pub fn send_failed(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = message.trim();
        RegistrationError::SendFailed {
            message: (!message.is_empty()).then(|| message.to_string()),
        }
    }
}
