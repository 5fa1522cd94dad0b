use thiserror::Error;

use super::bot_check::VerifierToken;
use crate::ids::Uid;

/// Handle returned by the provider after a passcode was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    verification_id: String,
    phone_number: String,
}

impl PendingConfirmation {
    pub fn new(verification_id: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            verification_id: verification_id.into(),
            phone_number: phone_number.into(),
        }
    }

    pub fn verification_id(&self) -> &str {
        &self.verification_id
    }

    /// Normalized number the code was sent to.
    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }
}

/// Identity issued by the provider once the passcode is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub uid: Uid,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneAuthError {
    #[error("invalid phone number")]
    InvalidPhoneNumber,

    #[error("quota exceeded")]
    QuotaExceeded,

    #[error("too many requests")]
    TooManyRequests,

    #[error("invalid verification code")]
    InvalidCode,

    #[error("verification session expired")]
    SessionExpired,

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Phone-number identity provider.
#[async_trait::async_trait]
pub trait PhoneAuthPort: Send + Sync {
    /// Sends a one-time passcode to `phone_number` (E.164).
    async fn send_code(
        &self,
        phone_number: &str,
        token: &VerifierToken,
    ) -> Result<PendingConfirmation, PhoneAuthError>;

    async fn confirm(
        &self,
        pending: &PendingConfirmation,
        code: &str,
    ) -> Result<AuthenticatedIdentity, PhoneAuthError>;
}
