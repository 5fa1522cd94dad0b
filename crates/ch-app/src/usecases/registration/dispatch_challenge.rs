use std::sync::Arc;

use ch_core::ports::{PendingConfirmation, PhoneAuthError, PhoneAuthPort, VerifierToken};
use ch_core::registration::phone::{mask_phone, normalize_phone};
use ch_core::RegistrationError;
use tracing::{info, warn};

/// Use case for sending the one-time passcode to the draft's phone number.
///
/// Makes exactly one provider call per invocation and only when a live
/// bot-check token is present.
pub struct DispatchChallenge {
    phone_auth: Arc<dyn PhoneAuthPort>,
    default_prefix: String,
}

impl DispatchChallenge {
    pub fn new(phone_auth: Arc<dyn PhoneAuthPort>, default_prefix: impl Into<String>) -> Self {
        Self {
            phone_auth,
            default_prefix: default_prefix.into(),
        }
    }

    pub async fn execute(
        &self,
        raw_phone: &str,
        token: Option<&VerifierToken>,
    ) -> Result<PendingConfirmation, RegistrationError> {
        let token = match token {
            Some(token) if token.is_revoked() => return Err(RegistrationError::VerifierUnavailable),
            Some(token) if token.is_expired() => return Err(RegistrationError::VerifierExpired),
            Some(token) => token,
            None => return Err(RegistrationError::VerifierUnavailable),
        };

        let phone = normalize_phone(raw_phone, &self.default_prefix);
        info!(phone = %mask_phone(&phone), "sending verification code");

        self.phone_auth
            .send_code(&phone, token)
            .await
            .map_err(|err| {
                warn!(error = %err, phone = %mask_phone(&phone), "verification code dispatch failed");
                map_send_error(err)
            })
    }
}

fn map_send_error(err: PhoneAuthError) -> RegistrationError {
    match err {
        PhoneAuthError::InvalidPhoneNumber => RegistrationError::InvalidPhoneNumber,
        PhoneAuthError::QuotaExceeded => RegistrationError::QuotaExceeded,
        PhoneAuthError::TooManyRequests => RegistrationError::TooManyRequests,
        PhoneAuthError::Provider { message } => RegistrationError::send_failed(message),
        PhoneAuthError::InvalidCode
        | PhoneAuthError::SessionExpired
        | PhoneAuthError::Transport(_) => RegistrationError::SendFailed { message: None },
    }
}
