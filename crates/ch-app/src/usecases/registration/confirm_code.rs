use std::sync::Arc;

use ch_core::ports::{AuthenticatedIdentity, PendingConfirmation, PhoneAuthError, PhoneAuthPort};
use ch_core::registration::phone::mask_phone;
use ch_core::registration::OTP_LENGTH;
use ch_core::RegistrationError;
use tracing::{info, warn};

/// Use case for exchanging the entered passcode for an authenticated identity.
pub struct ConfirmCode {
    phone_auth: Arc<dyn PhoneAuthPort>,
}

impl ConfirmCode {
    pub fn new(phone_auth: Arc<dyn PhoneAuthPort>) -> Self {
        Self { phone_auth }
    }

    /// Codes that are not exactly six digits fail without a provider call.
    pub async fn execute(
        &self,
        pending: &PendingConfirmation,
        code: &str,
    ) -> Result<AuthenticatedIdentity, RegistrationError> {
        if code.len() != OTP_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(RegistrationError::CodeIncomplete);
        }

        match self.phone_auth.confirm(pending, code).await {
            Ok(identity) => {
                info!(
                    uid = %identity.uid,
                    phone = %mask_phone(&identity.phone_number),
                    "phone number confirmed"
                );
                Ok(identity)
            }
            Err(err) => {
                warn!(error = %err, "verification code rejected");
                Err(map_confirm_error(err))
            }
        }
    }
}

fn map_confirm_error(err: PhoneAuthError) -> RegistrationError {
    match err {
        PhoneAuthError::TooManyRequests => RegistrationError::TooManyRequests,
        PhoneAuthError::Transport(_) => RegistrationError::VerifyUnavailable,
        PhoneAuthError::InvalidCode
        | PhoneAuthError::SessionExpired
        | PhoneAuthError::InvalidPhoneNumber
        | PhoneAuthError::QuotaExceeded
        | PhoneAuthError::Provider { .. } => RegistrationError::InvalidCode,
    }
}
