use std::collections::HashMap;

use async_trait::async_trait;
use ch_core::ports::{
    AuthenticatedIdentity, PendingConfirmation, PhoneAuthError, PhoneAuthPort, VerifierToken,
};
use ch_core::registration::phone::{digits_only, mask_phone};
use ch_core::{SecretString, Uid};
use rand::Rng;
use tokio::sync::Mutex;
use tracing::info;

/// Phone provider that never leaves the process.
///
/// Codes are "delivered" through the log at `info` level; the uid is derived
/// from the number so repeated runs hit the same profile.
#[derive(Default)]
pub struct OfflinePhoneAuth {
    sessions: Mutex<HashMap<String, SecretString>>,
}

impl OfflinePhoneAuth {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PhoneAuthPort for OfflinePhoneAuth {
    async fn send_code(
        &self,
        phone_number: &str,
        _token: &VerifierToken,
    ) -> Result<PendingConfirmation, PhoneAuthError> {
        if !phone_number.starts_with('+') || digits_only(phone_number).len() < 8 {
            return Err(PhoneAuthError::InvalidPhoneNumber);
        }

        let code = format!("{:06}", rand::rng().random_range(0..1_000_000u32));
        let session = uuid::Uuid::new_v4().to_string();
        info!(phone = %mask_phone(phone_number), code = %code, "offline verification code");

        self.sessions
            .lock()
            .await
            .insert(session.clone(), SecretString::new(code));
        Ok(PendingConfirmation::new(session, phone_number))
    }

    async fn confirm(
        &self,
        pending: &PendingConfirmation,
        code: &str,
    ) -> Result<AuthenticatedIdentity, PhoneAuthError> {
        let mut sessions = self.sessions.lock().await;
        let expected = sessions
            .get(pending.verification_id())
            .ok_or(PhoneAuthError::SessionExpired)?;
        if expected.expose() != code {
            return Err(PhoneAuthError::InvalidCode);
        }
        sessions.remove(pending.verification_id());

        Ok(AuthenticatedIdentity {
            uid: Uid::new(format!("offline-{}", digits_only(pending.phone_number()))),
            phone_number: pending.phone_number().to_string(),
        })
    }
}
