use std::time::Duration;

use async_trait::async_trait;
use ch_core::ports::{
    AuthenticatedIdentity, PendingConfirmation, PhoneAuthError, PhoneAuthPort, VerifierToken,
};
use ch_core::{SecretString, Uid};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SEND_CODE_PATH: &str = "accounts:sendVerificationCode";
const SIGN_IN_PATH: &str = "accounts:signInWithPhoneNumber";

pub struct IdentityToolkitPhoneAuth {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendCodeRequest<'a> {
    phone_number: &'a str,
    recaptcha_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendCodeResponse {
    session_info: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    session_info: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    phone_number: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl IdentityToolkitPhoneAuth {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self::with_client(client, base_url, api_key))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: SecretString::new(api_key),
        }
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, PhoneAuthError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose())])
            .json(body)
            .send()
            .await
            .map_err(|e| PhoneAuthError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<R>()
                .await
                .map_err(|e| PhoneAuthError::Transport(e.to_string()));
        }

        let text = response.text().await.unwrap_or_default();
        debug!(%status, path, "identity toolkit request failed");
        Err(map_error_response(status, &text))
    }
}

/// Maps an error response to a categorized error.
///
/// Error messages look like `INVALID_PHONE_NUMBER : Invalid format.`; only the
/// leading code is significant.
fn map_error_response(status: StatusCode, body: &str) -> PhoneAuthError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_default();
    let code = message
        .split([' ', ':'])
        .next()
        .unwrap_or_default()
        .trim();

    match code {
        "INVALID_PHONE_NUMBER" | "MISSING_PHONE_NUMBER" => PhoneAuthError::InvalidPhoneNumber,
        "QUOTA_EXCEEDED" => PhoneAuthError::QuotaExceeded,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => PhoneAuthError::TooManyRequests,
        "INVALID_CODE" | "MISSING_CODE" => PhoneAuthError::InvalidCode,
        "SESSION_EXPIRED" | "CODE_EXPIRED" | "INVALID_SESSION_INFO" => {
            PhoneAuthError::SessionExpired
        }
        "" if status == StatusCode::TOO_MANY_REQUESTS => PhoneAuthError::TooManyRequests,
        "" if status.is_server_error() => PhoneAuthError::Transport(status.to_string()),
        "" => PhoneAuthError::Provider {
            message: status.to_string(),
        },
        _ => PhoneAuthError::Provider { message },
    }
}

#[async_trait]
impl PhoneAuthPort for IdentityToolkitPhoneAuth {
    async fn send_code(
        &self,
        phone_number: &str,
        token: &VerifierToken,
    ) -> Result<PendingConfirmation, PhoneAuthError> {
        let request = SendCodeRequest {
            phone_number,
            recaptcha_token: token.expose(),
        };
        let response: SendCodeResponse = self.post(SEND_CODE_PATH, &request).await?;
        Ok(PendingConfirmation::new(response.session_info, phone_number))
    }

    async fn confirm(
        &self,
        pending: &PendingConfirmation,
        code: &str,
    ) -> Result<AuthenticatedIdentity, PhoneAuthError> {
        let request = SignInRequest {
            session_info: pending.verification_id(),
            code,
        };
        let response: SignInResponse = self.post(SIGN_IN_PATH, &request).await?;
        Ok(AuthenticatedIdentity {
            uid: Uid::new(response.local_id),
            phone_number: response
                .phone_number
                .unwrap_or_else(|| pending.phone_number().to_string()),
        })
    }
}
