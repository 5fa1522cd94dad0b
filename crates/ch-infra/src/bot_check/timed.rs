use std::collections::HashMap;
use std::sync::Arc;

use ch_core::ports::{BotCheckError, BotCheckPort, ExpiryNotifier, VerifierToken, WidgetAnchor};
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::debug;

/// Bot-check widget whose token is the configured site token and expires
/// after a fixed TTL.
///
/// Each rendered widget owns a timer task keyed by the token id; `clear`
/// aborts it.
pub struct TimedBotCheck {
    site_token: String,
    ttl: Duration,
    timers: Arc<Mutex<HashMap<String, tokio::task::AbortHandle>>>,
}

impl TimedBotCheck {
    pub fn new(site_token: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            site_token: site_token.into(),
            ttl: Duration::from_secs(ttl_secs),
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait::async_trait]
impl BotCheckPort for TimedBotCheck {
    async fn render(
        &self,
        anchor: &WidgetAnchor,
        notifier: ExpiryNotifier,
    ) -> Result<VerifierToken, BotCheckError> {
        if anchor.as_str().trim().is_empty() {
            return Err(BotCheckError::AnchorMissing(anchor.as_str().to_string()));
        }

        let token = VerifierToken::new(self.site_token.clone(), &notifier);
        let token_id = token.id().to_string();
        let timers = Arc::clone(&self.timers);
        let ttl = self.ttl;
        // The countdown starts at render, not when the timer task first runs.
        let deadline = Instant::now() + ttl;

        let mut timers_guard = self.timers.lock().await;
        let task_token_id = token_id.clone();
        let handle = tokio::spawn(async move {
            sleep_until(deadline).await;
            notifier.expire();
            timers.lock().await.remove(&task_token_id);
            debug!(token_id = %task_token_id, "bot-check token expired");
        });
        timers_guard.insert(token_id.clone(), handle.abort_handle());

        debug!(token_id = %token_id, anchor = %anchor.as_str(), ttl_secs = ttl.as_secs(), "bot-check widget rendered");
        Ok(token)
    }

    async fn clear(&self, token: &VerifierToken) -> Result<(), BotCheckError> {
        if let Some(handle) = self.timers.lock().await.remove(token.id()) {
            handle.abort();
            debug!(token_id = %token.id(), "bot-check timer stopped");
        }
        Ok(())
    }
}
