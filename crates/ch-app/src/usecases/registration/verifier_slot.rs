use std::sync::Arc;

use ch_core::ports::{BotCheckError, BotCheckPort, ExpiryNotifier, VerifierToken, WidgetAnchor};
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

struct ActiveVerifier {
    token: VerifierToken,
    watcher: Option<AbortHandle>,
}

/// Owns at most one live bot-check token for a mounted form.
pub struct VerifierSlot {
    bot_check: Arc<dyn BotCheckPort>,
    active: Mutex<Option<ActiveVerifier>>,
}

impl VerifierSlot {
    pub fn new(bot_check: Arc<dyn BotCheckPort>) -> Self {
        Self {
            bot_check,
            active: Mutex::new(None),
        }
    }

    /// Renders a fresh widget, disposing any previous one first.
    pub async fn init(
        &self,
        anchor: &WidgetAnchor,
    ) -> Result<(VerifierToken, ExpiryNotifier), BotCheckError> {
        self.dispose().await;

        let notifier = ExpiryNotifier::new();
        let token = self.bot_check.render(anchor, notifier.clone()).await?;
        debug!(token_id = %token.id(), anchor = %anchor.as_str(), "bot-check widget rendered");

        *self.active.lock().await = Some(ActiveVerifier {
            token: token.clone(),
            watcher: None,
        });
        Ok((token, notifier))
    }

    /// Ties a background task to the current token; it is aborted on dispose.
    pub async fn attach_watcher(&self, handle: AbortHandle) {
        let mut guard = self.active.lock().await;
        match guard.as_mut() {
            Some(active) => active.watcher = Some(handle),
            None => handle.abort(),
        }
    }

    pub async fn current(&self) -> Option<VerifierToken> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|active| active.token.clone())
    }

    /// Idempotent.
    pub async fn dispose(&self) {
        let Some(active) = self.active.lock().await.take() else {
            return;
        };

        active.token.revoke();
        if let Some(watcher) = active.watcher {
            watcher.abort();
        }
        if let Err(err) = self.bot_check.clear(&active.token).await {
            warn!(error = %err, token_id = %active.token.id(), "failed to clear bot-check widget");
        }
        debug!(token_id = %active.token.id(), "bot-check widget disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingBotCheck {
        renders: AtomicUsize,
        clears: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl BotCheckPort for CountingBotCheck {
        async fn render(
            &self,
            _anchor: &WidgetAnchor,
            notifier: ExpiryNotifier,
        ) -> Result<VerifierToken, BotCheckError> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            Ok(VerifierToken::new("token", &notifier))
        }

        async fn clear(&self, _token: &VerifierToken) -> Result<(), BotCheckError> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn init_disposes_previous_token() {
        let port = Arc::new(CountingBotCheck::default());
        let slot = VerifierSlot::new(port.clone());
        let anchor = WidgetAnchor::new("recaptcha-container");

        let (first, _) = slot.init(&anchor).await.unwrap();
        let (second, _) = slot.init(&anchor).await.unwrap();

        assert!(first.is_revoked());
        assert!(!second.is_revoked());
        assert_eq!(port.renders.load(Ordering::SeqCst), 2);
        assert_eq!(port.clears.load(Ordering::SeqCst), 1);
        assert_eq!(slot.current().await.unwrap().id(), second.id());
    }

    #[tokio::test]
    async fn dispose_is_idempotent() {
        let port = Arc::new(CountingBotCheck::default());
        let slot = VerifierSlot::new(port.clone());
        slot.init(&WidgetAnchor::new("a")).await.unwrap();

        slot.dispose().await;
        slot.dispose().await;

        assert_eq!(port.clears.load(Ordering::SeqCst), 1);
        assert!(slot.current().await.is_none());
    }

    #[tokio::test]
    async fn dispose_aborts_watcher() {
        let slot = VerifierSlot::new(Arc::new(CountingBotCheck::default()));
        slot.init(&WidgetAnchor::new("a")).await.unwrap();
        let task = tokio::spawn(std::future::pending::<()>());
        slot.attach_watcher(task.abort_handle()).await;

        slot.dispose().await;

        assert!(task.await.unwrap_err().is_cancelled());
    }
}
