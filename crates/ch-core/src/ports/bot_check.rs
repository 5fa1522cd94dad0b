use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Notify;

use crate::security::SecretString;

/// Identifier of the UI element the bot-check widget attaches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetAnchor(String);

impl WidgetAnchor {
    pub fn new(anchor: impl Into<String>) -> Self {
        Self(anchor.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Signals that the current bot-check token expired.
///
/// Shared between the widget, which calls [`ExpiryNotifier::expire`], and the
/// flow, which waits on [`ExpiryNotifier::expired`].
#[derive(Debug, Clone, Default)]
pub struct ExpiryNotifier {
    expired: Arc<AtomicBool>,
    signal: Arc<Notify>,
}

impl ExpiryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the token expired. Only the first call wakes the waiter.
    pub fn expire(&self) {
        if !self.expired.swap(true, Ordering::SeqCst) {
            self.signal.notify_one();
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    /// Resolves once [`ExpiryNotifier::expire`] was called.
    pub async fn expired(&self) {
        if self.is_expired() {
            return;
        }
        self.signal.notified().await;
    }
}

/// Token produced by a rendered bot-check widget.
///
/// Expired tokens come from the widget timing out, revoked ones from the flow
/// disposing the widget.
#[derive(Clone)]
pub struct VerifierToken {
    id: String,
    value: Arc<SecretString>,
    expired: Arc<AtomicBool>,
    revoked: Arc<AtomicBool>,
}

impl VerifierToken {
    pub fn new(value: impl Into<String>, notifier: &ExpiryNotifier) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            value: Arc::new(SecretString::new(value)),
            expired: notifier.expired.clone(),
            revoked: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn expose(&self) -> &str {
        self.value.expose()
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::SeqCst);
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for VerifierToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierToken")
            .field("id", &self.id)
            .field("expired", &self.is_expired())
            .field("revoked", &self.is_revoked())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BotCheckError {
    #[error("widget anchor not found: {0}")]
    AnchorMissing(String),

    #[error("widget error: {0}")]
    Widget(String),
}

/// Invisible bot-check widget bound to the registration form.
#[async_trait::async_trait]
pub trait BotCheckPort: Send + Sync {
    /// Renders a widget at `anchor`; it calls `notifier.expire()` on timeout.
    async fn render(
        &self,
        anchor: &WidgetAnchor,
        notifier: ExpiryNotifier,
    ) -> Result<VerifierToken, BotCheckError>;

    /// Tears down the widget that produced `token`.
    async fn clear(&self, token: &VerifierToken) -> Result<(), BotCheckError>;
}
