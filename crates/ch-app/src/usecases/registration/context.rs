use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ch_core::RegistrationState;
use tokio::sync::Mutex;

/// Shared registration context containing state, dispatch lock and busy flag.
///
/// Shared between `RegistrationOrchestrator` and its expiry listener task.
///
/// ## Lock Ordering
/// When acquiring both locks, acquire `dispatch_lock` first, then `state`.
pub struct RegistrationContext {
    state: Mutex<RegistrationState>,
    /// Serializes transitions between user dispatches and the expiry listener.
    dispatch_lock: Mutex<()>,
    /// Set while a user-triggered dispatch (and its network step) runs.
    busy: AtomicBool,
}

impl RegistrationContext {
    pub fn new(initial_state: RegistrationState) -> Self {
        Self {
            state: Mutex::new(initial_state),
            dispatch_lock: Mutex::new(()),
            busy: AtomicBool::new(false),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Does NOT acquire `dispatch_lock`.
    pub async fn get_state(&self) -> RegistrationState {
        self.state.lock().await.clone()
    }

    pub async fn acquire_dispatch_lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.dispatch_lock.lock().await
    }

    /// Should only be called while holding `dispatch_lock`.
    pub async fn set_state(&self, state: RegistrationState) {
        let mut guard = self.state.lock().await;
        *guard = state;
    }

    /// Marks the context busy. Returns `None` if it already was.
    pub fn try_begin(&self) -> Option<BusyGuard<'_>> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(BusyGuard { busy: &self.busy })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

impl Default for RegistrationContext {
    fn default() -> Self {
        Self::new(RegistrationState::initial())
    }
}

/// Clears the busy flag on drop.
pub struct BusyGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}
