use std::sync::Mutex;

use ch_core::ports::NavigationPort;
use tracing::info;

/// Records the path the flow asked to navigate to.
#[derive(Default)]
pub struct ConsoleNavigator {
    destination: Mutex<Option<String>>,
}

impl ConsoleNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destination(&self) -> Option<String> {
        self.destination
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl NavigationPort for ConsoleNavigator {
    fn navigate(&self, path: &str) {
        info!(path, "navigate");
        if let Ok(mut guard) = self.destination.lock() {
            *guard = Some(path.to_string());
        }
    }
}
