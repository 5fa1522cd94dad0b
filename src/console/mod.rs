//! Terminal adapters for the registration flow.

mod events;
mod navigator;
mod session;

pub use events::TracingEventPort;
pub use navigator::ConsoleNavigator;
pub use session::{ConsoleSession, SessionOutcome};
