//! Infrastructure adapters for the Clubhouse registration ports.

pub mod bot_check;
pub mod firestore;
pub mod fs;
pub mod identity_toolkit;
pub mod offline;
pub mod time;

pub use bot_check::TimedBotCheck;
pub use firestore::FirestoreDocumentStore;
pub use fs::FileDocumentStore;
pub use identity_toolkit::IdentityToolkitPhoneAuth;
pub use offline::OfflinePhoneAuth;
pub use time::SystemClock;
