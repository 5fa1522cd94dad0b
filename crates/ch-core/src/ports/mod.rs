//! Port interfaces for the application layer
//!
//! Ports define the contract between the registration use cases and the
//! infrastructure that talks to the identity provider, the bot-check widget,
//! the document store and the hosting UI.

mod bot_check;
mod clock;
mod document_store;
mod navigation;
mod phone_auth;
mod registration_event;

pub use bot_check::{BotCheckError, BotCheckPort, ExpiryNotifier, VerifierToken, WidgetAnchor};
pub use clock::ClockPort;
pub use document_store::{DocumentStoreError, DocumentStorePort, Record};
pub use navigation::NavigationPort;
pub use phone_auth::{AuthenticatedIdentity, PendingConfirmation, PhoneAuthError, PhoneAuthPort};
pub use registration_event::RegistrationEventPort;
