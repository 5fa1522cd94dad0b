//! # ch-core
//!
//! Core domain models and business logic for the Clubhouse registration
//! workflow.
//!
//! This crate contains pure business logic without any infrastructure
//! dependencies: the registration draft and its validator, the one-time
//! passcode buffer, the registration state machine and the port traits the
//! application layer drives.

pub mod config;
pub mod ids;
pub mod ports;
pub mod registration;
pub mod security;

// Re-export commonly used types at the crate root
pub use config::ClubhouseConfig;
pub use ids::{FlowId, Uid};
pub use registration::{
    FlowVariant, OtpBuffer, RegistrationAction, RegistrationDraft, RegistrationError,
    RegistrationEvent, RegistrationState, RegistrationStateMachine, Validator,
};
pub use security::SecretString;
