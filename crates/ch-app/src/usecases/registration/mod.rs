//! Registration use cases.
//!
//! This module exposes the registration orchestrator and the capability use
//! cases it executes actions with.

mod confirm_code;
mod context;
mod dispatch_challenge;
pub mod orchestrator;
mod persist_profile;
mod verifier_slot;

pub use confirm_code::ConfirmCode;
pub use dispatch_challenge::DispatchChallenge;
pub use orchestrator::{RegistrationDeps, RegistrationOrchestrator, RegistrationOrchestratorError};
pub use persist_profile::PersistProfile;
pub use verifier_slot::VerifierSlot;
