//! Registration domain module.
//!
//! Shared by the membership application and the blood-donor registration:
//! both collect a draft, prove control of a phone number through a one-time
//! passcode and then write a profile keyed by the authenticated identity.

pub mod draft;
pub mod error;
pub mod flow;
pub mod otp;
pub mod phone;
pub mod profile;
pub mod state_machine;
pub mod validator;

pub use draft::RegistrationDraft;
pub use error::RegistrationError;
pub use flow::{FieldRule, FieldSpec, FlowVariant};
pub use otp::{OtpBuffer, OTP_LENGTH};
pub use profile::{build_profile, PersistedDocument, PersistedProfile};
pub use state_machine::{
    RegistrationAction, RegistrationEvent, RegistrationState, RegistrationStateMachine,
};
pub use validator::{FieldErrors, Validator};
