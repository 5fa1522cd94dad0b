pub mod registration;

pub use registration::{
    ConfirmCode, DispatchChallenge, PersistProfile, RegistrationDeps, RegistrationOrchestrator,
    RegistrationOrchestratorError, VerifierSlot,
};
