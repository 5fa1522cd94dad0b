//! Clubhouse Application Orchestration Layer
//!
//! This crate contains the registration use cases and the orchestrator that
//! drives the registration state machine against the ports.

pub mod usecases;

pub use usecases::registration::{
    RegistrationDeps, RegistrationOrchestrator, RegistrationOrchestratorError,
};
