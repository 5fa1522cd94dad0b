//! Clubhouse
//!
//! Terminal host for the phone-verified registration flows: wires the
//! configured adapters into a registration orchestrator and drives it from
//! standard input.

pub mod bootstrap;
pub mod cli;
pub mod console;
