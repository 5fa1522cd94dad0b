//! Handling of sensitive values (verifier tokens, passcodes).

mod secret;

pub use secret::SecretString;
