//! Phone authentication against the Identity Toolkit REST API.

mod phone_auth;

pub use phone_auth::IdentityToolkitPhoneAuth;
