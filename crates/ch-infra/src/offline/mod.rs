//! Local stand-in for the phone identity provider.

mod phone_auth;

pub use phone_auth::OfflinePhoneAuth;
