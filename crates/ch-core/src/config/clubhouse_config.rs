//! Application configuration domain model.
//!
//! Every section is optional in the TOML source; missing keys take the
//! defaults below.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClubhouseConfig {
    pub registration: RegistrationSettings,
    pub bot_check: BotCheckSettings,
    pub provider: ProviderSettings,
    pub store: StoreSettings,
    pub navigation: NavigationSettings,
}

impl ClubhouseConfig {
    /// Map a parsed TOML document onto the configuration model.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let config: Self = toml_value.clone().try_into()?;
        Ok(config)
    }
}

/// Rules the registration workflow applies to every flow variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationSettings {
    /// Prefix prepended to numbers entered without an international prefix.
    pub default_country_prefix: String,
    /// Minimum number of digits a phone field must contain.
    pub min_phone_digits: usize,
    /// Domain of the placeholder email written for flows without an email field.
    pub placeholder_email_domain: String,
    pub users_collection: String,
    pub donors_collection: String,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            default_country_prefix: "+91".to_string(),
            min_phone_digits: 10,
            placeholder_email_domain: "phone.clubhouse.invalid".to_string(),
            users_collection: "users".to_string(),
            donors_collection: "blood_donors".to_string(),
        }
    }
}

/// Invisible bot-check widget settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotCheckSettings {
    pub anchor: String,
    pub site_token: String,
    pub ttl_secs: u64,
}

impl Default for BotCheckSettings {
    fn default() -> Self {
        Self {
            anchor: "recaptcha-container".to_string(),
            site_token: String::new(),
            ttl_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    IdentityToolkit,
    Offline,
}

/// Identity / OTP provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: String,
    pub base_url: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: String::new(),
            base_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Firestore,
    #[default]
    File,
}

/// Document store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub kind: StoreKind,
    pub project_id: String,
    pub base_url: String,
    /// Root directory of the file store. Empty means the platform data dir.
    pub data_dir: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            project_id: String::new(),
            base_url: "https://firestore.googleapis.com/v1".to_string(),
            data_dir: PathBuf::new(),
        }
    }
}

/// Where each flow navigates once the profile is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    pub membership_success_path: String,
    pub donor_success_path: String,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            membership_success_path: "/login".to_string(),
            donor_success_path: "/".to_string(),
        }
    }
}
