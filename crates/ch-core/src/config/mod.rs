//! Configuration domain models.

mod clubhouse_config;

pub use clubhouse_config::{
    BotCheckSettings, ClubhouseConfig, NavigationSettings, ProviderKind, ProviderSettings,
    RegistrationSettings, StoreKind, StoreSettings,
};
