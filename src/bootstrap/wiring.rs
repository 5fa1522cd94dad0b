//! Composition root: picks adapters from configuration and groups them into
//! [`RegistrationDeps`].

use std::sync::Arc;

use anyhow::Context;
use ch_app::RegistrationDeps;
use ch_core::config::{ProviderKind, StoreKind};
use ch_core::ports::{DocumentStorePort, NavigationPort, PhoneAuthPort, RegistrationEventPort};
use ch_core::ClubhouseConfig;
use ch_infra::{
    FileDocumentStore, FirestoreDocumentStore, IdentityToolkitPhoneAuth, OfflinePhoneAuth,
    SystemClock, TimedBotCheck,
};
use tracing::info;

pub fn build_phone_auth(config: &ClubhouseConfig) -> anyhow::Result<Arc<dyn PhoneAuthPort>> {
    let provider = &config.provider;
    let phone_auth: Arc<dyn PhoneAuthPort> = match provider.kind {
        ProviderKind::IdentityToolkit => {
            anyhow::ensure!(
                !provider.api_key.trim().is_empty(),
                "provider.api_key is required for the identity_toolkit provider"
            );
            Arc::new(
                IdentityToolkitPhoneAuth::new(&provider.base_url, &provider.api_key)
                    .context("Failed to build identity toolkit client")?,
            )
        }
        ProviderKind::Offline => Arc::new(OfflinePhoneAuth::new()),
    };
    info!(provider = ?provider.kind, "phone auth provider selected");
    Ok(phone_auth)
}

pub fn build_document_store(
    config: &ClubhouseConfig,
) -> anyhow::Result<Arc<dyn DocumentStorePort>> {
    let store = &config.store;
    let document_store: Arc<dyn DocumentStorePort> = match store.kind {
        StoreKind::Firestore => Arc::new(
            FirestoreDocumentStore::new(&store.base_url, &store.project_id, &config.provider.api_key)
                .context("Failed to build firestore client")?,
        ),
        StoreKind::File => {
            let file_store = FileDocumentStore::with_defaults(&store.data_dir);
            info!(root = %file_store.root().display(), "file document store selected");
            Arc::new(file_store)
        }
    };
    Ok(document_store)
}

/// Wires all registration ports. The hosting UI supplies navigation and state events.
pub fn wire_registration(
    config: &ClubhouseConfig,
    navigation: Arc<dyn NavigationPort>,
    events: Arc<dyn RegistrationEventPort>,
) -> anyhow::Result<RegistrationDeps> {
    Ok(RegistrationDeps {
        phone_auth: build_phone_auth(config)?,
        bot_check: Arc::new(TimedBotCheck::new(
            config.bot_check.site_token.clone(),
            config.bot_check.ttl_secs,
        )),
        document_store: build_document_store(config)?,
        clock: Arc::new(SystemClock),
        navigation,
        events,
    })
}
