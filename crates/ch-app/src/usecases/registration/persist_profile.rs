use std::sync::Arc;

use ch_core::config::RegistrationSettings;
use ch_core::ports::{AuthenticatedIdentity, ClockPort, DocumentStoreError, DocumentStorePort};
use ch_core::registration::{build_profile, PersistedProfile};
use ch_core::{FlowVariant, RegistrationDraft, RegistrationError};
use tracing::{error, info};

/// Use case for writing the profile of a confirmed identity.
pub struct PersistProfile {
    document_store: Arc<dyn DocumentStorePort>,
    clock: Arc<dyn ClockPort>,
    settings: RegistrationSettings,
}

impl PersistProfile {
    pub fn new(
        document_store: Arc<dyn DocumentStorePort>,
        clock: Arc<dyn ClockPort>,
        settings: RegistrationSettings,
    ) -> Self {
        Self {
            document_store,
            clock,
            settings,
        }
    }

    /// Fails with `AlreadyRegistered` if the flow's own record exists for the identity.
    ///
    /// Membership checks the member record. The donor flow checks only the
    /// donor record, so an existing member can still register as a donor.
    pub async fn ensure_unregistered(
        &self,
        variant: FlowVariant,
        identity: &AuthenticatedIdentity,
    ) -> Result<(), RegistrationError> {
        let collection = match variant {
            FlowVariant::Membership => &self.settings.users_collection,
            FlowVariant::BloodDonor => &self.settings.donors_collection,
        };
        let exists = self
            .document_store
            .exists(collection, identity.uid.as_str())
            .await
            .map_err(save_failed)?;
        if exists {
            info!(uid = %identity.uid, %collection, "profile already exists for identity");
            return Err(RegistrationError::AlreadyRegistered);
        }
        Ok(())
    }

    pub async fn execute(
        &self,
        identity: &AuthenticatedIdentity,
        draft: &RegistrationDraft,
    ) -> Result<PersistedProfile, RegistrationError> {
        let profile = build_profile(draft, identity, self.clock.now(), &self.settings);

        for document in &profile.documents {
            self.document_store
                .write(&document.collection, &document.key, &document.record)
                .await
                .map_err(|err| {
                    error!(
                        error = %err,
                        collection = %document.collection,
                        uid = %profile.uid,
                        "failed to write profile document"
                    );
                    save_failed(err)
                })?;
        }

        info!(
            uid = %profile.uid,
            variant = %draft.variant(),
            documents = profile.documents.len(),
            "profile saved"
        );
        Ok(profile)
    }
}

fn save_failed(err: DocumentStoreError) -> RegistrationError {
    RegistrationError::SaveFailed {
        detail: err.to_string(),
    }
}
