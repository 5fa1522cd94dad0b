//! Assembly of the records written once a registration is confirmed.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use super::draft::RegistrationDraft;
use super::flow::{FlowVariant, WORKING_STATUS};
use super::phone::digits_only;
use crate::config::RegistrationSettings;
use crate::ids::Uid;
use crate::ports::{AuthenticatedIdentity, Record};

/// One document to be written to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedDocument {
    pub collection: String,
    pub key: String,
    pub record: Record,
}

/// Everything one successful registration writes, keyed by the identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedProfile {
    pub uid: Uid,
    pub documents: Vec<PersistedDocument>,
}

impl PersistedProfile {
    pub fn document(&self, collection: &str) -> Option<&PersistedDocument> {
        self.documents.iter().find(|doc| doc.collection == collection)
    }
}

/// Merge the draft with identity-derived fields for the draft's flow.
///
/// The member record under `users/{uid}` always comes first. The donor flow
/// adds a second record under the donors collection, keyed by the same uid.
pub fn build_profile(
    draft: &RegistrationDraft,
    identity: &AuthenticatedIdentity,
    created_at: DateTime<Utc>,
    settings: &RegistrationSettings,
) -> PersistedProfile {
    let created_at = created_at.to_rfc3339_opts(SecondsFormat::Millis, true);
    let variant = draft.variant();
    let uid = identity.uid.clone();

    let mut documents = Vec::with_capacity(2);
    let member = match variant {
        FlowVariant::Membership => membership_fields(draft.fields()),
        FlowVariant::BloodDonor => donor_member_fields(draft.fields()),
    };
    documents.push(PersistedDocument {
        collection: settings.users_collection.clone(),
        key: uid.to_string(),
        record: with_identity(
            member,
            variant.has_field("email"),
            identity,
            &created_at,
            variant.is_donor(),
            settings,
        ),
    });

    if variant.is_donor() {
        documents.push(PersistedDocument {
            collection: settings.donors_collection.clone(),
            key: uid.to_string(),
            record: with_identity(
                strings(draft.fields()),
                true,
                identity,
                &created_at,
                true,
                settings,
            ),
        });
    }

    PersistedProfile { uid, documents }
}

fn strings(fields: &BTreeMap<String, String>) -> Record {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.trim().to_string())))
        .collect()
}

fn membership_fields(fields: &BTreeMap<String, String>) -> Record {
    let mut record = strings(fields);
    let working = fields.get("status").map(String::as_str) == Some(WORKING_STATUS);
    if !working {
        record.insert("profession".into(), Value::String(String::new()));
        record.insert("workplace".into(), Value::String(String::new()));
    }
    record
}

/// Member-shaped record for someone who registered through the donor form.
fn donor_member_fields(fields: &BTreeMap<String, String>) -> Record {
    let get = |name: &str| fields.get(name).map(|v| v.trim()).unwrap_or("");
    let mut parts = get("name").split_whitespace();
    let first_name = parts.next().unwrap_or("").to_string();
    let last_name = parts.collect::<Vec<_>>().join(" ");

    let mut record = Record::new();
    let mut put = |key: &str, value: &str| {
        record.insert(key.to_string(), Value::String(value.to_string()));
    };
    put("name", &first_name);
    put("lastName", &last_name);
    put("email", get("email"));
    put("mobile", get("phone"));
    put("address", get("place"));
    put("bloodGroup", get("bloodGroup"));
    for blank in [
        "gender",
        "dob",
        "fatherName",
        "qualification",
        "profession",
        "workplace",
    ] {
        put(blank, "");
    }
    put("status", "Donor");
    put("availability", "Native");
    record
}

fn with_identity(
    mut record: Record,
    has_email: bool,
    identity: &AuthenticatedIdentity,
    created_at: &str,
    blood_donor: bool,
    settings: &RegistrationSettings,
) -> Record {
    if !has_email {
        let placeholder = format!(
            "{}@{}",
            digits_only(&identity.phone_number),
            settings.placeholder_email_domain
        );
        record.insert("email".into(), Value::String(placeholder));
    }
    record.insert("uid".into(), Value::String(identity.uid.to_string()));
    record.insert(
        "phoneNumber".into(),
        Value::String(identity.phone_number.clone()),
    );
    record.insert("createdAt".into(), Value::String(created_at.to_string()));
    record.insert("verified".into(), Value::Bool(true));
    record.insert("isAdmin".into(), Value::Bool(false));
    record.insert("isBloodDonor".into(), Value::Bool(blood_donor));
    record
}
