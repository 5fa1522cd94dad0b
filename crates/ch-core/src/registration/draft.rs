//! In-progress form data for one registration attempt.

use std::collections::BTreeMap;

use serde::Serialize;

use super::flow::FlowVariant;
use super::validator::{FieldErrors, Validator};

/// Field values and per-field validation messages of the data-entry phase.
///
/// The key set is fixed by the flow variant when the draft is created. Errors
/// are only ever replaced wholesale by [`RegistrationDraft::revalidate`], or
/// cleared one field at a time when that field is edited, so their keys are
/// always a subset of the field keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationDraft {
    variant: FlowVariant,
    fields: BTreeMap<String, String>,
    errors: FieldErrors,
}

impl RegistrationDraft {
    pub fn new(variant: FlowVariant) -> Self {
        let fields = variant
            .schema()
            .iter()
            .map(|spec| (spec.name.to_string(), String::new()))
            .collect();
        Self {
            variant,
            fields,
            errors: FieldErrors::new(),
        }
    }

    pub fn variant(&self) -> FlowVariant {
        self.variant
    }

    /// Update one field and drop its displayed error.
    ///
    /// Returns `false` (and changes nothing) for names outside the schema.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.fields.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                self.errors.remove(name);
                true
            }
            None => false,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors
            .get(name)
            .map(String::as_str)
            .filter(|message| !message.is_empty())
    }

    /// Run the validator and replace the stored errors with its result.
    pub fn revalidate(&mut self, validator: &Validator) -> &FieldErrors {
        self.errors = validator.validate(&self.fields);
        &self.errors
    }

    /// Raw value of the flow's phone field.
    pub fn phone(&self) -> &str {
        self.field(self.variant.phone_field()).unwrap_or("")
    }
}
