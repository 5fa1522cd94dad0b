//! Pure field validation.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::flow::{FieldRule, FieldSpec, FlowVariant};
use super::phone::digit_count;

/// Field name to human-readable message. Empty means the draft is submittable.
pub type FieldErrors = BTreeMap<String, String>;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"));

/// Maps a field-value record to per-field error messages.
///
/// Deterministic and side-effect free. Missing keys are treated as empty
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validator {
    schema: &'static [FieldSpec],
    min_phone_digits: usize,
}

impl Validator {
    pub fn new(schema: &'static [FieldSpec], min_phone_digits: usize) -> Self {
        Self {
            schema,
            min_phone_digits,
        }
    }

    pub fn for_flow(variant: FlowVariant, min_phone_digits: usize) -> Self {
        Self::new(variant.schema(), min_phone_digits)
    }

    pub fn validate(&self, fields: &BTreeMap<String, String>) -> FieldErrors {
        let value_of = |name: &str| fields.get(name).map(String::as_str).unwrap_or("");

        self.schema
            .iter()
            .filter_map(|spec| {
                self.check(spec, value_of(spec.name), &value_of)
                    .map(|message| (spec.name.to_string(), message))
            })
            .collect()
    }

    fn check<'a>(
        &self,
        spec: &FieldSpec,
        value: &str,
        value_of: &impl Fn(&str) -> &'a str,
    ) -> Option<String> {
        let trimmed = value.trim();
        let required = || format!("{} is required", spec.label);

        match spec.rule {
            FieldRule::Optional => None,
            FieldRule::Required if trimmed.is_empty() => Some(required()),
            FieldRule::Required => None,
            FieldRule::Email if trimmed.is_empty() => Some(required()),
            FieldRule::Email if !EMAIL_PATTERN.is_match(trimmed) => {
                Some(format!("{} is invalid", spec.label))
            }
            FieldRule::Email => None,
            FieldRule::Phone if trimmed.is_empty() => Some(required()),
            FieldRule::Phone if digit_count(trimmed) < self.min_phone_digits => {
                Some("Enter a valid phone number".to_string())
            }
            FieldRule::Phone => None,
            FieldRule::OneOf(_) if trimmed.is_empty() => Some(required()),
            FieldRule::OneOf(allowed) if !allowed.contains(&trimmed) => {
                Some(format!("{} is invalid", spec.label))
            }
            FieldRule::OneOf(_) => None,
            FieldRule::RequiredWhen { field, equals }
                if value_of(field) == equals && trimmed.is_empty() =>
            {
                Some(required())
            }
            FieldRule::RequiredWhen { .. } => None,
        }
    }
}
