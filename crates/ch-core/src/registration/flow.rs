//! Flow variants and their field schemas.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::NavigationSettings;

pub const BLOOD_GROUPS: &[&str] = &["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];
pub const STATUSES: &[&str] = &["Studying", "Working"];
pub const AVAILABILITIES: &[&str] = &["Native", "Abroad"];

/// Status value that makes `profession` mandatory.
pub const WORKING_STATUS: &str = "Working";

/// Validation rule attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Must be non-empty after trimming.
    Required,
    /// May be left empty.
    Optional,
    /// Required, and must look like an email address.
    Email,
    /// Required, and must contain at least the configured number of digits.
    Phone,
    /// Required, and must be one of the listed values.
    OneOf(&'static [&'static str]),
    /// Required only while `field` holds `equals`.
    RequiredWhen {
        field: &'static str,
        equals: &'static str,
    },
}

/// One entry of a flow's form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub rule: FieldRule,
}

const fn field(name: &'static str, label: &'static str, rule: FieldRule) -> FieldSpec {
    FieldSpec { name, label, rule }
}

const MEMBERSHIP_FIELDS: &[FieldSpec] = &[
    field("name", "First name", FieldRule::Required),
    field("lastName", "Last name", FieldRule::Required),
    field("email", "Email", FieldRule::Email),
    field("mobile", "Mobile number", FieldRule::Phone),
    field("address", "Address", FieldRule::Required),
    field("bloodGroup", "Blood group", FieldRule::OneOf(BLOOD_GROUPS)),
    field("gender", "Gender", FieldRule::Required),
    field("dob", "Date of birth", FieldRule::Required),
    field("fatherName", "Father's name", FieldRule::Required),
    field("qualification", "Qualification", FieldRule::Required),
    field("status", "Status", FieldRule::OneOf(STATUSES)),
    field(
        "profession",
        "Profession",
        FieldRule::RequiredWhen {
            field: "status",
            equals: WORKING_STATUS,
        },
    ),
    field("workplace", "Workplace", FieldRule::Optional),
    field("availability", "Availability", FieldRule::OneOf(AVAILABILITIES)),
];

const DONOR_FIELDS: &[FieldSpec] = &[
    field("name", "Name", FieldRule::Required),
    field("email", "Email", FieldRule::Email),
    field("phone", "Phone number", FieldRule::Phone),
    field("place", "Place", FieldRule::Required),
    field("bloodGroup", "Blood group", FieldRule::OneOf(BLOOD_GROUPS)),
];

/// The two registration flows bound to the shared workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowVariant {
    Membership,
    BloodDonor,
}

impl FlowVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowVariant::Membership => "membership",
            FlowVariant::BloodDonor => "blood_donor",
        }
    }

    /// Ordered field schema. Keys of a draft are exactly these names.
    pub fn schema(self) -> &'static [FieldSpec] {
        match self {
            FlowVariant::Membership => MEMBERSHIP_FIELDS,
            FlowVariant::BloodDonor => DONOR_FIELDS,
        }
    }

    /// Field holding the number the passcode is sent to.
    pub fn phone_field(self) -> &'static str {
        match self {
            FlowVariant::Membership => "mobile",
            FlowVariant::BloodDonor => "phone",
        }
    }

    pub fn has_field(self, name: &str) -> bool {
        self.schema().iter().any(|spec| spec.name == name)
    }

    pub fn is_donor(self) -> bool {
        matches!(self, FlowVariant::BloodDonor)
    }

    pub fn success_path(self, navigation: &NavigationSettings) -> &str {
        match self {
            FlowVariant::Membership => &navigation.membership_success_path,
            FlowVariant::BloodDonor => &navigation.donor_success_path,
        }
    }
}

impl fmt::Display for FlowVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
