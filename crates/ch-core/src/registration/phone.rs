//! Phone number helpers.

/// Number of ASCII digits in `raw`, ignoring spaces, dashes and the like.
pub fn digit_count(raw: &str) -> usize {
    raw.chars().filter(|c| c.is_ascii_digit()).count()
}

/// Keep only the ASCII digits of `raw`.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize a user-entered number into the form sent to the provider.
///
/// Numbers that already carry an international `+` prefix are passed through
/// (trimmed only). Anything else is reduced to its digits and prefixed with
/// `default_prefix`.
pub fn normalize_phone(raw: &str, default_prefix: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('+') {
        return trimmed.to_string();
    }
    format!("{}{}", default_prefix, digits_only(trimmed))
}

/// Mask all but the last four digits, for log output.
pub fn mask_phone(phone: &str) -> String {
    let digits = digits_only(phone);
    let visible = digits.len().min(4);
    let hidden = digits.len() - visible;
    format!("{}{}", "*".repeat(hidden), &digits[hidden..])
}
