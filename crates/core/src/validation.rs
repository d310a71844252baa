//! Presentation-level form validation.
//!
//! These checks give the user immediate feedback before a form is sent to
//! the clinic API: required fields, length bounds, and simple patterns. They
//! never look across fields beyond "confirmation matches" and never look
//! across records; the API stays the authority on business rules.
//!
//! Individual rules are plain functions returning [`ValidationError`].
//! [`FormErrors`] collects them per field for rendering next to inputs.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::types::{Email, Price};

/// Minimum password length accepted by the forms.
pub const PASSWORD_MIN_LENGTH: usize = 8;
/// Maximum password length accepted by the forms.
pub const PASSWORD_MAX_LENGTH: usize = 128;
/// Format of `<input type="datetime-local">` values.
pub const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// 7 to 20 characters in total, a leading `+` included.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+[0-9 ()\-]{6,19}|[0-9 ()\-]{7,20})$").expect("Invalid regex")
});

static MICROCHIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{9,15}$").expect("Invalid regex"));

/// A single rule violation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{label} must be at least {min} characters")]
    TooShort { label: &'static str, min: usize },
    #[error("{label} must be at most {max} characters")]
    TooLong { label: &'static str, max: usize },
    #[error("{0}")]
    InvalidEmail(#[from] crate::types::EmailError),
    #[error("Password must contain at least one letter and one number")]
    WeakPassword,
    #[error("{0}")]
    Mismatch(&'static str),
    #[error("Phone number may only contain digits, spaces, +, - and parentheses (7-20 characters)")]
    InvalidPhone,
    #[error("Microchip must be 9 to 15 letters or digits")]
    InvalidMicrochip,
    #[error("{label} must be a number")]
    NotANumber { label: &'static str },
    #[error("{label} must be between {min} and {max}")]
    OutOfRange {
        label: &'static str,
        min: String,
        max: String,
    },
    #[error("{label} must be a valid date and time")]
    InvalidDateTime { label: &'static str },
    #[error("{label} has an unsupported value")]
    InvalidChoice { label: &'static str },
}

/// Check that a value is present after trimming.
///
/// # Errors
///
/// Returns [`ValidationError::Required`] for blank input.
pub fn validate_required(label: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(label));
    }
    Ok(())
}

/// Check that a trimmed value has between `min` and `max` characters.
///
/// # Errors
///
/// Returns `Required` when blank and `min > 0`, otherwise `TooShort`/`TooLong`.
pub fn validate_length(
    label: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 && min > 0 {
        return Err(ValidationError::Required(label));
    }
    if len < min {
        return Err(ValidationError::TooShort { label, min });
    }
    if len > max {
        return Err(ValidationError::TooLong { label, max });
    }
    Ok(())
}

/// Check password strength: 8-128 characters with a letter and a digit.
///
/// # Errors
///
/// Returns `Required`, `TooShort`, `TooLong`, or `WeakPassword`.
pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Required("Password"));
    }
    let len = value.chars().count();
    if len < PASSWORD_MIN_LENGTH {
        return Err(ValidationError::TooShort {
            label: "Password",
            min: PASSWORD_MIN_LENGTH,
        });
    }
    if len > PASSWORD_MAX_LENGTH {
        return Err(ValidationError::TooLong {
            label: "Password",
            max: PASSWORD_MAX_LENGTH,
        });
    }
    let has_letter = value.chars().any(char::is_alphabetic);
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        return Err(ValidationError::WeakPassword);
    }
    Ok(())
}

/// Check an optional phone number. Blank input is accepted.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPhone`] when the pattern does not match.
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || PHONE_RE.is_match(trimmed) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone)
    }
}

/// Check an optional microchip number. Blank input is accepted.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidMicrochip`] when the pattern does not match.
pub fn validate_microchip(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || MICROCHIP_RE.is_match(trimmed) {
        Ok(())
    } else {
        Err(ValidationError::InvalidMicrochip)
    }
}

/// Parse an optional decimal within an inclusive range. Blank gives `None`.
///
/// # Errors
///
/// Returns `NotANumber` or `OutOfRange`.
pub fn parse_optional_f64(
    label: &'static str,
    value: &str,
    min: f64,
    max: f64,
) -> Result<Option<f64>, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let parsed: f64 = trimmed
        .parse()
        .map_err(|_| ValidationError::NotANumber { label })?;
    if !parsed.is_finite() || parsed < min || parsed > max {
        return Err(ValidationError::OutOfRange {
            label,
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(Some(parsed))
}

/// Parse a whole number within an inclusive range.
///
/// # Errors
///
/// Returns `Required`, `NotANumber`, or `OutOfRange`.
pub fn parse_bounded_u32(
    label: &'static str,
    value: &str,
    min: u32,
    max: u32,
) -> Result<u32, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(label));
    }
    let parsed: u32 = trimmed
        .parse()
        .map_err(|_| ValidationError::NotANumber { label })?;
    if parsed < min || parsed > max {
        return Err(ValidationError::OutOfRange {
            label,
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(parsed)
}

/// Parse a `datetime-local` input value (`2024-05-01T09:30`).
///
/// Seconds are accepted too, since some browsers send them.
///
/// # Errors
///
/// Returns `Required` or `InvalidDateTime`.
pub fn parse_datetime_local(
    label: &'static str,
    value: &str,
) -> Result<NaiveDateTime, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(label));
    }
    NaiveDateTime::parse_from_str(trimmed, DATETIME_LOCAL_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidDateTime { label })
}

/// Field-keyed validation errors for one form submission.
///
/// Only the first error per field is kept, so rules can be chained from the
/// most basic (required) to the most specific (pattern).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, String>,
}

impl FormErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no rule failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields with an error.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Message for a field, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&String> {
        self.fields.get(field)
    }

    /// Whether a field has an error.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterate over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Record a message for a field unless it already has one.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    /// Record the outcome of a rule; returns the `Ok` value, if any.
    pub fn check<T>(&mut self, field: &str, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.add(field, e.to_string());
                None
            }
        }
    }

    /// Field must not be blank.
    pub fn required(&mut self, field: &str, label: &'static str, value: &str) -> &mut Self {
        self.check(field, validate_required(label, value));
        self
    }

    /// Field length must be within bounds.
    pub fn length(
        &mut self,
        field: &str,
        label: &'static str,
        value: &str,
        min: usize,
        max: usize,
    ) -> &mut Self {
        self.check(field, validate_length(label, value, min, max));
        self
    }

    /// Field must parse as an [`Email`]; returns it when valid.
    pub fn email(&mut self, field: &str, value: &str) -> Option<Email> {
        self.check(field, Email::parse(value).map_err(ValidationError::from))
    }

    /// Field must be a strong enough password.
    pub fn password(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(field, validate_password(value));
        self
    }

    /// Confirmation field must equal the original.
    pub fn matches(
        &mut self,
        field: &str,
        original: &str,
        confirmation: &str,
        message: &'static str,
    ) -> &mut Self {
        if original != confirmation {
            self.add(field, ValidationError::Mismatch(message).to_string());
        }
        self
    }

    /// Optional phone number pattern.
    pub fn phone(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(field, validate_phone(value));
        self
    }

    /// Optional microchip pattern.
    pub fn microchip(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(field, validate_microchip(value));
        self
    }

    /// Field must be a non-negative price.
    pub fn price(&mut self, field: &str, value: &str) -> Option<Price> {
        if value.trim().is_empty() {
            self.add(field, ValidationError::Required("Price").to_string());
            return None;
        }
        match Price::parse(value) {
            Ok(price) => Some(price),
            Err(e) => {
                self.add(field, e.to_string());
                None
            }
        }
    }

    /// Field must name a variant of `T` (a status or role select).
    pub fn choice<T: core::str::FromStr>(
        &mut self,
        field: &str,
        label: &'static str,
        value: &str,
    ) -> Option<T> {
        if value.trim().is_empty() {
            self.add(field, ValidationError::Required(label).to_string());
            return None;
        }
        self.check(
            field,
            value
                .parse::<T>()
                .map_err(|_| ValidationError::InvalidChoice { label }),
        )
    }

    /// Convert into a `Result`, keeping the errors when any rule failed.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::TriageSeverity;

    #[test]
    fn test_password_rules() {
        assert_eq!(
            validate_password("short1"),
            Err(ValidationError::TooShort {
                label: "Password",
                min: 8
            })
        );
        assert_eq!(
            validate_password("onlyletters"),
            Err(ValidationError::WeakPassword)
        );
        assert_eq!(
            validate_password("12345678"),
            Err(ValidationError::WeakPassword)
        );
        assert_eq!(
            validate_password(""),
            Err(ValidationError::Required("Password"))
        );
        assert!(validate_password("whiskers2024").is_ok());
    }

    #[test]
    fn test_password_message_mentions_minimum() {
        let msg = validate_password("abc1").unwrap_err().to_string();
        assert_eq!(msg, "Password must be at least 8 characters");
    }

    #[test]
    fn test_mismatched_confirmation_is_rejected() {
        let mut errors = FormErrors::new();
        errors.matches(
            "password_confirm",
            "whiskers2024",
            "whiskers2025",
            "Passwords do not match",
        );
        assert_eq!(
            errors.get("password_confirm").map(String::as_str),
            Some("Passwords do not match")
        );

        let mut ok = FormErrors::new();
        ok.matches("password_confirm", "same1234", "same1234", "Passwords do not match");
        assert!(ok.is_empty());
    }

    #[test]
    fn test_required_rejects_whitespace() {
        let mut errors = FormErrors::new();
        errors.required("name", "Name", "   ");
        assert_eq!(
            errors.get("name").map(String::as_str),
            Some("Name is required")
        );
    }

    #[test]
    fn test_first_error_per_field_wins() {
        let mut errors = FormErrors::new();
        errors
            .required("name", "Name", "")
            .length("name", "Name", "", 2, 50);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("name").map(String::as_str),
            Some("Name is required")
        );
    }

    #[test]
    fn test_length_bounds() {
        assert!(validate_length("Name", "Bo", 2, 50).is_ok());
        assert_eq!(
            validate_length("Name", "B", 2, 50),
            Err(ValidationError::TooShort {
                label: "Name",
                min: 2
            })
        );
        assert!(validate_length("Name", &"x".repeat(51), 2, 50).is_err());
        // Counts characters, not bytes
        assert!(validate_length("Name", "Ñandú", 2, 5).is_ok());
    }

    #[test]
    fn test_phone_pattern() {
        assert!(validate_phone("").is_ok());
        assert!(validate_phone("+1 (555) 123-4567").is_ok());
        assert_eq!(validate_phone("call me"), Err(ValidationError::InvalidPhone));
        assert_eq!(validate_phone("12345"), Err(ValidationError::InvalidPhone));
    }

    #[test]
    fn test_phone_length_counts_the_plus() {
        let digits = |n: usize| "1".repeat(n);

        assert!(validate_phone(&digits(20)).is_ok());
        assert!(validate_phone(&format!("+{}", digits(19))).is_ok());
        assert!(validate_phone(&format!("+{}", digits(6))).is_ok());
        assert_eq!(validate_phone(&digits(21)), Err(ValidationError::InvalidPhone));
        assert_eq!(
            validate_phone(&format!("+{}", digits(20))),
            Err(ValidationError::InvalidPhone)
        );
        assert_eq!(
            validate_phone(&format!("+{}", digits(5))),
            Err(ValidationError::InvalidPhone)
        );
        assert_eq!(validate_phone("1+234567"), Err(ValidationError::InvalidPhone));
    }

    #[test]
    fn test_microchip_pattern() {
        assert!(validate_microchip("985112345678901").is_ok());
        assert!(validate_microchip("").is_ok());
        assert!(validate_microchip("12-34").is_err());
    }

    #[test]
    fn test_numeric_parsers() {
        assert_eq!(
            parse_optional_f64("Weight", "12.5", 0.01, 1000.0).unwrap(),
            Some(12.5)
        );
        assert_eq!(parse_optional_f64("Weight", " ", 0.01, 1000.0).unwrap(), None);
        assert!(parse_optional_f64("Weight", "-1", 0.01, 1000.0).is_err());
        assert!(parse_optional_f64("Weight", "heavy", 0.01, 1000.0).is_err());

        assert_eq!(parse_bounded_u32("Duration", "30", 5, 480).unwrap(), 30);
        assert!(parse_bounded_u32("Duration", "2", 5, 480).is_err());
    }

    #[test]
    fn test_datetime_local() {
        let parsed = parse_datetime_local("Date", "2024-05-01T09:30").unwrap();
        assert_eq!(parsed.to_string(), "2024-05-01 09:30:00");
        assert!(parse_datetime_local("Date", "2024-05-01T09:30:15").is_ok());
        assert!(parse_datetime_local("Date", "tomorrow").is_err());
        assert_eq!(
            parse_datetime_local("Date", ""),
            Err(ValidationError::Required("Date"))
        );
    }

    #[test]
    fn test_email_and_choice_helpers() {
        let mut errors = FormErrors::new();
        assert!(errors.email("email", "vet@clinic.vet").is_some());
        assert!(errors.email("other", "nope").is_none());
        assert_eq!(
            errors.choice::<TriageSeverity>("severity", "Severity", "high"),
            Some(TriageSeverity::High)
        );
        assert!(errors.choice::<TriageSeverity>("sev2", "Severity", "meh").is_none());
        assert_eq!(errors.len(), 2);
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_price_helper() {
        let mut errors = FormErrors::new();
        assert!(errors.price("price", "45.50").is_some());
        assert!(errors.price("missing", "").is_none());
        assert!(errors.price("negative", "-5").is_none());
        assert_eq!(
            errors.get("negative").map(String::as_str),
            Some("price cannot be negative")
        );
    }
}
