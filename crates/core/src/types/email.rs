//! Email address type.
//!
//! Login, registration, password recovery and the user forms all accept an
//! email. The clinic API performs the authoritative check; this type only
//! rejects input that could never be an address so the user gets feedback
//! before a round trip.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input is empty after trimming.
    #[error("email is required")]
    Empty,
    /// The input is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace inside the address.
    #[error("email cannot contain spaces")]
    ContainsWhitespace,
    /// The input does not contain exactly one @ symbol.
    #[error("email must contain a single @ symbol")]
    InvalidAtSymbol,
    /// The mailbox (before @) is empty.
    #[error("email is missing the part before @")]
    EmptyLocalPart,
    /// The domain (after @) is empty or has no dot-separated label.
    #[error("email domain is not valid")]
    InvalidDomain,
}

/// A normalised email address.
///
/// Surrounding whitespace is trimmed and the domain is lowercased, so
/// `Vet@Clinic.COM ` and `Vet@clinic.com` produce equal values. The mailbox
/// keeps its case; only the receiving server may decide it is insensitive.
///
/// ## Constraints
///
/// - Length: 1-254 characters (RFC 5321 limit)
/// - No interior whitespace
/// - Exactly one @ symbol with a non-empty mailbox
/// - Domain contains a dot with non-empty labels on both sides
///
/// ## Examples
///
/// ```
/// use vetdesk_core::Email;
///
/// assert_eq!(Email::parse(" Dr.Ana@Clinic.VET ").unwrap().as_str(), "Dr.Ana@clinic.vet");
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("ana@clinic").is_err());
/// assert!(Email::parse("ana@@clinic.vet").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalise an `Email`.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first constraint the input
    /// violates.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }

        if trimmed.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(EmailError::ContainsWhitespace);
        }

        let (local, domain) = match trimmed.split_once('@') {
            Some((local, domain)) if !domain.contains('@') => (local, domain),
            _ => return Err(EmailError::InvalidAtSymbol),
        };

        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }

        let valid_domain = domain
            .rsplit_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
            && !domain.starts_with('.');
        if !valid_domain {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(format!("{local}@{}", domain.to_lowercase())))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the domain part of the email (after the @).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_common_addresses() {
        assert!(Email::parse("reception@happypaws.vet").is_ok());
        assert!(Email::parse("dr.lopez+oncall@clinic.co.uk").is_ok());
        assert!(Email::parse("a@b.c").is_ok());
    }

    #[test]
    fn test_parse_normalises_domain_case_and_whitespace() {
        let email = Email::parse("  Owner@Example.COM\n").unwrap();
        assert_eq!(email.as_str(), "Owner@example.com");
        assert_eq!(email.domain(), "example.com");
    }

    #[test]
    fn test_parse_keeps_mailbox_case() {
        assert_ne!(
            Email::parse("Ana.Lopez@clinic.vet").unwrap(),
            Email::parse("ana.lopez@clinic.vet").unwrap()
        );
        assert_eq!(
            Email::parse("ana@CLINIC.vet").unwrap(),
            Email::parse("ana@clinic.VET").unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
    }

    #[test]
    fn test_parse_rejects_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_interior_space() {
        assert_eq!(
            Email::parse("ana lopez@clinic.vet"),
            Err(EmailError::ContainsWhitespace)
        );
    }

    #[test]
    fn test_parse_rejects_bad_at_usage() {
        assert_eq!(
            Email::parse("no-at-symbol"),
            Err(EmailError::InvalidAtSymbol)
        );
        assert_eq!(
            Email::parse("a@b@clinic.vet"),
            Err(EmailError::InvalidAtSymbol)
        );
        assert_eq!(
            Email::parse("@clinic.vet"),
            Err(EmailError::EmptyLocalPart)
        );
    }

    #[test]
    fn test_parse_rejects_domain_without_dot() {
        assert_eq!(Email::parse("ana@clinic"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("ana@clinic."), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("ana@.vet"), Err(EmailError::InvalidDomain));
    }

    #[test]
    fn test_deserialize_is_transparent() {
        let parsed: Email = serde_json::from_str("\"vet@clinic.vet\"").unwrap();
        assert_eq!(parsed.to_string(), "vet@clinic.vet");
    }
}
