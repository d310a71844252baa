//! Clinic user roles.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role of an authenticated user, as assigned by the clinic API.
///
/// The front end uses it to pick a dashboard and to hide actions the API
/// would refuse anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Clinic administrator: users, services, everything else.
    Admin,
    /// Veterinarian: consultations, triage, appointments.
    Veterinarian,
    /// Front desk: appointments, triage intake, pets.
    Receptionist,
    /// Pet owner (client): own pets and appointments only.
    #[default]
    Owner,
}

impl Role {
    /// All roles, in the order they appear in select inputs.
    pub const ALL: [Self; 4] = [
        Self::Admin,
        Self::Veterinarian,
        Self::Receptionist,
        Self::Owner,
    ];

    /// Wire value (`"admin"`, `"veterinarian"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Veterinarian => "veterinarian",
            Self::Receptionist => "receptionist",
            Self::Owner => "owner",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Veterinarian => "Veterinarian",
            Self::Receptionist => "Receptionist",
            Self::Owner => "Pet owner",
        }
    }

    /// Whether this role belongs to clinic staff rather than a client.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        !matches!(self, Self::Owner)
    }

    /// Whether this role may write clinical records (consultations).
    #[must_use]
    pub const fn is_clinician(self) -> bool {
        matches!(self, Self::Admin | Self::Veterinarian)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a role string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "veterinarian" | "vet" => Ok(Self::Veterinarian),
            "receptionist" => Ok(Self::Receptionist),
            "owner" | "client" => Ok(Self::Owner),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(
            serde_json::to_string(&Role::Veterinarian).unwrap(),
            "\"veterinarian\""
        );
        let role: Role = serde_json::from_str("\"receptionist\"").unwrap();
        assert_eq!(role, Role::Receptionist);
    }

    #[test]
    fn test_role_from_str_accepts_aliases() {
        assert_eq!("VET".parse::<Role>().unwrap(), Role::Veterinarian);
        assert_eq!("client".parse::<Role>().unwrap(), Role::Owner);
        assert!("groomer".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_capabilities() {
        assert!(Role::Receptionist.is_staff());
        assert!(!Role::Owner.is_staff());
        assert!(Role::Veterinarian.is_clinician());
        assert!(!Role::Receptionist.is_clinician());
    }
}
