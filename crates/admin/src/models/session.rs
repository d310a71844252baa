//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use vetdesk_core::{Role, UserId};

use crate::backend::User;

/// Session-stored user identity.
///
/// Minimal copy of the clinic API's user record, enough to render the
/// navigation and branch page behaviour by role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's clinic API ID.
    pub id: UserId,
    /// User's email address.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact phone, if on file.
    #[serde(default)]
    pub phone: Option<String>,
    /// Role assigned by the clinic.
    pub role: Role,
}

impl CurrentUser {
    /// Display name (`"Ana Ruiz"`), falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }

    /// Whether this user may manage accounts and the service catalogue.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this user is clinic staff.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Whether this user may write consultations.
    #[must_use]
    pub const fn is_clinician(&self) -> bool {
        self.role.is_clinician()
    }

    /// Whether this user is a pet owner (client).
    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            role: user.role,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Fixed key the authenticated session is persisted under.
    pub const AUTH_SESSION: &str = "vetdesk_auth";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            email: "ana@clinic.vet".to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            phone: None,
            role: Role::Veterinarian,
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(user("Ana", "Ruiz").display_name(), "Ana Ruiz");
        assert_eq!(user("", " ").display_name(), "ana@clinic.vet");
    }

    #[test]
    fn test_role_helpers() {
        let vet = user("Ana", "Ruiz");
        assert!(vet.is_staff());
        assert!(vet.is_clinician());
        assert!(!vet.is_admin());
        assert!(!vet.is_owner());
    }
}
