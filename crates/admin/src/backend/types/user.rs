//! User accounts.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use vetdesk_core::{Role, UserId};

use super::common::{default_true, optional_datetime};

/// A clinic user: staff member or pet owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, with = "optional_datetime")]
    pub created_at: Option<NaiveDateTime>,
}

impl User {
    /// `"First Last"`, or the email when both names are blank.
    #[must_use]
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

/// Body for creating a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    pub password: String,
}

/// Body for updating a user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_api() {
        let json = r#"{
            "id": 12,
            "email": "ana@clinic.vet",
            "firstName": "Ana",
            "lastName": "Ruiz",
            "role": "veterinarian",
            "createdAt": "2025-11-02T08:00:00.000Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId::new(12));
        assert_eq!(user.role, Role::Veterinarian);
        assert!(user.is_active);
        assert!(user.created_at.is_some());
        assert_eq!(user.full_name(), "Ana Ruiz");
    }

    #[test]
    fn test_update_skips_absent_fields() {
        let update = UserUpdate {
            phone: Some("555-0100".to_string()),
            ..UserUpdate::default()
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"phone":"555-0100"}"#
        );
    }
}
