//! Billable clinic services.

use serde::{Deserialize, Serialize};

use vetdesk_core::{Price, ServiceId};

use super::common::default_true;

/// A service offered by the clinic (consultation, vaccination, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicService {
    pub id: ServiceId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Body for creating or updating a service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Price,
    pub duration_minutes: u32,
    pub is_active: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_accepts_number_or_string() {
        let a: ClinicService =
            serde_json::from_str(r#"{"id":1,"name":"Vaccine","price":45.5,"durationMinutes":15}"#)
                .unwrap();
        let b: ClinicService = serde_json::from_str(
            r#"{"id":1,"name":"Vaccine","price":"45.50","durationMinutes":15}"#,
        )
        .unwrap();
        assert_eq!(a.price, b.price);
        assert_eq!(a.price.to_string(), "$45.50");
        assert!(a.is_active);
    }
}
