//! Appointments and the decorators attached to them.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use vetdesk_core::{
    AppointmentId, AppointmentStatus, DecoratorId, DecoratorKind, PetId, ServiceId, UserId,
};

use super::common::{datetime, optional_datetime};

/// A booked visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub pet_id: PetId,
    #[serde(default)]
    pub pet_name: Option<String>,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub veterinarian_id: Option<UserId>,
    #[serde(default)]
    pub veterinarian_name: Option<String>,
    #[serde(default)]
    pub service_id: Option<ServiceId>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(with = "datetime")]
    pub scheduled_at: NaiveDateTime,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub decorators: Vec<Decorator>,
}

impl Appointment {
    /// Calendar day of the visit.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.scheduled_at.date()
    }

    /// Whether any attached decorator flags the visit as priority.
    #[must_use]
    pub fn is_priority(&self) -> bool {
        self.decorators
            .iter()
            .any(|d| d.kind == DecoratorKind::Priority)
    }
}

/// Body for creating or updating an appointment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentInput {
    pub pet_id: PetId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub veterinarian_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<ServiceId>,
    #[serde(with = "datetime")]
    pub scheduled_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Body for `PATCH /appointments/{id}/status`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusChange {
    pub status: AppointmentStatus,
}

/// Metadata attached to an appointment: a note, reminder, or priority flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decorator {
    pub id: DecoratorId,
    #[serde(default)]
    pub appointment_id: Option<AppointmentId>,
    #[serde(alias = "type")]
    pub kind: DecoratorKind,
    pub content: String,
    #[serde(default, with = "optional_datetime")]
    pub created_at: Option<NaiveDateTime>,
}

/// Body for attaching a decorator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDecorator {
    pub kind: DecoratorKind,
    pub content: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_appointment_with_decorators() {
        let json = r#"{
            "id": 40,
            "petId": 3,
            "petName": "Rex",
            "scheduledAt": "2026-03-14T09:30:00",
            "status": "confirmed",
            "decorators": [
                {"id": 1, "type": "priority", "content": "Post-surgery check"},
                {"id": 2, "kind": "note", "content": "Nervous around cats"}
            ]
        }"#;
        let appointment: Appointment = serde_json::from_str(json).unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Confirmed);
        assert_eq!(appointment.date(), NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(appointment.decorators.len(), 2);
        assert!(appointment.is_priority());
    }

    #[test]
    fn test_input_wire_format() {
        let input = AppointmentInput {
            pet_id: PetId::new(3),
            veterinarian_id: Some(UserId::new(7)),
            service_id: None,
            scheduled_at: NaiveDate::from_ymd_opt(2026, 3, 14)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            reason: None,
        };
        assert_eq!(
            serde_json::to_string(&input).unwrap(),
            r#"{"petId":3,"veterinarianId":7,"scheduledAt":"2026-03-14T09:30:00"}"#
        );
    }
}
