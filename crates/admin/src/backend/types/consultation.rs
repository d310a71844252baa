//! Consultation (clinical visit) records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use vetdesk_core::{AppointmentId, ConsultationId, PetId, UserId};

use super::common::optional_datetime;

/// Notes recorded by a veterinarian for one visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub id: ConsultationId,
    #[serde(default)]
    pub appointment_id: Option<AppointmentId>,
    pub pet_id: PetId,
    #[serde(default)]
    pub pet_name: Option<String>,
    #[serde(default)]
    pub veterinarian_id: Option<UserId>,
    #[serde(default)]
    pub veterinarian_name: Option<String>,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub treatment: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default, with = "optional_datetime")]
    pub created_at: Option<NaiveDateTime>,
}

/// Body for creating or updating a consultation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationInput {
    pub pet_id: PetId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<AppointmentId>,
    pub diagnosis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
}
