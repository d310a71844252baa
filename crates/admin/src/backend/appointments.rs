//! Appointment endpoints.

use chrono::NaiveDate;
use reqwest::Method;
use tracing::instrument;

use vetdesk_core::{AppointmentId, AppointmentStatus, PetId, UserId};

use super::{Api, Appointment, AppointmentInput, BackendError, ListPage, StatusChange};

/// Query filters for `GET /appointments`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
    pub owner_id: Option<UserId>,
    pub veterinarian_id: Option<UserId>,
    pub pet_id: Option<PetId>,
}

impl AppointmentFilter {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(date) = self.date {
            query.push(("date", date.format("%Y-%m-%d").to_string()));
        }
        if let Some(id) = self.owner_id {
            query.push(("ownerId", id.to_string()));
        }
        if let Some(id) = self.veterinarian_id {
            query.push(("veterinarianId", id.to_string()));
        }
        if let Some(id) = self.pet_id {
            query.push(("petId", id.to_string()));
        }
        query
    }
}

/// Service wrapper for `/appointments`.
#[derive(Debug, Clone, Copy)]
pub struct Appointments<'a> {
    api: Api<'a>,
}

impl<'a> Appointments<'a> {
    pub(crate) const fn new(api: Api<'a>) -> Self {
        Self { api }
    }

    /// List appointments.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list(
        self,
        filter: &AppointmentFilter,
    ) -> Result<ListPage<Appointment>, BackendError> {
        self.api.get_list("appointments", &filter.query()).await
    }

    /// Get a single appointment, decorators included.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the appointment does not exist.
    #[instrument(skip(self))]
    pub async fn get(self, id: AppointmentId) -> Result<Appointment, BackendError> {
        self.api.get(&format!("appointments/{id}"), &[]).await
    }

    /// Book an appointment.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the API rejects the input.
    #[instrument(skip(self, input))]
    pub async fn create(self, input: &AppointmentInput) -> Result<Appointment, BackendError> {
        self.api.send_json(Method::POST, "appointments", input).await
    }

    /// Reschedule or otherwise edit an appointment.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the API rejects the input.
    #[instrument(skip(self, input))]
    pub async fn update(
        self,
        id: AppointmentId,
        input: &AppointmentInput,
    ) -> Result<Appointment, BackendError> {
        self.api
            .send_json(Method::PUT, &format!("appointments/{id}"), input)
            .await
    }

    /// Move an appointment to a new status (confirm, cancel, complete, ...).
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the transition is not allowed.
    #[instrument(skip(self))]
    pub async fn update_status(
        self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<Option<String>, BackendError> {
        self.api
            .send_ack(
                Method::PATCH,
                &format!("appointments/{id}/status"),
                &StatusChange { status },
            )
            .await
    }

    /// Delete an appointment.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn delete(self, id: AppointmentId) -> Result<(), BackendError> {
        self.api.delete(&format!("appointments/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_query() {
        let filter = AppointmentFilter {
            status: Some(AppointmentStatus::InProgress),
            date: NaiveDate::from_ymd_opt(2026, 3, 14),
            veterinarian_id: Some(UserId::new(7)),
            ..AppointmentFilter::default()
        };
        assert_eq!(
            filter.query(),
            vec![
                ("status", "in_progress".to_string()),
                ("date", "2026-03-14".to_string()),
                ("veterinarianId", "7".to_string()),
            ]
        );
    }
}
