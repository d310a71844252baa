//! Appointment decorator endpoints.

use reqwest::Method;
use tracing::instrument;

use vetdesk_core::{AppointmentId, DecoratorId};

use super::{Api, BackendError, Decorator, NewDecorator};

/// Service wrapper for `/appointments/{id}/decorators`.
#[derive(Debug, Clone, Copy)]
pub struct Decorators<'a> {
    api: Api<'a>,
}

impl<'a> Decorators<'a> {
    pub(crate) const fn new(api: Api<'a>) -> Self {
        Self { api }
    }

    /// Decorators attached to an appointment.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list(self, appointment: AppointmentId) -> Result<Vec<Decorator>, BackendError> {
        Ok(self
            .api
            .get_list::<Decorator>(&format!("appointments/{appointment}/decorators"), &[])
            .await?
            .items)
    }

    /// Attach a decorator.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the API rejects the input.
    #[instrument(skip(self, decorator), fields(kind = %decorator.kind))]
    pub async fn add(
        self,
        appointment: AppointmentId,
        decorator: &NewDecorator,
    ) -> Result<Decorator, BackendError> {
        self.api
            .send_json(
                Method::POST,
                &format!("appointments/{appointment}/decorators"),
                decorator,
            )
            .await
    }

    /// Detach a decorator.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn remove(
        self,
        appointment: AppointmentId,
        decorator: DecoratorId,
    ) -> Result<(), BackendError> {
        self.api
            .delete(&format!("appointments/{appointment}/decorators/{decorator}"))
            .await
    }
}
