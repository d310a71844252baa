//! Service catalogue endpoints.

use reqwest::Method;
use tracing::instrument;

use vetdesk_core::ServiceId;

use super::{Api, BackendError, ClinicService, ListPage, ServiceInput};

/// Service wrapper for `/services`.
#[derive(Debug, Clone, Copy)]
pub struct Services<'a> {
    api: Api<'a>,
}

impl<'a> Services<'a> {
    pub(crate) const fn new(api: Api<'a>) -> Self {
        Self { api }
    }

    /// List services.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list(self) -> Result<ListPage<ClinicService>, BackendError> {
        self.api.get_list("services", &[]).await
    }

    /// Get a single service.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the service does not exist.
    #[instrument(skip(self))]
    pub async fn get(self, id: ServiceId) -> Result<ClinicService, BackendError> {
        self.api.get(&format!("services/{id}"), &[]).await
    }

    /// Create a service.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the API rejects the input.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(self, input: &ServiceInput) -> Result<ClinicService, BackendError> {
        self.api.send_json(Method::POST, "services", input).await
    }

    /// Update a service.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the API rejects the input.
    #[instrument(skip(self, input))]
    pub async fn update(
        self,
        id: ServiceId,
        input: &ServiceInput,
    ) -> Result<ClinicService, BackendError> {
        self.api
            .send_json(Method::PUT, &format!("services/{id}"), input)
            .await
    }

    /// Delete a service.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn delete(self, id: ServiceId) -> Result<(), BackendError> {
        self.api.delete(&format!("services/{id}")).await
    }
}
