//! Consultation endpoints.

use reqwest::Method;
use tracing::instrument;

use vetdesk_core::{ConsultationId, PetId, UserId};

use super::{Api, BackendError, Consultation, ConsultationInput, ListPage};

/// Query filters for `GET /consultations`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsultationFilter {
    pub pet_id: Option<PetId>,
    pub veterinarian_id: Option<UserId>,
}

impl ConsultationFilter {
    fn query(self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(id) = self.pet_id {
            query.push(("petId", id.to_string()));
        }
        if let Some(id) = self.veterinarian_id {
            query.push(("veterinarianId", id.to_string()));
        }
        query
    }
}

/// Service wrapper for `/consultations`.
#[derive(Debug, Clone, Copy)]
pub struct Consultations<'a> {
    api: Api<'a>,
}

impl<'a> Consultations<'a> {
    pub(crate) const fn new(api: Api<'a>) -> Self {
        Self { api }
    }

    /// List consultations.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list(
        self,
        filter: ConsultationFilter,
    ) -> Result<ListPage<Consultation>, BackendError> {
        self.api.get_list("consultations", &filter.query()).await
    }

    /// Get a single consultation.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the consultation does not exist.
    #[instrument(skip(self))]
    pub async fn get(self, id: ConsultationId) -> Result<Consultation, BackendError> {
        self.api.get(&format!("consultations/{id}"), &[]).await
    }

    /// Record a consultation.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the API rejects the input.
    #[instrument(skip(self, input))]
    pub async fn create(self, input: &ConsultationInput) -> Result<Consultation, BackendError> {
        self.api.send_json(Method::POST, "consultations", input).await
    }

    /// Amend a consultation.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the API rejects the input.
    #[instrument(skip(self, input))]
    pub async fn update(
        self,
        id: ConsultationId,
        input: &ConsultationInput,
    ) -> Result<Consultation, BackendError> {
        self.api
            .send_json(Method::PUT, &format!("consultations/{id}"), input)
            .await
    }
}
