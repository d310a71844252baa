//! Triage endpoints.

use reqwest::Method;
use tracing::instrument;

use vetdesk_core::TriageId;

use super::{Api, BackendError, ListPage, Triage, TriageInput, sort_by_urgency};

/// Service wrapper for `/triage`.
#[derive(Debug, Clone, Copy)]
pub struct TriageQueue<'a> {
    api: Api<'a>,
}

impl<'a> TriageQueue<'a> {
    pub(crate) const fn new(api: Api<'a>) -> Self {
        Self { api }
    }

    /// The triage queue, most urgent first.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list(self) -> Result<ListPage<Triage>, BackendError> {
        let mut page: ListPage<Triage> = self.api.get_list("triage", &[]).await?;
        sort_by_urgency(&mut page.items);
        Ok(page)
    }

    /// Get a single triage record.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the record does not exist.
    #[instrument(skip(self))]
    pub async fn get(self, id: TriageId) -> Result<Triage, BackendError> {
        self.api.get(&format!("triage/{id}"), &[]).await
    }

    /// Admit a patient to the queue.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the API rejects the input.
    #[instrument(skip(self, input), fields(severity = %input.severity))]
    pub async fn create(self, input: &TriageInput) -> Result<Triage, BackendError> {
        self.api.send_json(Method::POST, "triage", input).await
    }

    /// Update severity, notes, or status.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the API rejects the input.
    #[instrument(skip(self, input))]
    pub async fn update(self, id: TriageId, input: &TriageInput) -> Result<Triage, BackendError> {
        self.api
            .send_json(Method::PUT, &format!("triage/{id}"), input)
            .await
    }
}
