//! Pet endpoints.

use reqwest::Method;
use tracing::instrument;

use vetdesk_core::{PetId, UserId};

use super::{Api, BackendError, ListPage, Pet, PetInput};

/// Query filters for `GET /pets`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PetFilter {
    pub owner_id: Option<UserId>,
    pub species: Option<String>,
    pub search: Option<String>,
}

impl PetFilter {
    /// Only pets belonging to `owner_id`.
    #[must_use]
    pub const fn owned_by(owner_id: UserId) -> Self {
        Self {
            owner_id: Some(owner_id),
            species: None,
            search: None,
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(owner_id) = self.owner_id {
            query.push(("ownerId", owner_id.to_string()));
        }
        for (key, value) in [("species", &self.species), ("search", &self.search)] {
            if let Some(value) = value.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                query.push((key, value.to_string()));
            }
        }
        query
    }
}

/// Service wrapper for `/pets`.
#[derive(Debug, Clone, Copy)]
pub struct Pets<'a> {
    api: Api<'a>,
}

impl<'a> Pets<'a> {
    pub(crate) const fn new(api: Api<'a>) -> Self {
        Self { api }
    }

    /// List pets.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list(self, filter: &PetFilter) -> Result<ListPage<Pet>, BackendError> {
        self.api.get_list("pets", &filter.query()).await
    }

    /// Get a single pet.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the pet does not exist.
    #[instrument(skip(self))]
    pub async fn get(self, id: PetId) -> Result<Pet, BackendError> {
        self.api.get(&format!("pets/{id}"), &[]).await
    }

    /// Register a pet.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the API rejects the input.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(self, input: &PetInput) -> Result<Pet, BackendError> {
        self.api.send_json(Method::POST, "pets", input).await
    }

    /// Update a pet.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the API rejects the input.
    #[instrument(skip(self, input))]
    pub async fn update(self, id: PetId, input: &PetInput) -> Result<Pet, BackendError> {
        self.api
            .send_json(Method::PUT, &format!("pets/{id}"), input)
            .await
    }

    /// Delete a pet.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn delete(self, id: PetId) -> Result<(), BackendError> {
        self.api.delete(&format!("pets/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_query() {
        let mut filter = PetFilter::owned_by(UserId::new(9));
        filter.species = Some("cat".to_string());
        filter.search = Some(" ".to_string());
        assert_eq!(
            filter.query(),
            vec![("ownerId", "9".to_string()), ("species", "cat".to_string())]
        );
    }
}
