//! User account endpoints.

use reqwest::Method;
use tracing::instrument;

use vetdesk_core::{Role, UserId};

use super::{Api, BackendError, ListPage, NewUser, User, UserUpdate};

/// Query filters for `GET /users`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub search: Option<String>,
}

impl UserFilter {
    /// Only users with `role`.
    #[must_use]
    pub const fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            search: None,
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(role) = self.role {
            query.push(("role", role.as_str().to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }
        query
    }
}

/// Service wrapper for `/users`.
#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    api: Api<'a>,
}

impl<'a> Users<'a> {
    pub(crate) const fn new(api: Api<'a>) -> Self {
        Self { api }
    }

    /// List users.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list(self, filter: &UserFilter) -> Result<ListPage<User>, BackendError> {
        self.api.get_list("users", &filter.query()).await
    }

    /// Veterinarians, for appointment and consultation pickers.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    pub async fn list_veterinarians(self) -> Result<Vec<User>, BackendError> {
        Ok(self
            .list(&UserFilter::role(Role::Veterinarian))
            .await?
            .items)
    }

    /// Pet owners, for pet and appointment pickers.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    pub async fn list_owners(self) -> Result<Vec<User>, BackendError> {
        Ok(self.list(&UserFilter::role(Role::Owner)).await?.items)
    }

    /// Get a single user.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the user does not exist.
    #[instrument(skip(self))]
    pub async fn get(self, id: UserId) -> Result<User, BackendError> {
        self.api.get(&format!("users/{id}"), &[]).await
    }

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the API rejects the input.
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create(self, user: &NewUser) -> Result<User, BackendError> {
        self.api.send_json(Method::POST, "users", user).await
    }

    /// Update a user.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the API rejects the input.
    #[instrument(skip(self, update))]
    pub async fn update(self, id: UserId, update: &UserUpdate) -> Result<User, BackendError> {
        self.api
            .send_json(Method::PUT, &format!("users/{id}"), update)
            .await
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn delete(self, id: UserId) -> Result<(), BackendError> {
        self.api.delete(&format!("users/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_query() {
        let filter = UserFilter {
            role: Some(Role::Receptionist),
            search: Some("  ana ".to_string()),
        };
        assert_eq!(
            filter.query(),
            vec![
                ("role", "receptionist".to_string()),
                ("search", "ana".to_string())
            ]
        );
        assert!(UserFilter::default().query().is_empty());
    }
}
