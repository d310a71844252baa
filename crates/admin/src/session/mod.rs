//! Authenticated session store.
//!
//! A [`SessionStore`] is built per request from an injectable
//! [`SessionStorage`] strategy. It holds the signed-in identity and the API
//! tokens, and persists them to one of two media:
//!
//! - [`StorageMedium::Local`] survives closing the browser ("remember me").
//! - [`StorageMedium::Session`] lasts until the browser session ends.
//!
//! Reads prefer the persistent medium. Login clears the other medium first so
//! there is never more than one active session per client.

mod cookie;
mod memory;
pub mod token;

pub use cookie::CookieSessionStorage;
pub use memory::MemoryStorage;

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::CurrentUser;

/// Errors raised by session persistence.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The underlying session layer failed.
    #[error("session storage error: {0}")]
    Storage(#[from] tower_sessions::session::Error),

    /// The persisted record could not be encoded or decoded.
    #[error("session record error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Where the session record is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageMedium {
    /// Persistent across browser restarts.
    Local,
    /// Dropped when the browser session ends.
    Session,
}

impl StorageMedium {
    /// Both media, in read-preference order.
    pub const ALL: [Self; 2] = [Self::Local, Self::Session];

    /// Medium selected by the "remember me" flag.
    #[must_use]
    pub const fn for_remember_me(remember_me: bool) -> Self {
        if remember_me { Self::Local } else { Self::Session }
    }

    /// The other medium.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Local => Self::Session,
            Self::Session => Self::Local,
        }
    }

    /// Short name used in logs and namespaced keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Session => "session",
        }
    }
}

/// Access and refresh tokens issued by the clinic API.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived bearer token.
    pub access_token: String,
    /// Long-lived token exchanged for a new pair, when issued.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenPair {
    /// Create a token pair.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// The persisted session record.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Signed-in identity.
    pub user: Option<CurrentUser>,
    /// Bearer token for API calls.
    pub access_token: Option<String>,
    /// Token used to obtain a new access token.
    pub refresh_token: Option<String>,
    /// Whether a login has completed.
    pub is_authenticated: bool,
    /// Whether the record is persisted to [`StorageMedium::Local`].
    pub remember_me: bool,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("user", &self.user.as_ref().map(|u| u.id))
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("is_authenticated", &self.is_authenticated)
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

/// Persistence strategy for [`AuthSession`] records.
///
/// Each medium holds at most one record under a fixed key.
pub trait SessionStorage: Send + Sync {
    /// Read the record from `medium`, if any.
    fn load(
        &self,
        medium: StorageMedium,
    ) -> impl Future<Output = Result<Option<AuthSession>, SessionError>> + Send;

    /// Write `session` to `medium`, replacing any previous record.
    fn save(
        &self,
        medium: StorageMedium,
        session: &AuthSession,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Remove the record from `medium`.
    fn clear(&self, medium: StorageMedium) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Note activity on `medium`. Media with an inactivity window restart it.
    fn touch(&self, _medium: StorageMedium) {}
}

/// Per-request handle on the authenticated session.
#[derive(Debug)]
pub struct SessionStore<S> {
    storage: S,
    state: AuthSession,
}

impl<S: SessionStorage> SessionStore<S> {
    /// Create an empty, unauthenticated store.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            state: AuthSession::default(),
        }
    }

    /// Create a store from whatever is persisted, preferring the persistent
    /// medium.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the storage cannot be read.
    pub async fn restore(storage: S) -> Result<Self, SessionError> {
        let mut state = AuthSession::default();
        for medium in StorageMedium::ALL {
            if let Some(found) = storage.load(medium).await? {
                state = found;
                state.remember_me = medium == StorageMedium::Local;
                break;
            }
        }
        Ok(Self { storage, state })
    }

    /// Record a completed login and persist it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the storage cannot be written.
    pub async fn login(
        &mut self,
        user: CurrentUser,
        tokens: TokenPair,
        remember_me: bool,
    ) -> Result<(), SessionError> {
        let medium = StorageMedium::for_remember_me(remember_me);
        self.storage.clear(medium.other()).await?;

        self.state = AuthSession {
            user: Some(user),
            access_token: Some(tokens.access_token),
            refresh_token: tokens.refresh_token,
            is_authenticated: true,
            remember_me,
        };
        self.storage.save(medium, &self.state).await?;

        tracing::debug!(medium = medium.as_str(), "Session persisted");
        Ok(())
    }

    /// Clear the session and remove it from both media.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the storage cannot be written. The in-memory
    /// state is cleared regardless.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        self.state = AuthSession::default();
        for medium in StorageMedium::ALL {
            self.storage.clear(medium).await?;
        }
        Ok(())
    }

    /// Replace the tokens after a refresh.
    ///
    /// A pair without a refresh token keeps the current one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the storage cannot be written.
    pub async fn update_tokens(&mut self, tokens: TokenPair) -> Result<(), SessionError> {
        self.state.access_token = Some(tokens.access_token);
        if tokens.refresh_token.is_some() {
            self.state.refresh_token = tokens.refresh_token;
        }
        self.persist().await
    }

    /// Replace the cached identity, e.g. after a profile edit.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the storage cannot be written.
    pub async fn update_user(&mut self, user: CurrentUser) -> Result<(), SessionError> {
        self.state.user = Some(user);
        self.persist().await
    }

    async fn persist(&self) -> Result<(), SessionError> {
        if !self.state.is_authenticated {
            return Ok(());
        }
        let medium = StorageMedium::for_remember_me(self.state.remember_me);
        self.storage.save(medium, &self.state).await
    }
}

impl<S> SessionStore<S> {
    /// Whether the access token is missing, unreadable, or past its `exp`.
    #[must_use]
    pub fn is_token_expired(&self) -> bool {
        token::is_expired(self.access_token())
    }

    /// The full session record.
    #[must_use]
    pub const fn current(&self) -> &AuthSession {
        &self.state
    }

    /// Signed-in identity, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&CurrentUser> {
        self.state.user.as_ref()
    }

    /// Current bearer token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.state.access_token.as_deref()
    }

    /// Current refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.state.refresh_token.as_deref()
    }

    /// Whether a login has completed and an identity is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.state.is_authenticated && self.state.user.is_some()
    }

    /// Medium the session is persisted to, when authenticated.
    #[must_use]
    pub const fn medium(&self) -> Option<StorageMedium> {
        if self.state.is_authenticated {
            Some(StorageMedium::for_remember_me(self.state.remember_me))
        } else {
            None
        }
    }

    /// Restart the inactivity window of the medium in use.
    pub fn touch(&self)
    where
        S: SessionStorage,
    {
        if let Some(medium) = self.medium() {
            self.storage.touch(medium);
        }
    }

    /// The persistence strategy.
    pub const fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vetdesk_core::{Role, UserId};

    use super::token::tests::token_expiring_in;
    use super::*;

    fn vet() -> CurrentUser {
        CurrentUser {
            id: UserId::new(7),
            email: "vet@clinic.vet".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Ruiz".to_string(),
            phone: None,
            role: Role::Veterinarian,
        }
    }

    fn tokens() -> TokenPair {
        TokenPair::new(token_expiring_in(3600), Some("refresh-1".to_string()))
    }

    #[tokio::test]
    async fn test_remember_me_persists_to_local_only() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::new(storage.clone());
        store.login(vet(), tokens(), true).await.unwrap();

        assert!(storage.contains(StorageMedium::Local));
        assert!(!storage.contains(StorageMedium::Session));
        assert_eq!(store.medium(), Some(StorageMedium::Local));
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn test_without_remember_me_persists_to_session_only() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::new(storage.clone());
        store.login(vet(), tokens(), false).await.unwrap();

        assert!(storage.contains(StorageMedium::Session));
        assert!(!storage.contains(StorageMedium::Local));
        assert_eq!(store.medium(), Some(StorageMedium::Session));
    }

    #[tokio::test]
    async fn test_logout_clears_both_media() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::new(storage.clone());
        store.login(vet(), tokens(), true).await.unwrap();
        store.logout().await.unwrap();

        assert!(!storage.contains(StorageMedium::Local));
        assert!(!storage.contains(StorageMedium::Session));
        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
        assert!(store.is_token_expired());
    }

    #[tokio::test]
    async fn test_login_replaces_session_in_other_medium() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::new(storage.clone());
        store.login(vet(), tokens(), false).await.unwrap();
        store.login(vet(), tokens(), true).await.unwrap();

        assert!(storage.contains(StorageMedium::Local));
        assert!(!storage.contains(StorageMedium::Session));
    }

    #[tokio::test]
    async fn test_restore_prefers_local() {
        let storage = MemoryStorage::new();
        let mut local = AuthSession {
            user: Some(vet()),
            access_token: Some("local-token".to_string()),
            is_authenticated: true,
            ..AuthSession::default()
        };
        storage.save(StorageMedium::Local, &local).await.unwrap();
        local.access_token = Some("session-token".to_string());
        storage.save(StorageMedium::Session, &local).await.unwrap();

        let store = SessionStore::restore(storage).await.unwrap();
        assert_eq!(store.access_token(), Some("local-token"));
        assert!(store.current().remember_me);
    }

    #[tokio::test]
    async fn test_restore_from_session_medium() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::new(storage.clone());
        store.login(vet(), tokens(), false).await.unwrap();

        // A new request with the same browser session
        let restored = SessionStore::restore(storage).await.unwrap();
        assert!(restored.is_authenticated());
        assert_eq!(restored.user(), Some(&vet()));
        assert!(!restored.current().remember_me);
    }

    #[tokio::test]
    async fn test_restore_empty_storage_is_unauthenticated() {
        let store = SessionStore::restore(MemoryStorage::new()).await.unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(store.medium(), None);
    }

    #[tokio::test]
    async fn test_update_tokens_keeps_refresh_token_when_absent() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::new(storage.clone());
        store.login(vet(), tokens(), true).await.unwrap();

        let fresh = token_expiring_in(7200);
        store
            .update_tokens(TokenPair::new(fresh.clone(), None))
            .await
            .unwrap();
        assert_eq!(store.access_token(), Some(fresh.as_str()));
        assert_eq!(store.refresh_token(), Some("refresh-1"));

        let persisted = storage.load(StorageMedium::Local).await.unwrap().unwrap();
        assert_eq!(persisted.access_token, Some(fresh));
    }

    #[tokio::test]
    async fn test_update_user_persists() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::new(storage.clone());
        store.login(vet(), tokens(), false).await.unwrap();

        let mut renamed = vet();
        renamed.first_name = "Ana María".to_string();
        store.update_user(renamed.clone()).await.unwrap();

        let persisted = storage
            .load(StorageMedium::Session)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(persisted.user, Some(renamed));
    }

    #[tokio::test]
    async fn test_token_expiry_check() {
        let mut store = SessionStore::new(MemoryStorage::new());
        assert!(store.is_token_expired());

        store.login(vet(), tokens(), false).await.unwrap();
        assert!(!store.is_token_expired());

        store
            .update_tokens(TokenPair::new(token_expiring_in(-10), None))
            .await
            .unwrap();
        assert!(store.is_token_expired());

        store
            .update_tokens(TokenPair::new("garbage", None))
            .await
            .unwrap();
        assert!(store.is_token_expired());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let session = AuthSession {
            access_token: Some("secret-access".to_string()),
            refresh_token: Some("secret-refresh".to_string()),
            ..AuthSession::default()
        };
        let output = format!("{session:?} {:?}", tokens());
        assert!(!output.contains("secret-access"));
        assert!(!output.contains("secret-refresh"));
        assert!(!output.contains("refresh-1"));
    }
}
