//! In-memory session storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::session_keys;

use super::{AuthSession, SessionError, SessionStorage, StorageMedium};

type Medium = HashMap<String, String>;

/// Two in-memory key/value media, each holding serialized records.
///
/// Clones share the same maps, so a test can keep a handle while a
/// [`super::SessionStore`] owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    media: Arc<Mutex<HashMap<StorageMedium, Medium>>>,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `medium` holds a session record.
    #[must_use]
    pub fn contains(&self, medium: StorageMedium) -> bool {
        self.raw(medium).is_some()
    }

    /// The serialized record in `medium`, as written.
    #[must_use]
    pub fn raw(&self, medium: StorageMedium) -> Option<String> {
        let media = self.media.lock().unwrap_or_else(PoisonError::into_inner);
        media
            .get(&medium)
            .and_then(|entries| entries.get(session_keys::AUTH_SESSION))
            .cloned()
    }
}

impl SessionStorage for MemoryStorage {
    async fn load(&self, medium: StorageMedium) -> Result<Option<AuthSession>, SessionError> {
        self.raw(medium)
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(SessionError::from)
    }

    async fn save(&self, medium: StorageMedium, session: &AuthSession) -> Result<(), SessionError> {
        let raw = serde_json::to_string(session)?;
        let mut media = self.media.lock().unwrap_or_else(PoisonError::into_inner);
        media
            .entry(medium)
            .or_default()
            .insert(session_keys::AUTH_SESSION.to_string(), raw);
        Ok(())
    }

    async fn clear(&self, medium: StorageMedium) -> Result<(), SessionError> {
        let mut media = self.media.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entries) = media.get_mut(&medium) {
            entries.remove(session_keys::AUTH_SESSION);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_media_are_independent() {
        let storage = MemoryStorage::new();
        let session = AuthSession {
            is_authenticated: true,
            ..AuthSession::default()
        };
        storage.save(StorageMedium::Local, &session).await.unwrap();

        assert!(storage.contains(StorageMedium::Local));
        assert!(!storage.contains(StorageMedium::Session));
        assert!(storage.load(StorageMedium::Session).await.unwrap().is_none());

        storage.clear(StorageMedium::Local).await.unwrap();
        assert!(!storage.contains(StorageMedium::Local));
    }

    #[tokio::test]
    async fn test_corrupt_record_is_an_error() {
        let storage = MemoryStorage::new();
        storage
            .media
            .lock()
            .unwrap()
            .entry(StorageMedium::Session)
            .or_default()
            .insert(session_keys::AUTH_SESSION.to_string(), "{oops".to_string());

        assert!(matches!(
            storage.load(StorageMedium::Session).await,
            Err(SessionError::Serialization(_))
        ));
    }
}
