//! Session storage over the `tower-sessions` cookie session.
//!
//! Both media live in the same server-side session record, under keys
//! namespaced by medium. What distinguishes them is the cookie lifetime:
//! saving to [`StorageMedium::Local`] gives the cookie a persistent expiry,
//! saving to [`StorageMedium::Session`] makes it a browser-session cookie.
//!
//! `tower-sessions` only re-issues the cookie when the session changed, so a
//! remembered session is touched on every authenticated request to keep the
//! inactivity window counting from the last visit.

use tower_sessions::{Expiry, Session};

use crate::models::session_keys;

use super::{AuthSession, SessionError, SessionStorage, StorageMedium};

/// Cookie-backed [`SessionStorage`].
#[derive(Debug, Clone)]
pub struct CookieSessionStorage {
    session: Session,
    remember_for: time::Duration,
}

impl CookieSessionStorage {
    /// Wrap the request's session.
    ///
    /// `remember_for` is the inactivity window of a "remember me" cookie.
    #[must_use]
    pub const fn new(session: Session, remember_for: time::Duration) -> Self {
        Self {
            session,
            remember_for,
        }
    }

    /// Key the record for `medium` is stored under.
    #[must_use]
    pub fn key(medium: StorageMedium) -> String {
        format!("{}:{}", medium.as_str(), session_keys::AUTH_SESSION)
    }

    /// The wrapped session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    fn expiry_for(&self, medium: StorageMedium) -> Expiry {
        match medium {
            StorageMedium::Local => Expiry::OnInactivity(self.remember_for),
            StorageMedium::Session => Expiry::OnSessionEnd,
        }
    }
}

impl SessionStorage for CookieSessionStorage {
    async fn load(&self, medium: StorageMedium) -> Result<Option<AuthSession>, SessionError> {
        Ok(self.session.get::<AuthSession>(&Self::key(medium)).await?)
    }

    async fn save(&self, medium: StorageMedium, session: &AuthSession) -> Result<(), SessionError> {
        self.session.insert(&Self::key(medium), session).await?;
        self.session.set_expiry(Some(self.expiry_for(medium)));
        Ok(())
    }

    async fn clear(&self, medium: StorageMedium) -> Result<(), SessionError> {
        self.session
            .remove::<AuthSession>(&Self::key(medium))
            .await?;
        Ok(())
    }

    fn touch(&self, medium: StorageMedium) {
        if medium == StorageMedium::Local {
            self.session.set_expiry(Some(self.expiry_for(medium)));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn storage() -> CookieSessionStorage {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        CookieSessionStorage::new(session, time::Duration::days(30))
    }

    #[test]
    fn test_keys_are_namespaced() {
        assert_eq!(
            CookieSessionStorage::key(StorageMedium::Local),
            "local:vetdesk_auth"
        );
        assert_eq!(
            CookieSessionStorage::key(StorageMedium::Session),
            "session:vetdesk_auth"
        );
    }

    #[tokio::test]
    async fn test_local_save_sets_persistent_expiry() {
        let storage = storage();
        storage
            .save(StorageMedium::Local, &AuthSession::default())
            .await
            .unwrap();

        assert_eq!(
            storage.session().expiry(),
            Some(Expiry::OnInactivity(time::Duration::days(30)))
        );
        assert!(storage.load(StorageMedium::Local).await.unwrap().is_some());
        assert!(storage.load(StorageMedium::Session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_save_sets_browser_session_expiry() {
        let storage = storage();
        storage
            .save(StorageMedium::Session, &AuthSession::default())
            .await
            .unwrap();

        assert_eq!(storage.session().expiry(), Some(Expiry::OnSessionEnd));
    }

    #[test]
    fn test_touch_renews_only_remembered_sessions() {
        let storage = storage();
        storage.touch(StorageMedium::Session);
        assert!(!storage.session().is_modified());

        storage.touch(StorageMedium::Local);
        assert!(storage.session().is_modified());
        assert_eq!(
            storage.session().expiry(),
            Some(Expiry::OnInactivity(time::Duration::days(30)))
        );
    }

    #[tokio::test]
    async fn test_clear_removes_record() {
        let storage = storage();
        storage
            .save(StorageMedium::Session, &AuthSession::default())
            .await
            .unwrap();
        storage.clear(StorageMedium::Session).await.unwrap();

        assert!(storage.load(StorageMedium::Session).await.unwrap().is_none());
    }
}
