//! Authentication extractors.
//!
//! Every protected handler takes one of these extractors. They restore the
//! [`SessionStore`] for the request, refresh an expired access token when a
//! refresh token is held, and otherwise send the browser to the login page.
//!
//! | Extractor            | Who gets through                       |
//! |----------------------|----------------------------------------|
//! | [`RequireAuth`]      | any signed-in user                     |
//! | [`RequireStaff`]     | admin, veterinarian, receptionist      |
//! | [`RequireClinician`] | admin, veterinarian                    |
//! | [`RequireAdmin`]     | admin                                  |
//! | [`GuestOnly`]        | visitors who are *not* signed in       |

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::backend::Api;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::CurrentUser;
use crate::session::{CookieSessionStorage, SessionError, SessionStore};
use crate::state::AppState;

/// The session store used by request handlers.
pub type CookieSessionStore = SessionStore<CookieSessionStorage>;

/// Restore the session store for a request.
///
/// # Errors
///
/// Returns `SessionError` if the session record cannot be read.
pub async fn restore_session(
    session: Session,
    state: &AppState,
) -> Result<CookieSessionStore, SessionError> {
    let storage = CookieSessionStorage::new(session, state.config().remember_me_duration());
    SessionStore::restore(storage).await
}

/// A signed-in user together with their session store.
#[derive(Debug)]
pub struct Authenticated {
    user: CurrentUser,
    store: CookieSessionStore,
}

impl Authenticated {
    /// The signed-in user.
    #[must_use]
    pub const fn user(&self) -> &CurrentUser {
        &self.user
    }

    /// The bearer token for clinic API calls.
    #[must_use]
    pub fn token(&self) -> &str {
        self.store.access_token().unwrap_or_default()
    }

    /// The clinic API, scoped to this user.
    #[must_use]
    pub fn api<'a>(&'a self, state: &'a AppState) -> Api<'a> {
        state.backend().with_token(self.token())
    }

    /// Replace the cached identity after a profile edit.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session cannot be written.
    pub async fn update_user(&mut self, user: CurrentUser) -> Result<(), SessionError> {
        self.store.update_user(user.clone()).await?;
        self.user = user;
        Ok(())
    }

    /// Sign out, e.g. after the API refused the token.
    ///
    /// Storage failures are logged; the caller is redirected either way.
    pub async fn sign_out(mut self) -> Response {
        if let Err(e) = self.store.logout().await {
            tracing::error!("Failed to clear session: {e}");
        }
        clear_sentry_user();
        Redirect::to("/auth/login").into_response()
    }
}

/// Error returned when a request does not meet an extractor's requirements.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not signed in: redirect to the login page.
    RedirectToLogin,
    /// Already signed in: redirect to the dashboard.
    RedirectToDashboard,
    /// Session layer missing from the router.
    Unauthorized,
    /// Signed in but the role is not allowed here.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::RedirectToDashboard => Redirect::to("/").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have permission to view this page",
            )
                .into_response(),
        }
    }
}

/// Resolve the signed-in user, refreshing the access token if needed.
async fn authenticate(parts: &Parts, state: &AppState) -> Result<Authenticated, AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or(AuthRejection::Unauthorized)?;

    let mut store = restore_session(session, state).await.map_err(|e| {
        tracing::warn!("Failed to restore session: {e}");
        AuthRejection::RedirectToLogin
    })?;

    if !store.is_authenticated() {
        return Err(AuthRejection::RedirectToLogin);
    }

    if store.is_token_expired() {
        refresh_or_logout(&mut store, state).await?;
    }
    store.touch();

    let user = store
        .user()
        .cloned()
        .ok_or(AuthRejection::RedirectToLogin)?;
    set_sentry_user(user.id.as_i64(), Some(&user.email));

    Ok(Authenticated { user, store })
}

/// Exchange the refresh token for a new pair, or end the session.
async fn refresh_or_logout(
    store: &mut CookieSessionStore,
    state: &AppState,
) -> Result<(), AuthRejection> {
    let refreshed = match store.refresh_token() {
        Some(refresh_token) => state
            .backend()
            .public()
            .auth()
            .refresh(refresh_token)
            .await
            .map_err(|e| tracing::info!("Token refresh failed: {e}"))
            .ok(),
        None => None,
    };

    if let Some(tokens) = refreshed {
        if let Err(e) = store.update_tokens(tokens).await {
            tracing::error!("Failed to persist refreshed tokens: {e}");
        }
        tracing::debug!("Access token refreshed");
        return Ok(());
    }

    if let Err(e) = store.logout().await {
        tracing::error!("Failed to clear expired session: {e}");
    }
    Err(AuthRejection::RedirectToLogin)
}

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(auth): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user().display_name())
/// }
/// ```
pub struct RequireAuth(pub Authenticated);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).await.map(Self)
    }
}

/// Extractor that requires clinic staff (any role but owner).
pub struct RequireStaff(pub Authenticated);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = authenticate(parts, state).await?;
        if !auth.user().is_staff() {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(auth))
    }
}

/// Extractor that requires a veterinarian or admin.
pub struct RequireClinician(pub Authenticated);

impl FromRequestParts<AppState> for RequireClinician {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = authenticate(parts, state).await?;
        if !auth.user().is_clinician() {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(auth))
    }
}

/// Extractor that requires an admin.
pub struct RequireAdmin(pub Authenticated);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = authenticate(parts, state).await?;
        if !auth.user().is_admin() {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(auth))
    }
}

/// Extractor for public-only pages (login, registration, password reset).
///
/// Signed-in users are redirected to the dashboard. Visitors get an empty
/// session store that the login and registration handlers fill in.
pub struct GuestOnly(pub CookieSessionStore);

impl FromRequestParts<AppState> for GuestOnly {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::Unauthorized)?;
        let storage = CookieSessionStorage::new(session, state.config().remember_me_duration());

        match SessionStore::restore(storage.clone()).await {
            Ok(store) if store.is_authenticated() => Err(AuthRejection::RedirectToDashboard),
            Ok(store) => Ok(Self(store)),
            Err(e) => {
                tracing::warn!("Unreadable session on public page: {e}");
                Ok(Self(SessionStore::new(storage)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_responses() {
        let response = AuthRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/auth/login")
        );

        let response = AuthRejection::RedirectToDashboard.into_response();
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/")
        );

        assert_eq!(
            AuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
