//! Authentication endpoints.

use reqwest::Method;
use tracing::instrument;

use crate::session::TokenPair;

use super::{
    Api, AuthPayload, BackendError, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
    RefreshRequest, RegisterRequest, ResetPasswordRequest, User,
};

/// Service wrapper for `/auth/*`.
#[derive(Debug, Clone, Copy)]
pub struct Auth<'a> {
    api: Api<'a>,
}

impl<'a> Auth<'a> {
    pub(crate) const fn new(api: Api<'a>) -> Self {
        Self { api }
    }

    /// Exchange credentials for a user and token pair.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` (or `Validation`) on bad
    /// credentials, or another error if the request fails.
    #[instrument(skip(self, password))]
    pub async fn login(self, email: &str, password: &str) -> Result<AuthPayload, BackendError> {
        self.api
            .send_json(
                Method::POST,
                "auth/login",
                &LoginRequest { email, password },
            )
            .await
    }

    /// Create an owner account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the API rejects the input.
    #[instrument(skip(self, request), fields(email = request.email))]
    pub async fn register(
        self,
        request: &RegisterRequest<'_>,
    ) -> Result<AuthPayload, BackendError> {
        self.api
            .send_json(Method::POST, "auth/register", request)
            .await
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` if the refresh token is no longer
    /// valid.
    #[instrument(skip_all)]
    pub async fn refresh(self, refresh_token: &str) -> Result<TokenPair, BackendError> {
        self.api
            .send_json(
                Method::POST,
                "auth/refresh",
                &RefreshRequest { refresh_token },
            )
            .await
    }

    /// Ask the API to email a password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn forgot_password(self, email: &str) -> Result<Option<String>, BackendError> {
        self.api
            .send_ack(
                Method::POST,
                "auth/forgot-password",
                &ForgotPasswordRequest { email },
            )
            .await
    }

    /// Set a new password using a reset token.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the token is invalid or expired.
    #[instrument(skip_all)]
    pub async fn reset_password(
        self,
        token: &str,
        new_password: &str,
    ) -> Result<Option<String>, BackendError> {
        self.api
            .send_ack(
                Method::POST,
                "auth/reset-password",
                &ResetPasswordRequest {
                    token,
                    new_password,
                },
            )
            .await
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Validation` if the current password is wrong.
    #[instrument(skip_all)]
    pub async fn change_password(
        self,
        current_password: &str,
        new_password: &str,
    ) -> Result<Option<String>, BackendError> {
        self.api
            .send_ack(
                Method::POST,
                "auth/change-password",
                &ChangePasswordRequest {
                    current_password,
                    new_password,
                },
            )
            .await
    }

    /// The signed-in user's record.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` if the token is not accepted.
    #[instrument(skip(self))]
    pub async fn me(self) -> Result<User, BackendError> {
        self.api.get("auth/me", &[]).await
    }
}
