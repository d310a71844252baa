//! Authentication route handlers.
//!
//! Login, registration and password reset are public-only pages: signed-in
//! visitors are sent to the dashboard by [`GuestOnly`]. Changing the password
//! requires a session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use vetdesk_core::FormErrors;

use crate::backend::RegisterRequest;
use crate::components::{Nav, NoticeQuery, PageAlert};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::auth::{CookieSessionStore, GuestOnly, RequireAuth, restore_session};
use crate::models::CurrentUser;
use crate::state::AppState;

use super::{non_empty, render};

/// Message shown when the API refuses a login.
const INVALID_CREDENTIALS: &str = "Invalid email or password.";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Checkbox: present ("on") when ticked.
    pub remember_me: Option<String>,
}

impl LoginForm {
    fn remember(&self) -> bool {
        self.remember_me.is_some()
    }
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

/// Forgot password form data.
#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

/// Change password form data.
#[derive(Debug, Default, Deserialize)]
pub struct ChangePasswordForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub new_password_confirm: String,
}

/// Query parameters for the reset link.
#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    pub token: Option<String>,
}

// =============================================================================
// Validation
// =============================================================================

fn validate_login(form: &LoginForm) -> FormErrors {
    let mut errors = FormErrors::new();
    errors.email("email", &form.email);
    errors.required("password", "Password", &form.password);
    errors
}

fn validate_register(form: &RegisterForm) -> FormErrors {
    let mut errors = FormErrors::new();
    errors
        .length("first_name", "First name", &form.first_name, 2, 50)
        .length("last_name", "Last name", &form.last_name, 2, 50)
        .phone("phone", &form.phone)
        .password("password", &form.password)
        .matches(
            "password_confirm",
            &form.password,
            &form.password_confirm,
            "Passwords do not match",
        );
    errors.email("email", &form.email);
    errors
}

fn validate_reset(form: &ResetPasswordForm) -> FormErrors {
    let mut errors = FormErrors::new();
    if form.token.trim().is_empty() {
        errors.add("token", "This reset link is invalid. Please request a new one.");
    }
    errors.password("password", &form.password).matches(
        "password_confirm",
        &form.password,
        &form.password_confirm,
        "Passwords do not match",
    );
    errors
}

fn validate_change(form: &ChangePasswordForm) -> FormErrors {
    let mut errors = FormErrors::new();
    errors
        .required("current_password", "Current password", &form.current_password)
        .password("new_password", &form.new_password)
        .matches(
            "new_password_confirm",
            &form.new_password,
            &form.new_password_confirm,
            "Passwords do not match",
        );
    if !form.current_password.is_empty() && form.current_password == form.new_password {
        errors.add(
            "new_password",
            "New password must be different from the current one",
        );
    }
    errors
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub alert: Option<PageAlert>,
    pub email: String,
    pub remember_me: bool,
    pub errors: FormErrors,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub alert: Option<PageAlert>,
    pub form: RegisterForm,
    pub errors: FormErrors,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub alert: Option<PageAlert>,
    pub email: String,
    pub errors: FormErrors,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub alert: Option<PageAlert>,
    pub token: String,
    pub errors: FormErrors,
}

/// Change password page template (signed in).
#[derive(Template)]
#[template(path = "auth/change_password.html")]
pub struct ChangePasswordTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub errors: FormErrors,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(_guest: GuestOnly, Query(query): Query<NoticeQuery>) -> impl IntoResponse {
    LoginTemplate {
        alert: query.alert(),
        email: String::new(),
        remember_me: false,
        errors: FormErrors::new(),
    }
}

/// Handle login form submission.
///
/// "Remember me" keeps the session cookie across browser restarts; without
/// it the cookie ends with the browser session.
#[instrument(skip_all, fields(remember_me = form.remember()))]
pub async fn login(
    State(state): State<AppState>,
    GuestOnly(mut store): GuestOnly,
    Form(form): Form<LoginForm>,
) -> Response {
    let page = |alert: Option<PageAlert>, errors: FormErrors| LoginTemplate {
        alert,
        email: form.email.trim().to_string(),
        remember_me: form.remember(),
        errors,
    };

    let errors = validate_login(&form);
    if !errors.is_empty() {
        return page(None, errors).into_response();
    }

    let payload = match state
        .backend()
        .public()
        .auth()
        .login(form.email.trim(), &form.password)
        .await
    {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Login failed: {}", e);
            let message = if e.is_unauthorized() || e.status() == Some(400) {
                INVALID_CREDENTIALS.to_string()
            } else {
                e.user_message()
            };
            return page(Some(PageAlert::error(message)), FormErrors::new()).into_response();
        }
    };

    let user = CurrentUser::from(payload.user);
    let user_id = user.id;
    let email = user.email.clone();

    if let Err(e) = store.login(user, payload.tokens, form.remember()).await {
        tracing::error!("Failed to set session: {}", e);
        let alert = PageAlert::error("Could not start your session. Please try again.");
        return page(Some(alert), FormErrors::new()).into_response();
    }

    set_sentry_user(user_id.as_i64(), Some(&email));
    tracing::info!(user_id = %user_id, "User signed in");
    Redirect::to("/").into_response()
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(_guest: GuestOnly) -> impl IntoResponse {
    RegisterTemplate {
        alert: None,
        form: RegisterForm::default(),
        errors: FormErrors::new(),
    }
}

/// Handle registration form submission.
///
/// New accounts are pet owners and are signed in for this browser session.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    GuestOnly(mut store): GuestOnly,
    Form(form): Form<RegisterForm>,
) -> Response {
    let errors = validate_register(&form);
    if !errors.is_empty() {
        return RegisterTemplate {
            alert: None,
            form,
            errors,
        }
        .into_response();
    }

    let phone = non_empty(&form.phone);
    let request = RegisterRequest {
        email: form.email.trim(),
        password: &form.password,
        first_name: form.first_name.trim(),
        last_name: form.last_name.trim(),
        phone: phone.as_deref(),
    };

    let payload = match state.backend().public().auth().register(&request).await {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Registration failed: {}", e);
            return RegisterTemplate {
                alert: Some(PageAlert::error(e.user_message())),
                form,
                errors: FormErrors::new(),
            }
            .into_response();
        }
    };

    let user = CurrentUser::from(payload.user);
    let user_id = user.id;
    if let Err(e) = store.login(user, payload.tokens, false).await {
        tracing::error!("Failed to set session after registration: {}", e);
        return Redirect::to("/auth/login").into_response();
    }

    tracing::info!(user_id = %user_id, "User registered");
    Redirect::to("/").into_response()
}

// =============================================================================
// Password Reset Routes
// =============================================================================

/// Display the forgot password page.
pub async fn forgot_password_page(
    _guest: GuestOnly,
    Query(query): Query<NoticeQuery>,
) -> impl IntoResponse {
    ForgotPasswordTemplate {
        alert: query.alert(),
        email: String::new(),
        errors: FormErrors::new(),
    }
}

/// Handle forgot password form submission.
///
/// The outcome is the same whether or not the address is registered.
#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    _guest: GuestOnly,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    let mut errors = FormErrors::new();
    let Some(email) = errors.email("email", &form.email) else {
        return ForgotPasswordTemplate {
            alert: None,
            email: form.email,
            errors,
        }
        .into_response();
    };

    match state
        .backend()
        .public()
        .auth()
        .forgot_password(email.as_str())
        .await
    {
        Ok(_) => {}
        Err(e) if e.is_server_side() => {
            tracing::error!("Password recovery request failed: {}", e);
            return ForgotPasswordTemplate {
                alert: Some(PageAlert::error(e.user_message())),
                email: form.email,
                errors,
            }
            .into_response();
        }
        Err(e) => tracing::warn!("Password recovery request refused: {}", e),
    }

    Redirect::to("/auth/forgot-password?notice=reset_sent").into_response()
}

/// Display the reset password page.
///
/// Reached from the link in the reset email.
pub async fn reset_password_page(_guest: GuestOnly, Query(query): Query<ResetQuery>) -> Response {
    match query.token.as_deref().and_then(non_empty) {
        Some(token) => ResetPasswordTemplate {
            alert: None,
            token,
            errors: FormErrors::new(),
        }
        .into_response(),
        None => ResetPasswordTemplate {
            alert: Some(PageAlert::error(
                "This reset link is invalid. Please request a new one.",
            )),
            token: String::new(),
            errors: FormErrors::new(),
        }
        .into_response(),
    }
}

/// Handle reset password form submission.
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    _guest: GuestOnly,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    let errors = validate_reset(&form);
    if !errors.is_empty() {
        let alert = errors.get("token").map(|m| PageAlert::error(m.clone()));
        return ResetPasswordTemplate {
            alert,
            token: form.token,
            errors,
        }
        .into_response();
    }

    match state
        .backend()
        .public()
        .auth()
        .reset_password(form.token.trim(), &form.password)
        .await
    {
        Ok(_) => Redirect::to("/auth/login?notice=password_reset").into_response(),
        Err(e) => {
            tracing::warn!("Password reset failed: {}", e);
            ResetPasswordTemplate {
                alert: Some(PageAlert::error(e.user_message())),
                token: form.token,
                errors: FormErrors::new(),
            }
            .into_response()
        }
    }
}

// =============================================================================
// Change Password Routes
// =============================================================================

/// Display the change password page.
#[instrument(skip_all)]
pub async fn change_password_page(RequireAuth(auth): RequireAuth) -> Response {
    render(&ChangePasswordTemplate {
        nav: Nav::new(auth.user(), "/auth/change-password"),
        alert: None,
        errors: FormErrors::new(),
    })
    .into_response()
}

/// Handle change password form submission.
#[instrument(skip_all, fields(user_id = %auth.user().id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    let nav = Nav::new(auth.user(), "/auth/change-password");

    let errors = validate_change(&form);
    if !errors.is_empty() {
        return render(&ChangePasswordTemplate {
            nav,
            alert: None,
            errors,
        })
        .into_response();
    }

    let result = auth
        .api(&state)
        .auth()
        .change_password(&form.current_password, &form.new_password)
        .await;

    match result {
        Ok(_) => Redirect::to("/profile?notice=password_changed").into_response(),
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Password change failed: {}", e);
            render(&ChangePasswordTemplate {
                nav,
                alert: Some(PageAlert::error(e.user_message())),
                errors: FormErrors::new(),
            })
            .into_response()
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// Clears both storage media. Works whether or not a session exists.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    match restore_session(session, &state).await {
        Ok(mut store) => sign_out(&mut store).await,
        Err(e) => tracing::warn!("Failed to read session on logout: {}", e),
    }
    clear_sentry_user();
    Redirect::to("/auth/login?notice=signed_out").into_response()
}

async fn sign_out(store: &mut CookieSessionStore) {
    let user_id = store.user().map(|u| u.id);
    if let Err(e) = store.logout().await {
        tracing::error!("Failed to clear session: {}", e);
        return;
    }
    if let Some(user_id) = user_id {
        tracing::info!(user_id = %user_id, "User signed out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            first_name: "Ana".to_string(),
            last_name: "Ruiz".to_string(),
            email: "ana@example.com".to_string(),
            phone: String::new(),
            password: "kibble2024".to_string(),
            password_confirm: "kibble2024".to_string(),
        }
    }

    #[test]
    fn test_valid_registration_passes() {
        assert!(validate_register(&register_form()).is_empty());
    }

    #[test]
    fn test_registration_rejects_short_password_and_mismatch() {
        let mut form = register_form();
        form.password = "abc1".to_string();
        form.password_confirm = "abc2".to_string();
        let errors = validate_register(&form);
        assert!(errors.has("password"));
        assert!(errors.has("password_confirm"));
    }

    #[test]
    fn test_registration_rejects_blank_names_and_bad_email() {
        let mut form = register_form();
        form.first_name = "  ".to_string();
        form.email = "not-an-email".to_string();
        let errors = validate_register(&form);
        assert!(errors.has("first_name"));
        assert!(errors.has("email"));
        assert!(!errors.has("last_name"));
    }

    #[test]
    fn test_login_requires_both_fields() {
        let errors = validate_login(&LoginForm::default());
        assert!(errors.has("email"));
        assert!(errors.has("password"));
    }

    #[test]
    fn test_change_password_must_differ() {
        let form = ChangePasswordForm {
            current_password: "kibble2024".to_string(),
            new_password: "kibble2024".to_string(),
            new_password_confirm: "kibble2024".to_string(),
        };
        assert!(validate_change(&form).has("new_password"));
    }

    #[test]
    fn test_reset_requires_token() {
        let form = ResetPasswordForm {
            token: String::new(),
            password: "kibble2024".to_string(),
            password_confirm: "kibble2024".to_string(),
        };
        assert!(validate_reset(&form).has("token"));
    }
}
