//! HTTP route handlers for the clinic front end.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Health check
//!
//! # Auth (public-only unless noted)
//! GET  /auth/login                  - Login page
//! POST /auth/login                  - Login action ("remember me" picks the cookie lifetime)
//! GET  /auth/register               - Registration page
//! POST /auth/register               - Registration action
//! GET  /auth/forgot-password        - Request a reset link
//! POST /auth/forgot-password        - Send the reset link
//! GET  /auth/reset-password?token=  - Choose a new password
//! POST /auth/reset-password         - Reset action
//! GET  /auth/change-password        - Change password (signed in)
//! POST /auth/change-password        - Change action (signed in)
//! POST /auth/logout                 - Logout
//!
//! # Signed in
//! GET  /                            - Role-specific dashboard
//! GET  /profile                     - Own profile
//! POST /profile                     - Update own name and phone
//!
//! # Users (admin)
//! GET  /users                       - List (?q=, ?role=)
//! GET  /users/new                   - Create form
//! POST /users                       - Create
//! GET  /users/{id}/edit             - Edit form
//! POST /users/{id}                  - Update
//! GET  /users/{id}/delete           - Confirm delete
//! POST /users/{id}/delete           - Delete
//!
//! # Pets (owners see their own)
//! GET  /pets                        - List (?q=, ?species=)
//! GET  /pets/new | POST /pets       - Create
//! GET  /pets/{id}/edit | POST /pets/{id}      - Edit
//! GET  /pets/{id}/delete | POST /pets/{id}/delete  - Delete (staff)
//!
//! # Services (writes are admin only)
//! GET  /services                    - List (?q=, ?active=)
//! GET  /services/new | POST /services
//! GET  /services/{id}/edit | POST /services/{id}
//! GET  /services/{id}/delete | POST /services/{id}/delete
//!
//! # Appointments
//! GET  /appointments                - List (?status=, ?date=, ?q=)
//! GET  /appointments/new | POST /appointments
//! GET  /appointments/{id}           - Detail with decorators
//! GET  /appointments/{id}/edit | POST /appointments/{id}    (staff)
//! POST /appointments/{id}/status    - Status change (staff)
//! GET  /appointments/{id}/cancel | POST /appointments/{id}/cancel
//! GET  /appointments/{id}/delete | POST /appointments/{id}/delete  (admin)
//! POST /appointments/{id}/decorators                       (staff)
//! POST /appointments/{id}/decorators/{did}/delete          (staff)
//!
//! # Consultations (veterinarian, admin)
//! GET  /consultations               - List (?q=, ?pet_id=)
//! GET  /consultations/new | POST /consultations
//! GET  /consultations/{id}/edit | POST /consultations/{id}
//!
//! # Triage (staff)
//! GET  /triage                      - Queue (?status=)
//! GET  /triage/new | POST /triage
//! GET  /triage/{id}/edit | POST /triage/{id}
//! ```

pub mod appointments;
pub mod auth;
pub mod consultations;
pub mod dashboard;
pub mod pets;
pub mod profile;
pub mod services;
pub mod triage;
pub mod users;

use askama::Template;
use axum::{
    Router,
    response::Html,
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// Render a template; failures become a logged 500.
pub(crate) fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}

/// Treat blank form and query values as absent.
pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route(
            "/forgot-password",
            get(auth::forgot_password_page).post(auth::forgot_password),
        )
        .route(
            "/reset-password",
            get(auth::reset_password_page).post(auth::reset_password),
        )
        .route(
            "/change-password",
            get(auth::change_password_page).post(auth::change_password),
        )
        .route("/logout", post(auth::logout))
}

/// Create the user management routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index).post(users::create))
        .route("/new", get(users::new_page))
        .route("/{id}", post(users::update))
        .route("/{id}/edit", get(users::edit_page))
        .route(
            "/{id}/delete",
            get(users::delete_confirm).post(users::delete),
        )
}

/// Create the pet routes router.
pub fn pet_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pets::index).post(pets::create))
        .route("/new", get(pets::new_page))
        .route("/{id}", post(pets::update))
        .route("/{id}/edit", get(pets::edit_page))
        .route("/{id}/delete", get(pets::delete_confirm).post(pets::delete))
}

/// Create the service catalogue routes router.
pub fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(services::index).post(services::create))
        .route("/new", get(services::new_page))
        .route("/{id}", post(services::update))
        .route("/{id}/edit", get(services::edit_page))
        .route(
            "/{id}/delete",
            get(services::delete_confirm).post(services::delete),
        )
}

/// Create the appointment routes router.
pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(appointments::index).post(appointments::create))
        .route("/new", get(appointments::new_page))
        .route(
            "/{id}",
            get(appointments::show).post(appointments::update),
        )
        .route("/{id}/edit", get(appointments::edit_page))
        .route("/{id}/status", post(appointments::update_status))
        .route(
            "/{id}/cancel",
            get(appointments::cancel_confirm).post(appointments::cancel),
        )
        .route(
            "/{id}/delete",
            get(appointments::delete_confirm).post(appointments::delete),
        )
        .route("/{id}/decorators", post(appointments::add_decorator))
        .route(
            "/{id}/decorators/{decorator_id}/delete",
            post(appointments::remove_decorator),
        )
}

/// Create the consultation routes router.
pub fn consultation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(consultations::index).post(consultations::create))
        .route("/new", get(consultations::new_page))
        .route("/{id}", post(consultations::update))
        .route("/{id}/edit", get(consultations::edit_page))
}

/// Create the triage routes router.
pub fn triage_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(triage::index).post(triage::create))
        .route("/new", get(triage::new_page))
        .route("/{id}", post(triage::update))
        .route("/{id}/edit", get(triage::edit_page))
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/profile", get(profile::show).post(profile::update))
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/pets", pet_routes())
        .nest("/services", service_routes())
        .nest("/appointments", appointment_routes())
        .nest("/consultations", consultation_routes())
        .nest("/triage", triage_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  dog "), Some("dog".to_string()));
        assert_eq!(non_empty("   "), None);
        assert_eq!(non_empty(""), None);
    }
}
