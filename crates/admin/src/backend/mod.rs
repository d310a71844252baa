//! Clinic REST API client.
//!
//! One [`BackendClient`] is shared by the whole process. Handlers scope it to
//! a caller with [`BackendClient::with_token`] (or [`BackendClient::public`]
//! for the login and password-reset flows) and then reach the per-resource
//! service wrappers:
//!
//! ```rust,ignore
//! let api = state.backend().with_token(auth.token());
//! let pets = api.pets().list(&PetFilter::default()).await?;
//! ```
//!
//! Every response goes through [`envelope`], which accepts both
//! `{ success, data, message }` and bare `{ data }` bodies.

mod appointments;
mod auth;
mod client;
mod consultations;
mod dashboard;
mod decorators;
pub mod envelope;
mod pets;
mod services;
mod triage;
pub mod types;
mod users;

pub use appointments::{AppointmentFilter, Appointments};
pub use auth::Auth;
pub use client::{Api, BackendClient};
pub use consultations::{ConsultationFilter, Consultations};
pub use dashboard::Dashboard;
pub use decorators::Decorators;
pub use envelope::ListPage;
pub use pets::{PetFilter, Pets};
pub use services::Services;
pub use triage::TriageQueue;
pub use types::*;
pub use users::{UserFilter, Users};

use thiserror::Error;

/// Fallback banner text when nothing more specific is known.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors that can occur when calling the clinic API.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the input (400).
    #[error("Validation failed: {}", .0.as_deref().unwrap_or("no details"))]
    Validation(Option<String>),

    /// Missing or expired credentials (401).
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed (403).
    #[error("Forbidden: {}", .0.as_deref().unwrap_or("no details"))]
    Forbidden(Option<String>),

    /// Resource not found (404).
    #[error("Not found")]
    NotFound,

    /// Any other error status.
    #[error("API error: {status} - {}", .message.as_deref().unwrap_or("no details"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// The body was not in a shape we understand.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The API answered `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The base URL and path could not be joined.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl BackendError {
    /// Text shown in the page's alert banner.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone().unwrap_or_else(|| {
                "Some of the information provided is invalid. Please check the form and try again."
                    .to_string()
            }),
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            Self::Forbidden(_) => "You do not have permission to perform this action.".to_string(),
            Self::NotFound => "The requested record could not be found.".to_string(),
            Self::Rejected(message) => message.clone(),
            Self::Api {
                message: Some(message),
                status,
            } if *status < 500 => message.clone(),
            Self::Http(e) if e.is_timeout() => {
                "The clinic server took too long to respond. Please try again.".to_string()
            }
            Self::Http(_) => {
                "The clinic server could not be reached. Please try again.".to_string()
            }
            Self::Api { .. } | Self::Parse(_) | Self::Url(_) => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// HTTP status reported by the API, if the call got that far.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Validation(_) => Some(400),
            Self::Unauthorized => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound => Some(404),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure is on our side or the API's rather than the user's.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the caller's credentials were refused.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_by_status() {
        assert_eq!(
            BackendError::Forbidden(Some("role admin required".to_string())).user_message(),
            "You do not have permission to perform this action."
        );
        assert_eq!(
            BackendError::NotFound.user_message(),
            "The requested record could not be found."
        );
        assert_eq!(
            BackendError::Validation(Some("Email already registered".to_string())).user_message(),
            "Email already registered"
        );
        assert!(
            BackendError::Validation(None)
                .user_message()
                .contains("check the form")
        );
    }

    #[test]
    fn test_user_message_fallbacks() {
        assert_eq!(
            BackendError::Api {
                status: 409,
                message: Some("Slot already booked".to_string())
            }
            .user_message(),
            "Slot already booked"
        );
        assert_eq!(
            BackendError::Api {
                status: 500,
                message: Some("NullPointerException at line 3".to_string())
            }
            .user_message(),
            GENERIC_ERROR_MESSAGE
        );
        assert_eq!(
            BackendError::Parse("bad".to_string()).user_message(),
            GENERIC_ERROR_MESSAGE
        );
        assert_eq!(
            BackendError::Rejected("Pet has open appointments".to_string()).user_message(),
            "Pet has open appointments"
        );
    }

    #[test]
    fn test_status_and_classification() {
        assert_eq!(BackendError::NotFound.status(), Some(404));
        assert_eq!(BackendError::Parse(String::new()).status(), None);
        assert!(
            BackendError::Api {
                status: 502,
                message: None
            }
            .is_server_side()
        );
        assert!(!BackendError::Forbidden(None).is_server_side());
        assert!(BackendError::Unauthorized.is_unauthorized());
    }
}
