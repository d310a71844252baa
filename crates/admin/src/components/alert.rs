//! Page alert banners.
//!
//! Every page can show one banner above its content. Load failures carry a
//! "Reload" link; form failures do not, since reloading would drop the input.
//! Redirect-after-post flows pass a short `?notice=` code instead of the text.

use serde::Deserialize;

use crate::backend::BackendError;

/// Visual style of a banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Info,
    Error,
}

impl AlertKind {
    /// CSS modifier class used by `alert--*` styles.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "alert--success",
            Self::Info => "alert--info",
            Self::Error => "alert--error",
        }
    }
}

/// A banner shown at the top of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAlert {
    pub kind: AlertKind,
    pub message: String,
    /// Offer a "Reload" link.
    pub reload: bool,
}

impl PageAlert {
    /// Green confirmation banner.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Success,
            message: message.into(),
            reload: false,
        }
    }

    /// Neutral information banner.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Info,
            message: message.into(),
            reload: false,
        }
    }

    /// Error banner for a rejected form submission.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Error,
            message: message.into(),
            reload: false,
        }
    }

    /// Error banner for data that failed to load.
    #[must_use]
    pub fn from_backend(err: &BackendError) -> Self {
        Self {
            kind: AlertKind::Error,
            message: err.user_message(),
            reload: true,
        }
    }

    /// Banner for a `?notice=` code, if the code is known.
    #[must_use]
    pub fn notice(code: &str) -> Option<Self> {
        let alert = match code {
            "created" => Self::success("Record created."),
            "updated" => Self::success("Changes saved."),
            "deleted" => Self::success("Record deleted."),
            "cancelled" => Self::success("Appointment cancelled."),
            "status_updated" => Self::success("Status updated."),
            "decorator_added" => Self::success("Note added to the appointment."),
            "decorator_removed" => Self::success("Note removed from the appointment."),
            "profile_updated" => Self::success("Your profile has been updated."),
            "password_changed" => Self::success("Your password has been changed."),
            "password_reset" => Self::success("Your password has been reset. Please sign in."),
            "reset_sent" => Self::info(
                "If an account exists for that address, a reset link is on its way.",
            ),
            "signed_out" => Self::info("You have been signed out."),
            "session_expired" => Self::info("Your session has expired. Please sign in again."),
            "cannot_delete_self" => Self::error("You cannot delete your own account."),
            "closed" => Self::error("This appointment is closed and can no longer be changed."),
            _ => return None,
        };
        Some(alert)
    }
}

/// The `?notice=` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

impl NoticeQuery {
    /// Banner for the notice, if any.
    #[must_use]
    pub fn alert(&self) -> Option<PageAlert> {
        self.notice.as_deref().and_then(PageAlert::notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_errors_offer_reload() {
        let alert = PageAlert::from_backend(&BackendError::NotFound);
        assert_eq!(alert.kind, AlertKind::Error);
        assert!(alert.reload);
        assert_eq!(alert.message, "The requested record could not be found.");
    }

    #[test]
    fn test_notice_codes() {
        let query = NoticeQuery {
            notice: Some("deleted".to_string()),
        };
        assert_eq!(query.alert().map(|a| a.kind), Some(AlertKind::Success));

        assert_eq!(PageAlert::notice("<script>"), None);
        assert_eq!(NoticeQuery::default().alert(), None);
        assert_eq!(
            PageAlert::notice("cannot_delete_self").map(|a| a.kind),
            Some(AlertKind::Error)
        );
    }
}
