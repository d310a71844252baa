//! Confirmation page for destructive actions.
//!
//! Deletes and cancellations are two-step: a GET renders this page, and its
//! form POSTs to the same path to carry out the action.

use askama::Template;

use crate::filters;

use super::{Nav, PageAlert};

/// Confirmation page template.
#[derive(Template)]
#[template(path = "confirm.html")]
pub struct ConfirmTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub title: String,
    pub message: String,
    /// Path the confirm button posts to.
    pub action: String,
    pub confirm_label: String,
    pub cancel_href: String,
}

impl ConfirmTemplate {
    /// Confirmation for deleting the record at `action`.
    #[must_use]
    pub fn delete(nav: Nav, what: &str, name: &str, action: String, cancel_href: String) -> Self {
        Self {
            nav,
            alert: None,
            title: format!("Delete {what}"),
            message: format!("Delete {what} \u{201c}{name}\u{201d}? This cannot be undone."),
            action,
            confirm_label: "Delete".to_string(),
            cancel_href,
        }
    }
}
