//! Sidebar navigation.

use crate::models::CurrentUser;

/// Navigation state for the page layout.
///
/// Links are shown by role; the handlers enforce the same rules again.
#[derive(Debug, Clone)]
pub struct Nav {
    pub name: String,
    pub email: String,
    pub role_label: String,
    pub current_path: String,
    pub show_users: bool,
    pub show_consultations: bool,
    pub show_triage: bool,
    pub can_manage_services: bool,
}

impl Nav {
    /// Navigation for `user` on the page at `current_path`.
    #[must_use]
    pub fn new(user: &CurrentUser, current_path: &str) -> Self {
        Self {
            name: user.display_name(),
            email: user.email.clone(),
            role_label: user.role.label().to_string(),
            current_path: current_path.to_string(),
            show_users: user.is_admin(),
            show_consultations: user.is_clinician(),
            show_triage: user.is_staff(),
            can_manage_services: user.is_admin(),
        }
    }

    /// Whether `section` is the current page or one of its children.
    #[must_use]
    pub fn is_active(&self, section: &str) -> bool {
        if section == "/" {
            return self.current_path == "/";
        }
        self.current_path == section
            || self
                .current_path
                .strip_prefix(section)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}
