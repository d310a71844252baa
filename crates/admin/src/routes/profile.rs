//! Own profile page.

use askama::Template;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use vetdesk_core::FormErrors;

use crate::backend::UserUpdate;
use crate::components::{Nav, NoticeQuery, PageAlert};
use crate::filters;
use crate::middleware::auth::{Authenticated, RequireAuth};
use crate::models::CurrentUser;
use crate::state::AppState;

use super::{non_empty, render};

/// Profile form data. Email and role are managed by admins.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
}

impl From<&CurrentUser> for ProfileForm {
    fn from(user: &CurrentUser) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone().unwrap_or_default(),
        }
    }
}

impl ProfileForm {
    fn validate(&self) -> Result<UserUpdate, FormErrors> {
        let mut errors = FormErrors::new();
        errors
            .length("first_name", "First name", &self.first_name, 2, 50)
            .length("last_name", "Last name", &self.last_name, 2, 50)
            .phone("phone", &self.phone);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(UserUpdate {
            first_name: Some(self.first_name.trim().to_string()),
            last_name: Some(self.last_name.trim().to_string()),
            // Blank clears the number.
            phone: Some(non_empty(&self.phone).unwrap_or_default()),
            ..UserUpdate::default()
        })
    }
}

/// Profile page template.
#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub email: String,
    pub role_label: String,
    pub form: ProfileForm,
    pub errors: FormErrors,
}

impl ProfileTemplate {
    fn new(auth: &Authenticated, form: ProfileForm, errors: FormErrors) -> Self {
        let user = auth.user();
        Self {
            nav: Nav::new(user, "/profile"),
            alert: None,
            email: user.email.clone(),
            role_label: user.role.label().to_string(),
            form,
            errors,
        }
    }
}

/// Profile page handler.
///
/// Re-reads the account from the API so edits made by an admin show up
/// without signing in again. The cached identity is used if that fails.
#[instrument(skip(auth, state))]
pub async fn show(
    RequireAuth(mut auth): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> Response {
    let result = auth.api(&state).auth().me().await;
    match result {
        Ok(user) => {
            let fresh = CurrentUser::from(user);
            if &fresh != auth.user()
                && let Err(e) = auth.update_user(fresh).await
            {
                tracing::error!("Failed to store refreshed profile in session: {e}");
            }
        }
        Err(e) if e.is_unauthorized() => return auth.sign_out().await,
        Err(e) => tracing::warn!("Failed to refresh profile, showing cached copy: {e}"),
    }

    let form = ProfileForm::from(auth.user());
    let mut template = ProfileTemplate::new(&auth, form, FormErrors::new());
    template.alert = query.alert();
    render(&template).into_response()
}

/// Profile update handler.
#[instrument(skip(auth, state, form))]
pub async fn update(
    RequireAuth(mut auth): RequireAuth,
    State(state): State<AppState>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let update = match form.validate() {
        Ok(update) => update,
        Err(errors) => return render(&ProfileTemplate::new(&auth, form, errors)).into_response(),
    };

    let id = auth.user().id;
    let result = auth.api(&state).users().update(id, &update).await;
    match result {
        Ok(user) => {
            if let Err(e) = auth.update_user(CurrentUser::from(user)).await {
                tracing::error!("Failed to store updated profile in session: {e}");
            }
            tracing::info!(user_id = %id, "Profile updated");
            Redirect::to("/profile?notice=profile_updated").into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to update profile: {e}");
            let mut template = ProfileTemplate::new(&auth, form, FormErrors::new());
            template.alert = Some(PageAlert::error(e.user_message()));
            render(&template).into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_only_touches_own_fields() {
        let form = ProfileForm {
            first_name: " Ana ".to_string(),
            last_name: "Ruiz".to_string(),
            phone: "  ".to_string(),
        };
        let update = form.validate().unwrap();
        assert_eq!(update.first_name.as_deref(), Some("Ana"));
        assert_eq!(update.phone.as_deref(), Some(""));
        assert!(update.email.is_none());
        assert!(update.role.is_none());
        assert!(update.is_active.is_none());
    }

    #[test]
    fn test_profile_rejects_bad_phone() {
        let form = ProfileForm {
            first_name: "Ana".to_string(),
            last_name: "R".to_string(),
            phone: "call me".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("last_name"));
        assert!(errors.has("phone"));
    }
}
