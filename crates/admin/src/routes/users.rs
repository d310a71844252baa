//! User management route handlers (admin only).

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use vetdesk_core::{FormErrors, Role, UserId};

use crate::backend::{NewUser, User, UserFilter, UserUpdate, display_datetime};
use crate::components::{ConfirmTemplate, Nav, PageAlert, SelectOption, filter_by_query};
use crate::filters;
use crate::middleware::auth::{Authenticated, RequireAdmin};
use crate::state::AppState;

use super::{non_empty, render};

/// User row for list templates.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role_label: String,
    pub is_active: bool,
    pub created: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_i64(),
            name: user.full_name(),
            email: user.email.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            role_label: user.role.label().to_string(),
            is_active: user.is_active,
            created: display_datetime(user.created_at.as_ref()),
        }
    }
}

/// List filters.
#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub q: Option<String>,
    pub role: Option<String>,
    pub notice: Option<String>,
}

/// Create and edit form data.
///
/// Passwords are only set on create; `is_active` only on edit.
#[derive(Debug, Default, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    pub is_active: Option<String>,
}

impl From<&User> for UserForm {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            role: user.role.as_str().to_string(),
            password: String::new(),
            password_confirm: String::new(),
            is_active: user.is_active.then(|| "on".to_string()),
        }
    }
}

/// A validated user form.
struct ValidUser {
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    role: Role,
}

impl UserForm {
    fn validate(&self, is_new: bool) -> Result<ValidUser, FormErrors> {
        let mut errors = FormErrors::new();
        errors
            .length("first_name", "First name", &self.first_name, 2, 50)
            .length("last_name", "Last name", &self.last_name, 2, 50)
            .phone("phone", &self.phone);
        let email = errors.email("email", &self.email);
        let role = errors.choice::<Role>("role", "Role", &self.role);
        if is_new {
            errors.password("password", &self.password).matches(
                "password_confirm",
                &self.password,
                &self.password_confirm,
                "Passwords do not match",
            );
        }

        match (email, role) {
            (Some(email), Some(role)) if errors.is_empty() => Ok(ValidUser {
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                email: email.into_inner(),
                phone: non_empty(&self.phone),
                role,
            }),
            _ => Err(errors),
        }
    }

    fn is_active(&self) -> bool {
        self.is_active.is_some()
    }
}

/// Users list template.
#[derive(Template)]
#[template(path = "users/index.html")]
pub struct UsersIndexTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub users: Vec<UserRow>,
    pub query: String,
    pub role_options: Vec<SelectOption>,
    pub current_user_id: i64,
}

/// User create/edit form template.
#[derive(Template)]
#[template(path = "users/form.html")]
pub struct UserFormTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub title: String,
    pub action: String,
    pub is_new: bool,
    pub form: UserForm,
    pub role_options: Vec<SelectOption>,
    pub errors: FormErrors,
}

impl UserFormTemplate {
    fn new(auth: &Authenticated, id: Option<UserId>, form: UserForm, errors: FormErrors) -> Self {
        let (title, action, path) = match id {
            Some(id) => (
                "Edit user".to_string(),
                format!("/users/{id}"),
                format!("/users/{id}/edit"),
            ),
            None => (
                "New user".to_string(),
                "/users".to_string(),
                "/users/new".to_string(),
            ),
        };
        Self {
            nav: Nav::new(auth.user(), &path),
            alert: None,
            title,
            action,
            is_new: id.is_none(),
            role_options: SelectOption::choices::<Role>(&form.role),
            form,
            errors,
        }
    }

    fn with_alert(mut self, alert: PageAlert) -> Self {
        self.alert = Some(alert);
        self
    }
}

/// Users list page handler.
#[instrument(skip(auth, state))]
pub async fn index(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<UsersQuery>,
) -> Response {
    let role = query
        .role
        .as_deref()
        .and_then(non_empty)
        .and_then(|r| r.parse::<Role>().ok());
    let filter = UserFilter {
        role,
        search: query.q.as_deref().and_then(non_empty),
    };

    let mut alert = query.notice.as_deref().and_then(PageAlert::notice);
    let result = auth.api(&state).users().list(&filter).await;
    let users = match result {
        Ok(page) => page.items,
        Err(e) if e.is_unauthorized() => return auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch users: {e}");
            alert = Some(PageAlert::from_backend(&e));
            Vec::new()
        }
    };

    let mut users = filter_by_query(users, query.q.as_deref());
    if let Some(role) = role {
        users.retain(|u| u.role == role);
    }

    let template = UsersIndexTemplate {
        nav: Nav::new(auth.user(), "/users"),
        alert,
        users: users.iter().map(UserRow::from).collect(),
        query: query.q.unwrap_or_default(),
        role_options: SelectOption::choices::<Role>(role.map_or("", Role::as_str)),
        current_user_id: auth.user().id.as_i64(),
    };

    render(&template).into_response()
}

/// New user form handler.
#[instrument(skip(auth))]
pub async fn new_page(RequireAdmin(auth): RequireAdmin) -> Response {
    let form = UserForm {
        role: Role::Owner.as_str().to_string(),
        ..UserForm::default()
    };
    render(&UserFormTemplate::new(&auth, None, form, FormErrors::new())).into_response()
}

/// Create user handler.
#[instrument(skip(auth, state, form))]
pub async fn create(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<UserForm>,
) -> Response {
    let valid = match form.validate(true) {
        Ok(valid) => valid,
        Err(errors) => {
            return render(&UserFormTemplate::new(&auth, None, form, errors)).into_response();
        }
    };

    let new_user = NewUser {
        email: valid.email,
        first_name: valid.first_name,
        last_name: valid.last_name,
        phone: valid.phone,
        role: valid.role,
        password: form.password.clone(),
    };

    let result = auth.api(&state).users().create(&new_user).await;
    match result {
        Ok(user) => {
            tracing::info!(user_id = %user.id, role = user.role.as_str(), "User created");
            Redirect::to("/users?notice=created").into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to create user: {e}");
            let template = UserFormTemplate::new(&auth, None, form, FormErrors::new())
                .with_alert(PageAlert::error(e.user_message()));
            render(&template).into_response()
        }
    }
}

/// Edit user form handler.
#[instrument(skip(auth, state))]
pub async fn edit_page(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Response {
    let result = auth.api(&state).users().get(id).await;
    match result {
        Ok(user) => {
            let form = UserForm::from(&user);
            render(&UserFormTemplate::new(&auth, Some(id), form, FormErrors::new()))
                .into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch user {id}: {e}");
            let template = UserFormTemplate::new(&auth, Some(id), UserForm::default(), FormErrors::new())
                .with_alert(PageAlert::from_backend(&e));
            render(&template).into_response()
        }
    }
}

/// Update user handler.
#[instrument(skip(auth, state, form))]
pub async fn update(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Form(form): Form<UserForm>,
) -> Response {
    let valid = match form.validate(false) {
        Ok(valid) => valid,
        Err(errors) => {
            return render(&UserFormTemplate::new(&auth, Some(id), form, errors)).into_response();
        }
    };

    // Admins cannot lock themselves out.
    let is_self = id == auth.user().id;
    let update = UserUpdate {
        email: Some(valid.email),
        first_name: Some(valid.first_name),
        last_name: Some(valid.last_name),
        phone: Some(valid.phone.unwrap_or_default()),
        role: (!is_self).then_some(valid.role),
        is_active: (!is_self).then(|| form.is_active()),
    };

    let result = auth.api(&state).users().update(id, &update).await;
    match result {
        Ok(_) => Redirect::to("/users?notice=updated").into_response(),
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to update user {id}: {e}");
            let template = UserFormTemplate::new(&auth, Some(id), form, FormErrors::new())
                .with_alert(PageAlert::error(e.user_message()));
            render(&template).into_response()
        }
    }
}

/// Delete confirmation handler.
#[instrument(skip(auth, state))]
pub async fn delete_confirm(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Response {
    if id == auth.user().id {
        return Redirect::to("/users?notice=cannot_delete_self").into_response();
    }

    let result = auth.api(&state).users().get(id).await;
    let nav = Nav::new(auth.user(), "/users");
    match result {
        Ok(user) => render(&ConfirmTemplate::delete(
            nav,
            "user",
            &user.full_name(),
            format!("/users/{id}/delete"),
            "/users".to_string(),
        ))
        .into_response(),
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch user {id}: {e}");
            let mut template = ConfirmTemplate::delete(
                nav,
                "user",
                &format!("#{id}"),
                format!("/users/{id}/delete"),
                "/users".to_string(),
            );
            template.alert = Some(PageAlert::from_backend(&e));
            render(&template).into_response()
        }
    }
}

/// Delete user handler.
#[instrument(skip(auth, state))]
pub async fn delete(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Response {
    if id == auth.user().id {
        return Redirect::to("/users?notice=cannot_delete_self").into_response();
    }

    let result = auth.api(&state).users().delete(id).await;
    match result {
        Ok(()) => {
            tracing::info!(user_id = %id, "User deleted");
            Redirect::to("/users?notice=deleted").into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to delete user {id}: {e}");
            let mut template = ConfirmTemplate::delete(
                Nav::new(auth.user(), "/users"),
                "user",
                &format!("#{id}"),
                format!("/users/{id}/delete"),
                "/users".to_string(),
            );
            template.alert = Some(PageAlert::error(e.user_message()));
            render(&template).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> UserForm {
        UserForm {
            first_name: "Marta".to_string(),
            last_name: "Soto".to_string(),
            email: "marta@clinic.vet".to_string(),
            phone: "+34 600 123 456".to_string(),
            role: "veterinarian".to_string(),
            password: "stetho5cope".to_string(),
            password_confirm: "stetho5cope".to_string(),
            is_active: Some("on".to_string()),
        }
    }

    #[test]
    fn test_valid_form() {
        let valid = form().validate(true).ok().map(|v| (v.role, v.phone));
        assert_eq!(
            valid,
            Some((Role::Veterinarian, Some("+34 600 123 456".to_string())))
        );
    }

    #[test]
    fn test_password_only_checked_on_create() {
        let mut form = form();
        form.password = String::new();
        form.password_confirm = String::new();
        assert!(form.validate(true).is_err());
        assert!(form.validate(false).is_ok());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let mut form = form();
        form.role = "superuser".to_string();
        let errors = form.validate(false).err().unwrap_or_default();
        assert!(errors.has("role"));
    }
}
