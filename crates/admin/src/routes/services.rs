//! Service catalogue route handlers.
//!
//! Everyone signed in can browse the catalogue; only admins change it.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use vetdesk_core::validation::parse_bounded_u32;
use vetdesk_core::{FormErrors, ServiceId};

use crate::backend::{ClinicService, ServiceInput};
use crate::components::{ConfirmTemplate, Nav, PageAlert, SelectOption, filter_by_query};
use crate::filters;
use crate::middleware::auth::{Authenticated, RequireAdmin, RequireAuth};
use crate::state::AppState;

use super::{non_empty, render};

/// Shortest and longest bookable slot, in minutes.
const MIN_DURATION: u32 = 5;
const MAX_DURATION: u32 = 480;

/// Service row for list templates.
#[derive(Debug, Clone)]
pub struct ServiceRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: String,
    pub duration: String,
    pub is_active: bool,
}

impl From<&ClinicService> for ServiceRow {
    fn from(service: &ClinicService) -> Self {
        Self {
            id: service.id.as_i64(),
            name: service.name.clone(),
            description: service.description.clone().unwrap_or_default(),
            price: service.price.to_string(),
            duration: format!("{} min", service.duration_minutes),
            is_active: service.is_active,
        }
    }
}

/// List filters.
#[derive(Debug, Default, Deserialize)]
pub struct ServicesQuery {
    pub q: Option<String>,
    /// `active`, `inactive`, or blank for all.
    pub active: Option<String>,
    pub notice: Option<String>,
}

impl ServicesQuery {
    fn active_filter(&self) -> Option<bool> {
        match self.active.as_deref().map(str::trim) {
            Some("active") => Some(true),
            Some("inactive") => Some(false),
            _ => None,
        }
    }
}

/// Create and edit form data.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub duration_minutes: String,
    pub is_active: Option<String>,
}

impl From<&ClinicService> for ServiceForm {
    fn from(service: &ClinicService) -> Self {
        Self {
            name: service.name.clone(),
            description: service.description.clone().unwrap_or_default(),
            price: format!("{:.2}", service.price.amount()),
            duration_minutes: service.duration_minutes.to_string(),
            is_active: service.is_active.then(|| "on".to_string()),
        }
    }
}

impl ServiceForm {
    /// Blank form for a new service, active by default.
    fn new_service() -> Self {
        Self {
            duration_minutes: "30".to_string(),
            is_active: Some("on".to_string()),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<ServiceInput, FormErrors> {
        let mut errors = FormErrors::new();
        errors
            .length("name", "Name", &self.name, 2, 100)
            .length("description", "Description", &self.description, 0, 500);
        let price = errors.price("price", &self.price);
        let duration = errors.check(
            "duration_minutes",
            parse_bounded_u32("Duration", &self.duration_minutes, MIN_DURATION, MAX_DURATION),
        );

        match (price, duration) {
            (Some(price), Some(duration_minutes)) if errors.is_empty() => Ok(ServiceInput {
                name: self.name.trim().to_string(),
                description: non_empty(&self.description),
                price,
                duration_minutes,
                is_active: self.is_active.is_some(),
            }),
            _ => Err(errors),
        }
    }
}

/// Service catalogue template.
#[derive(Template)]
#[template(path = "services/index.html")]
pub struct ServicesIndexTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub services: Vec<ServiceRow>,
    pub query: String,
    pub active_options: Vec<SelectOption>,
    pub can_manage: bool,
}

/// Service create/edit form template.
#[derive(Template)]
#[template(path = "services/form.html")]
pub struct ServiceFormTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub title: String,
    pub action: String,
    pub form: ServiceForm,
    pub errors: FormErrors,
}

impl ServiceFormTemplate {
    fn new(
        auth: &Authenticated,
        id: Option<ServiceId>,
        form: ServiceForm,
        errors: FormErrors,
    ) -> Self {
        let (title, action, path) = match id {
            Some(id) => (
                "Edit service".to_string(),
                format!("/services/{id}"),
                format!("/services/{id}/edit"),
            ),
            None => (
                "New service".to_string(),
                "/services".to_string(),
                "/services/new".to_string(),
            ),
        };
        Self {
            nav: Nav::new(auth.user(), &path),
            alert: None,
            title,
            action,
            form,
            errors,
        }
    }

    fn with_alert(mut self, alert: PageAlert) -> Self {
        self.alert = Some(alert);
        self
    }
}

/// Service catalogue handler.
#[instrument(skip(auth, state))]
pub async fn index(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ServicesQuery>,
) -> Response {
    let mut alert = query.notice.as_deref().and_then(PageAlert::notice);
    let result = auth.api(&state).services().list().await;
    let services = match result {
        Ok(page) => page.items,
        Err(e) if e.is_unauthorized() => return auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch services: {e}");
            alert = Some(PageAlert::from_backend(&e));
            Vec::new()
        }
    };

    let mut services = filter_by_query(services, query.q.as_deref());
    if let Some(active) = query.active_filter() {
        services.retain(|s| s.is_active == active);
    }
    services.sort_by_key(|s| s.name.to_lowercase());

    let template = ServicesIndexTemplate {
        nav: Nav::new(auth.user(), "/services"),
        alert,
        services: services.iter().map(ServiceRow::from).collect(),
        active_options: SelectOption::list(
            [("active", "Active"), ("inactive", "Inactive")],
            query.active.as_deref().unwrap_or_default(),
        ),
        query: query.q.unwrap_or_default(),
        can_manage: auth.user().is_admin(),
    };

    render(&template).into_response()
}

/// New service form handler.
#[instrument(skip(auth))]
pub async fn new_page(RequireAdmin(auth): RequireAdmin) -> Response {
    render(&ServiceFormTemplate::new(
        &auth,
        None,
        ServiceForm::new_service(),
        FormErrors::new(),
    ))
    .into_response()
}

/// Create service handler.
#[instrument(skip(auth, state, form))]
pub async fn create(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<ServiceForm>,
) -> Response {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return render(&ServiceFormTemplate::new(&auth, None, form, errors)).into_response();
        }
    };

    let result = auth.api(&state).services().create(&input).await;
    match result {
        Ok(service) => {
            tracing::info!(service_id = %service.id, "Service created");
            Redirect::to("/services?notice=created").into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to create service: {e}");
            let template = ServiceFormTemplate::new(&auth, None, form, FormErrors::new())
                .with_alert(PageAlert::error(e.user_message()));
            render(&template).into_response()
        }
    }
}

/// Edit service form handler.
#[instrument(skip(auth, state))]
pub async fn edit_page(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ServiceId>,
) -> Response {
    let result = auth.api(&state).services().get(id).await;
    match result {
        Ok(service) => render(&ServiceFormTemplate::new(
            &auth,
            Some(id),
            ServiceForm::from(&service),
            FormErrors::new(),
        ))
        .into_response(),
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch service {id}: {e}");
            let template =
                ServiceFormTemplate::new(&auth, Some(id), ServiceForm::default(), FormErrors::new())
                    .with_alert(PageAlert::from_backend(&e));
            render(&template).into_response()
        }
    }
}

/// Update service handler.
#[instrument(skip(auth, state, form))]
pub async fn update(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ServiceId>,
    Form(form): Form<ServiceForm>,
) -> Response {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return render(&ServiceFormTemplate::new(&auth, Some(id), form, errors))
                .into_response();
        }
    };

    let result = auth.api(&state).services().update(id, &input).await;
    match result {
        Ok(_) => Redirect::to("/services?notice=updated").into_response(),
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to update service {id}: {e}");
            let template = ServiceFormTemplate::new(&auth, Some(id), form, FormErrors::new())
                .with_alert(PageAlert::error(e.user_message()));
            render(&template).into_response()
        }
    }
}

fn delete_page(auth: &Authenticated, id: ServiceId, name: &str) -> ConfirmTemplate {
    ConfirmTemplate::delete(
        Nav::new(auth.user(), "/services"),
        "service",
        name,
        format!("/services/{id}/delete"),
        "/services".to_string(),
    )
}

/// Delete confirmation handler.
#[instrument(skip(auth, state))]
pub async fn delete_confirm(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ServiceId>,
) -> Response {
    let result = auth.api(&state).services().get(id).await;
    match result {
        Ok(service) => render(&delete_page(&auth, id, &service.name)).into_response(),
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch service {id}: {e}");
            let mut template = delete_page(&auth, id, &format!("#{id}"));
            template.alert = Some(PageAlert::from_backend(&e));
            render(&template).into_response()
        }
    }
}

/// Delete service handler.
#[instrument(skip(auth, state))]
pub async fn delete(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ServiceId>,
) -> Response {
    let result = auth.api(&state).services().delete(id).await;
    match result {
        Ok(()) => {
            tracing::info!(service_id = %id, "Service deleted");
            Redirect::to("/services?notice=deleted").into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to delete service {id}: {e}");
            let mut template = delete_page(&auth, id, &format!("#{id}"));
            template.alert = Some(PageAlert::error(e.user_message()));
            render(&template).into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ServiceForm {
        ServiceForm {
            name: "Vaccination".to_string(),
            description: "  ".to_string(),
            price: "$45.5".to_string(),
            duration_minutes: "15".to_string(),
            is_active: None,
        }
    }

    #[test]
    fn test_valid_form_builds_input() {
        let input = form().validate().unwrap();
        assert_eq!(input.price.to_string(), "$45.50");
        assert_eq!(input.duration_minutes, 15);
        assert_eq!(input.description, None);
        assert!(!input.is_active);
    }

    #[test]
    fn test_rejects_bad_price_and_duration() {
        let mut form = form();
        form.price = "-2".to_string();
        form.duration_minutes = "600".to_string();
        let errors = form.validate().unwrap_err();
        assert!(errors.has("price"));
        assert!(errors.has("duration_minutes"));
    }

    #[test]
    fn test_active_filter() {
        let query = |active: &str| ServicesQuery {
            active: Some(active.to_string()),
            ..ServicesQuery::default()
        };
        assert_eq!(query("active").active_filter(), Some(true));
        assert_eq!(query("inactive").active_filter(), Some(false));
        assert_eq!(query("").active_filter(), None);
    }

    #[test]
    fn test_edit_form_keeps_price_digits() {
        let service: ClinicService = serde_json::from_value(serde_json::json!({
            "id": 4, "name": "Dental cleaning", "price": "120", "durationMinutes": 60
        }))
        .unwrap();
        let form = ServiceForm::from(&service);
        assert_eq!(form.price, "120.00");
        assert!(form.is_active.is_some());
    }
}
