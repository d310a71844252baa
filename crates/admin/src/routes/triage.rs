//! Triage queue route handlers (staff).
//!
//! The queue is shown most urgent first: severity, then arrival time.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use vetdesk_core::{FormErrors, PetId, TriageId, TriageSeverity, TriageStatus};

use crate::backend::{PetFilter, Triage, TriageInput, display_datetime, sort_by_urgency};
use crate::components::{Nav, PageAlert, SelectOption, filter_by_query};
use crate::filters;
use crate::middleware::auth::{Authenticated, RequireStaff};
use crate::state::AppState;

use super::{non_empty, render};

/// Triage row for list templates.
#[derive(Debug, Clone)]
pub struct TriageRow {
    pub id: i64,
    pub pet_name: String,
    pub severity_label: String,
    pub severity_badge: String,
    pub symptoms: String,
    pub notes: String,
    pub status_label: String,
    pub status_badge: String,
    pub arrived: String,
}

impl From<&Triage> for TriageRow {
    fn from(record: &Triage) -> Self {
        Self {
            id: record.id.as_i64(),
            pet_name: record
                .pet_name
                .clone()
                .unwrap_or_else(|| format!("Pet #{}", record.pet_id)),
            severity_label: record.severity.label().to_string(),
            severity_badge: record.severity.badge_class().to_string(),
            symptoms: record.symptoms.clone(),
            notes: record.notes.clone().unwrap_or_default(),
            status_label: record.status.label().to_string(),
            status_badge: record.status.badge_class().to_string(),
            arrived: display_datetime(record.created_at.as_ref()),
        }
    }
}

/// Queue filters.
#[derive(Debug, Default, Deserialize)]
pub struct TriageQuery {
    pub status: Option<String>,
    pub severity: Option<String>,
    pub q: Option<String>,
    pub notice: Option<String>,
}

/// Create and edit form data.
#[derive(Debug, Default, Deserialize)]
pub struct TriageForm {
    #[serde(default)]
    pub pet_id: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: String,
}

impl From<&Triage> for TriageForm {
    fn from(record: &Triage) -> Self {
        Self {
            pet_id: record.pet_id.to_string(),
            severity: record.severity.as_str().to_string(),
            symptoms: record.symptoms.clone(),
            notes: record.notes.clone().unwrap_or_default(),
            status: record.status.as_str().to_string(),
        }
    }
}

impl TriageForm {
    /// Blank intake form: new arrivals wait.
    fn intake() -> Self {
        Self {
            severity: TriageSeverity::Medium.as_str().to_string(),
            status: TriageStatus::Waiting.as_str().to_string(),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<TriageInput, FormErrors> {
        let mut errors = FormErrors::new();
        let pet_id = self.pet_id.trim().parse::<PetId>().ok();
        if pet_id.is_none() {
            errors.add("pet_id", "Pet is required");
        }
        let severity = errors.choice::<TriageSeverity>("severity", "Severity", &self.severity);
        let status = errors.choice::<TriageStatus>("status", "Status", &self.status);
        errors
            .length("symptoms", "Symptoms", &self.symptoms, 3, 500)
            .length("notes", "Notes", &self.notes, 0, 1000);

        match (pet_id, severity, status) {
            (Some(pet_id), Some(severity), Some(status)) if errors.is_empty() => Ok(TriageInput {
                pet_id,
                severity,
                symptoms: self.symptoms.trim().to_string(),
                notes: non_empty(&self.notes),
                status,
            }),
            _ => Err(errors),
        }
    }
}

/// Triage queue template.
#[derive(Template)]
#[template(path = "triage/index.html")]
pub struct TriageIndexTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub records: Vec<TriageRow>,
    pub query: String,
    pub status_options: Vec<SelectOption>,
    pub severity_options: Vec<SelectOption>,
}

/// Triage create/edit form template.
#[derive(Template)]
#[template(path = "triage/form.html")]
pub struct TriageFormTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub title: String,
    pub action: String,
    pub form: TriageForm,
    pub pet_options: Vec<SelectOption>,
    pub severity_options: Vec<SelectOption>,
    pub status_options: Vec<SelectOption>,
    pub errors: FormErrors,
}

async fn form_page(
    auth: &Authenticated,
    state: &AppState,
    id: Option<TriageId>,
    form: TriageForm,
    errors: FormErrors,
) -> TriageFormTemplate {
    let mut alert = None;
    let result = auth.api(state).pets().list(&PetFilter::default()).await;
    let pet_options = match result {
        Ok(page) => SelectOption::list(
            page.items.iter().map(|p| {
                let label = match &p.owner_name {
                    Some(owner) => format!("{} ({owner})", p.name),
                    None => p.name.clone(),
                };
                (p.id.to_string(), label)
            }),
            &form.pet_id,
        ),
        Err(e) => {
            tracing::error!("Failed to fetch pets: {e}");
            alert = Some(PageAlert::from_backend(&e));
            Vec::new()
        }
    };

    let (title, action, path) = match id {
        Some(id) => (
            "Update triage".to_string(),
            format!("/triage/{id}"),
            format!("/triage/{id}/edit"),
        ),
        None => (
            "New triage".to_string(),
            "/triage".to_string(),
            "/triage/new".to_string(),
        ),
    };

    TriageFormTemplate {
        nav: Nav::new(auth.user(), &path),
        alert,
        title,
        action,
        pet_options,
        severity_options: SelectOption::choices::<TriageSeverity>(&form.severity),
        status_options: SelectOption::choices::<TriageStatus>(&form.status),
        form,
        errors,
    }
}

/// Triage queue handler.
#[instrument(skip(auth, state))]
pub async fn index(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<TriageQuery>,
) -> Response {
    let mut alert = query.notice.as_deref().and_then(PageAlert::notice);
    let result = auth.api(&state).triage().list().await;
    let records = match result {
        Ok(page) => page.items,
        Err(e) if e.is_unauthorized() => return auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch triage queue: {e}");
            alert = Some(PageAlert::from_backend(&e));
            Vec::new()
        }
    };

    let status = query
        .status
        .as_deref()
        .and_then(|s| s.parse::<TriageStatus>().ok());
    let severity = query
        .severity
        .as_deref()
        .and_then(|s| s.parse::<TriageSeverity>().ok());

    let mut records = filter_by_query(records, query.q.as_deref());
    records.retain(|r| {
        status.is_none_or(|s| r.status == s) && severity.is_none_or(|s| r.severity == s)
    });
    sort_by_urgency(&mut records);

    let template = TriageIndexTemplate {
        nav: Nav::new(auth.user(), "/triage"),
        alert,
        records: records.iter().map(TriageRow::from).collect(),
        query: query.q.unwrap_or_default(),
        status_options: SelectOption::choices::<TriageStatus>(
            status.map(TriageStatus::as_str).unwrap_or_default(),
        ),
        severity_options: SelectOption::choices::<TriageSeverity>(
            severity.map(TriageSeverity::as_str).unwrap_or_default(),
        ),
    };

    render(&template).into_response()
}

/// New triage form handler.
#[instrument(skip(auth, state))]
pub async fn new_page(RequireStaff(auth): RequireStaff, State(state): State<AppState>) -> Response {
    render(&form_page(&auth, &state, None, TriageForm::intake(), FormErrors::new()).await)
        .into_response()
}

/// Create triage handler.
#[instrument(skip(auth, state, form))]
pub async fn create(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Form(form): Form<TriageForm>,
) -> Response {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return render(&form_page(&auth, &state, None, form, errors).await).into_response();
        }
    };

    let result = auth.api(&state).triage().create(&input).await;
    match result {
        Ok(record) => {
            tracing::info!(
                triage_id = %record.id,
                severity = record.severity.as_str(),
                "Patient triaged"
            );
            Redirect::to("/triage?notice=created").into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to create triage record: {e}");
            let mut template = form_page(&auth, &state, None, form, FormErrors::new()).await;
            template.alert = Some(PageAlert::error(e.user_message()));
            render(&template).into_response()
        }
    }
}

/// Edit triage form handler.
#[instrument(skip(auth, state))]
pub async fn edit_page(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<TriageId>,
) -> Response {
    let result = auth.api(&state).triage().get(id).await;
    match result {
        Ok(record) => {
            let form = TriageForm::from(&record);
            render(&form_page(&auth, &state, Some(id), form, FormErrors::new()).await)
                .into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch triage record {id}: {e}");
            let mut template =
                form_page(&auth, &state, Some(id), TriageForm::intake(), FormErrors::new()).await;
            template.alert = Some(PageAlert::from_backend(&e));
            render(&template).into_response()
        }
    }
}

/// Update triage handler.
#[instrument(skip(auth, state, form))]
pub async fn update(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<TriageId>,
    Form(form): Form<TriageForm>,
) -> Response {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return render(&form_page(&auth, &state, Some(id), form, errors).await)
                .into_response();
        }
    };

    let result = auth.api(&state).triage().update(id, &input).await;
    match result {
        Ok(_) => Redirect::to("/triage?notice=updated").into_response(),
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to update triage record {id}: {e}");
            let mut template = form_page(&auth, &state, Some(id), form, FormErrors::new()).await;
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
    fn test_intake_defaults() {
        let form = TriageForm::intake();
        assert_eq!(form.status, "waiting");
        assert_eq!(form.severity, "medium");
    }

    #[test]
    fn test_valid_form_builds_input() {
        let form = TriageForm {
            pet_id: "8".to_string(),
            severity: "critical".to_string(),
            symptoms: "Hit by car, bleeding".to_string(),
            notes: String::new(),
            status: "in_care".to_string(),
        };
        let input = form.validate().unwrap();
        assert_eq!(input.pet_id, PetId::new(8));
        assert_eq!(input.severity, TriageSeverity::Critical);
        assert_eq!(input.status, TriageStatus::InCare);
        assert_eq!(input.notes, None);
    }

    #[test]
    fn test_rejects_short_symptoms_and_unknown_severity() {
        let form = TriageForm {
            pet_id: "8".to_string(),
            severity: "apocalyptic".to_string(),
            symptoms: "ow".to_string(),
            notes: String::new(),
            status: "waiting".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("severity"));
        assert!(errors.has("symptoms"));
        assert!(!errors.has("status"));
    }
}
