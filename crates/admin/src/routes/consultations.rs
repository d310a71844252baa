//! Consultation route handlers (veterinarians and admins).

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use vetdesk_core::validation::parse_optional_f64;
use vetdesk_core::{AppointmentId, ConsultationId, FormErrors, PetId};

use crate::backend::{
    Consultation, ConsultationFilter, ConsultationInput, PetFilter, display_datetime,
};
use crate::components::{Nav, PageAlert, SelectOption, filter_by_query};
use crate::filters;
use crate::middleware::auth::{Authenticated, RequireClinician};
use crate::state::AppState;

use super::{non_empty, render};

/// Consultation row for list templates.
#[derive(Debug, Clone)]
pub struct ConsultationRow {
    pub id: i64,
    pub recorded: String,
    pub pet_name: String,
    pub veterinarian_name: String,
    pub diagnosis: String,
    pub treatment: String,
    pub vitals: String,
}

impl From<&Consultation> for ConsultationRow {
    fn from(consultation: &Consultation) -> Self {
        let vitals = [
            consultation.weight_kg.map(|w| format!("{w:.1} kg")),
            consultation.temperature_c.map(|t| format!("{t:.1} \u{b0}C")),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");

        Self {
            id: consultation.id.as_i64(),
            recorded: display_datetime(consultation.created_at.as_ref()),
            pet_name: consultation
                .pet_name
                .clone()
                .unwrap_or_else(|| format!("Pet #{}", consultation.pet_id)),
            veterinarian_name: consultation.veterinarian_name.clone().unwrap_or_default(),
            diagnosis: consultation.diagnosis.clone(),
            treatment: consultation.treatment.clone().unwrap_or_default(),
            vitals,
        }
    }
}

/// List filters.
#[derive(Debug, Default, Deserialize)]
pub struct ConsultationsQuery {
    pub q: Option<String>,
    pub pet_id: Option<String>,
    pub notice: Option<String>,
}

/// Prefill for the new consultation form, from an appointment page.
#[derive(Debug, Default, Deserialize)]
pub struct NewConsultationQuery {
    pub pet_id: Option<String>,
    pub appointment_id: Option<String>,
}

/// Create and edit form data.
#[derive(Debug, Default, Deserialize)]
pub struct ConsultationForm {
    #[serde(default)]
    pub pet_id: String,
    #[serde(default)]
    pub appointment_id: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub weight_kg: String,
    #[serde(default)]
    pub temperature_c: String,
}

impl From<&Consultation> for ConsultationForm {
    fn from(consultation: &Consultation) -> Self {
        Self {
            pet_id: consultation.pet_id.to_string(),
            appointment_id: consultation
                .appointment_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            diagnosis: consultation.diagnosis.clone(),
            treatment: consultation.treatment.clone().unwrap_or_default(),
            notes: consultation.notes.clone().unwrap_or_default(),
            weight_kg: consultation
                .weight_kg
                .map(|w| w.to_string())
                .unwrap_or_default(),
            temperature_c: consultation
                .temperature_c
                .map(|t| t.to_string())
                .unwrap_or_default(),
        }
    }
}

impl ConsultationForm {
    fn validate(&self) -> Result<ConsultationInput, FormErrors> {
        let mut errors = FormErrors::new();
        errors
            .length("diagnosis", "Diagnosis", &self.diagnosis, 3, 1000)
            .length("treatment", "Treatment", &self.treatment, 0, 1000)
            .length("notes", "Notes", &self.notes, 0, 2000);

        let pet_id = self.pet_id.trim().parse::<PetId>().ok();
        if pet_id.is_none() {
            errors.add("pet_id", "Pet is required");
        }
        let appointment_id = match non_empty(&self.appointment_id) {
            Some(raw) => {
                let parsed = raw.parse::<AppointmentId>().ok();
                if parsed.is_none() {
                    errors.add("appointment_id", "Appointment must be a number");
                }
                parsed
            }
            None => None,
        };

        let weight_kg = errors
            .check("weight_kg", parse_optional_f64("Weight", &self.weight_kg, 0.0, 1000.0))
            .flatten();
        if weight_kg.is_some_and(|w| w <= 0.0) {
            errors.add("weight_kg", "Weight must be greater than 0");
        }
        let temperature_c = errors
            .check(
                "temperature_c",
                parse_optional_f64("Temperature", &self.temperature_c, 30.0, 45.0),
            )
            .flatten();

        match pet_id {
            Some(pet_id) if errors.is_empty() => Ok(ConsultationInput {
                pet_id,
                appointment_id,
                diagnosis: self.diagnosis.trim().to_string(),
                treatment: non_empty(&self.treatment),
                notes: non_empty(&self.notes),
                weight_kg,
                temperature_c,
            }),
            _ => Err(errors),
        }
    }
}

/// Consultations list template.
#[derive(Template)]
#[template(path = "consultations/index.html")]
pub struct ConsultationsIndexTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub consultations: Vec<ConsultationRow>,
    pub query: String,
    pub pet_options: Vec<SelectOption>,
}

/// Consultation create/edit form template.
#[derive(Template)]
#[template(path = "consultations/form.html")]
pub struct ConsultationFormTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub title: String,
    pub action: String,
    pub form: ConsultationForm,
    pub pet_options: Vec<SelectOption>,
    pub errors: FormErrors,
}

/// Pet select options, plus the load failure banner if the list is missing.
async fn pet_options(
    auth: &Authenticated,
    state: &AppState,
    current: &str,
) -> (Vec<SelectOption>, Option<PageAlert>) {
    let result = auth.api(state).pets().list(&PetFilter::default()).await;
    match result {
        Ok(page) => {
            let mut pets = page.items;
            pets.sort_by_key(|p| p.name.to_lowercase());
            let options = SelectOption::list(
                pets.iter().map(|p| {
                    let label = match &p.owner_name {
                        Some(owner) => format!("{} ({}, {owner})", p.name, p.species),
                        None => format!("{} ({})", p.name, p.species),
                    };
                    (p.id.to_string(), label)
                }),
                current,
            );
            (options, None)
        }
        Err(e) => {
            tracing::error!("Failed to fetch pets: {e}");
            (Vec::new(), Some(PageAlert::from_backend(&e)))
        }
    }
}

async fn form_page(
    auth: &Authenticated,
    state: &AppState,
    id: Option<ConsultationId>,
    form: ConsultationForm,
    errors: FormErrors,
) -> ConsultationFormTemplate {
    let (pet_options, alert) = pet_options(auth, state, &form.pet_id).await;
    let (title, action, path) = match id {
        Some(id) => (
            "Edit consultation".to_string(),
            format!("/consultations/{id}"),
            format!("/consultations/{id}/edit"),
        ),
        None => (
            "New consultation".to_string(),
            "/consultations".to_string(),
            "/consultations/new".to_string(),
        ),
    };
    ConsultationFormTemplate {
        nav: Nav::new(auth.user(), &path),
        alert,
        title,
        action,
        form,
        pet_options,
        errors,
    }
}

/// Consultations list handler.
#[instrument(skip(auth, state))]
pub async fn index(
    RequireClinician(auth): RequireClinician,
    State(state): State<AppState>,
    Query(query): Query<ConsultationsQuery>,
) -> Response {
    let pet_id = query
        .pet_id
        .as_deref()
        .and_then(|id| id.trim().parse::<PetId>().ok());
    let filter = ConsultationFilter {
        pet_id,
        veterinarian_id: None,
    };

    let mut alert = query.notice.as_deref().and_then(PageAlert::notice);
    let (result, (pet_options, pets_alert)) = tokio::join!(
        auth.api(&state).consultations().list(filter),
        pet_options(&auth, &state, query.pet_id.as_deref().unwrap_or_default()),
    );
    let consultations = match result {
        Ok(page) => page.items,
        Err(e) if e.is_unauthorized() => return auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch consultations: {e}");
            alert = Some(PageAlert::from_backend(&e));
            Vec::new()
        }
    };
    if alert.is_none() {
        alert = pets_alert;
    }

    let mut consultations = filter_by_query(consultations, query.q.as_deref());
    if let Some(pet_id) = pet_id {
        consultations.retain(|c| c.pet_id == pet_id);
    }
    consultations.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let template = ConsultationsIndexTemplate {
        nav: Nav::new(auth.user(), "/consultations"),
        alert,
        consultations: consultations.iter().map(ConsultationRow::from).collect(),
        query: query.q.unwrap_or_default(),
        pet_options,
    };

    render(&template).into_response()
}

/// New consultation form handler.
#[instrument(skip(auth, state))]
pub async fn new_page(
    RequireClinician(auth): RequireClinician,
    State(state): State<AppState>,
    Query(prefill): Query<NewConsultationQuery>,
) -> Response {
    let form = ConsultationForm {
        pet_id: prefill.pet_id.unwrap_or_default(),
        appointment_id: prefill.appointment_id.unwrap_or_default(),
        ..ConsultationForm::default()
    };
    render(&form_page(&auth, &state, None, form, FormErrors::new()).await).into_response()
}

/// Create consultation handler.
#[instrument(skip(auth, state, form))]
pub async fn create(
    RequireClinician(auth): RequireClinician,
    State(state): State<AppState>,
    Form(form): Form<ConsultationForm>,
) -> Response {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return render(&form_page(&auth, &state, None, form, errors).await).into_response();
        }
    };

    let result = auth.api(&state).consultations().create(&input).await;
    match result {
        Ok(consultation) => {
            tracing::info!(consultation_id = %consultation.id, "Consultation recorded");
            Redirect::to("/consultations?notice=created").into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to create consultation: {e}");
            let mut template = form_page(&auth, &state, None, form, FormErrors::new()).await;
            template.alert = Some(PageAlert::error(e.user_message()));
            render(&template).into_response()
        }
    }
}

/// Edit consultation form handler.
#[instrument(skip(auth, state))]
pub async fn edit_page(
    RequireClinician(auth): RequireClinician,
    State(state): State<AppState>,
    Path(id): Path<ConsultationId>,
) -> Response {
    let result = auth.api(&state).consultations().get(id).await;
    match result {
        Ok(consultation) => {
            let form = ConsultationForm::from(&consultation);
            render(&form_page(&auth, &state, Some(id), form, FormErrors::new()).await)
                .into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch consultation {id}: {e}");
            let mut template = form_page(
                &auth,
                &state,
                Some(id),
                ConsultationForm::default(),
                FormErrors::new(),
            )
            .await;
            template.alert = Some(PageAlert::from_backend(&e));
            render(&template).into_response()
        }
    }
}

/// Update consultation handler.
#[instrument(skip(auth, state, form))]
pub async fn update(
    RequireClinician(auth): RequireClinician,
    State(state): State<AppState>,
    Path(id): Path<ConsultationId>,
    Form(form): Form<ConsultationForm>,
) -> Response {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return render(&form_page(&auth, &state, Some(id), form, errors).await)
                .into_response();
        }
    };

    let result = auth.api(&state).consultations().update(id, &input).await;
    match result {
        Ok(_) => Redirect::to("/consultations?notice=updated").into_response(),
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to update consultation {id}: {e}");
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

    fn form() -> ConsultationForm {
        ConsultationForm {
            pet_id: "3".to_string(),
            appointment_id: "40".to_string(),
            diagnosis: "Otitis externa".to_string(),
            treatment: "Ear drops twice daily".to_string(),
            notes: String::new(),
            weight_kg: "31.5".to_string(),
            temperature_c: "38.6".to_string(),
        }
    }

    #[test]
    fn test_valid_form_builds_input() {
        let input = form().validate().unwrap();
        assert_eq!(input.pet_id, PetId::new(3));
        assert_eq!(input.appointment_id, Some(AppointmentId::new(40)));
        assert_eq!(input.temperature_c, Some(38.6));
        assert_eq!(input.notes, None);
    }

    #[test]
    fn test_vitals_are_range_checked() {
        let mut form = form();
        form.temperature_c = "51".to_string();
        form.weight_kg = "-1".to_string();
        let errors = form.validate().unwrap_err();
        assert!(errors.has("temperature_c"));
        assert!(errors.has("weight_kg"));
    }

    #[test]
    fn test_diagnosis_and_pet_required() {
        let mut form = form();
        form.diagnosis = "  ".to_string();
        form.pet_id = String::new();
        let errors = form.validate().unwrap_err();
        assert!(errors.has("diagnosis"));
        assert!(errors.has("pet_id"));
    }

    #[test]
    fn test_row_joins_vitals() {
        let consultation: Consultation = serde_json::from_value(serde_json::json!({
            "id": 1, "petId": 3, "petName": "Rex", "diagnosis": "Healthy",
            "weightKg": 30.0, "temperatureC": 38.5
        }))
        .unwrap();
        let row = ConsultationRow::from(&consultation);
        assert_eq!(row.vitals, "30.0 kg, 38.5 \u{b0}C");
        assert_eq!(row.pet_name, "Rex");
    }
}
