//! Pet route handlers.
//!
//! Staff see and manage every pet. Owners see only their own, and the owner
//! field of their forms is fixed to themselves.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::instrument;

use vetdesk_core::validation::parse_optional_f64;
use vetdesk_core::{FormErrors, PetId, UserId, ValidationError};

use crate::backend::{BackendError, Pet, PetFilter, PetInput};
use crate::components::{ConfirmTemplate, Nav, PageAlert, SelectOption, filter_by_query};
use crate::filters;
use crate::middleware::auth::{Authenticated, RequireAuth, RequireStaff};
use crate::state::AppState;

use super::{non_empty, render};

/// Heaviest patient the form accepts, in kilograms.
const MAX_WEIGHT_KG: f64 = 1000.0;

/// Pet row for list templates.
#[derive(Debug, Clone)]
pub struct PetRow {
    pub id: i64,
    pub name: String,
    pub species: String,
    pub breed: String,
    pub sex: String,
    pub owner_name: String,
    pub age: String,
    pub weight: String,
    pub microchip: String,
}

impl PetRow {
    /// Row for `pet`, with the age as of `today`.
    #[must_use]
    pub fn new(pet: &Pet, today: NaiveDate) -> Self {
        let age = match pet.age_years(today) {
            Some(0) => "Under 1 year".to_string(),
            Some(1) => "1 year".to_string(),
            Some(years) => format!("{years} years"),
            None => String::new(),
        };
        Self {
            id: pet.id.as_i64(),
            name: pet.name.clone(),
            species: pet.species.clone(),
            breed: pet.breed.clone().unwrap_or_default(),
            sex: pet.sex.clone().unwrap_or_default(),
            owner_name: pet.owner_name.clone().unwrap_or_default(),
            age,
            weight: pet.weight_kg.map(|w| format!("{w:.1} kg")).unwrap_or_default(),
            microchip: pet.microchip.clone().unwrap_or_default(),
        }
    }
}

/// List filters.
#[derive(Debug, Default, Deserialize)]
pub struct PetsQuery {
    pub q: Option<String>,
    pub species: Option<String>,
    pub notice: Option<String>,
}

/// Create and edit form data.
#[derive(Debug, Default, Deserialize)]
pub struct PetForm {
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub weight_kg: String,
    #[serde(default)]
    pub microchip: String,
    #[serde(default)]
    pub notes: String,
}

impl From<&Pet> for PetForm {
    fn from(pet: &Pet) -> Self {
        Self {
            owner_id: pet.owner_id.to_string(),
            name: pet.name.clone(),
            species: pet.species.clone(),
            breed: pet.breed.clone().unwrap_or_default(),
            sex: pet.sex.clone().unwrap_or_default(),
            birth_date: pet
                .birth_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            weight_kg: pet.weight_kg.map(|w| w.to_string()).unwrap_or_default(),
            microchip: pet.microchip.clone().unwrap_or_default(),
            notes: pet.notes.clone().unwrap_or_default(),
        }
    }
}

impl PetForm {
    /// Validate the form. `owner` forces the owner for pet-owner accounts.
    fn validate(&self, owner: Option<UserId>, today: NaiveDate) -> Result<PetInput, FormErrors> {
        let mut errors = FormErrors::new();
        errors
            .length("name", "Name", &self.name, 1, 50)
            .length("species", "Species", &self.species, 1, 30)
            .length("breed", "Breed", &self.breed, 0, 50)
            .microchip("microchip", &self.microchip)
            .length("notes", "Notes", &self.notes, 0, 1000);

        let owner_id = owner.or_else(|| {
            errors.check(
                "owner_id",
                self.owner_id
                    .trim()
                    .parse::<UserId>()
                    .map_err(|_| ValidationError::Required("Owner")),
            )
        });

        let weight_kg = errors
            .check(
                "weight_kg",
                parse_optional_f64("Weight", &self.weight_kg, 0.0, MAX_WEIGHT_KG),
            )
            .flatten();
        if weight_kg.is_some_and(|w| w <= 0.0) {
            errors.add("weight_kg", "Weight must be greater than 0");
        }

        let birth_date = match non_empty(&self.birth_date) {
            Some(raw) => match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
                Ok(date) if date > today => {
                    errors.add("birth_date", "Birth date cannot be in the future");
                    None
                }
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add("birth_date", "Birth date must be a valid date");
                    None
                }
            },
            None => None,
        };

        match owner_id {
            Some(owner_id) if errors.is_empty() => Ok(PetInput {
                owner_id,
                name: self.name.trim().to_string(),
                species: self.species.trim().to_string(),
                breed: non_empty(&self.breed),
                sex: non_empty(&self.sex),
                birth_date,
                weight_kg,
                microchip: non_empty(&self.microchip),
                notes: non_empty(&self.notes),
            }),
            _ => Err(errors),
        }
    }
}

/// Pets list template.
#[derive(Template)]
#[template(path = "pets/index.html")]
pub struct PetsIndexTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub pets: Vec<PetRow>,
    pub query: String,
    pub species_options: Vec<SelectOption>,
    pub show_owner: bool,
    pub can_delete: bool,
}

/// Pet create/edit form template.
#[derive(Template)]
#[template(path = "pets/form.html")]
pub struct PetFormTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub title: String,
    pub action: String,
    pub form: PetForm,
    /// Empty for pet owners, who can only register their own pets.
    pub owner_options: Vec<SelectOption>,
    pub sex_options: Vec<SelectOption>,
    pub errors: FormErrors,
}

/// Distinct species in the list, for the filter select.
fn species_options(pets: &[Pet], current: &str) -> Vec<SelectOption> {
    let mut species: Vec<String> = pets
        .iter()
        .map(|p| p.species.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    species.sort_by_key(|s| s.to_lowercase());
    species.dedup_by(|a, b| a.to_lowercase() == b.to_lowercase());
    let current = current.to_lowercase();
    species
        .into_iter()
        .map(|s| {
            let selected = s.to_lowercase() == current;
            SelectOption {
                value: s.clone(),
                label: s,
                selected,
            }
        })
        .collect()
}

/// Build the form page, loading the owner list for staff.
async fn form_page(
    auth: &Authenticated,
    state: &AppState,
    id: Option<PetId>,
    form: PetForm,
    errors: FormErrors,
) -> PetFormTemplate {
    let (title, action, path) = match id {
        Some(id) => (
            "Edit pet".to_string(),
            format!("/pets/{id}"),
            format!("/pets/{id}/edit"),
        ),
        None => ("New pet".to_string(), "/pets".to_string(), "/pets/new".to_string()),
    };

    let mut alert = None;
    let owner_options = if auth.user().is_staff() {
        match auth.api(state).users().list_owners().await {
            Ok(owners) => SelectOption::list(
                owners
                    .iter()
                    .map(|o| (o.id.to_string(), format!("{} ({})", o.full_name(), o.email))),
                &form.owner_id,
            ),
            Err(e) => {
                tracing::error!("Failed to fetch owners: {e}");
                alert = Some(PageAlert::from_backend(&e));
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    PetFormTemplate {
        nav: Nav::new(auth.user(), &path),
        alert,
        title,
        action,
        sex_options: SelectOption::list([("male", "Male"), ("female", "Female")], &form.sex),
        owner_options,
        form,
        errors,
    }
}

/// The owner forced onto forms submitted by pet owners.
fn forced_owner(auth: &Authenticated) -> Option<UserId> {
    auth.user().is_owner().then_some(auth.user().id)
}

/// Pets list page handler.
#[instrument(skip(auth, state))]
pub async fn index(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<PetsQuery>,
) -> Response {
    let owner = forced_owner(&auth);
    let filter = PetFilter {
        owner_id: owner,
        species: None,
        search: query.q.as_deref().and_then(non_empty),
    };

    let mut alert = query.notice.as_deref().and_then(PageAlert::notice);
    let result = auth.api(&state).pets().list(&filter).await;
    let mut pets = match result {
        Ok(page) => page.items,
        Err(e) if e.is_unauthorized() => return auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch pets: {e}");
            alert = Some(PageAlert::from_backend(&e));
            Vec::new()
        }
    };
    if let Some(owner) = owner {
        pets.retain(|p| p.owner_id == owner);
    }

    let species = query.species.as_deref().and_then(non_empty).unwrap_or_default();
    let species_options = species_options(&pets, &species);

    let mut pets = filter_by_query(pets, query.q.as_deref());
    if !species.is_empty() {
        let wanted = species.to_lowercase();
        pets.retain(|p| p.species.trim().to_lowercase() == wanted);
    }

    let today = Local::now().date_naive();
    let template = PetsIndexTemplate {
        nav: Nav::new(auth.user(), "/pets"),
        alert,
        pets: pets.iter().map(|p| PetRow::new(p, today)).collect(),
        query: query.q.unwrap_or_default(),
        species_options,
        show_owner: owner.is_none(),
        can_delete: auth.user().is_staff(),
    };

    render(&template).into_response()
}

/// New pet form handler.
#[instrument(skip(auth, state))]
pub async fn new_page(RequireAuth(auth): RequireAuth, State(state): State<AppState>) -> Response {
    render(&form_page(&auth, &state, None, PetForm::default(), FormErrors::new()).await)
        .into_response()
}

/// Create pet handler.
#[instrument(skip(auth, state, form))]
pub async fn create(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Form(form): Form<PetForm>,
) -> Response {
    let input = match form.validate(forced_owner(&auth), Local::now().date_naive()) {
        Ok(input) => input,
        Err(errors) => {
            return render(&form_page(&auth, &state, None, form, errors).await).into_response();
        }
    };

    let result = auth.api(&state).pets().create(&input).await;
    match result {
        Ok(pet) => {
            tracing::info!(pet_id = %pet.id, "Pet registered");
            Redirect::to("/pets?notice=created").into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to create pet: {e}");
            let mut template = form_page(&auth, &state, None, form, FormErrors::new()).await;
            template.alert = Some(PageAlert::error(e.user_message()));
            render(&template).into_response()
        }
    }
}

/// Fetch a pet, refusing owners access to other owners' pets.
async fn fetch_visible(
    auth: &Authenticated,
    state: &AppState,
    id: PetId,
) -> Result<Pet, BackendError> {
    let pet = auth.api(state).pets().get(id).await?;
    if forced_owner(auth).is_some_and(|owner| owner != pet.owner_id) {
        tracing::warn!(pet_id = %id, "Owner tried to open another owner's pet");
        return Err(BackendError::Forbidden(None));
    }
    Ok(pet)
}

/// Edit pet form handler.
#[instrument(skip(auth, state))]
pub async fn edit_page(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<PetId>,
) -> Response {
    let result = fetch_visible(&auth, &state, id).await;
    match result {
        Ok(pet) => {
            let form = PetForm::from(&pet);
            render(&form_page(&auth, &state, Some(id), form, FormErrors::new()).await)
                .into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch pet {id}: {e}");
            let mut template =
                form_page(&auth, &state, Some(id), PetForm::default(), FormErrors::new()).await;
            template.alert = Some(PageAlert::from_backend(&e));
            render(&template).into_response()
        }
    }
}

/// Update pet handler.
#[instrument(skip(auth, state, form))]
pub async fn update(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<PetId>,
    Form(form): Form<PetForm>,
) -> Response {
    let input = match form.validate(forced_owner(&auth), Local::now().date_naive()) {
        Ok(input) => input,
        Err(errors) => {
            return render(&form_page(&auth, &state, Some(id), form, errors).await)
                .into_response();
        }
    };

    let result = match fetch_visible(&auth, &state, id).await {
        Ok(_) => auth.api(&state).pets().update(id, &input).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => Redirect::to("/pets?notice=updated").into_response(),
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to update pet {id}: {e}");
            let mut template = form_page(&auth, &state, Some(id), form, FormErrors::new()).await;
            template.alert = Some(PageAlert::error(e.user_message()));
            render(&template).into_response()
        }
    }
}

/// Confirmation page for pet `id`, named `name`.
fn delete_page(auth: &Authenticated, id: PetId, name: &str) -> ConfirmTemplate {
    ConfirmTemplate::delete(
        Nav::new(auth.user(), "/pets"),
        "pet",
        name,
        format!("/pets/{id}/delete"),
        "/pets".to_string(),
    )
}

/// Delete confirmation handler (staff).
#[instrument(skip(auth, state))]
pub async fn delete_confirm(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<PetId>,
) -> Response {
    let result = auth.api(&state).pets().get(id).await;
    match result {
        Ok(pet) => render(&delete_page(&auth, id, &pet.name)).into_response(),
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch pet {id}: {e}");
            let mut template = delete_page(&auth, id, &format!("#{id}"));
            template.alert = Some(PageAlert::from_backend(&e));
            render(&template).into_response()
        }
    }
}

/// Delete pet handler (staff).
#[instrument(skip(auth, state))]
pub async fn delete(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<PetId>,
) -> Response {
    let result = auth.api(&state).pets().delete(id).await;
    match result {
        Ok(()) => {
            tracing::info!(pet_id = %id, "Pet deleted");
            Redirect::to("/pets?notice=deleted").into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to delete pet {id}: {e}");
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

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn form() -> PetForm {
        PetForm {
            owner_id: "12".to_string(),
            name: "Rex".to_string(),
            species: "Dog".to_string(),
            breed: "Beagle".to_string(),
            sex: "male".to_string(),
            birth_date: "2019-04-12".to_string(),
            weight_kg: "12.5".to_string(),
            microchip: "941000024681357".to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_valid_form_builds_input() {
        let input = form().validate(None, today()).unwrap();
        assert_eq!(input.owner_id, UserId::new(12));
        assert_eq!(input.weight_kg, Some(12.5));
        assert_eq!(input.notes, None);
    }

    #[test]
    fn test_owner_accounts_cannot_pick_another_owner() {
        let input = form().validate(Some(UserId::new(7)), today()).unwrap();
        assert_eq!(input.owner_id, UserId::new(7));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut form = form();
        form.name = "  ".to_string();
        form.weight_kg = "0".to_string();
        form.microchip = "12".to_string();
        form.birth_date = "2030-01-01".to_string();
        let errors = form.validate(None, today()).unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("weight_kg"));
        assert!(errors.has("microchip"));
        assert!(errors.has("birth_date"));
    }

    #[test]
    fn test_staff_must_pick_owner() {
        let mut form = form();
        form.owner_id = String::new();
        assert!(form.validate(None, today()).unwrap_err().has("owner_id"));
    }

    #[test]
    fn test_species_options_are_distinct() {
        let pets: Vec<Pet> = serde_json::from_value(serde_json::json!([
            {"id": 1, "ownerId": 1, "name": "Rex", "species": "Dog"},
            {"id": 2, "ownerId": 1, "name": "Mia", "species": "cat"},
            {"id": 3, "ownerId": 2, "name": "Max", "species": "dog"}
        ]))
        .unwrap();
        let options = species_options(&pets, "DOG");
        assert_eq!(options.len(), 2);
        assert!(options.iter().any(|o| o.selected && o.value.eq_ignore_ascii_case("dog")));
    }

    #[test]
    fn test_species_options_fold_non_ascii_case() {
        let pets: Vec<Pet> = serde_json::from_value(serde_json::json!([
            {"id": 1, "ownerId": 1, "name": "Kiki", "species": "Ñandú"},
            {"id": 2, "ownerId": 1, "name": "Lulu", "species": "ÑANDÚ"}
        ]))
        .unwrap();
        let options = species_options(&pets, "ñandú");
        assert_eq!(options.len(), 1);
        assert!(options[0].selected);
    }
}
