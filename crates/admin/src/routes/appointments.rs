//! Appointment route handlers.
//!
//! Owners book, view and cancel their own appointments. Staff manage the whole
//! book: editing, status changes and decorators. Deleting is left to admins.
//! Completed, cancelled and no-show appointments are closed and refuse edits.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::instrument;

use vetdesk_core::validation::{DATETIME_LOCAL_FORMAT, parse_datetime_local};
use vetdesk_core::{
    AppointmentId, AppointmentStatus, DecoratorId, DecoratorKind, FormErrors, PetId, ServiceId,
    UserId,
};

use crate::backend::{
    Appointment, AppointmentFilter, AppointmentInput, BackendError, Decorator, NewDecorator,
    PetFilter, display_datetime,
};
use crate::components::{
    ConfirmTemplate, Nav, NoticeQuery, PageAlert, SelectOption, filter_by_query,
};
use crate::filters;
use crate::middleware::auth::{Authenticated, RequireAdmin, RequireAuth, RequireStaff};
use crate::models::CurrentUser;
use crate::state::AppState;

use super::{non_empty, render};

const SCHEDULED_FORMAT: &str = "%a %b %-d, %H:%M";

/// Appointment row for list templates.
#[derive(Debug, Clone)]
pub struct AppointmentRow {
    pub id: i64,
    pub pet_id: i64,
    pub scheduled: String,
    pub pet_name: String,
    pub owner_name: String,
    pub veterinarian_name: String,
    pub service_name: String,
    pub reason: String,
    pub status_label: String,
    pub status_badge: String,
    pub is_priority: bool,
    pub is_closed: bool,
}

impl From<&Appointment> for AppointmentRow {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id.as_i64(),
            pet_id: appointment.pet_id.as_i64(),
            scheduled: appointment.scheduled_at.format(SCHEDULED_FORMAT).to_string(),
            pet_name: appointment
                .pet_name
                .clone()
                .unwrap_or_else(|| format!("Pet #{}", appointment.pet_id)),
            owner_name: appointment.owner_name.clone().unwrap_or_default(),
            veterinarian_name: appointment.veterinarian_name.clone().unwrap_or_default(),
            service_name: appointment.service_name.clone().unwrap_or_default(),
            reason: appointment.reason.clone().unwrap_or_default(),
            status_label: appointment.status.label().to_string(),
            status_badge: appointment.status.badge_class().to_string(),
            is_priority: appointment.is_priority(),
            is_closed: appointment.status.is_closed(),
        }
    }
}

/// Decorator view for the detail page.
#[derive(Debug, Clone)]
pub struct DecoratorView {
    pub id: i64,
    pub kind_label: String,
    pub kind_badge: String,
    pub content: String,
    pub created: String,
}

impl From<&Decorator> for DecoratorView {
    fn from(decorator: &Decorator) -> Self {
        Self {
            id: decorator.id.as_i64(),
            kind_label: decorator.kind.label().to_string(),
            kind_badge: decorator.kind.badge_class().to_string(),
            content: decorator.content.clone(),
            created: display_datetime(decorator.created_at.as_ref()),
        }
    }
}

/// Whether `user` may see `appointment`.
///
/// Owners only see their own; a record without an owner is trusted to have
/// been scoped by the API.
pub(super) fn visible_to(user: &CurrentUser, appointment: &Appointment) -> bool {
    user.is_staff() || appointment.owner_id.is_none_or(|owner| owner == user.id)
}

/// Fetch an appointment the current user may see.
async fn fetch_visible(
    auth: &Authenticated,
    state: &AppState,
    id: AppointmentId,
) -> Result<Appointment, BackendError> {
    let appointment = auth.api(state).appointments().get(id).await?;
    if !visible_to(auth.user(), &appointment) {
        tracing::warn!(appointment_id = %id, "Owner tried to open another owner's appointment");
        return Err(BackendError::Forbidden(None));
    }
    Ok(appointment)
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// List filters.
#[derive(Debug, Default, Deserialize)]
pub struct AppointmentsQuery {
    pub status: Option<String>,
    /// `YYYY-MM-DD`.
    pub date: Option<String>,
    pub q: Option<String>,
    pub notice: Option<String>,
}

impl AppointmentsQuery {
    fn status(&self) -> Option<AppointmentStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }

    fn date(&self) -> Option<NaiveDate> {
        self.date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
    }
}

/// Appointments list template.
#[derive(Template)]
#[template(path = "appointments/index.html")]
pub struct AppointmentsIndexTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub appointments: Vec<AppointmentRow>,
    pub query: String,
    pub date: String,
    pub status_options: Vec<SelectOption>,
    pub show_owner: bool,
}

/// Appointments list handler.
#[instrument(skip(auth, state))]
pub async fn index(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<AppointmentsQuery>,
) -> Response {
    let user = auth.user();
    let status = query.status();
    let date = query.date();
    let filter = AppointmentFilter {
        status,
        date,
        owner_id: user.is_owner().then_some(user.id),
        ..AppointmentFilter::default()
    };

    let mut alert = query.notice.as_deref().and_then(PageAlert::notice);
    let result = auth.api(&state).appointments().list(&filter).await;
    let appointments = match result {
        Ok(page) => page.items,
        Err(e) if e.is_unauthorized() => return auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch appointments: {e}");
            alert = Some(PageAlert::from_backend(&e));
            Vec::new()
        }
    };

    let mut appointments = filter_by_query(appointments, query.q.as_deref());
    appointments.retain(|a| {
        visible_to(user, a)
            && status.is_none_or(|s| a.status == s)
            && date.is_none_or(|d| a.date() == d)
    });
    appointments.sort_by_key(|a| a.scheduled_at);

    let template = AppointmentsIndexTemplate {
        nav: Nav::new(user, "/appointments"),
        alert,
        appointments: appointments.iter().map(AppointmentRow::from).collect(),
        status_options: SelectOption::choices::<AppointmentStatus>(
            status.map(AppointmentStatus::as_str).unwrap_or_default(),
        ),
        date: date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
        query: query.q.unwrap_or_default(),
        show_owner: user.is_staff(),
    };

    render(&template).into_response()
}

// ---------------------------------------------------------------------------
// Create / edit
// ---------------------------------------------------------------------------

/// Create and edit form data.
#[derive(Debug, Default, Deserialize)]
pub struct AppointmentForm {
    #[serde(default)]
    pub pet_id: String,
    #[serde(default)]
    pub veterinarian_id: String,
    #[serde(default)]
    pub service_id: String,
    /// `datetime-local` value.
    #[serde(default)]
    pub scheduled_at: String,
    #[serde(default)]
    pub reason: String,
}

impl From<&Appointment> for AppointmentForm {
    fn from(appointment: &Appointment) -> Self {
        Self {
            pet_id: appointment.pet_id.to_string(),
            veterinarian_id: appointment
                .veterinarian_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            service_id: appointment
                .service_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            scheduled_at: appointment
                .scheduled_at
                .format(DATETIME_LOCAL_FORMAT)
                .to_string(),
            reason: appointment.reason.clone().unwrap_or_default(),
        }
    }
}

impl AppointmentForm {
    /// Validate the form. New bookings must be in the future.
    fn validate(&self, is_new: bool, now: NaiveDateTime) -> Result<AppointmentInput, FormErrors> {
        let mut errors = FormErrors::new();
        errors.length("reason", "Reason", &self.reason, 0, 500);

        let pet_id = match self.pet_id.trim().parse::<PetId>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add("pet_id", "Pet is required");
                None
            }
        };
        let veterinarian_id =
            optional_id::<UserId>(&mut errors, "veterinarian_id", &self.veterinarian_id);
        let service_id = optional_id::<ServiceId>(&mut errors, "service_id", &self.service_id);

        let scheduled_at = errors.check(
            "scheduled_at",
            parse_datetime_local("Date and time", &self.scheduled_at),
        );
        if is_new && scheduled_at.is_some_and(|at| at < now) {
            errors.add("scheduled_at", "Date and time must be in the future");
        }

        match (pet_id, scheduled_at) {
            (Some(pet_id), Some(scheduled_at)) if errors.is_empty() => Ok(AppointmentInput {
                pet_id,
                veterinarian_id,
                service_id,
                scheduled_at,
                reason: non_empty(&self.reason),
            }),
            _ => Err(errors),
        }
    }
}

/// Parse an optional select value, flagging anything that is not an ID.
fn optional_id<T: std::str::FromStr>(
    errors: &mut FormErrors,
    field: &str,
    value: &str,
) -> Option<T> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let parsed = value.parse().ok();
    if parsed.is_none() {
        errors.add(field, "Choose an option from the list");
    }
    parsed
}

/// Appointment create/edit form template.
#[derive(Template)]
#[template(path = "appointments/form.html")]
pub struct AppointmentFormTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub title: String,
    pub action: String,
    pub cancel_href: String,
    pub form: AppointmentForm,
    pub pet_options: Vec<SelectOption>,
    pub veterinarian_options: Vec<SelectOption>,
    pub service_options: Vec<SelectOption>,
    pub errors: FormErrors,
}

/// Build the form page, loading pets, veterinarians and services together.
async fn form_page(
    auth: &Authenticated,
    state: &AppState,
    id: Option<AppointmentId>,
    form: AppointmentForm,
    errors: FormErrors,
) -> AppointmentFormTemplate {
    let user = auth.user();
    let api = auth.api(state);
    let pet_filter = if user.is_owner() {
        PetFilter::owned_by(user.id)
    } else {
        PetFilter::default()
    };
    let (pets, veterinarians, services) = tokio::join!(
        api.pets().list(&pet_filter),
        api.users().list_veterinarians(),
        api.services().list(),
    );

    let mut failure: Option<BackendError> = None;
    let mut keep = |what: &str, e: BackendError| {
        tracing::error!("Failed to fetch {what}: {e}");
        failure.get_or_insert(e);
    };

    let pet_options = match pets {
        Ok(page) => SelectOption::list(
            page.items
                .iter()
                .filter(|p| !user.is_owner() || p.owner_id == user.id)
                .map(|p| {
                    let label = match &p.owner_name {
                        Some(owner) if !user.is_owner() => format!("{} ({owner})", p.name),
                        _ => p.name.clone(),
                    };
                    (p.id.to_string(), label)
                }),
            &form.pet_id,
        ),
        Err(e) => {
            keep("pets", e);
            Vec::new()
        }
    };
    let veterinarian_options = match veterinarians {
        Ok(vets) => SelectOption::list(
            vets.iter().map(|v| (v.id.to_string(), v.full_name())),
            &form.veterinarian_id,
        ),
        Err(e) => {
            keep("veterinarians", e);
            Vec::new()
        }
    };
    let service_options = match services {
        Ok(page) => SelectOption::list(
            page.items
                .iter()
                .filter(|s| s.is_active || s.id.to_string() == form.service_id)
                .map(|s| (s.id.to_string(), format!("{} ({})", s.name, s.price))),
            &form.service_id,
        ),
        Err(e) => {
            keep("services", e);
            Vec::new()
        }
    };

    let (title, action, cancel_href, path) = match id {
        Some(id) => (
            "Edit appointment".to_string(),
            format!("/appointments/{id}"),
            format!("/appointments/{id}"),
            format!("/appointments/{id}/edit"),
        ),
        None => (
            "Book an appointment".to_string(),
            "/appointments".to_string(),
            "/appointments".to_string(),
            "/appointments/new".to_string(),
        ),
    };

    AppointmentFormTemplate {
        nav: Nav::new(user, &path),
        alert: failure.as_ref().map(PageAlert::from_backend),
        title,
        action,
        cancel_href,
        form,
        pet_options,
        veterinarian_options,
        service_options,
        errors,
    }
}

/// New appointment form handler.
#[instrument(skip(auth, state))]
pub async fn new_page(RequireAuth(auth): RequireAuth, State(state): State<AppState>) -> Response {
    render(&form_page(&auth, &state, None, AppointmentForm::default(), FormErrors::new()).await)
        .into_response()
}

/// Create appointment handler.
#[instrument(skip(auth, state, form))]
pub async fn create(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Form(form): Form<AppointmentForm>,
) -> Response {
    let input = match form.validate(true, Local::now().naive_local()) {
        Ok(input) => input,
        Err(errors) => {
            return render(&form_page(&auth, &state, None, form, errors).await).into_response();
        }
    };

    let api = auth.api(&state);
    let result = match check_pet_owner(&auth, &state, input.pet_id).await {
        Ok(()) => api.appointments().create(&input).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(appointment) => {
            tracing::info!(appointment_id = %appointment.id, "Appointment booked");
            Redirect::to(&format!("/appointments/{}?notice=created", appointment.id))
                .into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to create appointment: {e}");
            let mut template = form_page(&auth, &state, None, form, FormErrors::new()).await;
            template.alert = Some(PageAlert::error(e.user_message()));
            render(&template).into_response()
        }
    }
}

/// Owners may only book for their own pets.
async fn check_pet_owner(
    auth: &Authenticated,
    state: &AppState,
    pet_id: PetId,
) -> Result<(), BackendError> {
    let user = auth.user();
    if !user.is_owner() {
        return Ok(());
    }
    let pet = auth.api(state).pets().get(pet_id).await?;
    if pet.owner_id != user.id {
        tracing::warn!(pet_id = %pet_id, "Owner tried to book for another owner's pet");
        return Err(BackendError::Forbidden(None));
    }
    Ok(())
}

/// Edit appointment form handler (staff).
#[instrument(skip(auth, state))]
pub async fn edit_page(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
) -> Response {
    let result = auth.api(&state).appointments().get(id).await;
    match result {
        Ok(appointment) if appointment.status.is_closed() => closed_redirect(id),
        Ok(appointment) => {
            let form = AppointmentForm::from(&appointment);
            render(&form_page(&auth, &state, Some(id), form, FormErrors::new()).await)
                .into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch appointment {id}: {e}");
            let mut template =
                form_page(&auth, &state, Some(id), AppointmentForm::default(), FormErrors::new())
                    .await;
            template.alert = Some(PageAlert::from_backend(&e));
            render(&template).into_response()
        }
    }
}

/// Update appointment handler (staff).
#[instrument(skip(auth, state, form))]
pub async fn update(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
    Form(form): Form<AppointmentForm>,
) -> Response {
    let input = match form.validate(false, Local::now().naive_local()) {
        Ok(input) => input,
        Err(errors) => {
            return render(&form_page(&auth, &state, Some(id), form, errors).await)
                .into_response();
        }
    };

    let api = auth.api(&state);
    let result = match api.appointments().get(id).await {
        Ok(current) if current.status.is_closed() => return closed_redirect(id),
        Ok(_) => api.appointments().update(id, &input).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => Redirect::to(&format!("/appointments/{id}?notice=updated")).into_response(),
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to update appointment {id}: {e}");
            let mut template = form_page(&auth, &state, Some(id), form, FormErrors::new()).await;
            template.alert = Some(PageAlert::error(e.user_message()));
            render(&template).into_response()
        }
    }
}

fn closed_redirect(id: AppointmentId) -> Response {
    Redirect::to(&format!("/appointments/{id}?notice=closed")).into_response()
}

// ---------------------------------------------------------------------------
// Detail and decorators
// ---------------------------------------------------------------------------

/// Decorator form data.
#[derive(Debug, Default, Deserialize)]
pub struct DecoratorForm {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub content: String,
}

impl DecoratorForm {
    fn validate(&self) -> Result<NewDecorator, FormErrors> {
        let mut errors = FormErrors::new();
        let kind = errors.choice::<DecoratorKind>("kind", "Type", &self.kind);
        errors.length("content", "Content", &self.content, 1, 500);
        match kind {
            Some(kind) if errors.is_empty() => Ok(NewDecorator {
                kind,
                content: self.content.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

/// Appointment detail template.
#[derive(Template)]
#[template(path = "appointments/show.html")]
pub struct AppointmentShowTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub appointment: Option<AppointmentRow>,
    pub decorators: Vec<DecoratorView>,
    pub status_options: Vec<SelectOption>,
    pub kind_options: Vec<SelectOption>,
    pub decorator_form: DecoratorForm,
    pub errors: FormErrors,
    pub can_manage: bool,
    pub can_cancel: bool,
    pub can_delete: bool,
    pub can_record: bool,
}

/// Render the detail page, fetching the appointment and its decorators.
async fn show_page(
    auth: Authenticated,
    state: &AppState,
    id: AppointmentId,
    decorator_form: DecoratorForm,
    errors: FormErrors,
    mut alert: Option<PageAlert>,
) -> Response {
    let user = auth.user();
    let api = auth.api(state);
    let (appointment, decorators) =
        tokio::join!(fetch_visible(&auth, state, id), api.decorators().list(id));

    let appointment = match appointment {
        Ok(appointment) => Some(appointment),
        Err(e) if e.is_unauthorized() => return auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch appointment {id}: {e}");
            alert = Some(PageAlert::from_backend(&e));
            None
        }
    };

    // Fall back to the decorators embedded in the appointment.
    let decorators = match (decorators, &appointment) {
        (Ok(list), _) => list,
        (Err(e), Some(appointment)) => {
            tracing::warn!("Failed to fetch decorators for appointment {id}: {e}");
            appointment.decorators.clone()
        }
        (Err(_), None) => Vec::new(),
    };

    let status = appointment.as_ref().map(|a| a.status);
    let open = status.is_some_and(|s| !s.is_closed());
    let template = AppointmentShowTemplate {
        nav: Nav::new(user, "/appointments"),
        alert,
        appointment: appointment.as_ref().map(AppointmentRow::from),
        decorators: decorators.iter().map(DecoratorView::from).collect(),
        status_options: SelectOption::choices::<AppointmentStatus>(
            status.map(AppointmentStatus::as_str).unwrap_or_default(),
        ),
        kind_options: SelectOption::choices::<DecoratorKind>(&decorator_form.kind),
        decorator_form,
        errors,
        can_manage: user.is_staff() && open,
        can_cancel: open,
        can_delete: user.is_admin() && appointment.is_some(),
        can_record: user.is_clinician() && appointment.is_some(),
    };
    render(&template).into_response()
}

/// Appointment detail handler.
#[instrument(skip(auth, state))]
pub async fn show(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
    Query(query): Query<NoticeQuery>,
) -> Response {
    let alert = query.alert();
    show_page(auth, &state, id, DecoratorForm::default(), FormErrors::new(), alert).await
}

/// Add decorator handler (staff).
#[instrument(skip(auth, state, form))]
pub async fn add_decorator(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
    Form(form): Form<DecoratorForm>,
) -> Response {
    let decorator = match form.validate() {
        Ok(decorator) => decorator,
        Err(errors) => return show_page(auth, &state, id, form, errors, None).await,
    };

    let result = auth.api(&state).decorators().add(id, &decorator).await;
    match result {
        Ok(_) => Redirect::to(&format!("/appointments/{id}?notice=decorator_added")).into_response(),
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to add decorator to appointment {id}: {e}");
            let alert = Some(PageAlert::error(e.user_message()));
            show_page(auth, &state, id, form, FormErrors::new(), alert).await
        }
    }
}

/// Remove decorator handler (staff).
#[instrument(skip(auth, state))]
pub async fn remove_decorator(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path((id, decorator_id)): Path<(AppointmentId, DecoratorId)>,
) -> Response {
    let result = auth.api(&state).decorators().remove(id, decorator_id).await;
    match result {
        Ok(()) => {
            Redirect::to(&format!("/appointments/{id}?notice=decorator_removed")).into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to remove decorator {decorator_id}: {e}");
            let alert = Some(PageAlert::error(e.user_message()));
            show_page(auth, &state, id, DecoratorForm::default(), FormErrors::new(), alert).await
        }
    }
}

// ---------------------------------------------------------------------------
// Status, cancel, delete
// ---------------------------------------------------------------------------

/// Status change form data.
#[derive(Debug, Default, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: String,
}

/// Status change handler (staff).
#[instrument(skip(auth, state, form))]
pub async fn update_status(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
    Form(form): Form<StatusForm>,
) -> Response {
    let mut errors = FormErrors::new();
    let Some(status) = errors.choice::<AppointmentStatus>("status", "Status", &form.status) else {
        let alert = errors.get("status").map(PageAlert::error);
        return show_page(auth, &state, id, DecoratorForm::default(), FormErrors::new(), alert)
            .await;
    };

    let api = auth.api(&state);
    let result = match api.appointments().get(id).await {
        Ok(current) if current.status.is_closed() => return closed_redirect(id),
        Ok(_) => api.appointments().update_status(id, status).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => {
            tracing::info!(appointment_id = %id, status = status.as_str(), "Appointment status changed");
            Redirect::to(&format!("/appointments/{id}?notice=status_updated")).into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to change status of appointment {id}: {e}");
            let alert = Some(PageAlert::error(e.user_message()));
            show_page(auth, &state, id, DecoratorForm::default(), FormErrors::new(), alert).await
        }
    }
}

fn cancel_page(auth: &Authenticated, id: AppointmentId, what: &str) -> ConfirmTemplate {
    ConfirmTemplate {
        nav: Nav::new(auth.user(), "/appointments"),
        alert: None,
        title: "Cancel appointment".to_string(),
        message: format!("Cancel {what}? The clinic will be notified."),
        action: format!("/appointments/{id}/cancel"),
        confirm_label: "Cancel appointment".to_string(),
        cancel_href: format!("/appointments/{id}"),
    }
}

/// Cancel confirmation handler.
#[instrument(skip(auth, state))]
pub async fn cancel_confirm(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
) -> Response {
    let result = fetch_visible(&auth, &state, id).await;
    match result {
        Ok(appointment) if appointment.status.is_closed() => closed_redirect(id),
        Ok(appointment) => {
            let row = AppointmentRow::from(&appointment);
            let what = format!("{}'s appointment on {}", row.pet_name, row.scheduled);
            render(&cancel_page(&auth, id, &what)).into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch appointment {id}: {e}");
            let mut template = cancel_page(&auth, id, &format!("appointment #{id}"));
            template.alert = Some(PageAlert::from_backend(&e));
            render(&template).into_response()
        }
    }
}

/// Cancel handler. Owners may cancel their own appointments.
#[instrument(skip(auth, state))]
pub async fn cancel(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
) -> Response {
    let result = match fetch_visible(&auth, &state, id).await {
        Ok(current) if current.status.is_closed() => return closed_redirect(id),
        Ok(_) => {
            auth.api(&state)
                .appointments()
                .update_status(id, AppointmentStatus::Cancelled)
                .await
        }
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => {
            tracing::info!(appointment_id = %id, "Appointment cancelled");
            Redirect::to(&format!("/appointments/{id}?notice=cancelled")).into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to cancel appointment {id}: {e}");
            let mut template = cancel_page(&auth, id, &format!("appointment #{id}"));
            template.alert = Some(PageAlert::error(e.user_message()));
            render(&template).into_response()
        }
    }
}

fn delete_page(auth: &Authenticated, id: AppointmentId, name: &str) -> ConfirmTemplate {
    ConfirmTemplate::delete(
        Nav::new(auth.user(), "/appointments"),
        "appointment",
        name,
        format!("/appointments/{id}/delete"),
        format!("/appointments/{id}"),
    )
}

/// Delete confirmation handler (admin).
#[instrument(skip(auth, state))]
pub async fn delete_confirm(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
) -> Response {
    let result = auth.api(&state).appointments().get(id).await;
    match result {
        Ok(appointment) => {
            let row = AppointmentRow::from(&appointment);
            let name = format!("{}, {}", row.pet_name, row.scheduled);
            render(&delete_page(&auth, id, &name)).into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::error!("Failed to fetch appointment {id}: {e}");
            let mut template = delete_page(&auth, id, &format!("#{id}"));
            template.alert = Some(PageAlert::from_backend(&e));
            render(&template).into_response()
        }
    }
}

/// Delete handler (admin).
#[instrument(skip(auth, state))]
pub async fn delete(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
) -> Response {
    let result = auth.api(&state).appointments().delete(id).await;
    match result {
        Ok(()) => {
            tracing::info!(appointment_id = %id, "Appointment deleted");
            Redirect::to("/appointments?notice=deleted").into_response()
        }
        Err(e) if e.is_unauthorized() => auth.sign_out().await,
        Err(e) => {
            tracing::warn!("Failed to delete appointment {id}: {e}");
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
    use vetdesk_core::Role;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn form(at: &str) -> AppointmentForm {
        AppointmentForm {
            pet_id: "3".to_string(),
            veterinarian_id: String::new(),
            service_id: "2".to_string(),
            scheduled_at: at.to_string(),
            reason: "Annual checkup".to_string(),
        }
    }

    fn appointment(owner: Option<i64>) -> Appointment {
        serde_json::from_value(serde_json::json!({
            "id": 9,
            "petId": 3,
            "ownerId": owner,
            "scheduledAt": "2026-03-14T09:30:00",
            "status": "scheduled"
        }))
        .unwrap()
    }

    fn user(role: Role, id: i64) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            email: "someone@example.com".to_string(),
            first_name: "Sam".to_string(),
            last_name: "Reyes".to_string(),
            phone: None,
            role,
        }
    }

    #[test]
    fn test_valid_form_builds_input() {
        let input = form("2026-03-14T09:30").validate(true, now()).unwrap();
        assert_eq!(input.pet_id, PetId::new(3));
        assert_eq!(input.veterinarian_id, None);
        assert_eq!(input.service_id, Some(ServiceId::new(2)));
        assert_eq!(input.reason.as_deref(), Some("Annual checkup"));
    }

    #[test]
    fn test_new_booking_must_be_in_future() {
        let errors = form("2026-02-01T09:30").validate(true, now()).unwrap_err();
        assert!(errors.has("scheduled_at"));
        assert!(form("2026-02-01T09:30").validate(false, now()).is_ok());
    }

    #[test]
    fn test_rejects_garbage() {
        let mut form = form("tomorrow");
        form.pet_id = String::new();
        form.veterinarian_id = "abc".to_string();
        let errors = form.validate(true, now()).unwrap_err();
        assert!(errors.has("pet_id"));
        assert!(errors.has("veterinarian_id"));
        assert!(errors.has("scheduled_at"));
    }

    #[test]
    fn test_decorator_form() {
        let ok = DecoratorForm {
            kind: "priority".to_string(),
            content: " Post-op check ".to_string(),
        };
        let decorator = ok.validate().unwrap();
        assert_eq!(decorator.kind, DecoratorKind::Priority);
        assert_eq!(decorator.content, "Post-op check");

        let bad = DecoratorForm {
            kind: "sticker".to_string(),
            content: "x".repeat(501),
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.has("kind"));
        assert!(errors.has("content"));
    }

    #[test]
    fn test_owners_only_see_their_appointments() {
        let owner = user(Role::Owner, 5);
        assert!(visible_to(&owner, &appointment(Some(5))));
        assert!(!visible_to(&owner, &appointment(Some(6))));
        assert!(visible_to(&owner, &appointment(None)));
        assert!(visible_to(&user(Role::Receptionist, 1), &appointment(Some(6))));
    }

    #[test]
    fn test_row_falls_back_to_pet_id() {
        let row = AppointmentRow::from(&appointment(None));
        assert_eq!(row.pet_name, "Pet #3");
        assert_eq!(row.status_label, "Scheduled");
        assert!(!row.is_closed);
    }
}
