//! Dashboard route handler.
//!
//! One page, four layouts:
//!
//! - admin: clinic stats, inventory alerts, newest accounts
//! - veterinarian: own appointments today, triage queue, inventory alerts
//! - receptionist: all appointments today, triage queue
//! - owner: own pets, upcoming appointments

use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::{Local, NaiveDateTime};
use tracing::instrument;

use vetdesk_core::{Role, TriageStatus};

use crate::backend::{
    Api, Appointment, AppointmentFilter, BackendError, DashboardStats, InventoryAlert, PetFilter, Triage,
    UserFilter,
};
use crate::components::{Nav, PageAlert};
use crate::filters;
use crate::middleware::auth::RequireAuth;
use crate::models::CurrentUser;
use crate::state::AppState;

use super::appointments::{AppointmentRow, visible_to};
use super::pets::PetRow;
use super::render;
use super::triage::TriageRow;
use super::users::UserRow;

/// Rows shown in each dashboard list.
const LIST_LIMIT: usize = 5;

/// Inventory alert view for templates.
#[derive(Debug, Clone)]
pub struct InventoryAlertView {
    pub item_name: String,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub shortfall: i64,
    pub level: String,
    pub badge_class: String,
}

impl From<&InventoryAlert> for InventoryAlertView {
    fn from(alert: &InventoryAlert) -> Self {
        Self {
            item_name: alert.item_name.clone(),
            current_stock: alert.current_stock,
            minimum_stock: alert.minimum_stock,
            shortfall: alert.shortfall(),
            level: alert.severity.label().to_string(),
            badge_class: alert.severity.badge_class().to_string(),
        }
    }
}

/// Panels shown on the dashboard.
///
/// A `show_*` flag is set when the role gets the panel, even if its list
/// came back empty.
#[derive(Debug, Default)]
pub struct DashboardPanels {
    pub stats: Option<DashboardStats>,
    pub show_alerts: bool,
    pub inventory_alerts: Vec<InventoryAlertView>,
    pub show_users: bool,
    pub recent_users: Vec<UserRow>,
    pub show_appointments: bool,
    pub appointments_title: String,
    pub appointments: Vec<AppointmentRow>,
    pub show_triage: bool,
    pub triage: Vec<TriageRow>,
    pub show_pets: bool,
    pub pets: Vec<PetRow>,
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard/index.html")]
pub struct DashboardTemplate {
    pub nav: Nav,
    pub alert: Option<PageAlert>,
    pub greeting: String,
    pub today: String,
    pub panels: DashboardPanels,
}

/// Keeps the first load failure for the banner.
#[derive(Default)]
struct Failures {
    first: Option<BackendError>,
    unauthorized: bool,
}

impl Failures {
    fn take<T: Default>(&mut self, what: &str, result: Result<T, BackendError>) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to fetch {what}: {e}");
                self.unauthorized |= e.is_unauthorized();
                if self.first.is_none() {
                    self.first = Some(e);
                }
                T::default()
            }
        }
    }
}

/// Dashboard page handler.
#[instrument(skip(auth, state), fields(role = auth.user().role.as_str()))]
pub async fn index(State(state): State<AppState>, RequireAuth(auth): RequireAuth) -> Response {
    let user = auth.user();
    let api = auth.api(&state);
    let now = Local::now().naive_local();
    let mut failures = Failures::default();

    let panels = match user.role {
        Role::Admin => admin_panels(api, &mut failures).await,
        Role::Veterinarian => veterinarian_panels(api, user, now, &mut failures).await,
        Role::Receptionist => receptionist_panels(api, now, &mut failures).await,
        Role::Owner => owner_panels(api, user, now, &mut failures).await,
    };

    if failures.unauthorized {
        return auth.sign_out().await;
    }

    let template = DashboardTemplate {
        nav: Nav::new(user, "/"),
        alert: failures.first.as_ref().map(PageAlert::from_backend),
        greeting: format!("Welcome back, {}", user.first_name.trim()),
        today: now.format("%A, %B %-d").to_string(),
        panels,
    };

    render(&template).into_response()
}

async fn admin_panels(api: Api<'_>, failures: &mut Failures) -> DashboardPanels {
    let user_filter = UserFilter::default();
    let (stats, alerts, users) = tokio::join!(
        api.dashboard().stats(),
        api.dashboard().inventory_alerts(),
        api.users().list(&user_filter),
    );

    let stats = failures.take("dashboard stats", stats);
    let alerts = failures.take("inventory alerts", alerts);
    let mut users = failures.take("users", users).items;
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    DashboardPanels {
        stats: Some(stats),
        show_alerts: true,
        inventory_alerts: alerts.iter().map(InventoryAlertView::from).collect(),
        show_users: true,
        recent_users: users.iter().take(LIST_LIMIT).map(UserRow::from).collect(),
        ..DashboardPanels::default()
    }
}

async fn veterinarian_panels(
    api: Api<'_>,
    user: &CurrentUser,
    now: NaiveDateTime,
    failures: &mut Failures,
) -> DashboardPanels {
    let filter = AppointmentFilter {
        date: Some(now.date()),
        veterinarian_id: Some(user.id),
        ..AppointmentFilter::default()
    };
    let (appointments, triage, alerts) = tokio::join!(
        api.appointments().list(&filter),
        api.triage().list(),
        api.dashboard().inventory_alerts(),
    );

    let mut appointments = failures.take("appointments", appointments).items;
    appointments.retain(|a| a.date() == now.date());
    appointments.sort_by_key(|a| a.scheduled_at);
    let triage = failures.take("triage queue", triage).items;
    let alerts = failures.take("inventory alerts", alerts);

    DashboardPanels {
        show_alerts: true,
        inventory_alerts: alerts.iter().map(InventoryAlertView::from).collect(),
        show_appointments: true,
        appointments_title: "Your appointments today".to_string(),
        appointments: appointments.iter().map(AppointmentRow::from).collect(),
        show_triage: true,
        triage: active_triage(&triage),
        ..DashboardPanels::default()
    }
}

async fn receptionist_panels(
    api: Api<'_>,
    now: NaiveDateTime,
    failures: &mut Failures,
) -> DashboardPanels {
    let filter = AppointmentFilter {
        date: Some(now.date()),
        ..AppointmentFilter::default()
    };
    let (appointments, triage) =
        tokio::join!(api.appointments().list(&filter), api.triage().list());

    let mut appointments = failures.take("appointments", appointments).items;
    appointments.retain(|a| a.date() == now.date());
    appointments.sort_by_key(|a| a.scheduled_at);
    let triage = failures.take("triage queue", triage).items;

    DashboardPanels {
        show_appointments: true,
        appointments_title: "Today's appointments".to_string(),
        appointments: appointments.iter().map(AppointmentRow::from).collect(),
        show_triage: true,
        triage: active_triage(&triage),
        ..DashboardPanels::default()
    }
}

async fn owner_panels(
    api: Api<'_>,
    user: &CurrentUser,
    now: NaiveDateTime,
    failures: &mut Failures,
) -> DashboardPanels {
    let filter = AppointmentFilter {
        owner_id: Some(user.id),
        ..AppointmentFilter::default()
    };
    let pet_filter = PetFilter::owned_by(user.id);
    let (pets, appointments) = tokio::join!(
        api.pets().list(&pet_filter),
        api.appointments().list(&filter),
    );

    let mut pets = failures.take("pets", pets).items;
    pets.retain(|p| p.owner_id == user.id);
    let mut upcoming = failures.take("appointments", appointments).items;
    upcoming.retain(|a| is_upcoming(user, a, now));
    upcoming.sort_by_key(|a| a.scheduled_at);

    let today = now.date();
    DashboardPanels {
        show_pets: true,
        pets: pets.iter().map(|p| PetRow::new(p, today)).collect(),
        show_appointments: true,
        appointments_title: "Upcoming appointments".to_string(),
        appointments: upcoming
            .iter()
            .take(LIST_LIMIT)
            .map(AppointmentRow::from)
            .collect(),
        ..DashboardPanels::default()
    }
}

/// Open appointments of this owner that have not started yet.
fn is_upcoming(user: &CurrentUser, appointment: &Appointment, now: NaiveDateTime) -> bool {
    visible_to(user, appointment)
        && appointment.scheduled_at >= now
        && !appointment.status.is_closed()
}

/// Patients still waiting or in care, most urgent first.
fn active_triage(records: &[Triage]) -> Vec<TriageRow> {
    records
        .iter()
        .filter(|t| t.status != TriageStatus::Discharged)
        .map(TriageRow::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_keep_first_error() {
        let mut failures = Failures::default();
        let stats: DashboardStats =
            failures.take("stats", Err(BackendError::Forbidden(None)));
        assert_eq!(stats, DashboardStats::default());
        let _: Vec<InventoryAlert> = failures.take("alerts", Err(BackendError::NotFound));
        let kept: u64 = failures.take("count", Ok(3));

        assert_eq!(kept, 3);
        assert!(matches!(failures.first, Some(BackendError::Forbidden(_))));
        assert!(!failures.unauthorized);
    }

    #[test]
    fn test_unauthorized_is_flagged() {
        let mut failures = Failures::default();
        let _: Vec<InventoryAlert> = failures.take("alerts", Err(BackendError::Unauthorized));
        assert!(failures.unauthorized);
    }

    #[test]
    fn test_owner_sees_only_own_upcoming_appointments() {
        let owner = CurrentUser {
            id: vetdesk_core::UserId::new(7),
            email: "olive@example.com".to_string(),
            first_name: "Olive".to_string(),
            last_name: "Hart".to_string(),
            phone: None,
            role: Role::Owner,
        };
        let now = NaiveDateTime::parse_from_str("2026-03-14 12:00", "%Y-%m-%d %H:%M").unwrap();
        let appointments: Vec<Appointment> = serde_json::from_value(serde_json::json!([
            {"id": 1, "petId": 1, "ownerId": 7, "scheduledAt": "2026-03-15T09:00:00", "status": "scheduled"},
            {"id": 2, "petId": 2, "ownerId": 99, "scheduledAt": "2026-03-15T10:00:00", "status": "scheduled"},
            {"id": 3, "petId": 1, "ownerId": 7, "scheduledAt": "2026-03-13T09:00:00", "status": "scheduled"},
            {"id": 4, "petId": 1, "ownerId": 7, "scheduledAt": "2026-03-16T09:00:00", "status": "cancelled"}
        ]))
        .unwrap();

        let kept: Vec<i64> = appointments
            .iter()
            .filter(|a| is_upcoming(&owner, a, now))
            .map(|a| a.id.as_i64())
            .collect();
        assert_eq!(kept, vec![1]);
    }

    #[test]
    fn test_active_triage_hides_discharged() {
        let records: Vec<Triage> = serde_json::from_value(serde_json::json!([
            {"id": 1, "petId": 1, "severity": "low", "symptoms": "cough", "status": "discharged"},
            {"id": 2, "petId": 2, "severity": "high", "symptoms": "limping", "status": "waiting"}
        ]))
        .unwrap();
        let rows = active_triage(&records);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 2);
    }
}
