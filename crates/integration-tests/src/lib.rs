//! Integration test harness for the VetDesk front end.
//!
//! Each test starts two servers on ephemeral ports:
//!
//! - a [`FakeClinic`] standing in for the clinic REST API, whose answers the
//!   test scripts through [`Scenario`]
//! - the real front end router, pointed at the fake
//!
//! and drives the front end with a cookie-keeping `reqwest` client that does
//! not follow redirects, so tests can assert on `Location` headers.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};

use vetdesk_admin::build_router;
use vetdesk_admin::config::AdminConfig;
use vetdesk_admin::state::AppState;

/// Password the fake API refuses.
pub const WRONG_PASSWORD: &str = "not-the-password";

/// ID of the user the fake API signs in.
pub const USER_ID: i64 = 7;

/// Phone number `GET /auth/me` reports, unlike the one sent at login.
pub const UPDATED_PHONE: &str = "+44 20 7946 0123";

/// Pet and appointment of the signed-in owner.
pub const OWN_PET_ID: i64 = 31;
pub const OWN_APPOINTMENT_ID: i64 = 41;

/// Pet and appointment belonging to someone else. Their names never appear
/// in any other fixture.
pub const STRANGER_PET_ID: i64 = 32;
pub const STRANGER_PET_NAME: &str = "Marmalade";
pub const STRANGER_APPOINTMENT_ID: i64 = 42;

/// How the fake API answers `GET /pets`.
#[derive(Debug, Clone)]
pub enum PetsReply {
    /// `{ "success": true, "data": [...] }`
    Wrapped,
    /// `{ "data": { "items": [...], "total": n } }`
    Paged,
    /// An error status with a JSON `message`.
    Error(StatusCode, &'static str),
}

/// Scripted behavior of the fake clinic API.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Role of the signed-in user.
    pub role: &'static str,
    /// Lifetime of issued access tokens, in seconds. Zero or less issues
    /// tokens that are already expired.
    pub access_ttl: i64,
    /// Whether `POST /auth/refresh` hands out a new pair.
    pub refresh_succeeds: bool,
    /// Reply to `GET /pets`.
    pub pets: PetsReply,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            role: "owner",
            access_ttl: 3600,
            refresh_succeeds: true,
            pets: PetsReply::Wrapped,
        }
    }
}

/// A request the fake API received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub bearer: Option<String>,
}

#[derive(Debug, Default)]
struct ClinicState {
    scenario: Scenario,
    requests: Vec<Recorded>,
    issued: u32,
}

type Shared = Arc<Mutex<ClinicState>>;

fn lock(state: &Shared) -> MutexGuard<'_, ClinicState> {
    state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// In-process stand-in for the clinic REST API.
#[derive(Debug, Clone)]
pub struct FakeClinic {
    state: Shared,
    addr: SocketAddr,
}

impl FakeClinic {
    /// Start the fake API with the given scenario.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start(scenario: Scenario) -> Self {
        let state: Shared = Arc::new(Mutex::new(ClinicState {
            scenario,
            ..ClinicState::default()
        }));

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/refresh", post(refresh))
            .route("/auth/me", get(me))
            .route("/pets", get(pets).post(empty_list))
            .route("/pets/{id}", get(pet_by_id).fallback(empty_list))
            .route("/appointments", get(appointments).post(empty_list))
            .route(
                "/appointments/{id}",
                get(appointment_by_id).fallback(empty_list),
            )
            .fallback(empty_list)
            .with_state(state.clone());

        let addr = serve(app).await;
        Self { state, addr }
    }

    /// Base URL the front end should call.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Change the scenario mid-test.
    pub fn update(&self, f: impl FnOnce(&mut Scenario)) {
        f(&mut lock(&self.state).scenario);
    }

    /// Requests received for `path`, oldest first.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

/// The front end under test.
#[derive(Debug)]
pub struct TestApp {
    pub clinic: FakeClinic,
    pub client: reqwest::Client,
    addr: SocketAddr,
}

impl TestApp {
    /// Start a fake clinic API and a front end pointed at it.
    ///
    /// # Panics
    ///
    /// Panics if either server fails to start.
    pub async fn spawn(scenario: Scenario) -> Self {
        let clinic = FakeClinic::start(scenario).await;

        let config = AdminConfig::for_api(&clinic.base_url()).expect("valid test config");
        let state = AppState::new(config).expect("failed to create app state");
        let addr = serve(build_router(state)).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            clinic,
            client,
            addr,
        }
    }

    /// Absolute URL for a front end path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// GET a front end page.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed")
    }

    /// Submit the login form.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn login(&self, password: &str, remember_me: bool) -> reqwest::Response {
        let mut form = vec![("email", "olive@example.com"), ("password", password)];
        if remember_me {
            form.push(("remember_me", "on"));
        }
        self.client
            .post(self.url("/auth/login"))
            .form(&form)
            .send()
            .await
            .expect("login request failed")
    }
}

/// `Location` header of a redirect, if any.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Build an unsigned JWT whose `exp` is `ttl` seconds from now.
#[must_use]
pub fn token_expiring_in(ttl: i64, serial: u32) -> String {
    let exp = chrono::Utc::now().timestamp() + ttl;
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let claims =
        URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"{USER_ID}","exp":{exp},"n":{serial}}}"#));
    format!("{header}.{claims}.c2lnbmF0dXJl")
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}

/// Log the request and return the scenario with a per-request serial number.
fn record(state: &Shared, method: &Method, uri: &Uri, headers: &HeaderMap) -> (Scenario, u32) {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(String::from);
    let mut guard = lock(state);
    guard.requests.push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        bearer,
    });
    guard.issued += 1;
    (guard.scenario.clone(), guard.issued)
}

fn user_json(role: &str) -> Value {
    json!({
        "id": USER_ID,
        "email": "olive@example.com",
        "firstName": "Olive",
        "lastName": "Hart",
        "phone": "+44 20 7946 0000",
        "role": role,
        "isActive": true
    })
}

fn pet_json() -> Value {
    json!({
        "id": OWN_PET_ID,
        "ownerId": USER_ID,
        "ownerName": "Olive Hart",
        "name": "Biscuit",
        "species": "Dog",
        "breed": "Beagle",
        "weightKg": 12.5
    })
}

fn stranger_pet_json() -> Value {
    json!({
        "id": STRANGER_PET_ID,
        "ownerId": 99,
        "ownerName": "Sam Reyes",
        "name": STRANGER_PET_NAME,
        "species": "Cat",
        "breed": "Tabby"
    })
}

fn appointment_json() -> Value {
    json!({
        "id": OWN_APPOINTMENT_ID,
        "petId": OWN_PET_ID,
        "petName": "Biscuit",
        "ownerId": USER_ID,
        "ownerName": "Olive Hart",
        "scheduledAt": "2099-01-01T09:00:00",
        "status": "scheduled",
        "reason": "Annual vaccination"
    })
}

fn stranger_appointment_json() -> Value {
    json!({
        "id": STRANGER_APPOINTMENT_ID,
        "petId": STRANGER_PET_ID,
        "petName": STRANGER_PET_NAME,
        "ownerId": 99,
        "ownerName": "Sam Reyes",
        "scheduledAt": "2099-01-02T10:00:00",
        "status": "scheduled",
        "reason": "Dental check"
    })
}

async fn login(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let (scenario, serial) = record(&state, &method, &uri, &headers);
    if body.get("password").and_then(Value::as_str) == Some(WRONG_PASSWORD) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response();
    }

    Json(json!({
        "success": true,
        "data": {
            "user": user_json(scenario.role),
            "accessToken": token_expiring_in(scenario.access_ttl, serial),
            "refreshToken": "refresh-token"
        }
    }))
    .into_response()
}

async fn refresh(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let (scenario, serial) = record(&state, &method, &uri, &headers);
    if !scenario.refresh_succeeds {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Refresh token expired" })),
        )
            .into_response();
    }

    Json(json!({
        "data": {
            "accessToken": token_expiring_in(3600, serial),
            "refreshToken": "refresh-token-2"
        }
    }))
    .into_response()
}

/// The account as an admin has since edited it: a new phone number.
async fn me(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let (scenario, _) = record(&state, &method, &uri, &headers);
    let mut user = user_json(scenario.role);
    user["phone"] = json!(UPDATED_PHONE);
    Json(json!({ "success": true, "data": user })).into_response()
}

async fn pets(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let (scenario, _) = record(&state, &method, &uri, &headers);
    match scenario.pets {
        PetsReply::Wrapped => Json(json!({
            "success": true,
            "data": [pet_json(), stranger_pet_json()]
        }))
        .into_response(),
        PetsReply::Paged => {
            Json(json!({ "data": { "items": [pet_json()], "total": 1 } })).into_response()
        }
        PetsReply::Error(status, message) => {
            (status, Json(json!({ "message": message }))).into_response()
        }
    }
}

async fn pet_by_id(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    record(&state, &method, &uri, &headers);
    match id {
        OWN_PET_ID => Json(json!({ "success": true, "data": pet_json() })).into_response(),
        STRANGER_PET_ID => {
            Json(json!({ "success": true, "data": stranger_pet_json() })).into_response()
        }
        _ => not_found(),
    }
}

/// Every appointment, regardless of the `ownerId` filter, like an API that
/// scopes too loosely.
async fn appointments(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    record(&state, &method, &uri, &headers);
    Json(json!({
        "success": true,
        "data": [appointment_json(), stranger_appointment_json()]
    }))
    .into_response()
}

async fn appointment_by_id(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    record(&state, &method, &uri, &headers);
    match id {
        OWN_APPOINTMENT_ID => {
            Json(json!({ "success": true, "data": appointment_json() })).into_response()
        }
        STRANGER_APPOINTMENT_ID => {
            Json(json!({ "success": true, "data": stranger_appointment_json() }))
                .into_response()
        }
        _ => not_found(),
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Not found" })),
    )
        .into_response()
}

async fn empty_list(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    record(&state, &method, &uri, &headers);
    Json(json!({ "data": [] })).into_response()
}
