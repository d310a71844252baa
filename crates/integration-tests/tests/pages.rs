//! Page rendering against the fake clinic API: envelope shapes, error
//! banners and response headers.
//!
//! Run with: cargo test -p vetdesk-integration-tests

use reqwest::StatusCode;

use vetdesk_integration_tests::{PetsReply, Scenario, TestApp, UPDATED_PHONE, location};

async fn signed_in(pets: PetsReply) -> TestApp {
    let app = TestApp::spawn(Scenario {
        pets,
        ..Scenario::default()
    })
    .await;
    app.login("correct-horse", false).await;
    app
}

async fn pets_page(app: &TestApp) -> String {
    let resp = app.get("/pets").await;
    assert_eq!(resp.status(), StatusCode::OK);
    resp.text().await.unwrap()
}

#[tokio::test]
async fn test_health_needs_no_session() {
    let app = TestApp::spawn(Scenario::default()).await;

    let resp = app.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_security_headers_on_pages() {
    let app = TestApp::spawn(Scenario::default()).await;

    let resp = app.get("/auth/login").await;
    let headers = resp.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    let csp = headers["content-security-policy"].to_str().unwrap();
    assert!(csp.contains("script-src 'none'"));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_stylesheet_is_served() {
    let app = TestApp::spawn(Scenario::default()).await;

    let resp = app.get("/static/css/admin.css").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrapped_list_envelope() {
    let app = signed_in(PetsReply::Wrapped).await;

    let body = pets_page(&app).await;
    assert!(body.contains("Biscuit"));
    assert!(body.contains("Beagle"));
}

#[tokio::test]
async fn test_paged_list_envelope() {
    let app = signed_in(PetsReply::Paged).await;

    let body = pets_page(&app).await;
    assert!(body.contains("Biscuit"));
}

#[tokio::test]
async fn test_search_filters_rows() {
    let app = signed_in(PetsReply::Wrapped).await;

    let body = app.get("/pets?q=whiskers").await.text().await.unwrap();
    assert!(!body.contains("Beagle"));

    let body = app.get("/pets?q=BISC").await.text().await.unwrap();
    assert!(body.contains("Beagle"));
}

#[tokio::test]
async fn test_forbidden_shows_banner() {
    let app = signed_in(PetsReply::Error(StatusCode::FORBIDDEN, "staff only")).await;

    let body = pets_page(&app).await;
    assert!(body.contains("You do not have permission to perform this action."));
    assert!(body.contains("Reload"));
}

#[tokio::test]
async fn test_not_found_shows_banner() {
    let app = signed_in(PetsReply::Error(StatusCode::NOT_FOUND, "no such route")).await;

    let body = pets_page(&app).await;
    assert!(body.contains("The requested record could not be found."));
}

#[tokio::test]
async fn test_validation_message_is_passed_through() {
    let app = signed_in(PetsReply::Error(
        StatusCode::BAD_REQUEST,
        "Species filter is not supported",
    ))
    .await;

    let body = pets_page(&app).await;
    assert!(body.contains("Species filter is not supported"));
}

#[tokio::test]
async fn test_server_errors_are_not_leaked() {
    let app = signed_in(PetsReply::Error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "panic at pets.go:42",
    ))
    .await;

    let body = pets_page(&app).await;
    assert!(body.contains("Something went wrong. Please try again."));
    assert!(!body.contains("pets.go"));
}

#[tokio::test]
async fn test_unauthorized_api_call_signs_out() {
    let app = signed_in(PetsReply::Error(StatusCode::UNAUTHORIZED, "token revoked")).await;

    let resp = app.get("/pets").await;
    assert_eq!(location(&resp).as_deref(), Some("/auth/login"));

    let resp = app.get("/").await;
    assert_eq!(location(&resp).as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn test_invalid_form_is_rerendered_without_api_call() {
    let app = signed_in(PetsReply::Wrapped).await;

    let resp = app
        .client
        .post(app.url("/pets"))
        .form(&[("name", ""), ("species", "Dog"), ("weight_kg", "-2")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Name is required"));
    assert!(body.contains("Weight"));
    assert!(
        app.clinic
            .requests_to("/pets")
            .iter()
            .all(|r| r.method == "GET")
    );
}

#[tokio::test]
async fn test_profile_shows_current_account() {
    let app = signed_in(PetsReply::Wrapped).await;

    let resp = app.get("/profile").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains(UPDATED_PHONE));
    assert!(body.contains("olive@example.com"));

    let calls = app.clinic.requests_to("/auth/me");
    assert_eq!(calls.len(), 1);
    assert!(calls[0].bearer.is_some());
}
