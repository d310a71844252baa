//! Sign-in, session lifetime and access gating, end to end.
//!
//! Each test runs the front end against an in-process fake clinic API.
//!
//! Run with: cargo test -p vetdesk-integration-tests

use reqwest::StatusCode;

use vetdesk_integration_tests::{Scenario, TestApp, WRONG_PASSWORD, location};

fn session_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("vetdesk_session="))
        .map(str::to_ascii_lowercase)
}

#[tokio::test]
async fn test_protected_pages_redirect_to_login() {
    let app = TestApp::spawn(Scenario::default()).await;

    for path in ["/", "/pets", "/appointments", "/profile", "/auth/change-password"] {
        let resp = app.get(path).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp).as_deref(), Some("/auth/login"), "{path}");
    }
}

#[tokio::test]
async fn test_login_redirects_home_and_guest_pages_bounce() {
    let app = TestApp::spawn(Scenario::default()).await;

    let resp = app.login("correct-horse", false).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/"));

    let resp = app.get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Welcome back, Olive"));

    for path in ["/auth/login", "/auth/register", "/auth/forgot-password"] {
        let resp = app.get(path).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp).as_deref(), Some("/"), "{path}");
    }
}

#[tokio::test]
async fn test_bad_credentials_show_banner() {
    let app = TestApp::spawn(Scenario::default()).await;

    let resp = app.login(WRONG_PASSWORD, false).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Invalid email or password."));
    assert!(body.contains("olive@example.com"));

    let resp = app.get("/pets").await;
    assert_eq!(location(&resp).as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn test_remember_me_sets_persistent_cookie() {
    let app = TestApp::spawn(Scenario::default()).await;

    let resp = app.login("correct-horse", true).await;
    let cookie = session_cookie(&resp).expect("session cookie set");
    assert!(cookie.contains("max-age=") || cookie.contains("expires="));
    assert!(cookie.contains("httponly"));
}

#[tokio::test]
async fn test_without_remember_me_cookie_ends_with_browser() {
    let app = TestApp::spawn(Scenario::default()).await;

    let resp = app.login("correct-horse", false).await;
    let cookie = session_cookie(&resp).expect("session cookie set");
    assert!(!cookie.contains("max-age="));
    assert!(!cookie.contains("expires="));
}

#[tokio::test]
async fn test_remembered_cookie_is_renewed_on_visits() {
    let app = TestApp::spawn(Scenario::default()).await;
    app.login("correct-horse", true).await;

    let resp = app.get("/pets").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = session_cookie(&resp).expect("remembered cookie re-issued");
    assert!(cookie.contains("max-age=") || cookie.contains("expires="));
}

#[tokio::test]
async fn test_browser_session_cookie_is_not_reissued() {
    let app = TestApp::spawn(Scenario::default()).await;
    app.login("correct-horse", false).await;

    let resp = app.get("/pets").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(session_cookie(&resp).is_none());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::spawn(Scenario::default()).await;
    app.login("correct-horse", true).await;

    let resp = app
        .client
        .post(app.url("/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(
        location(&resp).as_deref(),
        Some("/auth/login?notice=signed_out")
    );

    let resp = app.get("/").await;
    assert_eq!(location(&resp).as_deref(), Some("/auth/login"));
    assert_eq!(app.get("/auth/login").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_once() {
    let app = TestApp::spawn(Scenario {
        access_ttl: -60,
        ..Scenario::default()
    })
    .await;
    app.login("correct-horse", false).await;
    let issued = app.clinic.requests_to("/auth/login").len();
    assert_eq!(issued, 1);

    let resp = app.get("/pets").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Biscuit"));
    assert_eq!(app.clinic.requests_to("/auth/refresh").len(), 1);

    // The refreshed token is still valid on the next page.
    assert_eq!(app.get("/pets").await.status(), StatusCode::OK);
    assert_eq!(app.clinic.requests_to("/auth/refresh").len(), 1);

    let bearers: Vec<_> = app
        .clinic
        .requests_to("/pets")
        .into_iter()
        .map(|r| r.bearer.expect("pets call is authenticated"))
        .collect();
    assert_eq!(bearers.len(), 2);
    assert_eq!(bearers[0], bearers[1]);
}

#[tokio::test]
async fn test_failed_refresh_signs_out() {
    let app = TestApp::spawn(Scenario {
        access_ttl: -60,
        refresh_succeeds: false,
        ..Scenario::default()
    })
    .await;
    app.login("correct-horse", true).await;

    let resp = app.get("/pets").await;
    assert_eq!(location(&resp).as_deref(), Some("/auth/login"));
    assert!(app.clinic.requests_to("/pets").is_empty());

    // Session was cleared, so the login page is reachable again.
    assert_eq!(app.get("/auth/login").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_role_gates() {
    let app = TestApp::spawn(Scenario::default()).await;
    app.login("correct-horse", false).await;

    for path in ["/triage", "/consultations", "/users", "/services/new"] {
        assert_eq!(app.get(path).await.status(), StatusCode::FORBIDDEN, "{path}");
    }
    assert_eq!(app.get("/services").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_staff_reach_triage() {
    let app = TestApp::spawn(Scenario {
        role: "receptionist",
        ..Scenario::default()
    })
    .await;
    app.login("correct-horse", false).await;

    assert_eq!(app.get("/triage").await.status(), StatusCode::OK);
    assert_eq!(app.get("/consultations").await.status(), StatusCode::FORBIDDEN);
}
