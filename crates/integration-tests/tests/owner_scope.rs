//! Pet owners only ever see their own pets and appointments, even when the
//! clinic API hands back other owners' records.
//!
//! Run with: cargo test -p vetdesk-integration-tests

use reqwest::StatusCode;

use vetdesk_integration_tests::{
    OWN_APPOINTMENT_ID, OWN_PET_ID, STRANGER_APPOINTMENT_ID, STRANGER_PET_ID, STRANGER_PET_NAME,
    Scenario, TestApp,
};

const NO_PERMISSION: &str = "You do not have permission to perform this action.";

async fn owner() -> TestApp {
    let app = TestApp::spawn(Scenario::default()).await;
    app.login("correct-horse", false).await;
    app
}

async fn page(app: &TestApp, path: &str) -> String {
    let resp = app.get(path).await;
    assert_eq!(resp.status(), StatusCode::OK, "{path}");
    resp.text().await.unwrap()
}

#[tokio::test]
async fn test_dashboard_hides_other_owners_records() {
    let app = owner().await;

    let body = page(&app, "/").await;
    assert!(body.contains("Upcoming appointments"));
    assert!(body.contains("Biscuit"));
    assert!(!body.contains(STRANGER_PET_NAME));
}

#[tokio::test]
async fn test_lists_hide_other_owners_records() {
    let app = owner().await;

    for path in ["/pets", "/appointments", "/appointments/new"] {
        let body = page(&app, path).await;
        assert!(body.contains("Biscuit"), "{path}");
        assert!(!body.contains(STRANGER_PET_NAME), "{path}");
    }
}

#[tokio::test]
async fn test_staff_see_every_owner() {
    let app = TestApp::spawn(Scenario {
        role: "receptionist",
        ..Scenario::default()
    })
    .await;
    app.login("correct-horse", false).await;

    assert!(page(&app, "/pets").await.contains(STRANGER_PET_NAME));
    assert!(page(&app, "/appointments").await.contains(STRANGER_PET_NAME));
}

#[tokio::test]
async fn test_own_detail_pages_open() {
    let app = owner().await;

    let body = page(&app, &format!("/appointments/{OWN_APPOINTMENT_ID}")).await;
    assert!(body.contains("Annual vaccination"));
    assert!(!body.contains(NO_PERMISSION));

    let body = page(&app, &format!("/pets/{OWN_PET_ID}/edit")).await;
    assert!(body.contains("Biscuit"));
    assert!(!body.contains(NO_PERMISSION));
}

#[tokio::test]
async fn test_other_owners_detail_pages_are_refused() {
    let app = owner().await;

    for path in [
        format!("/appointments/{STRANGER_APPOINTMENT_ID}"),
        format!("/appointments/{STRANGER_APPOINTMENT_ID}/cancel"),
        format!("/pets/{STRANGER_PET_ID}/edit"),
    ] {
        let body = page(&app, &path).await;
        assert!(body.contains(NO_PERMISSION), "{path}");
        assert!(!body.contains(STRANGER_PET_NAME), "{path}");
        assert!(!body.contains("Dental check"), "{path}");
    }

    let resp = app.get(&format!("/pets/{STRANGER_PET_ID}/delete")).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_other_owners_records_cannot_be_changed() {
    let app = owner().await;

    let resp = app
        .client
        .post(app.url(&format!("/appointments/{STRANGER_APPOINTMENT_ID}/cancel")))
        .send()
        .await
        .unwrap();
    assert!(resp.text().await.unwrap().contains(NO_PERMISSION));
    assert!(
        app.clinic
            .requests_to(&format!("/appointments/{STRANGER_APPOINTMENT_ID}/status"))
            .is_empty()
    );

    let resp = app
        .client
        .post(app.url(&format!("/pets/{STRANGER_PET_ID}")))
        .form(&[("name", "Marmalade"), ("species", "Cat")])
        .send()
        .await
        .unwrap();
    assert!(resp.text().await.unwrap().contains(NO_PERMISSION));
    assert!(
        app.clinic
            .requests_to(&format!("/pets/{STRANGER_PET_ID}"))
            .iter()
            .all(|r| r.method == "GET")
    );
}
