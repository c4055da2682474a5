
use chrono::Utc;
use contact_backend::{entities::email::DispatchAtomicity, settings::AppConfig};
use reqwest::StatusCode;
use serde_json::{json, Value};
use test_utils::*;

const SUCCESS: &str = "Thank you for your message! We'll get back to you within 24 hours.";
const GENERIC_FAILURE: &str =
    "Sorry, there was an issue sending your message. Please try again or contact us directly.";

#[actix_rt::test]
async fn valid_submission_sends_both_emails() {
    let app = TestApp::spawn().await;

    let response = app.post_contact("203.0.113.10", &valid_submission()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"success": true, "message": SUCCESS}));

    let sent = app.sender.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, vec!["alonso.molina@cypcore.com".to_string()]);
    assert_eq!(sent[0].subject, "New Contact Form Submission from Jane Doe");
    assert_eq!(sent[1].to, vec!["jane@example.com".to_string()]);
    assert_eq!(sent[1].subject, "Thank you for contacting CyP Data");
}

#[actix_rt::test]
async fn spam_is_acknowledged_but_not_sent() {
    let app = TestApp::spawn().await;
    let mut submission = valid_submission();
    submission["message"] = json!("Earn free BITCOIN with our amazing offer today");

    let response = app.post_contact("203.0.113.11", &submission).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"success": true, "message": "Thank you for your message!"}));
    assert!(app.sender.sent().is_empty());
}

#[actix_rt::test]
async fn invalid_email_returns_field_errors() {
    let app = TestApp::spawn().await;
    let mut submission = valid_submission();
    submission["email"] = json!("not-an-email");

    let response = app.post_contact("203.0.113.12", &submission).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Validation failed");
    let email_errors = body["details"]["email"].as_array().unwrap();
    assert!(!email_errors.is_empty());
    assert!(body["details"].get("name").is_none());

    assert!(app.sender.sent().is_empty());
    let entry = app.rate_limit_entry("203.0.113.12").await.unwrap();
    assert_eq!(entry.count, 1);
}

#[actix_rt::test]
async fn sixth_request_within_the_hour_is_rate_limited() {
    let app = TestApp::spawn().await;

    for _ in 0..5 {
        let response = app.post_contact("203.0.113.13", &valid_submission()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.post_contact("203.0.113.13", &valid_submission()).await;

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Too many requests. Please try again later.");
    let reset_time = body["resetTime"].as_i64().unwrap();
    assert!(reset_time > Utc::now().timestamp_millis());
    assert_eq!(app.sender.sent().len(), 10);
}

#[actix_rt::test]
async fn rate_limit_is_per_address() {
    let app = TestApp::spawn().await;

    for _ in 0..5 {
        app.post_contact("203.0.113.14", &valid_submission()).await;
    }

    let response = app.post_contact("203.0.113.15", &valid_submission()).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn missing_proxy_headers_share_the_loopback_bucket() {
    let app = TestApp::spawn().await;

    let response = app.client
        .post(format!("{}/api/contact", app.address))
        .json(&valid_submission())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.rate_limit_entry("127.0.0.1").await.unwrap().count, 1);
}

#[actix_rt::test]
async fn rate_limited_request_is_rejected_before_parsing() {
    let app = TestApp::spawn().await;

    for _ in 0..5 {
        app.post_raw("203.0.113.16", "{not json").await;
    }

    let response = app.post_raw("203.0.113.16", "{not json").await;

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[actix_rt::test]
async fn malformed_body_returns_generic_error() {
    let app = TestApp::spawn().await;

    let response = app.post_raw("203.0.113.17", "{\"name\": \"Jane").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": GENERIC_FAILURE}));
    assert!(app.sender.sent().is_empty());
}

#[actix_rt::test]
async fn team_notification_failure_returns_generic_error() {
    let app = TestApp::spawn_with(RecordingEmailSender::failing(FailMode::Team), test_config()).await;

    let response = app.post_contact("203.0.113.18", &valid_submission()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": GENERIC_FAILURE}));
    assert_eq!(app.sender.sent().len(), 1);
}

#[actix_rt::test]
async fn confirmation_failure_fails_the_request_under_all_or_nothing() {
    let app = TestApp::spawn_with(RecordingEmailSender::failing(FailMode::User), test_config()).await;

    let response = app.post_contact("203.0.113.19", &valid_submission()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.sender.sent().len(), 2);
}

#[actix_rt::test]
async fn confirmation_failure_still_succeeds_under_best_effort() {
    let config = AppConfig {
        dispatch_atomicity: DispatchAtomicity::BestEffort,
        ..test_config()
    };
    let app = TestApp::spawn_with(RecordingEmailSender::failing(FailMode::User), config).await;

    let response = app.post_contact("203.0.113.20", &valid_submission()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], SUCCESS);
}

#[actix_rt::test]
async fn health_reports_wiring() {
    let app = TestApp::spawn().await;

    let response = app.client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["email_provider"], "recording");
    assert_eq!(body["rate_limit_store"], "memory");
}
