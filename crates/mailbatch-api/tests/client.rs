//! Integration tests for the API client.
//!
//! These tests run the client against a mock provider so every failure class
//! can be produced without a real account.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use mailbatch_api::{ApiClient, ApiError, EmailType, Endpoints, LetterFilter, Timeouts};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> ApiClient {
    let endpoints = Endpoints::from_base(format!("{}/v1/", server.uri())).unwrap();
    ApiClient::new(endpoints, "test-token").with_timeouts(Timeouts {
        standard: Duration::from_millis(300),
        extended: Duration::from_millis(300),
    })
}

#[tokio::test]
async fn test_change_password_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/change-password"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "email": "user@example.com",
            "new_password": "new-secret",
            "old_password": "old-secret"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": "Password changed"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let message = client
        .change_password("user@example.com", "old-secret", "new-secret")
        .await
        .unwrap();
    assert_eq!(message, "Password changed");
}

#[tokio::test]
async fn test_change_password_default_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/change-password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let message = client
        .change_password("user@example.com", "old", "new")
        .await
        .unwrap();
    assert_eq!(message, "Password changed successfully.");
}

#[tokio::test]
async fn test_change_password_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/change-password"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"code": 401})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .change_password("user@example.com", "wrong", "new")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn test_provider_rejection_uses_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/change-password"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"code": 400, "data": "Password too short"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .change_password("user@example.com", "old", "x")
        .await
        .unwrap_err();
    match err {
        ApiError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Password too short");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/change-password"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"code": 200}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .change_password("user@example.com", "old", "new")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Timeout));
    assert_eq!(err.to_string(), "request timeout");
}

#[tokio::test]
async fn test_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/change-password"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .change_password("user@example.com", "old", "new")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid response format");
}

#[tokio::test]
async fn test_transport_fault() {
    // Nothing listens on the discard port of the loopback interface.
    let endpoints = Endpoints::from_base("http://127.0.0.1:9/v1/").unwrap();
    let client = ApiClient::new(endpoints, "test-token");
    let err = client
        .change_password("user@example.com", "old", "new")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_) | ApiError::Timeout));
}

#[tokio::test]
async fn test_letters_with_filters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/letters"))
        .and(body_json(json!({
            "email": "user@example.com",
            "password": "secret",
            "filters": {"search": "invoice", "star": true}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": {"letters": [
                {"id": "1", "subject": "Invoice #1", "date": 1700000000},
                {"id": "2", "subject": "Invoice #2", "date": 1700000100, "star": true}
            ]}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let filter = LetterFilter::new().with_search("invoice").starred_only();
    let letters = client
        .letters("user@example.com", "secret", &filter)
        .await
        .unwrap();
    assert_eq!(letters.len(), 2);
    assert_eq!(letters[0].subject(), "Invoice #1");
    assert!(letters[1].star);
}

#[tokio::test]
async fn test_letters_empty_inbox() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/letters"))
        .and(body_json(json!({
            "email": "user@example.com",
            "password": "secret",
            "filters": {}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": {}})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let letters = client
        .letters("user@example.com", "secret", &LetterFilter::new())
        .await
        .unwrap();
    assert!(letters.is_empty());
}

#[tokio::test]
async fn test_letters_embedded_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/letters"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 401, "message": "denied"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .letters("user@example.com", "bad", &LetterFilter::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn test_me() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": {"balance": 150.5, "username": "operator"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let profile = client.me().await.unwrap();
    assert_eq!(profile.username(), "operator");
    assert!((profile.balance - 150.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_buy_emails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/buy-emails"))
        .and(body_json(json!({"count": 2, "type_email": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": ["a@example.com:pw1", "b@example.com:pw2"]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let emails = client.buy_emails(2, EmailType::Unlimited).await.unwrap();
    assert_eq!(emails, vec!["a@example.com:pw1", "b@example.com:pw2"]);
}

#[tokio::test]
async fn test_buy_emails_rejected_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/buy-emails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 402,
            "message": "Insufficient balance"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.buy_emails(5, EmailType::Personal).await.unwrap_err();
    assert_eq!(err.to_string(), "Insufficient balance");
}

#[tokio::test]
async fn test_reachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert_eq!(client.reachable().await.unwrap(), 404);
}
