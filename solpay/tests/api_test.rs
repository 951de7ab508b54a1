use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use solpay::rest::ApiHttpClient;
use solpay::session::AuthSession;
use solpay::PayError;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn user_json(username: &str, credits: u64) -> serde_json::Value {
    json!({
        "id": "66f1a2b3c4d5e6f7a8b9c0d1",
        "email": format!("{username}@example.com"),
        "username": username,
        "credits": credits,
        "postsCreated": 0
    })
}

async fn session_against(server: &MockServer, mirror: Option<PathBuf>) -> AuthSession {
    let api = Arc::new(ApiHttpClient::new(&server.uri()).unwrap());
    AuthSession::new(api, mirror)
}

fn temp_mirror(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("solpay-test-{name}-{}.json", std::process::id()))
}

#[tokio::test]
async fn test_login_success_sets_current_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(
            json!({"email": "alice@example.com", "password": "hunter22"}),
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "user": user_json("alice", 100)})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_against(&server, None).await;
    let user = session.login("alice@example.com", "hunter22").await.unwrap();
    assert_eq!(user.username, "alice");
    assert!(session.is_logged_in());
    assert_eq!(session.current_user().unwrap().credits, 100);
}

#[tokio::test]
async fn test_login_failure_surfaces_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"success": false, "error": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let mut session = session_against(&server, None).await;
    let err = session
        .login("alice@example.com", "wrongpass")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(!session.is_logged_in());
}

#[tokio::test]
async fn test_login_validation_blocks_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = session_against(&server, None).await;
    let err = session.login("alice@example.com", "").await.unwrap_err();
    assert!(matches!(err, PayError::Validation(_)));
    assert_eq!(err.to_string(), "Please enter both email and password");
}

#[tokio::test]
async fn test_register_password_mismatch_blocks_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = session_against(&server, None).await;
    let err = session
        .register("alice", "alice@example.com", "hunter22", "hunter23")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Passwords do not match");
}

#[tokio::test]
async fn test_register_success_logs_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_json(json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "hunter22"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "user": user_json("alice", 0)})),
        )
        .mount(&server)
        .await;

    let mut session = session_against(&server, None).await;
    let user = session
        .register("alice", "alice@example.com", "hunter22", "hunter22")
        .await
        .unwrap();
    assert_eq!(user.username, "alice");
    assert!(session.is_logged_in());
}

#[tokio::test]
async fn test_session_cookie_rides_on_subsequent_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=abc123; Path=/; HttpOnly")
                .set_body_json(json!({"success": true, "user": user_json("alice", 0)})),
        )
        .mount(&server)
        .await;
    // Only matches when the cookie set at login is replayed.
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("cookie", "session=abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "user": user_json("alice", 5)})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiHttpClient::new(&server.uri()).unwrap();
    api.login("alice@example.com", "hunter22").await.unwrap();
    let user = api.me().await.unwrap();
    assert_eq!(user.credits, 5);
}

#[tokio::test]
async fn test_initialize_restores_session_and_writes_mirror() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/verify-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "user": user_json("alice", 42)})),
        )
        .mount(&server)
        .await;

    let mirror = temp_mirror("restore");
    let mut session = session_against(&server, Some(mirror.clone())).await;
    assert!(session.initialize().await);
    assert_eq!(session.current_user().unwrap().credits, 42);

    let written = std::fs::read_to_string(&mirror).unwrap();
    assert!(written.contains("alice"));
    let _ = std::fs::remove_file(&mirror);
}

#[tokio::test]
async fn test_initialize_with_invalid_token_clears_mirror() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/verify-token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let mirror = temp_mirror("stale");
    std::fs::write(&mirror, "{\"id\":\"stale\"}").unwrap();

    let mut session = session_against(&server, Some(mirror.clone())).await;
    assert!(!session.initialize().await);
    assert!(!session.is_logged_in());
    assert!(!mirror.exists());
}

#[tokio::test]
async fn test_load_dashboard_history_failure_is_independent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "user": user_json("alice", 7)})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transactions/history"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut session = session_against(&server, None).await;
    let load = session.load_dashboard().await;
    assert!(load.success());
    assert_eq!(load.user.unwrap().credits, 7);
    assert!(load.history.is_err());
}

#[tokio::test]
async fn test_load_dashboard_parses_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "user": user_json("alice", 7)})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transactions/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "transactions": [{
                "date": "2025-03-14T09:26:53Z",
                "packageName": "Pro",
                "amountUsd": 20.0,
                "amountSol": 0.2,
                "credits": 56000,
                "signature": "abc123"
            }]
        })))
        .mount(&server)
        .await;

    let mut session = session_against(&server, None).await;
    let load = session.load_dashboard().await;
    let history = load.history.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].package_name, "Pro");
}

#[tokio::test]
async fn test_logout_clears_local_state_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "user": user_json("alice", 0)})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mirror = temp_mirror("logout");
    let mut session = session_against(&server, Some(mirror.clone())).await;
    session.login("alice@example.com", "hunter22").await.unwrap();
    assert!(mirror.exists());

    session.logout().await;
    assert!(!session.is_logged_in());
    assert!(!mirror.exists());
}
