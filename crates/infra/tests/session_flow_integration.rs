//! Integration tests for the session lifecycle
//!
//! Sign in, reuse the cached token, expire it and sign in again, all through
//! the public client.

mod support;

use std::time::Duration;

use fleetlink_common::MockClock;
use fleetlink_domain::codes;
use futures::future::join_all;
use serde_json::json;
use support::{client_for, client_with_timeout, mount_hash_signin, signin_reply, AUTH_HASH, USERNAME};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_cached_session_is_reused_until_expired() {
    let server = MockServer::start().await;
    let clock = MockClock::new();
    mount_hash_signin(&server, signin_reply("tok-1"), 1).await;

    let client = client_for(&server, &clock);
    let first = client.hash_signin(USERNAME, AUTH_HASH).await.unwrap();
    clock.advance(Duration::from_secs(30 * 60));
    let second = client.hash_signin(USERNAME, AUTH_HASH).await.unwrap();

    assert_eq!(first.token(), "tok-1");
    assert_eq!(second.token(), "tok-1");
    server.verify().await;

    server.reset().await;
    mount_hash_signin(&server, signin_reply("tok-2"), 1).await;

    client.expire_session();
    let renewed = client.hash_signin(USERNAME, AUTH_HASH).await.unwrap();
    assert_eq!(renewed.token(), "tok-2");
}

#[tokio::test]
async fn test_session_refreshes_after_one_hour() {
    let server = MockServer::start().await;
    let clock = MockClock::new();
    mount_hash_signin(&server, signin_reply("tok-1"), 2).await;

    let client = client_for(&server, &clock);
    client.hash_signin(USERNAME, AUTH_HASH).await.unwrap();
    clock.advance(Duration::from_secs(60 * 60 + 1));
    client.hash_signin(USERNAME, AUTH_HASH).await.unwrap();
}

#[tokio::test]
async fn test_concurrent_signins_share_one_request() {
    let server = MockServer::start().await;
    let clock = MockClock::new();
    mount_hash_signin(&server, signin_reply("tok-1").set_delay(Duration::from_millis(200)), 1).await;

    let client = client_for(&server, &clock);
    let results = join_all((0..8).map(|_| client.hash_signin(USERNAME, AUTH_HASH))).await;

    for result in results {
        assert_eq!(result.unwrap().token(), "tok-1");
    }
}

#[tokio::test]
async fn test_cached_token_is_attached_to_rest_calls() {
    let server = MockServer::start().await;
    let clock = MockClock::new();
    mount_hash_signin(&server, signin_reply("tok-1"), 1).await;
    Mock::given(method("POST"))
        .and(path("/device/delete"))
        .and(header("token", "tok-1"))
        .and(header("apikey", "it-api-key"))
        .and(header("user-agent", "cli-1.0.0-linux-6.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "true"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &clock);
    client.hash_signin(USERNAME, AUTH_HASH).await.unwrap();
    client.services().remove("80:00:00:00:01:00:00:01").await.unwrap();
}

#[tokio::test]
async fn test_rejected_signin_is_classified_and_not_cached() {
    let server = MockServer::start().await;
    let clock = MockClock::new();
    mount_hash_signin(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "status": "false",
            "reason": "username or password are invalid",
        })),
        2,
    )
    .await;

    let client = client_for(&server, &clock);
    for _ in 0..2 {
        let err = client.hash_signin(USERNAME, AUTH_HASH).await.unwrap_err();
        assert!(err.is(codes::AUTH_HASH_INVALID), "{err}");
        assert!(err.is_authentication());
    }
    assert!(client.auth().current_session().is_none());
}

#[tokio::test]
async fn test_mfa_code_wins_over_reason_text() {
    let server = MockServer::start().await;
    let clock = MockClock::new();
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "false",
            "code": "SOFTWARE_TOKEN_MFA",
            "reason": "username or password are invalid",
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, &clock);
    let err = client.password_signin(USERNAME, "pw").await.unwrap_err();
    assert!(err.is(codes::AUTH_MFA_ENABLED), "{err}");
}

#[tokio::test]
async fn test_slow_signin_surfaces_client_timeout() {
    let server = MockServer::start().await;
    let clock = MockClock::new();
    mount_hash_signin(&server, signin_reply("tok-late").set_delay(Duration::from_secs(2)), 1).await;

    let client = client_with_timeout(&server, &clock, Duration::from_millis(300));
    let err = client.hash_signin(USERNAME, AUTH_HASH).await.unwrap_err();

    assert!(err.is(codes::CLIENT_TIMEOUT), "{err}");
    assert!(err.is_transport());
    assert!(client.auth().current_session().is_none());
}
