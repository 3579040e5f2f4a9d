//! Shared wiring for integration tests against a `wiremock` server.

use std::sync::{Arc, Once};
use std::time::Duration;

use fleetlink_common::MockClock;
use fleetlink_domain::ClientConfig;
use fleetlink_infra::{DeviceApiClient, HttpClient};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static TRACING: Once = Once::new();

/// Route client logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub const USERNAME: &str = "alice@example.com";
pub const AUTH_HASH: &str = "hash-1";

/// Client wired to `server` with a controllable clock.
pub fn client_for(server: &MockServer, clock: &MockClock) -> DeviceApiClient {
    client_with_timeout(server, clock, Duration::from_secs(5))
}

/// Like [`client_for`] with a custom dispatch timeout.
pub fn client_with_timeout(
    server: &MockServer,
    clock: &MockClock,
    timeout: Duration,
) -> DeviceApiClient {
    init_tracing();
    let config = ClientConfig::new(server.uri(), "it-api-key", format!("{}/graphql", server.uri()))
        .with_platform("cli-1.0.0", "linux", "6.1")
        .with_timeout(timeout);
    let transport = Arc::new(HttpClient::new().expect("http client should build"));
    DeviceApiClient::with_transport(config, transport, Arc::new(clock.clone()))
}

/// Successful hash sign-in reply carrying `token`.
pub fn signin_reply(token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": "true",
        "token": token,
        "service_authhash": AUTH_HASH,
        "guid": "guid-1",
    }))
}

/// Mount the hash sign-in endpoint, expecting exactly `calls` hits.
pub async fn mount_hash_signin(server: &MockServer, reply: ResponseTemplate, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/user/login/authhash"))
        .respond_with(reply)
        .expect(calls)
        .mount(server)
        .await;
}
