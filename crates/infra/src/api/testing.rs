//! Shared wiring for tests against a `wiremock` server.

use std::sync::Arc;
use std::time::Duration;

use fleetlink_common::{Clock, MockClock, TtlCell};
use fleetlink_domain::ClientConfig;
use wiremock::MockServer;

use super::dispatcher::Dispatcher;
use crate::http::HttpClient;

pub(crate) fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri(), "test-api-key", format!("{}/graphql", server.uri()))
        .with_platform("cli-0.0.0", "linux", "6.1")
        .with_timeout(Duration::from_secs(5))
}

pub(crate) fn dispatcher_with(config: ClientConfig, clock: &MockClock) -> Arc<Dispatcher> {
    let clock: Arc<dyn Clock> = Arc::new(clock.clone());
    let session = Arc::new(TtlCell::with_clock("session", config.session_ttl(), clock));
    let transport = Arc::new(HttpClient::new().expect("http client"));
    Arc::new(Dispatcher::new(transport, Arc::new(config), session))
}

pub(crate) fn dispatcher_for(server: &MockServer) -> Arc<Dispatcher> {
    dispatcher_with(config_for(server), &MockClock::new())
}
