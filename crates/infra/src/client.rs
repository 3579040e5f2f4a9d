//! Device API client
//!
//! [`DeviceApiClient`] owns one dispatcher, one session cache and one
//! application-type cache. Collaborators borrow the shared dispatcher, so a
//! token obtained through [`DeviceApiClient::hash_signin`] is attached to
//! every later call made through the same client.

use std::sync::Arc;
use std::time::Duration;

use fleetlink_common::{Clock, SystemClock, TtlCell};
use fleetlink_domain::{ApiError, ClientConfig, Credentials, Result};
use tracing::{debug, info, instrument};

use crate::api::{
    AutoRegistrationApi, Authenticator, CertificateApi, DeviceApi, Dispatcher, GraphQlClient,
    HashTokenProvider, ProxyApi, Request, RestoreApi, ServiceApi,
};
use crate::http::{HttpClient, Transport};

/// Headroom between the dispatch deadline and reqwest's own timeout.
const TRANSPORT_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// One configured API client instance.
pub struct DeviceApiClient {
    dispatcher: Arc<Dispatcher>,
    auth: Arc<Authenticator>,
    graphql: GraphQlClient,
    devices: DeviceApi,
    services: ServiceApi,
    proxies: ProxyApi,
    autoreg: AutoRegistrationApi,
    restore: RestoreApi,
    certificates: CertificateApi,
}

impl DeviceApiClient {
    /// Build a client backed by the reqwest transport and the system clock.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let backstop = config.timeout().saturating_add(TRANSPORT_TIMEOUT_SLACK);
        let transport = HttpClient::builder().timeout(backstop).build().map_err(ApiError::from)?;
        Ok(Self::with_transport(config, Arc::new(transport), Arc::new(SystemClock)))
    }

    /// Build a client over an arbitrary transport and clock.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let session = Arc::new(TtlCell::with_clock("session", config.session_ttl(), clock.clone()));
        debug!(api_url = %config.api_url, ttl = ?config.session_ttl(), "creating device api client");

        let dispatcher = Arc::new(Dispatcher::new(transport, Arc::new(config), session));
        Self {
            auth: Arc::new(Authenticator::new(dispatcher.clone(), clock.clone())),
            graphql: GraphQlClient::new(dispatcher.clone(), clock),
            devices: DeviceApi::new(dispatcher.clone()),
            services: ServiceApi::new(dispatcher.clone()),
            proxies: ProxyApi::new(dispatcher.clone()),
            autoreg: AutoRegistrationApi::new(dispatcher.clone()),
            restore: RestoreApi::new(dispatcher.clone()),
            certificates: CertificateApi::new(dispatcher.clone()),
            dispatcher,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        self.dispatcher.config()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn auth(&self) -> &Arc<Authenticator> {
        &self.auth
    }

    pub fn graphql(&self) -> &GraphQlClient {
        &self.graphql
    }

    pub fn devices(&self) -> &DeviceApi {
        &self.devices
    }

    pub fn services(&self) -> &ServiceApi {
        &self.services
    }

    pub fn proxies(&self) -> &ProxyApi {
        &self.proxies
    }

    pub fn autoreg(&self) -> &AutoRegistrationApi {
        &self.autoreg
    }

    pub fn restore(&self) -> &RestoreApi {
        &self.restore
    }

    pub fn certificates(&self) -> &CertificateApi {
        &self.certificates
    }

    pub async fn password_signin(&self, username: &str, password: &str) -> Result<Credentials> {
        self.auth.password_signin(username, password).await
    }

    pub async fn hash_signin(&self, username: &str, auth_hash: &str) -> Result<Credentials> {
        self.auth.hash_signin(username, auth_hash).await
    }

    pub fn expire_session(&self) {
        self.auth.expire_session();
    }

    /// Token provider bound to this client's session cache.
    pub fn token_provider(
        &self,
        username: impl Into<String>,
        auth_hash: impl Into<String>,
    ) -> HashTokenProvider {
        HashTokenProvider::new(self.auth.clone(), username, auth_hash)
    }

    /// Whether the REST base URL answers with a 2xx status.
    #[instrument(skip(self))]
    pub async fn can_reach_api(&self) -> bool {
        match self.dispatcher.execute(Request::get("")).await {
            Ok(response) => {
                let reachable = response.is_success();
                info!(status = response.status, reachable, "api reachability checked");
                reachable
            }
            Err(err) => {
                info!(error = %err, "api unreachable");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use fleetlink_common::MockClock;
    use fleetlink_domain::codes;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::testing::config_for;
    use crate::api::AccessTokenProvider;

    fn client_for(server: &MockServer, clock: &MockClock) -> DeviceApiClient {
        let transport = Arc::new(HttpClient::new().unwrap());
        DeviceApiClient::with_transport(config_for(server), transport, Arc::new(clock.clone()))
    }

    async fn mount_hash_signin(server: &MockServer, token: &str) {
        Mock::given(method("POST"))
            .and(path("/user/login/authhash"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "true",
                "token": token,
                "service_authhash": "hash-1",
                "guid": "user-guid",
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_session_token_rides_on_later_calls() {
        let server = MockServer::start().await;
        let clock = MockClock::new();
        mount_hash_signin(&server, "tok-1").await;
        Mock::given(method("GET"))
            .and(path("/device/list/all"))
            .and(header("token", "tok-1"))
            .and(header("apikey", "test-api-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "true", "devices": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, &clock);
        client.hash_signin("alice", "hash-1").await.unwrap();
        let list = client.devices().list_all().await.unwrap();
        assert!(list.devices.is_empty());
    }

    #[tokio::test]
    async fn test_token_provider_shares_the_session_cache() {
        let server = MockServer::start().await;
        let clock = MockClock::new();
        Mock::given(method("POST"))
            .and(path("/user/login/authhash"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "true",
                "token": "tok-1",
                "service_authhash": "hash-1",
                "guid": "user-guid",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, &clock);
        let provider = client.token_provider("alice", "hash-1");
        assert_eq!(provider.access_token().await.unwrap(), "tok-1");
        assert_eq!(client.hash_signin("alice", "hash-1").await.unwrap().token(), "tok-1");
    }

    #[tokio::test]
    async fn test_can_reach_api_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

        let client = client_for(&server, &MockClock::new());
        assert!(client.can_reach_api().await);
    }

    #[tokio::test]
    async fn test_can_reach_api_false_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(503)).mount(&server).await;

        let client = client_for(&server, &MockClock::new());
        assert!(!client.can_reach_api().await);
    }

    #[tokio::test]
    async fn test_can_reach_api_false_when_nothing_listens() {
        let config = ClientConfig::new("http://127.0.0.1:1", "k", "http://127.0.0.1:1/graphql")
            .with_timeout(Duration::from_secs(2));
        let client = DeviceApiClient::new(config).unwrap();
        assert!(!client.can_reach_api().await);
    }

    #[tokio::test]
    async fn test_transport_failure_is_a_transport_error() {
        let config = ClientConfig::new("http://127.0.0.1:1", "k", "http://127.0.0.1:1/graphql")
            .with_timeout(Duration::from_secs(2));
        let client = DeviceApiClient::new(config).unwrap();
        let err = client.hash_signin("alice", "hash-1").await.unwrap_err();
        assert!(err.is_transport(), "{err}");
        assert!(!err.is(codes::AUTH_HASH_INVALID));
    }

    #[tokio::test]
    async fn test_slow_reply_reports_dispatch_deadline() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/login/authhash"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let config = config_for(&server).with_timeout(Duration::from_millis(300));
        let client = DeviceApiClient::new(config).unwrap();
        let err = client.hash_signin("alice", "hash-1").await.unwrap_err();

        assert!(err.is(codes::CLIENT_TIMEOUT), "{err}");
        assert_eq!(err.detail(), Some("request timed out after 300ms"));
    }
}
