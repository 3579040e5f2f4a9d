//! Proxy connections
//!
//! A failed delete forwards the upstream reason like every other call site.

use std::sync::Arc;

use fleetlink_domain::constants::{PATH_PROXY_CONNECT, PATH_PROXY_STOP};
use fleetlink_domain::{
    codes, scopes, CreateProxyRequest, CreateProxyResponse, DeleteProxyRequest, Result,
};
use serde::de::IgnoredAny;
use tracing::{info, instrument};

use super::classifier::classify_final;
use super::dispatcher::{Dispatcher, Request};

pub struct ProxyApi {
    dispatcher: Arc<Dispatcher>,
}

impl ProxyApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    #[instrument(skip(self, request), fields(device = %request.device_address))]
    pub async fn create(&self, request: &CreateProxyRequest) -> Result<CreateProxyResponse> {
        let request = Request::post(PATH_PROXY_CONNECT)
            .json(request, codes::PROXY_CREATE_CANT_PREP_REQUEST)?;
        let response = self.dispatcher.execute(request).await?;

        let created: CreateProxyResponse = classify_final(&response.body, &scopes::PROXY_CREATE)?;
        info!(connection_id = %created.connection.connection_id, "proxy connection created");
        Ok(created)
    }

    #[instrument(skip(self, request), fields(connection_id = %request.connection_id))]
    pub async fn delete(&self, request: &DeleteProxyRequest) -> Result<()> {
        let request =
            Request::post(PATH_PROXY_STOP).json(request, codes::PROXY_DELETE_CANT_PREP_REQUEST)?;
        let response = self.dispatcher.execute(request).await?;
        classify_final::<IgnoredAny>(&response.body, &scopes::PROXY_DELETE)?;

        info!("proxy connection stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::testing::dispatcher_for;

    #[tokio::test]
    async fn test_create_returns_connection_details() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PATH_PROXY_CONNECT))
            .and(body_json(json!({
                "deviceaddress": "80:00:00:00:01:00:40:C4",
                "hostip": "203.0.113.9",
                "wait": "true"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "true",
                "connection": {
                    "connectionid": "118EB6E7-1BA5",
                    "proxy": "https://x.example.net:33000",
                    "proxyServerPort": 33000,
                    "reverseProxy": true
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = CreateProxyRequest {
            device_address: "80:00:00:00:01:00:40:C4".into(),
            host_ip: "203.0.113.9".into(),
            wait: "true".into(),
            ..CreateProxyRequest::default()
        };
        let created = ProxyApi::new(dispatcher_for(&server)).create(&request).await.unwrap();

        assert_eq!(created.connection.connection_id, "118EB6E7-1BA5");
        assert_eq!(created.connection.proxy_server_port, 33000);
        assert!(created.connection.reverse_proxy);
    }

    #[tokio::test]
    async fn test_create_for_unknown_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "false",
                "reason": "[0861] Service not found for UID"
            })))
            .mount(&server)
            .await;

        let err = ProxyApi::new(dispatcher_for(&server))
            .create(&CreateProxyRequest::default())
            .await
            .unwrap_err();
        assert!(err.is(codes::PROXY_CREATE_NO_SERVICE_FOUND));
    }

    #[tokio::test]
    async fn test_delete_posts_address_and_connection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PATH_PROXY_STOP))
            .and(body_json(json!({"deviceaddress": "80:01", "connectionid": "c-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "true"})))
            .expect(1)
            .mount(&server)
            .await;

        ProxyApi::new(dispatcher_for(&server))
            .delete(&DeleteProxyRequest::new("80:01", "c-1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_failure_forwards_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "false",
                "reason": "connection already closed"
            })))
            .mount(&server)
            .await;

        let api = ProxyApi::new(dispatcher_for(&server));
        let err = api.delete(&DeleteProxyRequest::new("80:01", "c-1")).await.unwrap_err();

        assert!(err.is(codes::PROXY_DELETE_GENERIC));
        assert_eq!(err.upstream_reason(), Some("connection already closed"));
    }

    #[tokio::test]
    async fn test_delete_garbage_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let api = ProxyApi::new(dispatcher_for(&server));
        let err = api.delete(&DeleteProxyRequest::new("80:01", "c-1")).await.unwrap_err();
        assert!(err.is(codes::PROXY_DELETE_CANT_READ_RESPONSE));
    }
}
