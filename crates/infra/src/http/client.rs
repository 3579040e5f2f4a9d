use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method};
use tracing::debug;

use crate::errors::TransportError;

/// A fully addressed request ready for the wire.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl TransportRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: HeaderMap::new(), body: None }
    }
}

/// Raw result of one HTTP call.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Status line in `"<code> <reason>"` form.
    pub fn status_line(&self) -> String {
        match reqwest::StatusCode::from_u16(self.status) {
            Ok(status) => status.to_string(),
            Err(_) => self.status.to_string(),
        }
    }
}

/// Performs exactly one HTTP attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: TransportRequest) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed transport.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    timeout: Option<Duration>,
    connect_timeout: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, TransportError> {
        Self::builder().build()
    }

    /// reqwest reports its own deadlines without the limit; attach ours.
    fn elapsed_limit(&self, err: &reqwest::Error) -> Duration {
        match self.timeout {
            Some(timeout) if !err.is_connect() => timeout,
            _ => self.connect_timeout,
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn execute(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        let TransportRequest { method, url, headers, body } = request;

        let mut builder = self.client.request(method.clone(), &url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let request = builder.build()?;

        // Paths can embed secrets; log the host only.
        let host = request.url().host_str().unwrap_or_default().to_string();
        let started = Instant::now();
        debug!(%method, %host, "sending HTTP request");

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                let limit = self.elapsed_limit(&err);
                debug!(%method, %host, ?limit, "HTTP request timed out");
                return Err(TransportError::Timeout(limit));
            }
            Err(err) => {
                debug!(%method, %host, error = %err, "HTTP request failed");
                return Err(err.into());
            }
        };

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|err| {
            if err.is_timeout() {
                TransportError::Timeout(self.elapsed_limit(&err))
            } else {
                TransportError::Read(err.to_string())
            }
        })?;

        debug!(
            %method,
            %host,
            status,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "received HTTP response"
        );

        Ok(RawResponse { status, headers, body })
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Option<Duration>,
    connect_timeout: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: None, connect_timeout: Duration::from_secs(10) }
    }
}

impl HttpClientBuilder {
    /// Client-level backstop; per-call deadlines are enforced by the dispatcher.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<HttpClient, TransportError> {
        let mut builder = ReqwestClient::builder().connect_timeout(self.connect_timeout).no_proxy();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|err| TransportError::Build(err.to_string()))?;

        Ok(HttpClient { client, timeout: self.timeout, connect_timeout: self.connect_timeout })
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::header::{HeaderValue, CONTENT_TYPE};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_returns_body_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let response = client
            .execute(TransportRequest::new(Method::GET, format!("{}/ping", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert!(response.is_success());
        assert_eq!(&response.body[..], b"pong");
    }

    #[tokio::test]
    async fn test_sends_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("apikey", "k-1"))
            .and(body_string(r#"{"a":1}"#))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut request = TransportRequest::new(Method::POST, format!("{}/echo", server.uri()));
        request.headers.insert("apikey", HeaderValue::from_static("k-1"));
        request.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request.body = Some(Bytes::from_static(br#"{"a":1}"#));

        let response = HttpClient::new().unwrap().execute(request).await.unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_does_not_retry_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(1)
            .mount(&server)
            .await;

        let response = HttpClient::new()
            .unwrap()
            .execute(TransportRequest::new(Method::GET, server.uri()))
            .await
            .unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(response.status_line(), "503 Service Unavailable");
    }

    #[tokio::test]
    async fn test_connection_refused_is_send_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = HttpClient::new()
            .unwrap()
            .execute(TransportRequest::new(Method::GET, format!("http://{addr}")))
            .await;

        assert!(matches!(result, Err(TransportError::Send(_))));
    }

    #[tokio::test]
    async fn test_invalid_url_is_build_error() {
        let result =
            HttpClient::new().unwrap().execute(TransportRequest::new(Method::GET, "::nope::")).await;
        assert!(matches!(result, Err(TransportError::Build(_))));
    }

    #[tokio::test]
    async fn test_client_timeout_reports_configured_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = HttpClient::builder().timeout(Duration::from_millis(200)).build().unwrap();
        let err = client
            .execute(TransportRequest::new(Method::GET, server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Timeout(limit) if limit == Duration::from_millis(200)));
        assert_eq!(err.to_string(), "request timed out after 200ms");
    }
}
