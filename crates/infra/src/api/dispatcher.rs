//! Request dispatcher
//!
//! Composes the fixed header contract (user agent, API key, session token
//! when one is cached) and runs a single transport attempt under the
//! configured deadline.

use std::sync::Arc;

use bytes::Bytes;
use fleetlink_common::{Clock, TtlCell};
use fleetlink_domain::constants::{HEADER_API_KEY, HEADER_SESSION_TOKEN};
use fleetlink_domain::{codes, ApiError, ClientConfig, Credentials, ErrorCode, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::errors::TransportError;
use crate::http::{RawResponse, Transport, TransportRequest};

/// Session credential cache shared by the dispatcher and the authenticators.
pub type SessionCache = TtlCell<Credentials, Arc<dyn Clock>>;

/// Target of a request: a path under the REST base URL or an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Path(String),
    Url(String),
}

/// One outbound call. Built per call, never persisted.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub target: Target,
    pub body: Option<Bytes>,
    pub extra_headers: Vec<(HeaderName, String)>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::GET, target: Target::Path(path.into()), body: None, extra_headers: Vec::new() }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self { method: Method::POST, target: Target::Path(path.into()), body: None, extra_headers: Vec::new() }
    }

    /// Serialize `body` as JSON; failure is reported with `prep_code`.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B, prep_code: ErrorCode) -> Result<Self> {
        let encoded =
            serde_json::to_vec(body).map_err(|err| ApiError::with_detail(prep_code, err.to_string()))?;
        self.body = Some(Bytes::from(encoded));
        Ok(self)
    }

    /// Address an absolute URL instead of a REST path.
    pub fn to_url(mut self, url: impl Into<String>) -> Self {
        self.target = Target::Url(url.into());
        self
    }

    pub fn header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.extra_headers.push((name, value.into()));
        self
    }
}

/// The only component that talks to the transport.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
    session: Arc<SessionCache>,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: Arc<ClientConfig>,
        session: Arc<SessionCache>,
    ) -> Self {
        Self { transport, config, session }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionCache> {
        &self.session
    }

    /// `dispatch(method, path, body) -> bytes`: the raw body of a REST call.
    pub async fn dispatch(&self, method: Method, path: &str, body: Option<Bytes>) -> Result<Bytes> {
        let request =
            Request { method, target: Target::Path(path.to_string()), body, extra_headers: Vec::new() };
        Ok(self.execute(request).await?.body)
    }

    /// Send one request and return the raw response, whatever its HTTP status.
    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn execute(&self, request: Request) -> Result<RawResponse> {
        let url = match &request.target {
            Target::Path(path) => self.config.endpoint(path),
            Target::Url(url) => url.clone(),
        };

        let headers = self.compose_headers(&request)?;
        let timeout = self.config.timeout();
        let transport_request =
            TransportRequest { method: request.method, url, headers, body: request.body };

        match tokio::time::timeout(timeout, self.transport.execute(transport_request)).await {
            Ok(Ok(response)) => {
                debug!(status = response.status, "dispatch complete");
                Ok(response)
            }
            Ok(Err(err)) => {
                warn!(error = %err, "dispatch failed");
                Err(err.into())
            }
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "dispatch timed out");
                Err(TransportError::Timeout(timeout).into())
            }
        }
    }

    fn compose_headers(&self, request: &Request) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&self.config.user_agent())?);
        headers.insert(HeaderName::from_static(HEADER_API_KEY), header_value(&self.config.api_key)?);

        // Best effort: an absent token is for the upstream to reject.
        if let Some(credentials) = self.session.get().filter(Credentials::has_token) {
            headers.insert(
                HeaderName::from_static(HEADER_SESSION_TOKEN),
                header_value(credentials.token())?,
            );
        }

        if request.body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        for (name, value) in &request.extra_headers {
            headers.insert(name.clone(), header_value(value)?);
        }

        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| {
        ApiError::with_detail(codes::CLIENT_CANT_CREATE_REQUEST, "header value is not valid ASCII")
    })
}
