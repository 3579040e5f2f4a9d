//! GraphQL sub-dispatcher
//!
//! Queries go through the shared [`Dispatcher`] (same headers and deadline)
//! but replies use the GraphQL `data`/`errors` shape instead of the REST
//! envelope. The application-type catalog is cached for ten hours.

use std::sync::Arc;

use fleetlink_common::{Clock, TtlCell};
use fleetlink_domain::constants::GRAPHQL_UNAUTHORIZED_BODY;
use fleetlink_domain::{codes, ApiError, ApplicationType, DefinedDevice, DefinedService, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::dispatcher::{Dispatcher, Request};

const APPLICATION_TYPES_QUERY: &str =
    "{ applicationTypes { id name description port proxy protocol } }";

/// Cached application-type catalog.
pub type ApplicationTypesCache = TtlCell<Vec<ApplicationType>, Arc<dyn Clock>>;

#[derive(Serialize)]
struct QueryBody<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationTypesData {
    #[serde(default)]
    application_types: Vec<ApplicationType>,
}

#[derive(Deserialize)]
struct LoginData<T> {
    login: T,
}

#[derive(Deserialize)]
struct ServiceApplications {
    #[serde(default)]
    service: Vec<ServiceApplication>,
}

#[derive(Deserialize)]
struct ServiceApplication {
    #[serde(default)]
    application: i32,
}

#[derive(Deserialize)]
struct Devices {
    #[serde(default)]
    device: Vec<DefinedDevice>,
}

#[derive(Deserialize)]
struct Services {
    #[serde(default)]
    service: Vec<DefinedService>,
}

pub struct GraphQlClient {
    dispatcher: Arc<Dispatcher>,
    application_types: ApplicationTypesCache,
}

impl GraphQlClient {
    pub fn new(dispatcher: Arc<Dispatcher>, clock: Arc<dyn Clock>) -> Self {
        let ttl = dispatcher.config().application_types_ttl();
        Self {
            dispatcher,
            application_types: TtlCell::with_clock("application_types", ttl, clock),
        }
    }

    /// Run `query` and decode its `data` member.
    #[instrument(skip(self, query))]
    pub async fn execute<T: DeserializeOwned>(&self, query: &str) -> Result<T> {
        let url = self.dispatcher.config().graphql_url.clone();
        let request =
            Request::post("").to_url(url).json(&QueryBody { query }, codes::GQL_CANT_PREP_REQUEST)?;
        let response = self.dispatcher.execute(request).await?;

        // The endpoint answers unauthenticated calls with a bare string.
        if String::from_utf8_lossy(&response.body).trim() == GRAPHQL_UNAUTHORIZED_BODY {
            warn!("graphql call not authorized");
            return Err(ApiError::new(codes::GQL_NOT_AUTHORIZED));
        }

        let decoded: GraphQlResponse<T> = serde_json::from_slice(&response.body)
            .map_err(|err| ApiError::with_detail(codes::GQL_CANT_READ_RESPONSE, err.to_string()))?;

        if let Some(errors) = decoded.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<&str> = errors.iter().map(|error| error.message.as_str()).collect();
            let combined = messages.join(", ");
            warn!(errors = %combined, "graphql query returned errors");
            return Err(ApiError::with_detail(codes::GQL_GENERIC, combined));
        }

        decoded.data.ok_or_else(|| {
            ApiError::with_detail(codes::GQL_CANT_READ_RESPONSE, "response missing data field")
        })
    }

    /// The application-type catalog, fetched at most once per TTL.
    #[instrument(skip(self))]
    pub async fn application_types(&self) -> Result<Vec<ApplicationType>> {
        self.application_types
            .get_or_refresh_within(
                self.dispatcher.config().timeout(),
                || {
                    ApiError::with_detail(
                        codes::CLIENT_TIMEOUT,
                        "timed out waiting for application types refresh",
                    )
                },
                || async {
                    let data: ApplicationTypesData = self.execute(APPLICATION_TYPES_QUERY).await?;
                    info!(count = data.application_types.len(), "application types refreshed");
                    Ok::<_, ApiError>(data.application_types)
                },
            )
            .await
    }

    /// Drop the cached catalog so the next lookup refetches it.
    pub fn expire_application_types(&self) {
        self.application_types.invalidate();
    }

    /// Application type of a service, `None` when unknown or `service_id` is blank.
    #[instrument(skip(self))]
    pub async fn application_type(&self, service_id: &str) -> Result<Option<i32>> {
        let service_id = service_id.trim();
        if service_id.is_empty() {
            return Ok(None);
        }

        let query =
            format!("{{ login {{ service(id: {}) {{ application }} }} }}", quote(service_id)?);
        let data: LoginData<ServiceApplications> = self.execute(&query).await?;
        Ok(data.login.service.first().map(|service| service.application))
    }

    /// A device and its services' names, `None` when unknown or `device_id` is blank.
    #[instrument(skip(self))]
    pub async fn device_and_service_names(&self, device_id: &str) -> Result<Option<DefinedDevice>> {
        let device_id = device_id.trim();
        if device_id.is_empty() {
            return Ok(None);
        }

        let query = format!(
            "{{ login {{ device(id: {}) {{ id name services {{ id name }} }} }} }}",
            quote(device_id)?
        );
        let data: LoginData<Devices> = self.execute(&query).await?;
        Ok(data.login.device.into_iter().next())
    }

    /// Names of the requested services. Only services whose ID was asked for
    /// are returned.
    #[instrument(skip(self, service_ids), fields(count = service_ids.len()))]
    pub async fn service_names_by_ids(&self, service_ids: &[String]) -> Result<Vec<DefinedService>> {
        let wanted: Vec<&str> =
            service_ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()).collect();
        if wanted.is_empty() {
            debug!("no service ids to look up");
            return Ok(Vec::new());
        }

        let quoted = wanted.iter().map(|id| quote(id)).collect::<Result<Vec<_>>>()?;
        let query =
            format!("{{ login {{ service(id: [{}]) {{ id name }} }} }}", quoted.join(", "));
        let data: LoginData<Services> = self.execute(&query).await?;

        Ok(data
            .login
            .service
            .into_iter()
            .filter(|service| wanted.contains(&service.id.as_str()))
            .collect())
    }
}

/// Identifiers are embedded as JSON string literals, which GraphQL accepts.
fn quote(id: &str) -> Result<String> {
    serde_json::to_string(id)
        .map_err(|err| ApiError::with_detail(codes::GQL_CANT_PREP_REQUEST, err.to_string()))
}
