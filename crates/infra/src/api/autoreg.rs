//! Bulk autoregistration
//!
//! A device reports its hardware, asks which product template applies, pulls
//! each service's configuration and finally registers. The template and
//! register steps may answer `reset`/`pending`, surfaced as
//! [`Outcome::Pending`] so the caller can poll.

use std::sync::Arc;

use fleetlink_domain::constants::{
    BULK_SERVICE_ID, FALLBACK_SERVICE_PORT, PATH_BULK_CONFIGURATION, PATH_BULK_DEVICE_INFORMATION,
    PATH_BULK_FRIENDLY_CONFIGURATION, PATH_BULK_REGISTER,
};
use fleetlink_domain::{
    codes, scopes, ApiError, DeviceInfo, Outcome, Result, ServiceConfig, ServiceCredentials,
};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::classifier::{classify, classify_final};
use super::dispatcher::{Dispatcher, Request};

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeviceInfoBody<'a> {
    bulk_identification_code: &'a str,
    hardware_id: &'a str,
    #[serde(rename = "MACAddress")]
    mac_address: &'a str,
    #[serde(rename = "CPUId")]
    cpu_id: &'a str,
    #[serde(rename = "OSLabel")]
    os_label: &'a str,
    #[serde(rename = "R3Package")]
    r3_package: &'a str,
    #[serde(rename = "TCPServiceList")]
    tcp_service_list: &'a str,
}

#[derive(Deserialize)]
struct TemplateReply {
    #[serde(default)]
    projects: String,
}

#[derive(Deserialize)]
struct ConfigurationReply {
    #[serde(default)]
    content_ip: String,
    #[serde(default)]
    content_port: Value,
    #[serde(default)]
    content_type: Value,
    #[serde(default)]
    enabled: Value,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    registration_key: &'a str,
    hardware_id: &'a str,
    project_id: &'a str,
}

pub struct AutoRegistrationApi {
    dispatcher: Arc<Dispatcher>,
}

impl AutoRegistrationApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Report this device's hardware against a registration key.
    #[instrument(skip(self, info), fields(hardware_id = %info.hardware_id))]
    pub async fn send_device_info(&self, info: &DeviceInfo) -> Result<()> {
        if info.registration_key.trim().is_empty() {
            return Err(ApiError::new(codes::AUTOREG_BIC_EMPTY));
        }

        let body = DeviceInfoBody {
            bulk_identification_code: &info.registration_key,
            hardware_id: &info.hardware_id,
            mac_address: &info.mac_address,
            cpu_id: &info.cpu_id,
            os_label: &info.os_label,
            r3_package: &info.version,
            tcp_service_list: "",
        };
        let request = Request::post(PATH_BULK_DEVICE_INFORMATION)
            .json(&body, codes::AUTOREG_CANT_PREP_REQUEST)?;
        let response = self.dispatcher.execute(request).await?;
        classify_final::<IgnoredAny>(&response.body, &scopes::AUTOREG)?;

        debug!("device information accepted");
        Ok(())
    }

    /// Project IDs configured for this device. `Pending` while the service
    /// is still resetting the device's registration.
    #[instrument(skip(self, registration_key))]
    pub async fn product_template(
        &self,
        registration_key: &str,
        device_id: &str,
    ) -> Result<Outcome<Vec<String>>> {
        let path = format!("{PATH_BULK_FRIENDLY_CONFIGURATION}/{registration_key}/{device_id}/");
        let response = self.dispatcher.execute(Request::get(path)).await?;

        let outcome = classify::<TemplateReply>(&response.body, &scopes::AUTOREG)?;
        Ok(outcome.map(|reply| {
            reply
                .projects
                .split(',')
                .map(str::trim)
                .filter(|project| !project.is_empty())
                .map(str::to_string)
                .collect()
        }))
    }

    /// Service settings for one project of the template.
    #[instrument(skip(self))]
    pub async fn service_config(&self, service_id: &str, hardware_id: &str) -> Result<ServiceConfig> {
        let path = format!("{PATH_BULK_CONFIGURATION}/{service_id}/{hardware_id}/");
        let response = self.dispatcher.execute(Request::get(path)).await?;

        let reply: ConfigurationReply = classify_final(&response.body, &scopes::AUTOREG)?;
        let port = parse_int(&reply.content_port)
            .and_then(|port| u16::try_from(port).ok())
            .unwrap_or(FALLBACK_SERVICE_PORT);
        let service_type = parse_int(&reply.content_type)
            .and_then(|value| i32::try_from(value).ok())
            .unwrap_or(BULK_SERVICE_ID);

        Ok(ServiceConfig {
            hostname: reply.content_ip,
            port,
            service_type,
            disabled: !is_enabled(&reply.enabled),
        })
    }

    /// Register one project. `Pending` until the service has issued
    /// credentials.
    #[instrument(skip(self, registration_key))]
    pub async fn register_service(
        &self,
        service_id: &str,
        hardware_id: &str,
        registration_key: &str,
    ) -> Result<Outcome<ServiceCredentials>> {
        let body = RegisterBody { registration_key, hardware_id, project_id: service_id };
        let request =
            Request::post(PATH_BULK_REGISTER).json(&body, codes::AUTOREG_CANT_PREP_REQUEST)?;
        let response = self.dispatcher.execute(request).await?;

        let outcome = classify::<ServiceCredentials>(&response.body, &scopes::AUTOREG_REGISTER)?;
        if let Outcome::Ready(credentials) = &outcome {
            info!(uid = %credentials.uid, "bulk service registered");
        }
        Ok(outcome)
    }
}

fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn is_enabled(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_i64() == Some(1),
        Value::String(text) => text.trim() == "1",
        _ => false,
    }
}
