//! Service registration
//!
//! The traditional three-step flow: reserve a UID, create a blank service
//! under it, then register it with a name to obtain its secret.

use std::sync::Arc;

use fleetlink_domain::constants::{
    BULK_SERVICE_ID, PATH_DEVICE_ADDRESS, PATH_DEVICE_CREATE, PATH_DEVICE_DELETE,
    PATH_DEVICE_REGISTER,
};
use fleetlink_domain::{codes, scopes, ApiError, Result, Service, ServiceRegistrationInfo};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::classifier::{classify_final, require_field};
use super::dispatcher::{Dispatcher, Request};

#[derive(Serialize)]
struct CreateBody<'a> {
    deviceaddress: &'a str,
    devicetype: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    deviceaddress: &'a str,
    devicetype: &'a str,
    devicealias: &'a str,
    hardwareid: &'a str,
    skipsecret: &'a str,
    skipemail: &'a str,
}

#[derive(Serialize)]
struct RemoveBody<'a> {
    deviceaddress: &'a str,
}

#[derive(Deserialize)]
struct AddressReply {
    #[serde(default)]
    deviceaddress: String,
}

#[derive(Deserialize)]
struct RegisterReply {
    #[serde(default)]
    secret: String,
}

pub struct ServiceApi {
    dispatcher: Arc<Dispatcher>,
}

impl ServiceApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Reserve a new service UID under a project key.
    #[instrument(skip(self, project_secret))]
    pub async fn generate_uid(&self, project_key: &str, project_secret: &str) -> Result<String> {
        let request = Request::get(format!("{PATH_DEVICE_ADDRESS}/{project_key}/{project_secret}"));
        let response = self.dispatcher.execute(request).await?;

        let reply: AddressReply = classify_final(&response.body, &scopes::SERVICE_ADDRESS)?;
        require_field(&reply.deviceaddress, codes::HELPERS_NO_UID_RETURNED)?;
        Ok(reply.deviceaddress)
    }

    /// Create a blank service for `uid`.
    #[instrument(skip(self))]
    pub async fn create(&self, uid: &str, service_type: &str) -> Result<()> {
        let request = Request::post(PATH_DEVICE_CREATE).json(
            &CreateBody { deviceaddress: uid, devicetype: service_type },
            codes::SERVICE_CANT_PREP_REQUEST,
        )?;
        let response = self.dispatcher.execute(request).await?;
        classify_final::<IgnoredAny>(&response.body, &scopes::SERVICE_HELPERS)?;
        Ok(())
    }

    /// Name the service and return its secret, colons stripped.
    #[instrument(skip(self))]
    pub async fn register(
        &self,
        name: &str,
        uid: &str,
        hardware_id: &str,
        service_type: &str,
        service_type_id: i32,
    ) -> Result<String> {
        let skip_email = if service_type_id == BULK_SERVICE_ID { "false" } else { "true" };
        let body = RegisterBody {
            deviceaddress: uid,
            devicetype: service_type,
            devicealias: name,
            hardwareid: hardware_id,
            skipsecret: "true",
            skipemail: skip_email,
        };
        let request =
            Request::post(PATH_DEVICE_REGISTER).json(&body, codes::SERVICE_CANT_PREP_REQUEST)?;
        let response = self.dispatcher.execute(request).await?;

        let reply: RegisterReply = classify_final(&response.body, &scopes::SERVICE_HELPERS)
            .map_err(|err| {
                if err.is(codes::HELPERS_DUPLICATE_NAME) {
                    ApiError::with_detail(
                        codes::HELPERS_DUPLICATE_NAME,
                        format!("a device in your account already has the name \"{name}\""),
                    )
                } else {
                    err
                }
            })?;

        Ok(reply.secret.replace(':', ""))
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, uid: &str) -> Result<()> {
        let request = Request::post(PATH_DEVICE_DELETE)
            .json(&RemoveBody { deviceaddress: uid }, codes::SERVICE_CANT_PREP_REQUEST)?;
        let response = self.dispatcher.execute(request).await?;
        classify_final::<IgnoredAny>(&response.body, &scopes::SERVICE)?;

        info!(uid, "service removed");
        Ok(())
    }

    /// Run the full registration flow. Stops at the first failing step.
    #[instrument(skip(self, info, project_secret), fields(name = %info.name))]
    pub async fn create_full_service(
        &self,
        info: &ServiceRegistrationInfo,
        project_key: &str,
        project_secret: &str,
    ) -> Result<Service> {
        let uid = self.generate_uid(project_key, project_secret).await?;
        self.create(&uid, &info.service_type).await?;

        let hardware_id = match info.hardware_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => uid.clone(),
        };
        let secret = self
            .register(&info.name, &uid, &hardware_id, &info.service_type, info.service_type_id)
            .await?;

        info!(uid = %uid, "service registered");
        Ok(Service {
            uid,
            secret,
            hardware_id,
            service_type: info.service_type_id,
            overload: Service::overload_for(info.service_type_id),
            ..Service::default()
        })
    }
}
