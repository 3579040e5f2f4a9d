//! Device endpoints: account listing, unregistration and transfer.

use std::sync::Arc;

use fleetlink_domain::constants::{
    PATH_DEVELOPER_DEVICE_DELETE, PATH_DEVELOPER_DEVICE_TRANSFER, PATH_DEVICE_LIST_ALL,
};
use fleetlink_domain::{codes, scopes, DeviceList, Result};
use serde::de::IgnoredAny;
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};

use super::classifier::classify_final;
use super::dispatcher::{Dispatcher, Request};

#[derive(Serialize)]
struct TransferBody<'a> {
    user: &'a str,
}

pub struct DeviceApi {
    dispatcher: Arc<Dispatcher>,
}

impl DeviceApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Every device visible to the signed-in account, bypassing server caches.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<DeviceList> {
        let response = self.dispatcher.execute(Request::get(PATH_DEVICE_LIST_ALL)).await?;
        classify_final(&response.body, &scopes::DEVICE_LIST)
    }

    #[instrument(skip(self))]
    pub async fn unregister(&self, uid: &str) -> Result<()> {
        let request = Request::post(format!("{PATH_DEVELOPER_DEVICE_DELETE}/{uid}"))
            .json(&json!({}), codes::DEVICE_CANT_PREP_REQUEST)?;
        let response = self.dispatcher.execute(request).await?;
        classify_final::<IgnoredAny>(&response.body, &scopes::DEVICE)?;

        info!(uid, "device unregistered");
        Ok(())
    }

    /// Move a device to another account.
    #[instrument(skip(self))]
    pub async fn transfer(&self, uid: &str, destination_account: &str) -> Result<()> {
        let request = Request::post(format!("{PATH_DEVELOPER_DEVICE_TRANSFER}/{uid}"))
            .json(&TransferBody { user: destination_account }, codes::DEVICE_CANT_PREP_REQUEST)?;
        let response = self.dispatcher.execute(request).await?;
        classify_final::<IgnoredAny>(&response.body, &scopes::DEVICE)?;

        info!(uid, "device transferred");
        Ok(())
    }
}
