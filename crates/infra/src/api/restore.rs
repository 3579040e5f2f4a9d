//! Device restore
//!
//! The restore endpoint lives outside the REST base URL and reports failures
//! through HTTP status codes instead of the envelope.

use std::sync::Arc;

use bytes::Bytes;
use fleetlink_domain::{codes, ApiError, Result};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::dispatcher::{Dispatcher, Request};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RestoreBody<'a> {
    device_id: &'a str,
    machine_id: &'a str,
}

pub struct RestoreApi {
    dispatcher: Arc<Dispatcher>,
}

impl RestoreApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Restore `device_id` onto this machine. Returns the raw reply body.
    #[instrument(skip(self))]
    pub async fn restore(&self, device_id: &str, machine_id: &str) -> Result<Bytes> {
        let Some(url) = self.dispatcher.config().restore_url.clone() else {
            return Err(ApiError::new(codes::RESTORE_NOT_CONFIGURED));
        };

        let request = Request::post("")
            .to_url(url)
            .json(&RestoreBody { device_id, machine_id }, codes::RESTORE_CANT_PREP_REQUEST)?;
        let response = self.dispatcher.execute(request).await?;

        let code = match response.status {
            200 => {
                info!("device restored");
                return Ok(response.body);
            }
            400 => codes::RESTORE_DEVICE_ACTIVE,
            401 => codes::RESTORE_TOKEN_NOT_SPECIFIED,
            403 => codes::RESTORE_DEVICE_NOT_EXISTS,
            _ => {
                warn!(status = response.status, "restore rejected");
                return Err(ApiError::with_detail(codes::RESTORE_GENERIC, response.status_line()));
            }
        };
        warn!(status = response.status, code = code.id, "restore rejected");
        Err(ApiError::new(code))
    }
}
