//! Service certificates
//!
//! Like restore, the certificate endpoint sits outside the REST base URL and
//! answers with plain HTTP statuses. A 200 reply carries the issued
//! certificate as bare JSON, without the envelope.

use std::sync::Arc;

use fleetlink_domain::{codes, ApiError, CertificateRequest, CertificateResponse, Result};
use tracing::{info, instrument, warn};

use super::dispatcher::{Dispatcher, Request};

pub struct CertificateApi {
    dispatcher: Arc<Dispatcher>,
}

impl CertificateApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Issue a certificate for the service described by `request`.
    #[instrument(skip(self, request), fields(service_id = %request.service_id))]
    pub async fn generate(&self, request: &CertificateRequest) -> Result<CertificateResponse> {
        let Some(url) = self.dispatcher.config().certificate_url.clone() else {
            return Err(ApiError::new(codes::CERT_NOT_CONFIGURED));
        };

        let outgoing =
            Request::post("").to_url(url).json(request, codes::CERT_CANT_PREP_REQUEST)?;
        let response = self.dispatcher.execute(outgoing).await?;

        match response.status {
            200 => {}
            401 => {
                warn!(status = response.status, "certificate request rejected");
                return Err(ApiError::new(codes::CERT_TOKEN_NOT_SPECIFIED));
            }
            _ => {
                warn!(status = response.status, "certificate request rejected");
                return Err(ApiError::with_detail(codes::CERT_GENERIC, response.status_line()));
            }
        }

        let issued: CertificateResponse = serde_json::from_slice(&response.body)
            .map_err(|err| ApiError::with_detail(codes::CERT_CANT_READ_RESPONSE, err.to_string()))?;
        info!(cn = %issued.cn, "certificate issued");
        Ok(issued)
    }
}
