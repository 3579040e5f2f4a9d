//! Conversions from external infrastructure errors into domain errors.

use fleetlink_domain::{codes, ApiError};
use reqwest::Error as HttpError;

use super::TransportError;

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TransportError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for TransportError {
    fn from(err: HttpError) -> Self {
        if err.is_builder() {
            return TransportError::Build(err.to_string());
        }

        if err.is_body() || err.is_decode() {
            return TransportError::Read(err.to_string());
        }

        TransportError::Send(err.to_string())
    }
}

/* -------------------------------------------------------------------------- */
/* TransportError → ApiError */
/* -------------------------------------------------------------------------- */

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        let code = match &err {
            TransportError::Build(_) => codes::CLIENT_CANT_CREATE_REQUEST,
            TransportError::Send(_) => codes::CLIENT_CANT_SEND,
            TransportError::Read(_) => codes::CLIENT_CANT_READ,
            TransportError::Timeout(_) => codes::CLIENT_TIMEOUT,
        };
        ApiError::with_detail(code, err.to_string())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
