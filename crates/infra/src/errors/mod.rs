//! Infrastructure-side errors
//!
//! [`TransportError`] describes a failed HTTP attempt before any upstream
//! classification happens. It converts into the domain [`ApiError`] using the
//! transport codes of the error table.
//!
//! [`ApiError`]: fleetlink_domain::ApiError

mod conversions;

use std::time::Duration;

use thiserror::Error;

/// Failure of a single transport attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be constructed (bad URL, invalid header).
    #[error("failed to build request: {0}")]
    Build(String),

    /// Connection, TLS or protocol failure while sending.
    #[error("failed to send request: {0}")]
    Send(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Read(String),

    /// The deadline elapsed before the transport returned.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}
