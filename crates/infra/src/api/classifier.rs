//! Response classifier
//!
//! The single place that interprets the upstream `status`/`reason`/`code`
//! fields. Evaluation order, first match wins:
//!
//! 1. body is not a JSON object → the scope's `cant_read`
//! 2. `reset` → [`Outcome::Pending`]
//! 3. `pending` → [`Outcome::Pending`]
//! 4. `false` (or a missing/unknown status):
//!    MFA `code` → `AUTH_MFA_ENABLED`; then the scope's reason table; then a
//!    generic error carrying the non-blank reason; else the scope's `unknown`
//! 5. `true` → the decoded payload

use fleetlink_domain::{
    codes, is_mfa_code, ApiError, EnvelopeStatus, ErrorCode, ErrorScope, Outcome, Result,
    UpstreamEnvelope,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Classify a REST reply body against `scope`.
pub fn classify<T: DeserializeOwned>(body: &[u8], scope: &ErrorScope) -> Result<Outcome<T>> {
    let value: Value = serde_json::from_slice(body).map_err(|err| cant_read(scope, err))?;
    if !value.is_object() {
        return Err(ApiError::with_detail(scope.cant_read, "reply is not a JSON object"));
    }

    let envelope = UpstreamEnvelope::deserialize(&value).map_err(|err| cant_read(scope, err))?;

    match envelope.status {
        EnvelopeStatus::Reset | EnvelopeStatus::Pending => Ok(Outcome::Pending),
        EnvelopeStatus::True => {
            serde_json::from_value(value).map(Outcome::Ready).map_err(|err| cant_read(scope, err))
        }
        EnvelopeStatus::False | EnvelopeStatus::Other(_) => Err(failure(&envelope, scope)),
    }
}

/// Like [`classify`] for call sites with no pending state: a pending or
/// reset reply is reported as the scope's `unknown` error.
pub fn classify_final<T: DeserializeOwned>(body: &[u8], scope: &ErrorScope) -> Result<T> {
    match classify(body, scope)? {
        Outcome::Ready(value) => Ok(value),
        Outcome::Pending => Err(ApiError::with_detail(scope.unknown, "operation is still pending")),
    }
}

/// A success reply can still lack the field the caller needs.
pub fn require_field<'a>(value: &'a str, code: ErrorCode) -> Result<&'a str> {
    if value.trim().is_empty() {
        Err(ApiError::new(code))
    } else {
        Ok(value)
    }
}

fn failure(envelope: &UpstreamEnvelope, scope: &ErrorScope) -> ApiError {
    let error = if is_mfa_code(&envelope.code) {
        ApiError::new(codes::AUTH_MFA_ENABLED)
    } else if let Some(code) = scope.match_reason(&envelope.reason) {
        ApiError::new(code)
    } else if !envelope.reason.trim().is_empty() {
        ApiError::with_detail(scope.generic, envelope.reason.clone())
    } else {
        ApiError::new(scope.unknown)
    };

    warn!(scope = scope.name, code = error.id(), reason = %envelope.reason, "upstream rejected request");
    error
}

fn cant_read(scope: &ErrorScope, err: serde_json::Error) -> ApiError {
    warn!(scope = scope.name, error = %err, "could not decode upstream reply");
    ApiError::with_detail(scope.cant_read, err.to_string())
}
