//! Error taxonomy for the device-management API
//!
//! Every failure surfaced by the client is an [`ApiError`]: a stable
//! [`ErrorCode`] from the closed table in [`codes`], optionally carrying the
//! raw upstream reason. Calling code branches on identity (`err.is(codes::X)`)
//! rather than on message text.
//!
//! The mapping from upstream `reason` text to codes is data, not control
//! flow: each call site classifies against an [`ErrorScope`] whose ordered
//! [`ReasonRule`] table is evaluated top-down.

use std::fmt;

use thiserror::Error;

use crate::constants;

/// Coarse error categories used for caller policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Request preparation, connection, timeout or undecodable reply.
    Transport,
    /// Invalid credentials, missing user, MFA required, missing/expired token.
    Authentication,
    /// Upstream refused the operation (not found, duplicate name, bad address).
    UpstreamBusiness,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "Transport"),
            Self::Authentication => write!(f, "Authentication"),
            Self::UpstreamBusiness => write!(f, "Upstream"),
        }
    }
}

/// A stable error identity: numeric id, category and fixed message.
///
/// Generic codes (the `*_GENERIC` entries) use their message as a category
/// prefix; the upstream reason is appended when the error is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    pub id: u32,
    pub category: ErrorCategory,
    pub message: &'static str,
}

impl ErrorCode {
    pub const fn new(id: u32, category: ErrorCategory, message: &'static str) -> Self {
        Self { id, category, message }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.message)
    }
}

/// The closed, versioned error table.
///
/// Ids are grouped in families of 100/1000 per feature area. Entries are
/// never renumbered; new failures get new ids.
pub mod codes {
    use super::ErrorCategory::{Authentication, Transport, UpstreamBusiness};
    use super::ErrorCode;

    pub const MFA_IS_ENABLED: &str = "Sorry, your account has Two-Factor authentication and/or \
        Google Auth configured. This client does not support these features. Please disable \
        them in your account to use this client.";

    // Bulk autoregistration (3xx, 6xx)
    pub const AUTOREG_GENERIC: ErrorCode = ErrorCode::new(300, UpstreamBusiness, "AutoReg");
    pub const AUTOREG_BIC_EMPTY: ErrorCode = ErrorCode::new(
        303,
        UpstreamBusiness,
        "AutoReg - Registration key (Bulk Identification Code) is empty",
    );
    pub const AUTOREG_CANT_PREP_REQUEST: ErrorCode =
        ErrorCode::new(304, Transport, "AutoReg - Can't prep autoreg details");
    pub const AUTOREG_CANT_READ_RESPONSE: ErrorCode =
        ErrorCode::new(306, Transport, "AutoReg - Can't read autoreg response");
    pub const AUTOREG_NO_MATCHING_REG_INFO: ErrorCode = ErrorCode::new(
        307,
        UpstreamBusiness,
        "AutoReg - No registration exists that matches the key",
    );
    pub const AUTOREG_UNKNOWN: ErrorCode =
        ErrorCode::new(311, UpstreamBusiness, "AutoReg - Unknown error occurred");
    pub const AUTOREG_REGISTER_GENERIC: ErrorCode =
        ErrorCode::new(600, UpstreamBusiness, "AutoReg Register");

    // Authentication (5xx)
    pub const AUTH_GENERIC: ErrorCode = ErrorCode::new(500, Authentication, "Auth");
    pub const AUTH_UNKNOWN: ErrorCode =
        ErrorCode::new(501, Authentication, "Auth - Unknown error occurred");
    pub const AUTH_MFA_ENABLED: ErrorCode = ErrorCode::new(502, Authentication, MFA_IS_ENABLED);
    pub const AUTH_NO_AUTH_HASH: ErrorCode =
        ErrorCode::new(503, Authentication, "Auth - No auth hash returned");
    pub const AUTH_NO_TOKEN: ErrorCode =
        ErrorCode::new(504, Authentication, "Auth - No token returned");
    pub const AUTH_CANT_PREP_PASSWORD_SIGNIN: ErrorCode =
        ErrorCode::new(505, Transport, "Auth - Can't prep password signin");
    pub const AUTH_CANT_READ_PASSWORD_SIGNIN: ErrorCode =
        ErrorCode::new(507, Transport, "Auth - Can't read password signin reply");
    pub const AUTH_PASSWORD_INVALID: ErrorCode =
        ErrorCode::new(508, Authentication, "Auth - Password is invalid");
    pub const AUTH_NO_SUCH_USER: ErrorCode =
        ErrorCode::new(509, Authentication, "Auth - No such user");
    pub const AUTH_HASH_CANT_PREP_REQUEST: ErrorCode =
        ErrorCode::new(510, Transport, "Auth - AuthHash can't prep request");
    pub const AUTH_HASH_CANT_READ_RESULT: ErrorCode =
        ErrorCode::new(512, Transport, "Auth - AuthHash can't read result");
    pub const AUTH_HASH_INVALID: ErrorCode =
        ErrorCode::new(513, Authentication, "Auth - AuthHash invalid");
    pub const AUTH_SESSION_WAIT_TIMEOUT: ErrorCode =
        ErrorCode::new(514, Transport, "Auth - Timed out waiting for session refresh");

    // Device list (7xx)
    pub const DEVICE_LIST_GENERIC: ErrorCode = ErrorCode::new(700, UpstreamBusiness, "Device list");
    pub const DEVICE_LIST_CANT_READ_RESPONSE: ErrorCode =
        ErrorCode::new(702, Transport, "Device list - Can't read response");
    pub const DEVICE_LIST_UNKNOWN: ErrorCode =
        ErrorCode::new(703, UpstreamBusiness, "Device list - Unknown error occurred");

    // Device (8xx)
    pub const DEVICE_GENERIC: ErrorCode = ErrorCode::new(800, UpstreamBusiness, "Device");
    pub const DEVICE_UNKNOWN: ErrorCode =
        ErrorCode::new(801, UpstreamBusiness, "Device - Unknown error occurred");
    pub const DEVICE_NO_SERVICE_FOUND: ErrorCode =
        ErrorCode::new(802, UpstreamBusiness, "Device - No service found matching that UID");
    pub const DEVICE_CANT_PREP_REQUEST: ErrorCode =
        ErrorCode::new(803, Transport, "Device - Can't prepare request");
    pub const DEVICE_CANT_READ_RESPONSE: ErrorCode =
        ErrorCode::new(805, Transport, "Device - Can't read response");

    // Proxy create (9xx)
    pub const PROXY_CREATE_GENERIC: ErrorCode =
        ErrorCode::new(900, UpstreamBusiness, "Create Proxy");
    pub const PROXY_CREATE_UNKNOWN: ErrorCode =
        ErrorCode::new(901, UpstreamBusiness, "Create Proxy - Unknown error occurred");
    pub const PROXY_CREATE_NO_SERVICE_FOUND: ErrorCode = ErrorCode::new(
        902,
        UpstreamBusiness,
        "Create Proxy - No service found matching that UID",
    );
    pub const PROXY_CREATE_CANT_PREP_REQUEST: ErrorCode =
        ErrorCode::new(903, Transport, "Create Proxy - Can't prep request");
    pub const PROXY_CREATE_CANT_READ_RESPONSE: ErrorCode =
        ErrorCode::new(905, Transport, "Create Proxy - Can't read response");

    // Proxy delete (10xx)
    pub const PROXY_DELETE_GENERIC: ErrorCode =
        ErrorCode::new(1000, UpstreamBusiness, "Delete Proxy");
    pub const PROXY_DELETE_UNKNOWN: ErrorCode =
        ErrorCode::new(1001, UpstreamBusiness, "Delete Proxy - Unknown error occurred");
    pub const PROXY_DELETE_CANT_PREP_REQUEST: ErrorCode =
        ErrorCode::new(1002, Transport, "Delete Proxy - Can't prep request");
    pub const PROXY_DELETE_CANT_READ_RESPONSE: ErrorCode =
        ErrorCode::new(1004, Transport, "Delete Proxy - Can't read response");

    // Restore (20xx)
    pub const RESTORE_GENERIC: ErrorCode =
        ErrorCode::new(2000, UpstreamBusiness, "Restore Client");
    pub const RESTORE_DEVICE_ACTIVE: ErrorCode =
        ErrorCode::new(2002, UpstreamBusiness, "Restore Client - The device state is active");
    pub const RESTORE_TOKEN_NOT_SPECIFIED: ErrorCode =
        ErrorCode::new(2003, Authentication, "Restore Client - Token not specified or invalid");
    pub const RESTORE_DEVICE_NOT_EXISTS: ErrorCode = ErrorCode::new(
        2004,
        UpstreamBusiness,
        "Restore Client - Device does not exist or is not owned by the user",
    );
    pub const RESTORE_CANT_PREP_REQUEST: ErrorCode =
        ErrorCode::new(2005, Transport, "Restore Client - Can't prep request");
    pub const RESTORE_NOT_CONFIGURED: ErrorCode =
        ErrorCode::new(2008, Transport, "Restore Client - No restore endpoint configured");

    // Certificate (21xx)
    pub const CERT_GENERIC: ErrorCode = ErrorCode::new(2100, UpstreamBusiness, "Cert Client");
    pub const CERT_TOKEN_NOT_SPECIFIED: ErrorCode =
        ErrorCode::new(2103, Authentication, "Cert Client - Token not specified or invalid");
    pub const CERT_CANT_PREP_REQUEST: ErrorCode =
        ErrorCode::new(2105, Transport, "Cert Client - Can't prep request");
    pub const CERT_CANT_READ_RESPONSE: ErrorCode =
        ErrorCode::new(2107, Transport, "Cert Client - Can't read response");
    pub const CERT_NOT_CONFIGURED: ErrorCode =
        ErrorCode::new(2108, Transport, "Cert Client - No certificate endpoint configured");

    // Service (30xx)
    pub const SERVICE_GENERIC: ErrorCode = ErrorCode::new(3000, UpstreamBusiness, "Service");
    pub const SERVICE_UNKNOWN: ErrorCode =
        ErrorCode::new(3001, UpstreamBusiness, "Service - Unknown error occurred");
    pub const SERVICE_NO_SERVICE_FOUND: ErrorCode =
        ErrorCode::new(3002, UpstreamBusiness, "Service - No service found matching that UID");
    pub const SERVICE_CANT_PREP_REQUEST: ErrorCode =
        ErrorCode::new(3003, Transport, "Service - Can't prep request");
    pub const SERVICE_CANT_READ_RESPONSE: ErrorCode =
        ErrorCode::new(3005, Transport, "Service - Can't read response");

    // Service registration helpers (40xx)
    pub const HELPERS_GENERIC: ErrorCode = ErrorCode::new(4000, UpstreamBusiness, "API Helpers");
    pub const HELPERS_UNKNOWN: ErrorCode = ErrorCode::new(
        4001,
        UpstreamBusiness,
        "API Helpers - Unknown error occurred creating service",
    );
    pub const HELPERS_CANT_CREATE_SERVICE_ID: ErrorCode = ErrorCode::new(
        4002,
        UpstreamBusiness,
        "API Helpers - Unknown error occurred creating a service UID",
    );
    pub const HELPERS_NO_UID_RETURNED: ErrorCode =
        ErrorCode::new(4003, UpstreamBusiness, "API Helpers - No UID was returned by the API");
    pub const HELPERS_NO_TOKEN: ErrorCode =
        ErrorCode::new(4004, Authentication, "API Helpers - Missing authentication token");
    pub const HELPERS_SERVICE_UID_NOT_FOUND: ErrorCode =
        ErrorCode::new(4005, UpstreamBusiness, "API Helpers - Service matching UID not found");
    pub const HELPERS_SERVICE_UID_MISSING: ErrorCode =
        ErrorCode::new(4006, UpstreamBusiness, "API Helpers - Service UID invalid or missing");
    pub const HELPERS_DUPLICATE_NAME: ErrorCode = ErrorCode::new(
        4008,
        UpstreamBusiness,
        "API Helpers - A device in your account already has that name",
    );

    // Transport (50xx)
    pub const CLIENT_CANT_CREATE_REQUEST: ErrorCode =
        ErrorCode::new(5001, Transport, "API Client - Error creating request");
    pub const CLIENT_CANT_SEND: ErrorCode =
        ErrorCode::new(5002, Transport, "API Client - Error sending request");
    pub const CLIENT_CANT_READ: ErrorCode =
        ErrorCode::new(5003, Transport, "API Client - Error reading response");
    pub const CLIENT_TIMEOUT: ErrorCode =
        ErrorCode::new(5004, Transport, "API Client - Request timed out");

    // GraphQL (60xx)
    pub const GQL_GENERIC: ErrorCode = ErrorCode::new(6000, UpstreamBusiness, "GQL Client");
    pub const GQL_CANT_PREP_REQUEST: ErrorCode =
        ErrorCode::new(6001, Transport, "GQL Client - Error creating request");
    pub const GQL_CANT_READ_RESPONSE: ErrorCode =
        ErrorCode::new(6003, Transport, "GQL Client - Error read response");
    pub const GQL_NOT_AUTHORIZED: ErrorCode =
        ErrorCode::new(6004, Authentication, "GQL Client - Not authorized");
}

/// A classified failure: stable code plus optional upstream/transport detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{id}] {message}{}", detail_suffix(.detail), id = .code.id, message = .code.message)]
pub struct ApiError {
    code: ErrorCode,
    detail: Option<String>,
}

impl ApiError {
    /// Create an error that carries only its code.
    pub const fn new(code: ErrorCode) -> Self {
        Self { code, detail: None }
    }

    /// Create an error carrying detail text (raw upstream reason, transport cause).
    pub fn with_detail(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self { code, detail: Some(detail.into()) }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn id(&self) -> u32 {
        self.code.id
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category
    }

    /// Detail text, if any. For generic errors this is the upstream reason verbatim.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Raw upstream reason for errors built from an unmapped `reason`.
    ///
    /// Only generic codes carry the upstream text; transport detail is not
    /// reported here.
    pub fn upstream_reason(&self) -> Option<&str> {
        match self.code.category {
            ErrorCategory::UpstreamBusiness | ErrorCategory::Authentication => self.detail(),
            ErrorCategory::Transport => None,
        }
    }

    /// Identity check against a table entry.
    pub fn is(&self, code: ErrorCode) -> bool {
        self.code.id == code.id
    }

    /// Human readable message: the fixed message, then the detail if present.
    pub fn message(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{} - {}", self.code.message, detail),
            None => self.code.message.to_string(),
        }
    }

    pub fn is_authentication(&self) -> bool {
        self.category() == ErrorCategory::Authentication
    }

    pub fn is_transport(&self) -> bool {
        self.category() == ErrorCategory::Transport
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|detail| format!(" - {detail}")).unwrap_or_default()
}

impl From<ErrorCode> for ApiError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// One row of a reason table: if the upstream `reason` contains `needle`
/// (case-sensitive substring), the failure is `code`.
#[derive(Debug, Clone, Copy)]
pub struct ReasonRule {
    pub needle: &'static str,
    pub code: ErrorCode,
}

impl ReasonRule {
    pub const fn new(needle: &'static str, code: ErrorCode) -> Self {
        Self { needle, code }
    }
}

/// Classification policy for one call site.
#[derive(Debug, Clone, Copy)]
pub struct ErrorScope {
    /// Name used in log lines.
    pub name: &'static str,
    /// Body could not be decoded as the expected envelope.
    pub cant_read: ErrorCode,
    /// Failure with a non-empty unmapped reason; the reason is attached verbatim.
    pub generic: ErrorCode,
    /// Failure with no reason at all.
    pub unknown: ErrorCode,
    /// Ordered, first match wins.
    pub reasons: &'static [ReasonRule],
}

impl ErrorScope {
    /// First matching rule for `reason`, if any.
    pub fn match_reason(&self, reason: &str) -> Option<ErrorCode> {
        self.reasons.iter().find(|rule| reason.contains(rule.needle)).map(|rule| rule.code)
    }
}

/// Per-call-site classification scopes.
pub mod scopes {
    use super::{codes, ErrorScope, ReasonRule};
    use crate::constants::{
        REASON_BAD_DEVICE_ADDRESS, REASON_DEVICE_NOT_FOUND, REASON_DUPLICATE_NAME,
        REASON_MISSING_API_TOKEN, REASON_MISSING_USER, REASON_NO_MATCHING_BULK_PROJECT,
        REASON_SERVICE_NOT_FOUND_FOR_UID, REASON_USER_OR_PASSWORD_INVALID,
    };

    pub const PASSWORD_SIGNIN: ErrorScope = ErrorScope {
        name: "password_signin",
        cant_read: codes::AUTH_CANT_READ_PASSWORD_SIGNIN,
        generic: codes::AUTH_GENERIC,
        unknown: codes::AUTH_UNKNOWN,
        reasons: &[
            ReasonRule::new(REASON_USER_OR_PASSWORD_INVALID, codes::AUTH_PASSWORD_INVALID),
            ReasonRule::new(REASON_MISSING_USER, codes::AUTH_NO_SUCH_USER),
        ],
    };

    pub const AUTH_HASH_SIGNIN: ErrorScope = ErrorScope {
        name: "auth_hash_signin",
        cant_read: codes::AUTH_HASH_CANT_READ_RESULT,
        generic: codes::AUTH_GENERIC,
        unknown: codes::AUTH_UNKNOWN,
        reasons: &[
            ReasonRule::new(REASON_USER_OR_PASSWORD_INVALID, codes::AUTH_HASH_INVALID),
            ReasonRule::new(REASON_MISSING_USER, codes::AUTH_NO_SUCH_USER),
        ],
    };

    pub const DEVICE_LIST: ErrorScope = ErrorScope {
        name: "device_list",
        cant_read: codes::DEVICE_LIST_CANT_READ_RESPONSE,
        generic: codes::DEVICE_LIST_GENERIC,
        unknown: codes::DEVICE_LIST_UNKNOWN,
        reasons: &[],
    };

    pub const DEVICE: ErrorScope = ErrorScope {
        name: "device",
        cant_read: codes::DEVICE_CANT_READ_RESPONSE,
        generic: codes::DEVICE_GENERIC,
        unknown: codes::DEVICE_UNKNOWN,
        reasons: &[ReasonRule::new(REASON_SERVICE_NOT_FOUND_FOR_UID, codes::DEVICE_NO_SERVICE_FOUND)],
    };

    pub const SERVICE: ErrorScope = ErrorScope {
        name: "service",
        cant_read: codes::SERVICE_CANT_READ_RESPONSE,
        generic: codes::SERVICE_GENERIC,
        unknown: codes::SERVICE_UNKNOWN,
        reasons: &[ReasonRule::new(REASON_SERVICE_NOT_FOUND_FOR_UID, codes::SERVICE_NO_SERVICE_FOUND)],
    };

    pub const SERVICE_HELPERS: ErrorScope = ErrorScope {
        name: "service_helpers",
        cant_read: codes::SERVICE_CANT_READ_RESPONSE,
        generic: codes::HELPERS_GENERIC,
        unknown: codes::HELPERS_UNKNOWN,
        reasons: &[
            ReasonRule::new(REASON_DEVICE_NOT_FOUND, codes::HELPERS_SERVICE_UID_NOT_FOUND),
            ReasonRule::new(REASON_DUPLICATE_NAME, codes::HELPERS_DUPLICATE_NAME),
            ReasonRule::new(REASON_BAD_DEVICE_ADDRESS, codes::HELPERS_SERVICE_UID_MISSING),
            ReasonRule::new(REASON_MISSING_API_TOKEN, codes::HELPERS_NO_TOKEN),
        ],
    };

    pub const SERVICE_ADDRESS: ErrorScope = ErrorScope {
        name: "service_address",
        cant_read: codes::SERVICE_CANT_READ_RESPONSE,
        generic: codes::HELPERS_GENERIC,
        unknown: codes::HELPERS_CANT_CREATE_SERVICE_ID,
        reasons: &[],
    };

    pub const PROXY_CREATE: ErrorScope = ErrorScope {
        name: "proxy_create",
        cant_read: codes::PROXY_CREATE_CANT_READ_RESPONSE,
        generic: codes::PROXY_CREATE_GENERIC,
        unknown: codes::PROXY_CREATE_UNKNOWN,
        reasons: &[ReasonRule::new(
            REASON_SERVICE_NOT_FOUND_FOR_UID,
            codes::PROXY_CREATE_NO_SERVICE_FOUND,
        )],
    };

    pub const PROXY_DELETE: ErrorScope = ErrorScope {
        name: "proxy_delete",
        cant_read: codes::PROXY_DELETE_CANT_READ_RESPONSE,
        generic: codes::PROXY_DELETE_GENERIC,
        unknown: codes::PROXY_DELETE_UNKNOWN,
        reasons: &[],
    };

    pub const AUTOREG: ErrorScope = ErrorScope {
        name: "autoreg",
        cant_read: codes::AUTOREG_CANT_READ_RESPONSE,
        generic: codes::AUTOREG_GENERIC,
        unknown: codes::AUTOREG_UNKNOWN,
        reasons: &[ReasonRule::new(
            REASON_NO_MATCHING_BULK_PROJECT,
            codes::AUTOREG_NO_MATCHING_REG_INFO,
        )],
    };

    pub const AUTOREG_REGISTER: ErrorScope = ErrorScope {
        name: "autoreg_register",
        cant_read: codes::AUTOREG_CANT_READ_RESPONSE,
        generic: codes::AUTOREG_REGISTER_GENERIC,
        unknown: codes::AUTOREG_UNKNOWN,
        reasons: &[ReasonRule::new(
            REASON_NO_MATCHING_BULK_PROJECT,
            codes::AUTOREG_NO_MATCHING_REG_INFO,
        )],
    };
}

/// True if the envelope `code` is one of the MFA sentinels.
pub fn is_mfa_code(code: &str) -> bool {
    constants::MFA_CODES.contains(&code)
}
