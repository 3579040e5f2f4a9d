//! Wire constants
//!
//! Fixed values of the upstream contract: header names, envelope statuses,
//! reason substrings and REST paths.

// Timeouts and cache lifetimes
pub const DEFAULT_TIMEOUT_SECS: u64 = 40;
pub const SESSION_TTL_SECS: u64 = 60 * 60;
pub const APPLICATION_TYPES_TTL_SECS: u64 = 10 * 60 * 60;

// Header contract
pub const HEADER_API_KEY: &str = "apikey";
pub const HEADER_SESSION_TOKEN: &str = "token";

// Envelope statuses
pub const STATUS_TRUE: &str = "true";
pub const STATUS_FALSE: &str = "false";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_RESET: &str = "reset";

// Upstream error codes have no standard shape; the stable part is embedded
// in the human readable `reason`.
pub const REASON_DEVICE_NOT_FOUND: &str = "[0806]";
pub const REASON_DUPLICATE_NAME: &str = "[0807]";
pub const REASON_SERVICE_NOT_FOUND_FOR_UID: &str = "[0861]";
pub const REASON_BAD_DEVICE_ADDRESS: &str = "bad device address";
pub const REASON_MISSING_API_TOKEN: &str = "missing api token";
pub const REASON_USER_OR_PASSWORD_INVALID: &str = "username or password are invalid";
pub const REASON_MISSING_USER: &str = "missing user";
pub const REASON_NO_MATCHING_BULK_PROJECT: &str = "no matching bulk project";

/// Values of the envelope `code` field that signal multi-factor authentication.
pub const MFA_CODES: [&str; 3] = ["SMS_MFA", "SOFTWARE_TOKEN_MFA", "MFA_SETUP"];

/// Plain-text body returned by the GraphQL endpoint for unauthenticated calls.
pub const GRAPHQL_UNAUTHORIZED_BODY: &str = "Unauthorized";

// REST paths
pub const PATH_PASSWORD_SIGNIN: &str = "/user/login";
pub const PATH_AUTH_HASH_SIGNIN: &str = "/user/login/authhash";
pub const PATH_DEVICE_CREATE: &str = "/device/create";
pub const PATH_DEVICE_DELETE: &str = "/device/delete";
pub const PATH_DEVICE_REGISTER: &str = "/device/register";
pub const PATH_DEVICE_LIST_ALL: &str = "/device/list/all?cache=false";
pub const PATH_DEVICE_ADDRESS: &str = "/device/address";
pub const PATH_DEVELOPER_DEVICE_DELETE: &str = "/developer/device/delete/registered";
pub const PATH_DEVELOPER_DEVICE_TRANSFER: &str = "/developer/devices/transfer";
pub const PATH_PROXY_CONNECT: &str = "/device/connect";
pub const PATH_PROXY_STOP: &str = "/device/connect/stop";
pub const PATH_BULK_DEVICE_INFORMATION: &str = "/bulk/registration/device/information/";
pub const PATH_BULK_FRIENDLY_CONFIGURATION: &str = "/bulk/registration/device/friendly/configuration";
pub const PATH_BULK_CONFIGURATION: &str = "/bulk/registration/configuration";
pub const PATH_BULK_REGISTER: &str = "/bulk/registration/register";

// Service type identifiers
pub const TCP_SERVICE_ID: i32 = 1;
pub const BULK_SERVICE_ID: i32 = 35;
pub const MULTI_PORT_SERVICE_ID: i32 = 40;

/// Fallback port when the bulk configuration carries an unparsable port.
pub const FALLBACK_SERVICE_PORT: u16 = 65535;
