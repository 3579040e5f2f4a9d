//! # Fleetlink Domain
//!
//! Domain types for the Fleetlink device-management API client.
//!
//! This crate contains:
//! - Credential bundles and the upstream JSON envelope
//! - The closed error-code table and `ApiError`
//! - Device, service, proxy and application-type payloads
//! - Client configuration and wire constants
//!
//! ## Architecture
//! - No dependencies on other Fleetlink crates
//! - No I/O; pure data and classification vocabulary

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
