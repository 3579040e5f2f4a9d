//! # Fleetlink Infrastructure
//!
//! I/O side of the Fleetlink device-management client.
//!
//! This crate contains:
//! - The HTTP transport and its error conversions
//! - The request dispatcher, reply classifier and authenticators
//! - REST and GraphQL collaborators (devices, services, proxies, registration,
//!   restore, certificates)
//! - Configuration loading from environment and files
//!
//! ## Architecture
//! - Depends on `fleetlink-domain` for types and the error table
//! - Depends on `fleetlink-common` for the clock and TTL cache
//! - [`DeviceApiClient`] wires one client instance together

pub mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod http;

// Re-export commonly used items
pub use api::{AccessTokenProvider, Authenticator, Dispatcher, GraphQlClient, HashTokenProvider};
pub use client::DeviceApiClient;
pub use config::ConfigError;
pub use errors::TransportError;
pub use http::{HttpClient, Transport};
