//! Authenticated device-management API
//!
//! Every call flows through one [`Dispatcher`]: it attaches the user agent,
//! API key and cached session token, and enforces the per-request deadline.
//! Replies are decoded by the [`classifier`] against the error scope of the
//! operation that issued them.
//!
//! # Architecture
//!
//! - [`auth`]: password and hash sign-in, session caching
//! - [`graphql`]: GraphQL queries and the application-type catalog
//! - [`device`], [`service`], [`proxy`], [`autoreg`], [`restore`]: REST collaborators
//! - [`certificate`]: service certificate issuing

pub mod auth;
pub mod autoreg;
pub mod certificate;
pub mod classifier;
pub mod device;
pub mod dispatcher;
pub mod graphql;
pub mod proxy;
pub mod restore;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AccessTokenProvider, Authenticator, HashTokenProvider};
pub use autoreg::AutoRegistrationApi;
pub use certificate::CertificateApi;
pub use classifier::{classify, classify_final, require_field};
pub use device::DeviceApi;
pub use dispatcher::{Dispatcher, Request, SessionCache, Target};
pub use graphql::{ApplicationTypesCache, GraphQlClient};
pub use proxy::ProxyApi;
pub use restore::RestoreApi;
pub use service::ServiceApi;
