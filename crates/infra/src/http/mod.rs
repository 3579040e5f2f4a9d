//! HTTP transport
//!
//! One attempt per call, no retries. Callers above this layer decide policy.

mod client;

pub use client::{HttpClient, HttpClientBuilder, RawResponse, Transport, TransportRequest};
