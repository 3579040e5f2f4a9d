//! Runtime utilities shared across Fleetlink crates.
//!
//! - [`time`]: clock abstraction with a controllable [`time::MockClock`]
//! - [`cache`]: single-value TTL cache with single-flight refresh

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod cache;
pub mod time;

pub use cache::{CacheEntry, TtlCell};
pub use time::{Clock, MockClock, SystemClock};
