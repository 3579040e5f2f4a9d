//! Single-value caches with time-to-live
//!
//! [`TtlCell`] holds at most one value. Reads never block on a refresh in
//! progress; refreshes through [`TtlCell::get_or_refresh`] are serialized so
//! concurrent callers share one upstream call.

mod cell;

pub use cell::{CacheEntry, TtlCell};
