use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::debug;

use crate::time::{Clock, SystemClock};

/// A cached value and its expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
    /// `None` when the TTL is too large to represent as an instant.
    expires_at: Option<Instant>,
}

impl<T> CacheEntry<T> {
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn stored_at(&self) -> Instant {
        self.stored_at
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Lock-guarded cache for one replaceable value with a time-to-live.
///
/// Two locks are involved. `entry` is held only for the duration of a read or
/// a swap and never across an await point. `refresh_gate` is held across the
/// refresh future, so concurrent [`get_or_refresh`](Self::get_or_refresh)
/// callers queue behind the one doing the work and then read its result.
/// The refresh itself may call [`get`](Self::get) without deadlocking.
pub struct TtlCell<T, C: Clock = SystemClock> {
    name: &'static str,
    ttl: Duration,
    entry: RwLock<Option<CacheEntry<T>>>,
    refresh_gate: Mutex<()>,
    clock: C,
}

impl<T: Clone> TtlCell<T, SystemClock> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self::with_clock(name, ttl, SystemClock)
    }
}

impl<T: Clone, C: Clock> TtlCell<T, C> {
    /// Create a cell with a custom clock (useful for testing)
    pub fn with_clock(name: &'static str, ttl: Duration, clock: C) -> Self {
        Self { name, ttl, entry: RwLock::new(None), refresh_gate: Mutex::new(()), clock }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value, if present and not expired. No side effects.
    pub fn get(&self) -> Option<T> {
        let now = self.clock.now();
        self.entry.read().as_ref().filter(|entry| entry.is_fresh(now)).map(|entry| entry.value.clone())
    }

    /// Replace the value and restart its TTL.
    pub fn set(&self, value: T) {
        let now = self.clock.now();
        let entry = CacheEntry { value, stored_at: now, expires_at: now.checked_add(self.ttl) };
        *self.entry.write() = Some(entry);
    }

    /// Force expiry. The value is kept for [`last_known`](Self::last_known).
    pub fn invalidate(&self) {
        let now = self.clock.now();
        if let Some(entry) = self.entry.write().as_mut() {
            entry.expires_at = Some(now);
        }
        debug!(cache = self.name, "cache entry invalidated");
    }

    /// The most recently stored value, expired or not.
    pub fn last_known(&self) -> Option<T> {
        self.entry.read().as_ref().map(|entry| entry.value.clone())
    }

    /// Snapshot of the current entry, expired or not.
    pub fn entry(&self) -> Option<CacheEntry<T>> {
        self.entry.read().clone()
    }

    pub fn is_fresh(&self) -> bool {
        let now = self.clock.now();
        self.entry.read().as_ref().is_some_and(|entry| entry.is_fresh(now))
    }

    /// Return the cached value, or run `refresh` and store its result.
    ///
    /// At most one refresh runs at a time. Callers arriving during a refresh
    /// wait for it and receive the stored value. A failed refresh leaves the
    /// cell untouched and its error goes to the caller that ran it; the next
    /// waiter in line then attempts its own refresh.
    ///
    /// Dropping the returned future (for instance on a caller deadline)
    /// releases the wait without affecting other callers.
    pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get() {
            return Ok(value);
        }

        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked(refresh).await
    }

    /// Like [`get_or_refresh`](Self::get_or_refresh), but waits at most
    /// `wait` for a refresh run by another caller.
    ///
    /// The deadline covers only the queue in front of the refresh. Once this
    /// caller holds the gate its own `refresh` runs to completion, so any
    /// deadline inside `refresh` reports its own error unchanged.
    pub async fn get_or_refresh_within<F, Fut, E>(
        &self,
        wait: Duration,
        on_wait_timeout: impl FnOnce() -> E,
        refresh: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get() {
            return Ok(value);
        }

        let Ok(_gate) = tokio::time::timeout(wait, self.refresh_gate.lock()).await else {
            debug!(cache = self.name, wait_ms = wait.as_millis() as u64, "gave up waiting for refresh");
            return Err(on_wait_timeout());
        };
        self.refresh_locked(refresh).await
    }

    async fn refresh_locked<F, Fut, E>(&self, refresh: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get() {
            debug!(cache = self.name, "cache filled by concurrent refresh");
            return Ok(value);
        }

        debug!(cache = self.name, "cache refresh started");
        let value = refresh().await?;
        self.set(value.clone());
        debug!(cache = self.name, ttl_ms = self.ttl.as_millis() as u64, "cache refreshed");
        Ok(value)
    }
}

impl<T, C: Clock> fmt::Debug for TtlCell<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let now = self.clock.now();
        let fresh = self.entry.read().as_ref().map(|entry| entry.is_fresh(now));
        f.debug_struct("TtlCell")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("fresh", &fresh)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::time::MockClock;

    const HOUR: Duration = Duration::from_secs(3600);

    fn cell(clock: &MockClock) -> TtlCell<String, MockClock> {
        TtlCell::with_clock("test", HOUR, clock.clone())
    }

    #[test]
    fn test_set_then_get_within_ttl() {
        let clock = MockClock::new();
        let cell = cell(&clock);
        assert_eq!(cell.get(), None);

        cell.set("token-a".to_string());
        clock.advance(HOUR - Duration::from_secs(1));

        assert_eq!(cell.get(), Some("token-a".to_string()));
        assert!(cell.is_fresh());
    }

    #[test]
    fn test_get_after_ttl_is_absent() {
        let clock = MockClock::new();
        let cell = cell(&clock);
        cell.set("token-a".to_string());

        clock.advance(HOUR);

        assert_eq!(cell.get(), None);
        assert_eq!(cell.last_known(), Some("token-a".to_string()));
    }

    #[test]
    fn test_invalidate_keeps_last_known() {
        let clock = MockClock::new();
        let cell = cell(&clock);
        cell.set("token-a".to_string());

        cell.invalidate();

        assert_eq!(cell.get(), None);
        assert_eq!(cell.last_known(), Some("token-a".to_string()));
        assert!(!cell.is_fresh());
    }

    #[test]
    fn test_set_after_invalidate_restores() {
        let clock = MockClock::new();
        let cell = cell(&clock);
        cell.set("token-a".to_string());
        cell.invalidate();
        cell.set("token-b".to_string());

        assert_eq!(cell.get(), Some("token-b".to_string()));
    }

    #[test]
    fn test_oversized_ttl_never_expires() {
        let clock = MockClock::new();
        let cell: TtlCell<u8, MockClock> =
            TtlCell::with_clock("forever", Duration::from_secs(u64::MAX), clock.clone());
        cell.set(1);
        clock.advance(Duration::from_secs(10 * 365 * 24 * 3600));
        assert_eq!(cell.get(), Some(1));
    }

    #[tokio::test]
    async fn test_get_or_refresh_uses_cached_value() {
        let clock = MockClock::new();
        let cell = cell(&clock);
        cell.set("cached".to_string());
        let calls = AtomicUsize::new(0);

        let value = cell
            .get_or_refresh(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>("fresh".to_string())
            })
            .await;

        assert_eq!(value, Ok("cached".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_runs_once() {
        let clock = MockClock::new();
        let cell = Arc::new(cell(&clock));
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks = (0..16).map(|_| {
            let cell = Arc::clone(&cell);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                cell.get_or_refresh(|| async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<_, ()>(format!("token-{n}"))
                })
                .await
            })
        });

        let results = futures::future::join_all(tasks).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap(), Ok("token-0".to_string()));
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_cell_unchanged() {
        let clock = MockClock::new();
        let cell = cell(&clock);
        cell.set("old".to_string());
        cell.invalidate();

        let result = cell.get_or_refresh(|| async { Err::<String, _>("upstream down") }).await;

        assert_eq!(result, Err("upstream down"));
        assert_eq!(cell.get(), None);
        assert_eq!(cell.last_known(), Some("old".to_string()));
    }

    #[tokio::test]
    async fn test_refresh_may_read_the_cell() {
        let clock = MockClock::new();
        let cell = cell(&clock);

        let value = cell
            .get_or_refresh(|| async {
                assert_eq!(cell.get(), None);
                Ok::<_, ()>("new".to_string())
            })
            .await;

        assert_eq!(value, Ok("new".to_string()));
    }

    #[tokio::test]
    async fn test_waiter_deadline_is_independent() {
        let clock = MockClock::new();
        let cell = Arc::new(cell(&clock));

        let leader = {
            let cell = Arc::clone(&cell);
            tokio::spawn(async move {
                cell.get_or_refresh(|| async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok::<_, ()>("slow".to_string())
                })
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let waiter = tokio::time::timeout(
            Duration::from_millis(20),
            cell.get_or_refresh(|| async { Ok::<_, ()>("unused".to_string()) }),
        )
        .await;
        assert!(waiter.is_err(), "waiter should give up on its own deadline");

        assert_eq!(leader.await.unwrap(), Ok("slow".to_string()));
        assert_eq!(cell.get(), Some("slow".to_string()));
    }

    #[tokio::test]
    async fn test_wait_deadline_reports_waiter_timeout() {
        let clock = MockClock::new();
        let cell = Arc::new(cell(&clock));

        let leader = {
            let cell = Arc::clone(&cell);
            tokio::spawn(async move {
                cell.get_or_refresh(|| async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok::<_, &str>("slow".to_string())
                })
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let waiter = cell
            .get_or_refresh_within(
                Duration::from_millis(20),
                || "gave up",
                || async { Ok("unused".to_string()) },
            )
            .await;
        assert_eq!(waiter, Err("gave up"));

        assert_eq!(leader.await.unwrap(), Ok("slow".to_string()));
    }

    #[tokio::test]
    async fn test_wait_deadline_does_not_cut_own_refresh() {
        let clock = MockClock::new();
        let cell = cell(&clock);

        let value = cell
            .get_or_refresh_within(
                Duration::from_millis(10),
                || "gave up",
                || async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Err::<String, _>("refresh timed out")
                },
            )
            .await;

        assert_eq!(value, Err("refresh timed out"));
        assert_eq!(cell.last_known(), None);
    }

    #[tokio::test]
    async fn test_wait_deadline_serves_cached_value() {
        let clock = MockClock::new();
        let cell = cell(&clock);
        cell.set("cached".to_string());

        let value = cell
            .get_or_refresh_within(Duration::ZERO, || "gave up", || async {
                Ok("fresh".to_string())
            })
            .await;

        assert_eq!(value, Ok("cached".to_string()));
    }
}
