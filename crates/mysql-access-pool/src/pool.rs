//! Bounded connection pool.
//!
//! The pool owns a fixed-capacity set of slots, grows lazily up to the
//! configured ceiling, validates connections before lending them out, and
//! replaces stale connections in place. One mutex serializes every slot
//! mutation; the whole acquire sequence (scan, validate, recreate, expand)
//! runs inside that critical section. Correctness is deliberately favored
//! over acquire latency at the target pool sizes.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::config::{ConnectOptions, PoolConfig};
use crate::error::PoolError;
use crate::factory::{Connection, ConnectionFactory, MySqlFactory};

/// A bounded pool of reusable database connections.
///
/// Connections are lent out as [`PooledConnection`] guards and returned
/// automatically on drop, so no error path can leak a checkout. `acquire`
/// never blocks waiting for a free connection: when the pool is exhausted
/// it reports [`PoolError::Exhausted`] immediately.
///
/// # Example
///
/// ```rust,ignore
/// use mysql_access_pool::{ConnectOptions, Pool, PoolConfig};
///
/// let opts = ConnectOptions::new()
///     .host("127.0.0.1")
///     .user("app")
///     .password("secret")
///     .database("inventory");
///
/// let pool = Pool::connect(opts, PoolConfig::default())?;
///
/// let mut conn = pool.acquire()?;
/// // Run queries on `conn`; it returns to the pool when dropped.
/// ```
pub struct Pool<F: ConnectionFactory = MySqlFactory> {
    inner: Arc<PoolInner<F>>,
}

impl<F: ConnectionFactory> std::fmt::Debug for Pool<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool").finish_non_exhaustive()
    }
}

impl<F: ConnectionFactory> Clone for Pool<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct PoolInner<F: ConnectionFactory> {
    factory: F,
    config: PoolConfig,
    closed: AtomicBool,
    /// Sole serialization point for slot state and counters.
    state: Mutex<PoolState<F::Conn>>,
}

struct PoolState<C> {
    slots: Vec<Slot<C>>,
    metrics: MetricsInner,
}

/// One pool slot. While the connection is lent out the slot keeps
/// `in_use = true` and the handle itself lives in the guard, so a second
/// checkout of the same connection is unrepresentable.
struct Slot<C> {
    conn: Option<C>,
    in_use: bool,
}

#[derive(Debug, Default, Clone)]
struct MetricsInner {
    connections_created: u64,
    connections_closed: u64,
    checkouts_successful: u64,
    checkouts_failed: u64,
    validations_performed: u64,
    validations_failed: u64,
}

impl Pool<MySqlFactory> {
    /// Open a MySQL-backed pool.
    ///
    /// Convenience wrapper wiring a [`MySqlFactory`] from connection
    /// parameters; see [`Pool::open`].
    pub fn connect(opts: ConnectOptions, config: PoolConfig) -> Result<Self, PoolError> {
        opts.validate()?;
        Self::open(config, MySqlFactory::new(opts))
    }
}

impl<F: ConnectionFactory> Pool<F> {
    /// Create a pool and eagerly open the minimum warm set.
    ///
    /// If any warm-set connection fails to open, the whole creation fails
    /// and every connection opened so far is closed before the error is
    /// returned; a partially-usable pool is never handed to the caller.
    pub fn open(config: PoolConfig, factory: F) -> Result<Self, PoolError> {
        config.validate()?;

        let mut state = PoolState {
            slots: Vec::with_capacity(config.max_connections as usize),
            metrics: MetricsInner::default(),
        };

        for _ in 0..config.min_connections {
            let conn = factory.connect().map_err(PoolError::connect)?;
            state.metrics.connections_created += 1;
            state.slots.push(Slot {
                conn: Some(conn),
                in_use: false,
            });
        }

        tracing::info!(
            min = config.min_connections,
            max = config.max_connections,
            "connection pool created"
        );

        Ok(Self {
            inner: Arc::new(PoolInner {
                factory,
                config,
                closed: AtomicBool::new(false),
                state: Mutex::new(state),
            }),
        })
    }

    /// Get a connection from the pool.
    ///
    /// Scans populated slots in index order for an idle connection,
    /// validating it before handing it out. A stale connection is closed
    /// and replaced in place; if the replacement cannot be opened the scan
    /// continues with the next idle slot. When no idle slot yields a usable
    /// connection and the pool is below capacity, a new connection is
    /// opened and appended.
    ///
    /// # Errors
    ///
    /// - [`PoolError::Exhausted`] when every slot is busy and the pool is
    ///   at capacity; callers back off externally, the pool never waits.
    /// - [`PoolError::Connect`] when expanding the pool required a new
    ///   connection and opening it failed.
    /// - [`PoolError::Closed`] after [`Pool::close`].
    pub fn acquire(&self) -> Result<PooledConnection<F>, PoolError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(PoolError::Closed);
        }

        let mut state = self.inner.state.lock();

        // Re-check under the lock: close() may have swapped the flag and
        // drained every slot between the unlocked check above and lock
        // acquisition, and the drained slots must not be repopulated.
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(PoolError::Closed);
        }

        let PoolState { slots, metrics } = &mut *state;

        // Reuse: first idle slot in index order.
        for (idx, slot) in slots.iter_mut().enumerate() {
            if slot.in_use {
                continue;
            }

            let mut conn = slot.conn.take();
            // Probe only populated slots; an empty slot (earlier failed
            // replacement) is reopened without counting a validation.
            if conn.is_some() {
                metrics.validations_performed += 1;
                if !Self::validate(conn.as_mut()) {
                    metrics.validations_failed += 1;
                    metrics.connections_closed += 1;
                    // Close the stale session, then reopen in place.
                    conn = None;
                }
            }
            if conn.is_none() {
                conn = match self.inner.factory.connect() {
                    Ok(fresh) => {
                        metrics.connections_created += 1;
                        Some(fresh)
                    }
                    Err(err) => {
                        // Slot stays empty; the next acquire that reaches it
                        // tries again. Keep scanning the remaining idle slots.
                        tracing::warn!(
                            slot = idx,
                            error = %err,
                            "failed to replace stale connection"
                        );
                        None
                    }
                };
            }

            if let Some(conn) = conn {
                slot.in_use = true;
                metrics.checkouts_successful += 1;
                tracing::trace!(slot = idx, "connection checked out");
                return Ok(PooledConnection {
                    conn: Some(conn),
                    slot: idx,
                    pool: Arc::clone(&self.inner),
                });
            }
        }

        // No idle slot yielded a usable connection: expand if below capacity.
        if slots.len() < self.inner.config.max_connections as usize {
            match self.inner.factory.connect() {
                Ok(conn) => {
                    metrics.connections_created += 1;
                    metrics.checkouts_successful += 1;
                    let idx = slots.len();
                    slots.push(Slot {
                        conn: None,
                        in_use: true,
                    });
                    tracing::debug!(slot = idx, total = slots.len(), "pool expanded");
                    return Ok(PooledConnection {
                        conn: Some(conn),
                        slot: idx,
                        pool: Arc::clone(&self.inner),
                    });
                }
                Err(err) => {
                    metrics.checkouts_failed += 1;
                    return Err(PoolError::connect(err));
                }
            }
        }

        metrics.checkouts_failed += 1;
        Err(PoolError::Exhausted)
    }

    /// Liveness probe. An absent handle counts as invalid.
    #[must_use]
    pub fn validate(conn: Option<&mut F::Conn>) -> bool {
        conn.is_some_and(|c| c.ping())
    }

    /// Current slot occupancy.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state.lock();
        let in_use = state.slots.iter().filter(|s| s.in_use).count() as u32;
        let available = state
            .slots
            .iter()
            .filter(|s| !s.in_use && s.conn.is_some())
            .count() as u32;
        PoolStatus {
            available,
            in_use,
            total: state.slots.len() as u32,
            max: self.inner.config.max_connections,
        }
    }

    /// Counters accumulated since pool creation.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        let state = self.inner.state.lock();
        let m = &state.metrics;
        PoolMetrics {
            connections_created: m.connections_created,
            connections_closed: m.connections_closed,
            checkouts_successful: m.checkouts_successful,
            checkouts_failed: m.checkouts_failed,
            validations_performed: m.validations_performed,
            validations_failed: m.validations_failed,
        }
    }

    /// Close the pool.
    ///
    /// Closes every populated slot's connection under the lock and refuses
    /// subsequent acquires. Connections still lent out are closed when
    /// their guards drop. Calling `close` again is a no-op.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut state = self.inner.state.lock();
        let mut dropped = 0u64;
        for slot in &mut state.slots {
            if slot.conn.take().is_some() {
                dropped += 1;
            }
        }
        state.metrics.connections_closed += dropped;
        tracing::info!(closed = dropped, "connection pool closed");
    }

    /// Check if the pool is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Get the pool sizing configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }
}

impl<F: ConnectionFactory> PoolInner<F> {
    /// Return a lent connection to its slot. If the pool closed while the
    /// connection was out, it is dropped instead.
    fn release(&self, slot: usize, conn: F::Conn) {
        let mut state = self.state.lock();
        if self.closed.load(Ordering::Acquire) {
            state.metrics.connections_closed += 1;
            if let Some(entry) = state.slots.get_mut(slot) {
                entry.in_use = false;
            }
            return;
        }
        if let Some(entry) = state.slots.get_mut(slot) {
            entry.conn = Some(conn);
            entry.in_use = false;
        }
    }
}

/// Status information about the pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolStatus {
    /// Number of idle connections available.
    pub available: u32,
    /// Number of connections currently lent out.
    pub in_use: u32,
    /// Total number of slots ever populated.
    pub total: u32,
    /// Maximum allowed connections.
    pub max: u32,
}

impl PoolStatus {
    /// Calculate the utilization percentage.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        (f64::from(self.in_use) / f64::from(self.max)) * 100.0
    }

    /// Check if the pool is at capacity.
    #[must_use]
    pub fn is_at_capacity(&self) -> bool {
        self.total >= self.max
    }
}

/// Metrics collected from the pool.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Total connections created since pool start.
    pub connections_created: u64,
    /// Total connections closed since pool start.
    pub connections_closed: u64,
    /// Successful connection checkouts.
    pub checkouts_successful: u64,
    /// Failed checkouts (exhaustion or expansion failure).
    pub checkouts_failed: u64,
    /// Liveness probes performed before lending.
    pub validations_performed: u64,
    /// Liveness probes that found a stale connection.
    pub validations_failed: u64,
}

impl PoolMetrics {
    /// Calculate checkout success rate (0.0 to 1.0).
    #[must_use]
    pub fn checkout_success_rate(&self) -> f64 {
        let total = self.checkouts_successful + self.checkouts_failed;
        if total == 0 {
            return 1.0;
        }
        self.checkouts_successful as f64 / total as f64
    }
}

/// A connection lent from the pool.
///
/// Dereferences to the underlying connection. When dropped, the connection
/// is returned to its slot, on success and failure paths alike.
pub struct PooledConnection<F: ConnectionFactory = MySqlFactory> {
    conn: Option<F::Conn>,
    slot: usize,
    pool: Arc<PoolInner<F>>,
}

impl<F: ConnectionFactory> std::fmt::Debug for PooledConnection<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl<F: ConnectionFactory> PooledConnection<F> {
    /// Index of the pool slot this connection was lent from.
    #[must_use]
    pub fn slot(&self) -> usize {
        self.slot
    }
}

#[allow(clippy::expect_used)]
impl<F: ConnectionFactory> Deref for PooledConnection<F> {
    type Target = F::Conn;

    fn deref(&self) -> &Self::Target {
        // Present from construction until drop.
        self.conn.as_ref().expect("connection present until drop")
    }
}

#[allow(clippy::expect_used)]
impl<F: ConnectionFactory> DerefMut for PooledConnection<F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl<F: ConnectionFactory> Drop for PooledConnection<F> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::trace!(slot = self.slot, "connection returned to pool");
            self.pool.release(self.slot, conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::atomic::{AtomicIsize, AtomicUsize};
    use std::thread;

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct Refused;

    struct TestConn {
        id: usize,
        alive: Arc<AtomicBool>,
        drops: Arc<AtomicUsize>,
    }

    impl Connection for TestConn {
        fn ping(&mut self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }
    }

    impl Drop for TestConn {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct TestFactory {
        remaining: AtomicIsize,
        next_id: AtomicUsize,
        drops: Arc<AtomicUsize>,
        handles: Mutex<Vec<Arc<AtomicBool>>>,
    }

    impl TestFactory {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                remaining: AtomicIsize::new(isize::MAX),
                next_id: AtomicUsize::new(0),
                drops: Arc::new(AtomicUsize::new(0)),
                handles: Mutex::new(Vec::new()),
            })
        }

        fn refuse(&self) {
            self.remaining.store(0, Ordering::SeqCst);
        }

        fn allow_opens(&self, n: isize) {
            self.remaining.store(n, Ordering::SeqCst);
        }

        fn kill(&self, id: usize) {
            self.handles.lock()[id].store(false, Ordering::SeqCst);
        }

        fn opened(&self) -> usize {
            self.next_id.load(Ordering::SeqCst)
        }

        fn dropped(&self) -> usize {
            self.drops.load(Ordering::SeqCst)
        }
    }

    impl ConnectionFactory for Arc<TestFactory> {
        type Conn = TestConn;
        type Error = Refused;

        fn connect(&self) -> Result<TestConn, Refused> {
            if self.remaining.fetch_sub(1, Ordering::SeqCst) <= 0 {
                return Err(Refused);
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let alive = Arc::new(AtomicBool::new(true));
            self.handles.lock().push(Arc::clone(&alive));
            Ok(TestConn {
                id,
                alive,
                drops: Arc::clone(&self.drops),
            })
        }
    }

    fn pool_with(
        min: u32,
        max: u32,
    ) -> (Pool<Arc<TestFactory>>, Arc<TestFactory>) {
        let factory = TestFactory::new();
        let config = PoolConfig::new().min_connections(min).max_connections(max);
        let pool = Pool::open(config, Arc::clone(&factory)).unwrap();
        (pool, factory)
    }

    #[test]
    fn warm_set_opened_eagerly_and_live() {
        let (pool, factory) = pool_with(2, 4);

        let status = pool.status();
        assert_eq!(status.total, 2);
        assert_eq!(status.available, 2);
        assert_eq!(status.in_use, 0);
        assert_eq!(factory.opened(), 2);

        let mut a = pool.acquire().unwrap();
        let mut b = pool.acquire().unwrap();
        assert!(a.ping());
        assert!(b.ping());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn warm_set_failure_fails_creation_without_leaks() {
        let factory = TestFactory::new();
        factory.allow_opens(1);

        let config = PoolConfig::new().min_connections(2).max_connections(4);
        let err = Pool::open(config, Arc::clone(&factory)).unwrap_err();

        assert!(matches!(err, PoolError::Connect(_)));
        // The one connection that did open was closed during unwind.
        assert_eq!(factory.opened(), 1);
        assert_eq!(factory.dropped(), 1);
    }

    #[test]
    fn acquire_to_capacity_then_exhausted_then_recover() {
        let (pool, _factory) = pool_with(2, 4);

        let mut guards = Vec::new();
        let mut seen = HashSet::new();
        for _ in 0..4 {
            let conn = pool.acquire().unwrap();
            assert!(seen.insert(conn.id), "same connection lent twice");
            guards.push(conn);
        }

        assert!(matches!(pool.acquire().unwrap_err(), PoolError::Exhausted));
        assert_eq!(pool.status().total, 4);

        drop(guards.pop());
        let mut conn = pool.acquire().unwrap();
        assert!(conn.ping());

        // The pool never grew past its ceiling.
        assert_eq!(pool.status().total, 4);
    }

    #[test]
    fn no_connection_lent_twice_under_stress() {
        let (pool, _factory) = pool_with(2, 4);
        let in_flight: Arc<Mutex<HashSet<usize>>> = Arc::new(Mutex::new(HashSet::new()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            let in_flight = Arc::clone(&in_flight);
            handles.push(thread::spawn(move || {
                for _ in 0..200 {
                    match pool.acquire() {
                        Ok(conn) => {
                            assert!(
                                in_flight.lock().insert(conn.id),
                                "connection lent to two callers"
                            );
                            thread::yield_now();
                            assert!(in_flight.lock().remove(&conn.id));
                            drop(conn);
                        }
                        Err(PoolError::Exhausted) => thread::yield_now(),
                        Err(err) => panic!("unexpected error: {err}"),
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let status = pool.status();
        assert!(status.total <= 4);
        assert_eq!(status.in_use, 0);
    }

    #[test]
    fn stale_connection_replaced_on_next_acquire() {
        let (pool, factory) = pool_with(1, 2);

        let first_id = {
            let conn = pool.acquire().unwrap();
            conn.id
        };

        factory.kill(first_id);

        let mut conn = pool.acquire().unwrap();
        assert_ne!(conn.id, first_id);
        assert!(conn.ping());
        assert_eq!(conn.slot(), 0);

        let metrics = pool.metrics();
        assert_eq!(metrics.validations_failed, 1);
        // Replaced in place, not appended.
        assert_eq!(pool.status().total, 1);
    }

    #[test]
    fn failed_replacement_continues_scanning_idle_slots() {
        let (pool, factory) = pool_with(2, 2);

        factory.kill(0);
        factory.refuse();

        // Slot 0 is stale and cannot be repaired; slot 1 must be lent instead.
        let conn = pool.acquire().unwrap();
        assert_eq!(conn.slot(), 1);
        assert_eq!(conn.id, 1);

        // With slot 1 lent out and slot 0 unrepairable at capacity, the pool
        // is exhausted rather than erroring.
        assert!(matches!(pool.acquire().unwrap_err(), PoolError::Exhausted));

        // Once the factory recovers, slot 0 is repaired in place.
        factory.allow_opens(isize::MAX);
        let repaired = pool.acquire().unwrap();
        assert_eq!(repaired.slot(), 0);
        assert_eq!(pool.status().total, 2);
    }

    #[test]
    fn empty_slot_reopen_is_not_counted_as_validation() {
        let (pool, factory) = pool_with(2, 2);

        factory.kill(0);
        factory.refuse();

        // Slot 0 probed stale, replacement refused; slot 1 probed live.
        let held = pool.acquire().unwrap();
        assert_eq!(held.slot(), 1);
        let metrics = pool.metrics();
        assert_eq!(metrics.validations_performed, 2);
        assert_eq!(metrics.validations_failed, 1);

        drop(held);
        factory.allow_opens(isize::MAX);

        // Slot 0 is empty: reopened without a liveness probe, so neither
        // counter moves.
        let repaired = pool.acquire().unwrap();
        assert_eq!(repaired.slot(), 0);
        let metrics = pool.metrics();
        assert_eq!(metrics.validations_performed, 2);
        assert_eq!(metrics.validations_failed, 1);
    }

    #[test]
    fn expansion_failure_reports_connect_error_not_exhaustion() {
        let (pool, factory) = pool_with(1, 2);

        let _held = pool.acquire().unwrap();
        factory.refuse();

        let err = pool.acquire().unwrap_err();
        assert!(matches!(err, PoolError::Connect(_)));
    }

    #[test]
    fn close_drops_every_populated_connection() {
        let (pool, factory) = pool_with(3, 4);

        pool.close();
        assert_eq!(factory.dropped(), 3);
        assert!(pool.is_closed());
        assert!(matches!(pool.acquire().unwrap_err(), PoolError::Closed));

        // Second close is a no-op.
        pool.close();
        assert_eq!(factory.dropped(), 3);
        assert_eq!(pool.metrics().connections_closed, 3);
    }

    #[test]
    fn connection_released_after_close_is_dropped() {
        let (pool, factory) = pool_with(2, 4);

        let held = pool.acquire().unwrap();
        pool.close();
        assert_eq!(factory.dropped(), 1);

        drop(held);
        assert_eq!(factory.dropped(), 2);
        assert_eq!(pool.metrics().connections_closed, 2);
    }

    #[test]
    fn acquire_racing_close_opens_nothing_after_close_returns() {
        let (pool, factory) = pool_with(1, 4);
        let stop = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let pool = pool.clone();
            let stop = Arc::clone(&stop);
            handles.push(thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    match pool.acquire() {
                        Ok(conn) => drop(conn),
                        Err(PoolError::Closed) => break,
                        Err(_) => thread::yield_now(),
                    }
                }
            }));
        }

        thread::yield_now();
        pool.close();

        // Every acquire that raced close either finished before the slots
        // were drained or observes the closed flag under the lock; none may
        // open a fresh connection once close has returned.
        let opened = factory.opened();
        stop.store(true, Ordering::SeqCst);
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(factory.opened(), opened);
        assert!(matches!(pool.acquire().unwrap_err(), PoolError::Closed));
        assert_eq!(pool.status().available, 0);
    }

    #[test]
    fn validate_treats_absent_handle_as_invalid() {
        assert!(!Pool::<Arc<TestFactory>>::validate(None));
    }

    #[test]
    fn test_pool_status_utilization() {
        let status = PoolStatus {
            available: 5,
            in_use: 5,
            total: 10,
            max: 20,
        };
        assert!((status.utilization() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pool_status_at_capacity() {
        let status = PoolStatus {
            available: 0,
            in_use: 10,
            total: 10,
            max: 10,
        };
        assert!(status.is_at_capacity());

        let status2 = PoolStatus {
            available: 5,
            in_use: 5,
            total: 10,
            max: 20,
        };
        assert!(!status2.is_at_capacity());
    }

    #[test]
    fn test_metrics_checkout_success_rate() {
        let metrics = PoolMetrics {
            connections_created: 10,
            connections_closed: 2,
            checkouts_successful: 90,
            checkouts_failed: 10,
            validations_performed: 100,
            validations_failed: 5,
        };
        assert!((metrics.checkout_success_rate() - 0.9).abs() < f64::EPSILON);
    }
}
