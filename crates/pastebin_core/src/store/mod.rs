//! Bounded paste store.
//!
//! [`BinStore`] keeps at most `max_bins` bins active. Inserting into a full
//! store replaces the oldest active bin and moves it to the archive. Every
//! capacity-affecting mutation runs under a single insert gate, so the
//! count-then-mutate sequence never interleaves across callers and no reader
//! ever observes more than `max_bins` active bins.

mod clock;


pub use clock::{Clock, SystemClock};

use crate::constants::{DEFAULT_CONTENT_MAX, DEFAULT_MAX_BINS, DEFAULT_TITLE_MAX};
use crate::db::{BinBackend, Eviction};
use crate::error::AppError;
use crate::models::bin::Bin;
use parking_lot::{Mutex, MutexGuard};
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Capacity and field-length bounds enforced by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_bins: usize,
    /// Title bound in UTF-8 bytes.
    pub title_max: usize,
    /// Content bound in UTF-8 bytes.
    pub content_max: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_bins: DEFAULT_MAX_BINS,
            title_max: DEFAULT_TITLE_MAX,
            content_max: DEFAULT_CONTENT_MAX,
        }
    }
}

impl StoreLimits {
    /// Reject oversized fields before anything touches the backend.
    ///
    /// # Errors
    /// Returns [`AppError::PayloadTooLarge`] naming the first offending field.
    pub fn validate(&self, title: &str, content: &str) -> Result<(), AppError> {
        if title.len() > self.title_max {
            return Err(AppError::PayloadTooLarge {
                field: "title",
                limit: self.title_max,
                actual: title.len(),
            });
        }
        if content.len() > self.content_max {
            return Err(AppError::PayloadTooLarge {
                field: "content",
                limit: self.content_max,
                actual: content.len(),
            });
        }
        Ok(())
    }
}

/// How long inserts wait for the gate before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    /// Wait per acquisition attempt.
    pub attempt_timeout: Duration,
    pub max_attempts: u32,
    /// Upper bound of the random pause between attempts.
    pub max_backoff: Duration,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_millis(500),
            max_attempts: 4,
            max_backoff: Duration::from_millis(50),
        }
    }
}

/// What a successful insert did to the active set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The active set had room.
    Added,
    /// The oldest bin was replaced. `archived` is false when the archive
    /// append failed after the replace committed.
    Evicted { evicted: Bin, archived: bool },
}

/// State owned by the insert gate.
#[derive(Debug, Default)]
struct GateState {
    /// Highest timestamp handed out; `None` until the first insert seeds it
    /// from the backend.
    last_timestamp: Option<i64>,
}

/// Bounded-capacity paste store over a [`BinBackend`].
pub struct BinStore {
    backend: Arc<dyn BinBackend>,
    limits: StoreLimits,
    clock: Arc<dyn Clock>,
    gate: Mutex<GateState>,
    gate_policy: GatePolicy,
    archive_failures: AtomicU64,
}

impl BinStore {
    /// Build a store that stamps bins with the system clock.
    pub fn new(backend: Arc<dyn BinBackend>, limits: StoreLimits) -> Self {
        Self::with_clock(backend, limits, Arc::new(SystemClock))
    }

    /// Build a store with an explicit clock.
    pub fn with_clock(
        backend: Arc<dyn BinBackend>,
        limits: StoreLimits,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            limits,
            clock,
            gate: Mutex::new(GateState::default()),
            gate_policy: GatePolicy::default(),
            archive_failures: AtomicU64::new(0),
        }
    }

    /// Replace the gate acquisition policy.
    pub fn with_gate_policy(mut self, policy: GatePolicy) -> Self {
        self.gate_policy = policy;
        self
    }

    /// Bounds this store enforces.
    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    /// Number of evictions whose archive append failed since startup.
    pub fn archive_failures(&self) -> u64 {
        self.archive_failures.load(Ordering::Relaxed)
    }

    /// List active bins ordered by timestamp ascending, ties by insertion order.
    ///
    /// Runs without the insert gate; a concurrent insert is either fully
    /// visible or not at all.
    ///
    /// # Errors
    /// Returns [`AppError::StoreUnavailable`] when the backend fails.
    pub fn list_active(&self) -> Result<Vec<Bin>, AppError> {
        self.backend
            .list_active_sorted_by_timestamp()
            .map_err(AppError::into_store_unavailable)
    }

    /// List archived bins in eviction order.
    ///
    /// # Errors
    /// Returns [`AppError::StoreUnavailable`] when the backend fails.
    pub fn list_archive(&self) -> Result<Vec<Bin>, AppError> {
        self.backend
            .list_archive()
            .map_err(AppError::into_store_unavailable)
    }

    /// Submit a new bin, evicting the oldest active bin when the store is full.
    ///
    /// # Returns
    /// [`InsertOutcome`] describing whether an eviction happened. Once the
    /// active-set mutation commits the insert succeeds, even when archiving
    /// the evicted bin fails.
    ///
    /// # Errors
    /// - [`AppError::PayloadTooLarge`] when a field exceeds its bound; nothing
    ///   is mutated.
    /// - [`AppError::Rejected`] when the insert gate stays busy for the whole
    ///   retry budget.
    /// - [`AppError::StoreUnavailable`] when the backend fails during the
    ///   count or mutate step.
    ///
    /// An active set already above capacity (for example a database opened
    /// with a lower `max_bins`) is trimmed to capacity before the replace, so
    /// the set never holds more than `max_bins` bins once this returns.
    pub fn insert(&self, title: &str, content: &str) -> Result<InsertOutcome, AppError> {
        self.limits.validate(title, content)?;

        let mut gate = self.acquire_gate()?;
        let timestamp = self.next_timestamp(&mut gate)?;
        let bin = Bin::new(timestamp, title, content);

        let count = self
            .backend
            .count_active()
            .map_err(AppError::into_store_unavailable)?;

        let max_bins = self.limits.max_bins as u64;
        if count < max_bins {
            self.backend
                .insert_active(&bin)
                .map_err(AppError::into_store_unavailable)?;
            gate.last_timestamp = Some(timestamp);
            tracing::debug!(timestamp, active = count + 1, "Admitted bin");
            return Ok(InsertOutcome::Added);
        }

        if count > max_bins {
            let excess = count - max_bins;
            tracing::warn!(
                active = count,
                max_bins,
                excess,
                "Active set exceeds capacity; archiving the oldest excess bins"
            );
            let trimmed = self
                .backend
                .archive_oldest(usize::try_from(excess).unwrap_or(usize::MAX))
                .map_err(AppError::into_store_unavailable)?;
            for eviction in &trimmed {
                self.record_eviction(eviction);
            }
        }

        let eviction = self
            .backend
            .replace_oldest_and_archive(&bin)
            .map_err(AppError::into_store_unavailable)?;
        gate.last_timestamp = Some(timestamp);
        drop(gate);

        let archived = self.record_eviction(&eviction);
        tracing::debug!(timestamp, "Admitted bin after eviction");

        Ok(InsertOutcome::Evicted {
            evicted: eviction.evicted,
            archived,
        })
    }

    /// Log an eviction and count it when the archive append failed.
    ///
    /// Returns whether the evicted bin reached the archive.
    fn record_eviction(&self, eviction: &Eviction) -> bool {
        match &eviction.archive_error {
            None => {
                tracing::debug!(
                    evicted_timestamp = eviction.evicted.timestamp,
                    "Evicted oldest bin to archive"
                );
                true
            }
            Some(err) => {
                self.archive_failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    evicted_timestamp = eviction.evicted.timestamp,
                    evicted_title = %eviction.evicted.title,
                    error = %err,
                    "Evicted bin was removed from the active set but could not be archived"
                );
                false
            }
        }
    }

    fn acquire_gate(&self) -> Result<MutexGuard<'_, GateState>, AppError> {
        let policy = self.gate_policy;
        let attempts = policy.max_attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(guard) = self.gate.try_lock_for(policy.attempt_timeout) {
                return Ok(guard);
            }
            tracing::debug!(attempt, attempts, "Insert gate busy");
            if attempt < attempts && !policy.max_backoff.is_zero() {
                let max_micros = policy.max_backoff.as_micros() as u64;
                let pause = rand::thread_rng().gen_range(0..=max_micros);
                std::thread::sleep(Duration::from_micros(pause));
            }
        }
        Err(AppError::Rejected(format!(
            "insert gate still busy after {} attempts",
            attempts
        )))
    }

    /// Next non-decreasing timestamp. Must be called with the gate held.
    fn next_timestamp(&self, gate: &mut GateState) -> Result<i64, AppError> {
        let floor = match gate.last_timestamp {
            Some(last) => last,
            None => {
                let newest = self
                    .list_active()?
                    .last()
                    .map(|bin| bin.timestamp)
                    .unwrap_or(i64::MIN);
                gate.last_timestamp = Some(newest);
                newest
            }
        };
        Ok(self.clock.now_seconds().max(floor))
    }
}
