//! Shared test-only helpers for pastebin_core.

use crate::db::{BinBackend, MemoryBackend, RedbBackend};
use crate::error::AppError;
use crate::models::bin::Bin;
use crate::store::Clock;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tempfile::TempDir;

/// Creates an isolated redb backend and returns it with the temp dir.
///
/// Keep the [`TempDir`] alive for the full test to preserve the backing file.
///
/// # Panics
/// Panics if temp-dir creation or database initialization fails.
pub(crate) fn setup_temp_redb() -> (RedbBackend, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join("db");
    let backend = RedbBackend::open(db_path.to_str().expect("db path")).expect("db");
    (backend, temp_dir)
}

/// Clock whose reading only changes when a test says so.
pub(crate) struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub(crate) fn starting_at(seconds: i64) -> Self {
        Self {
            now: AtomicI64::new(seconds),
        }
    }

    pub(crate) fn set(&self, seconds: i64) {
        self.now.store(seconds, Ordering::SeqCst);
    }

    pub(crate) fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_seconds(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Memory backend wrapper with switchable failures, for fault injection.
///
/// Uses the trait's default two-step eviction, so a failing archive append
/// surfaces as the documented replace-committed / archive-lost gap.
#[derive(Default)]
pub(crate) struct FaultyBackend {
    inner: MemoryBackend,
    fail_archive: AtomicBool,
    fail_count: AtomicBool,
    fail_list: AtomicBool,
}

impl FaultyBackend {
    pub(crate) fn fail_archive(&self, enabled: bool) {
        self.fail_archive.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn fail_count(&self, enabled: bool) {
        self.fail_count.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn fail_list(&self, enabled: bool) {
        self.fail_list.store(enabled, Ordering::SeqCst);
    }
}

impl BinBackend for FaultyBackend {
    fn count_active(&self) -> Result<u64, AppError> {
        if self.fail_count.load(Ordering::SeqCst) {
            return Err(AppError::StorageMessage("injected count failure".to_string()));
        }
        self.inner.count_active()
    }

    fn insert_active(&self, bin: &Bin) -> Result<(), AppError> {
        self.inner.insert_active(bin)
    }

    fn atomic_replace_oldest(&self, bin: &Bin) -> Result<Bin, AppError> {
        self.inner.atomic_replace_oldest(bin)
    }

    fn remove_oldest(&self) -> Result<Bin, AppError> {
        self.inner.remove_oldest()
    }

    fn append_archive(&self, bin: &Bin) -> Result<(), AppError> {
        if self.fail_archive.load(Ordering::SeqCst) {
            return Err(AppError::StorageMessage(
                "injected archive failure".to_string(),
            ));
        }
        self.inner.append_archive(bin)
    }

    fn list_active_sorted_by_timestamp(&self) -> Result<Vec<Bin>, AppError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(AppError::StorageMessage("injected list failure".to_string()));
        }
        self.inner.list_active_sorted_by_timestamp()
    }

    fn list_archive(&self) -> Result<Vec<Bin>, AppError> {
        self.inner.list_archive()
    }
}
