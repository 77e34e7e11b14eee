//! Backing-store capability consumed by [`crate::store::BinStore`].
//!
//! A backend owns two collections: the active set, ordered by
//! `(timestamp, insertion sequence)`, and the append-only archive. Backends
//! make each individual call atomic; the store is responsible for
//! serializing the count-then-mutate sequence across callers.

/// In-process backend.
pub mod memory;
/// Persistent backend on redb.
pub mod redb_store;
/// redb table definitions.
pub mod tables;


pub use memory::MemoryBackend;
pub use redb_store::RedbBackend;

use crate::config::{Config, StorageKind};
use crate::error::AppError;
use crate::models::bin::Bin;
use std::sync::Arc;

/// Result of replacing the oldest active bin during an eviction.
///
/// The active-set replace has always committed when an `Eviction` exists.
/// `archive_error` is set when the evicted bin could not be appended to the
/// archive afterwards.
#[derive(Debug)]
pub struct Eviction {
    pub evicted: Bin,
    pub archive_error: Option<AppError>,
}

/// Storage operations required by the bounded store.
pub trait BinBackend: Send + Sync {
    /// Number of bins currently in the active set.
    fn count_active(&self) -> Result<u64, AppError>;

    /// Append `bin` to the active set after every existing entry with the
    /// same timestamp.
    fn insert_active(&self, bin: &Bin) -> Result<(), AppError>;

    /// Atomically remove the oldest active bin, admit `bin`, and return the
    /// removed bin.
    ///
    /// # Errors
    /// Fails without mutating when the active set is empty.
    fn atomic_replace_oldest(&self, bin: &Bin) -> Result<Bin, AppError>;

    /// Remove the oldest active bin without admitting a replacement.
    ///
    /// # Errors
    /// Fails without mutating when the active set is empty.
    fn remove_oldest(&self) -> Result<Bin, AppError>;

    /// Append `bin` to the archive.
    fn append_archive(&self, bin: &Bin) -> Result<(), AppError>;

    /// Active bins ordered by timestamp ascending, ties by insertion order.
    fn list_active_sorted_by_timestamp(&self) -> Result<Vec<Bin>, AppError>;

    /// Archived bins in the order they were archived.
    fn list_archive(&self) -> Result<Vec<Bin>, AppError>;

    /// Replace the oldest active bin with `bin` and archive the evicted row.
    ///
    /// The default runs [`Self::atomic_replace_oldest`] then
    /// [`Self::append_archive`]. The replace commits first, so an archive
    /// failure is reported in [`Eviction::archive_error`] instead of failing
    /// the call. Backends with multi-table transactions override this to
    /// commit both steps together.
    fn replace_oldest_and_archive(&self, bin: &Bin) -> Result<Eviction, AppError> {
        let evicted = self.atomic_replace_oldest(bin)?;
        let archive_error = self.append_archive(&evicted).err();
        Ok(Eviction {
            evicted,
            archive_error,
        })
    }

    /// Move the `count` oldest active bins to the archive, oldest first.
    ///
    /// Used to shrink an active set that holds more bins than the store's
    /// capacity. The default removes and archives one bin at a time with the
    /// same reporting as [`Self::replace_oldest_and_archive`]; it stops early
    /// when the active set runs out.
    fn archive_oldest(&self, count: usize) -> Result<Vec<Eviction>, AppError> {
        let available = usize::try_from(self.count_active()?).unwrap_or(usize::MAX);
        let count = count.min(available);
        let mut evictions = Vec::with_capacity(count);
        for _ in 0..count {
            let evicted = self.remove_oldest()?;
            let archive_error = self.append_archive(&evicted).err();
            evictions.push(Eviction {
                evicted,
                archive_error,
            });
        }
        Ok(evictions)
    }
}

/// Open the backend selected by `config`.
///
/// # Errors
/// Returns an error when the redb database cannot be created or initialized.
pub fn open_backend(config: &Config) -> Result<Arc<dyn BinBackend>, AppError> {
    match config.storage {
        StorageKind::Redb => Ok(Arc::new(RedbBackend::open(&config.db_path)?)),
        StorageKind::Memory => {
            tracing::warn!("Using in-memory storage; bins will not survive a restart");
            Ok(Arc::new(MemoryBackend::default()))
        }
    }
}
