//! Persistent backend on redb.

use super::tables::{
    ACTIVE_BINS, ACTIVE_SEQ_KEY, ARCHIVED_BINS, ARCHIVE_SEQ_KEY, BIN_COUNTERS, REDB_FILE_NAME,
};
use super::{BinBackend, Eviction};
use crate::error::AppError;
use crate::models::bin::Bin;
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata};
use std::path::Path;

/// [`BinBackend`] that stores both collections in one redb file.
pub struct RedbBackend {
    db: redb::Database,
}

fn deserialize_bin(bytes: &[u8]) -> Result<Bin, AppError> {
    Ok(bincode::deserialize(bytes)?)
}

fn next_sequence(counters: &mut redb::Table<&str, u64>, key: &str) -> Result<u64, AppError> {
    let current = counters.get(key)?.map(|guard| guard.value()).unwrap_or(0);
    counters.insert(key, current.saturating_add(1))?;
    Ok(current)
}

fn admit_in_txn(
    active: &mut redb::Table<(i64, u64), &[u8]>,
    counters: &mut redb::Table<&str, u64>,
    bin: &Bin,
) -> Result<(), AppError> {
    let encoded = bincode::serialize(bin)?;
    let seq = next_sequence(counters, ACTIVE_SEQ_KEY)?;
    active.insert((bin.timestamp, seq), encoded.as_slice())?;
    Ok(())
}

fn archive_in_txn(
    archive: &mut redb::Table<u64, &[u8]>,
    counters: &mut redb::Table<&str, u64>,
    bin: &Bin,
) -> Result<(), AppError> {
    let encoded = bincode::serialize(bin)?;
    let seq = next_sequence(counters, ARCHIVE_SEQ_KEY)?;
    archive.insert(seq, encoded.as_slice())?;
    Ok(())
}

fn pop_oldest_in_txn(active: &mut redb::Table<(i64, u64), &[u8]>) -> Result<Bin, AppError> {
    let Some((_, value)) = active.pop_first()? else {
        return Err(AppError::StorageMessage(
            "Cannot take the oldest bin of an empty active set".to_string(),
        ));
    };
    deserialize_bin(value.value())
}

impl RedbBackend {
    /// Open (or create) the database under directory `path`.
    ///
    /// # Returns
    /// A backend with all tables initialized.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be created, the file is
    /// already held by another process, or table initialization fails.
    pub fn open(path: &str) -> Result<Self, AppError> {
        let dir = Path::new(path);
        std::fs::create_dir_all(dir).map_err(|err| {
            AppError::StorageMessage(format!(
                "Failed to create database directory '{}': {}",
                dir.display(),
                err
            ))
        })?;

        let db = match redb::Database::create(dir.join(REDB_FILE_NAME)) {
            Ok(db) => db,
            Err(redb::DatabaseError::DatabaseAlreadyOpen) => {
                return Err(AppError::StorageMessage(format!(
                    "Database at '{}' is already open.\n\
                    Another pastebin server may be running; stop it first, \
                    or set DB_PATH to use a different database location.",
                    dir.display()
                )));
            }
            Err(err) => return Err(err.into()),
        };

        let write_txn = db.begin_write()?;
        write_txn.open_table(ACTIVE_BINS)?;
        write_txn.open_table(ARCHIVED_BINS)?;
        write_txn.open_table(BIN_COUNTERS)?;
        write_txn.commit()?;

        Ok(Self { db })
    }
}

impl BinBackend for RedbBackend {
    fn count_active(&self) -> Result<u64, AppError> {
        let read_txn = self.db.begin_read()?;
        let active = read_txn.open_table(ACTIVE_BINS)?;
        Ok(active.len()?)
    }

    fn insert_active(&self, bin: &Bin) -> Result<(), AppError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut active = write_txn.open_table(ACTIVE_BINS)?;
            let mut counters = write_txn.open_table(BIN_COUNTERS)?;
            admit_in_txn(&mut active, &mut counters, bin)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn atomic_replace_oldest(&self, bin: &Bin) -> Result<Bin, AppError> {
        let write_txn = self.db.begin_write()?;
        let evicted = {
            let mut active = write_txn.open_table(ACTIVE_BINS)?;
            let mut counters = write_txn.open_table(BIN_COUNTERS)?;
            let evicted = pop_oldest_in_txn(&mut active)?;
            admit_in_txn(&mut active, &mut counters, bin)?;
            evicted
        };
        write_txn.commit()?;
        Ok(evicted)
    }

    fn remove_oldest(&self) -> Result<Bin, AppError> {
        let write_txn = self.db.begin_write()?;
        let evicted = {
            let mut active = write_txn.open_table(ACTIVE_BINS)?;
            pop_oldest_in_txn(&mut active)?
        };
        write_txn.commit()?;
        Ok(evicted)
    }

    fn append_archive(&self, bin: &Bin) -> Result<(), AppError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut archive = write_txn.open_table(ARCHIVED_BINS)?;
            let mut counters = write_txn.open_table(BIN_COUNTERS)?;
            archive_in_txn(&mut archive, &mut counters, bin)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn list_active_sorted_by_timestamp(&self) -> Result<Vec<Bin>, AppError> {
        let read_txn = self.db.begin_read()?;
        let active = read_txn.open_table(ACTIVE_BINS)?;
        let mut bins = Vec::new();
        for item in active.iter()? {
            let (_, value) = item?;
            bins.push(deserialize_bin(value.value())?);
        }
        Ok(bins)
    }

    fn list_archive(&self) -> Result<Vec<Bin>, AppError> {
        let read_txn = self.db.begin_read()?;
        let archive = read_txn.open_table(ARCHIVED_BINS)?;
        let mut bins = Vec::new();
        for item in archive.iter()? {
            let (_, value) = item?;
            bins.push(deserialize_bin(value.value())?);
        }
        Ok(bins)
    }

    /// Replace and archive inside a single write transaction, so the evicted
    /// bin is never lost between the two collections.
    fn replace_oldest_and_archive(&self, bin: &Bin) -> Result<Eviction, AppError> {
        let write_txn = self.db.begin_write()?;
        let evicted = {
            let mut active = write_txn.open_table(ACTIVE_BINS)?;
            let mut archive = write_txn.open_table(ARCHIVED_BINS)?;
            let mut counters = write_txn.open_table(BIN_COUNTERS)?;
            let evicted = pop_oldest_in_txn(&mut active)?;
            admit_in_txn(&mut active, &mut counters, bin)?;
            archive_in_txn(&mut archive, &mut counters, &evicted)?;
            evicted
        };
        write_txn.commit()?;
        Ok(Eviction {
            evicted,
            archive_error: None,
        })
    }

    /// Trim the whole excess in one write transaction.
    fn archive_oldest(&self, count: usize) -> Result<Vec<Eviction>, AppError> {
        let write_txn = self.db.begin_write()?;
        let evictions = {
            let mut active = write_txn.open_table(ACTIVE_BINS)?;
            let mut archive = write_txn.open_table(ARCHIVED_BINS)?;
            let mut counters = write_txn.open_table(BIN_COUNTERS)?;
            let available = usize::try_from(active.len()?).unwrap_or(usize::MAX);
            let mut evictions = Vec::with_capacity(count.min(available));
            for _ in 0..count.min(available) {
                let evicted = pop_oldest_in_txn(&mut active)?;
                archive_in_txn(&mut archive, &mut counters, &evicted)?;
                evictions.push(Eviction {
                    evicted,
                    archive_error: None,
                });
            }
            evictions
        };
        write_txn.commit()?;
        Ok(evictions)
    }
}
