//! In-process backend used for non-persistent deployments and tests.

use super::BinBackend;
use crate::error::AppError;
use crate::models::bin::Bin;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct MemoryState {
    active: BTreeMap<(i64, u64), Bin>,
    archive: Vec<Bin>,
    next_seq: u64,
}

impl MemoryState {
    fn admit(&mut self, bin: &Bin) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.active.insert((bin.timestamp, seq), bin.clone());
    }
}

/// [`BinBackend`] over `RwLock`-guarded in-memory collections.
#[derive(Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
}

impl MemoryBackend {
    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, AppError> {
        self.state
            .read()
            .map_err(|_| AppError::StorageMessage("Memory backend lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, AppError> {
        self.state
            .write()
            .map_err(|_| AppError::StorageMessage("Memory backend lock poisoned".to_string()))
    }
}

impl BinBackend for MemoryBackend {
    fn count_active(&self) -> Result<u64, AppError> {
        Ok(self.read()?.active.len() as u64)
    }

    fn insert_active(&self, bin: &Bin) -> Result<(), AppError> {
        self.write()?.admit(bin);
        Ok(())
    }

    fn atomic_replace_oldest(&self, bin: &Bin) -> Result<Bin, AppError> {
        let mut state = self.write()?;
        let Some((_, evicted)) = state.active.pop_first() else {
            return Err(AppError::StorageMessage(
                "Cannot replace the oldest bin of an empty active set".to_string(),
            ));
        };
        state.admit(bin);
        Ok(evicted)
    }

    fn remove_oldest(&self) -> Result<Bin, AppError> {
        let mut state = self.write()?;
        state
            .active
            .pop_first()
            .map(|(_, evicted)| evicted)
            .ok_or_else(|| {
                AppError::StorageMessage(
                    "Cannot remove the oldest bin of an empty active set".to_string(),
                )
            })
    }

    fn append_archive(&self, bin: &Bin) -> Result<(), AppError> {
        self.write()?.archive.push(bin.clone());
        Ok(())
    }

    fn list_active_sorted_by_timestamp(&self) -> Result<Vec<Bin>, AppError> {
        Ok(self.read()?.active.values().cloned().collect())
    }

    fn list_archive(&self) -> Result<Vec<Bin>, AppError> {
        Ok(self.read()?.archive.clone())
    }
}
