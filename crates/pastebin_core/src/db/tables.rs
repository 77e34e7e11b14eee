//! redb table definitions shared by storage modules.

use redb::TableDefinition;

/// File name for the redb database within the configured DB directory.
pub const REDB_FILE_NAME: &str = "bins.redb";

/// Active bins keyed by `(timestamp, insertion sequence)` (`Bin`, bincode-encoded).
pub const ACTIVE_BINS: TableDefinition<(i64, u64), &[u8]> = TableDefinition::new("active_bins");
/// Archived bins keyed by archive sequence (`Bin`, bincode-encoded).
pub const ARCHIVED_BINS: TableDefinition<u64, &[u8]> = TableDefinition::new("archived_bins");
/// Monotonic sequence counters.
pub const BIN_COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("bin_counters");

/// Counter key for the next active-set insertion sequence.
pub const ACTIVE_SEQ_KEY: &str = "active_seq";
/// Counter key for the next archive sequence.
pub const ARCHIVE_SEQ_KEY: &str = "archive_seq";
