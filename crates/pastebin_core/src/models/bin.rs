//! Bin model shared by the store, backends, and transports.

use serde::{Deserialize, Serialize};

/// A stored paste: title, content, and submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bin {
    /// Submission time in seconds since the Unix epoch.
    pub timestamp: i64,
    pub title: String,
    pub content: String,
}

impl Bin {
    /// Build a bin stamped with `timestamp`.
    pub fn new(timestamp: i64, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            timestamp,
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Request payload for submitting a bin.
///
/// Missing fields decode as empty strings, matching form semantics.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBinRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}
