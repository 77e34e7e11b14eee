//! Data models.

/// Bin model and request payloads.
pub mod bin;
