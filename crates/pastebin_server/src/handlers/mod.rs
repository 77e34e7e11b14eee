//! HTTP handlers.

/// Bin list and submit endpoints.
pub mod bins;
