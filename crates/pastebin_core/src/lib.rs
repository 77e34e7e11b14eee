//! Core domain library for the pastebin service (config, storage, bounded store).

/// Configuration loading and defaults.
pub mod config;
/// Shared default values.
pub mod constants;
/// Backing-store capability and its implementations.
pub mod db;
/// Application error types (storage/domain).
pub mod error;
/// Data models for bins and request payloads.
pub mod models;
/// The bounded paste store.
pub mod store;
/// Text helpers shared by transports.
pub mod text;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use constants::{DEFAULT_GRPC_PORT, DEFAULT_HTTP_PORT};
pub use db::BinBackend;
pub use error::AppError;
pub use models::bin::Bin;
pub use store::{BinStore, InsertOutcome, StoreLimits};
