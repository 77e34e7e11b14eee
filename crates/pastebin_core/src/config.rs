//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_CONTENT_MAX, DEFAULT_GRPC_PORT, DEFAULT_HTTP_PORT, DEFAULT_MAX_BINS,
    DEFAULT_MAX_REQUEST_BYTES, DEFAULT_STORE_TIMEOUT_MS, DEFAULT_TITLE_MAX,
};
use crate::store::StoreLimits;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Which backing store the service opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Persistent redb database under `db_path`.
    Redb,
    /// In-process collections; contents are lost on exit.
    Memory,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redb" | "disk" => Ok(Self::Redb),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("unknown storage kind '{}'", other)),
        }
    }
}

/// Runtime configuration for the pastebin service.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub storage: StorageKind,
    pub port: u16,
    pub grpc_port: u16,
    pub enable_grpc: bool,
    pub max_bins: usize,
    pub title_max: usize,
    pub content_max: usize,
    pub max_request_bytes: usize,
    pub store_timeout_ms: u64,
    pub disable_html_escape: bool,
    pub static_dir: Option<String>,
    /// PEM certificate chain; TLS is enabled only when `tls_key` is set too.
    pub tls_cert: Option<String>,
    /// PEM private key matching `tls_cert`.
    pub tls_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            storage: StorageKind::Redb,
            port: DEFAULT_HTTP_PORT,
            grpc_port: DEFAULT_GRPC_PORT,
            enable_grpc: false,
            max_bins: DEFAULT_MAX_BINS,
            title_max: DEFAULT_TITLE_MAX,
            content_max: DEFAULT_CONTENT_MAX,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            disable_html_escape: false,
            static_dir: None,
            tls_cert: None,
            tls_key: None,
        }
    }
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

fn default_db_path() -> String {
    let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".cache")
        .join("pastebin")
        .join("db")
        .to_string_lossy()
        .to_string()
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parsed_or<T: FromStr>(raw: Option<String>, name: &str, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!("Ignoring invalid {}='{}'; using default", name, raw);
            default
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Unparseable values fall back to defaults with a warning. A zero
    /// `MAX_BINS` is rejected the same way since the store needs room for at
    /// least one bin.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |name: &str| {
            lookup(name)
                .and_then(|value| parse_env_flag(&value))
                .unwrap_or(false)
        };

        let mut max_bins = parsed_or(lookup("MAX_BINS"), "MAX_BINS", defaults.max_bins);
        if max_bins == 0 {
            tracing::warn!("MAX_BINS must be at least 1; using {}", defaults.max_bins);
            max_bins = defaults.max_bins;
        }

        let path = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(expand_tilde)
        };
        let (tls_cert, tls_key) = match (path("TLS_CERT"), path("TLS_KEY")) {
            (Some(cert), Some(key)) => (Some(cert), Some(key)),
            (None, None) => (None, None),
            _ => {
                tracing::warn!("TLS_CERT and TLS_KEY must be set together; serving without TLS");
                (None, None)
            }
        };

        Self {
            db_path: lookup("DB_PATH")
                .filter(|value| !value.trim().is_empty())
                .map(expand_tilde)
                .unwrap_or(defaults.db_path),
            storage: parsed_or(lookup("STORAGE"), "STORAGE", defaults.storage),
            port: parsed_or(lookup("PORT"), "PORT", defaults.port),
            grpc_port: parsed_or(lookup("GRPC_PORT"), "GRPC_PORT", defaults.grpc_port),
            enable_grpc: flag("ENABLE_GRPC"),
            max_bins,
            title_max: parsed_or(lookup("TITLE_MAX"), "TITLE_MAX", defaults.title_max),
            content_max: parsed_or(lookup("CONTENT_MAX"), "CONTENT_MAX", defaults.content_max),
            max_request_bytes: parsed_or(
                lookup("MAX_REQUEST_BYTES"),
                "MAX_REQUEST_BYTES",
                defaults.max_request_bytes,
            ),
            store_timeout_ms: parsed_or(
                lookup("STORE_TIMEOUT_MS"),
                "STORE_TIMEOUT_MS",
                defaults.store_timeout_ms,
            ),
            disable_html_escape: flag("DISABLE_HTML_ESCAPE"),
            static_dir: path("STATIC_DIR"),
            tls_cert,
            tls_key,
        }
    }

    /// Capacity and length bounds handed to the store.
    pub fn limits(&self) -> StoreLimits {
        StoreLimits {
            max_bins: self.max_bins,
            title_max: self.title_max,
            content_max: self.content_max,
        }
    }

    /// Certificate and key paths when both are configured.
    pub fn tls_identity_paths(&self) -> Option<(&str, &str)> {
        match (&self.tls_cert, &self.tls_key) {
            (Some(cert), Some(key)) => Some((cert.as_str(), key.as_str())),
            _ => None,
        }
    }

    /// Deadline applied by transports to each store call.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_env_flag, Config, StorageKind};
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parse_env_flag_accepts_truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert_eq!(parse_env_flag(value), Some(true), "value: {}", value);
        }
    }

    #[test]
    fn parse_env_flag_accepts_falsy_values() {
        for value in ["", "0", "false", "FALSE", " no ", "off"] {
            assert_eq!(parse_env_flag(value), Some(false), "value: {}", value);
        }
    }

    #[test]
    fn parse_env_flag_rejects_unknown_values() {
        assert_eq!(parse_env_flag("maybe"), None);
        assert_eq!(parse_env_flag("enabled"), None);
    }

    #[test]
    fn from_lookup_applies_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.max_bins, 10);
        assert_eq!(config.title_max, 20);
        assert_eq!(config.content_max, 256);
        assert_eq!(config.max_request_bytes, 512);
        assert_eq!(config.store_timeout_ms, 3_000);
        assert_eq!(config.storage, StorageKind::Redb);
        assert!(!config.enable_grpc);
        assert!(!config.disable_html_escape);
        assert!(config.static_dir.is_none());
        assert!(config.db_path.ends_with("db"));
    }

    #[test]
    fn from_lookup_reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DB_PATH", "/tmp/pastebin-db"),
            ("STORAGE", "memory"),
            ("PORT", "9000"),
            ("GRPC_PORT", "9001"),
            ("ENABLE_GRPC", "1"),
            ("MAX_BINS", "3"),
            ("TITLE_MAX", "8"),
            ("CONTENT_MAX", "64"),
            ("MAX_REQUEST_BYTES", "128"),
            ("STORE_TIMEOUT_MS", "250"),
            ("DISABLE_HTML_ESCAPE", "yes"),
            ("STATIC_DIR", " /srv/www "),
        ]));
        assert_eq!(config.db_path, "/tmp/pastebin-db");
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.port, 9000);
        assert_eq!(config.grpc_port, 9001);
        assert!(config.enable_grpc);
        assert!(config.disable_html_escape);
        assert_eq!(config.static_dir.as_deref(), Some("/srv/www"));

        let limits = config.limits();
        assert_eq!(limits.max_bins, 3);
        assert_eq!(limits.title_max, 8);
        assert_eq!(limits.content_max, 64);
        assert_eq!(config.max_request_bytes, 128);
        assert_eq!(config.store_timeout().as_millis(), 250);
    }

    #[test]
    fn from_lookup_falls_back_on_invalid_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("MAX_BINS", "0"),
            ("STORAGE", "cassette"),
            ("ENABLE_GRPC", "perhaps"),
        ]));
        assert_eq!(config.port, crate::DEFAULT_HTTP_PORT);
        assert_eq!(config.max_bins, 10);
        assert_eq!(config.storage, StorageKind::Redb);
        assert!(!config.enable_grpc);
    }

    #[test]
    fn tls_requires_both_certificate_and_key() {
        let config = Config::from_lookup(lookup_from(&[
            ("TLS_CERT", "/etc/pastebin/cert.crt"),
            ("TLS_KEY", "/etc/pastebin/cert.key"),
        ]));
        assert_eq!(
            config.tls_identity_paths(),
            Some(("/etc/pastebin/cert.crt", "/etc/pastebin/cert.key"))
        );

        let cert_only = Config::from_lookup(lookup_from(&[("TLS_CERT", "/etc/pastebin/cert.crt")]));
        assert!(cert_only.tls_identity_paths().is_none());
        assert!(cert_only.tls_cert.is_none());

        let blank = Config::from_lookup(lookup_from(&[("TLS_CERT", " "), ("TLS_KEY", "")]));
        assert!(blank.tls_identity_paths().is_none());
        assert!(Config::default().tls_identity_paths().is_none());
    }

    #[test]
    fn storage_kind_parses_aliases() {
        assert_eq!("REDB".parse::<StorageKind>(), Ok(StorageKind::Redb));
        assert_eq!(" mem ".parse::<StorageKind>(), Ok(StorageKind::Memory));
        assert!("tape".parse::<StorageKind>().is_err());
    }
}
