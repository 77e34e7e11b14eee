//! Shared integration-test server bootstrap helpers.

#![allow(dead_code)]

use axum_test::TestServer;
use pastebin_core::config::StorageKind;
use pastebin_server::{create_app, AppState, Config};
use std::path::Path;
use tempfile::TempDir;

pub(crate) fn test_config_for_db_path(db_path: &Path) -> Config {
    Config {
        port: 0,
        db_path: db_path.to_str().expect("db path").to_string(),
        storage: StorageKind::Redb,
        ..Config::default()
    }
}

pub(crate) fn test_server_for_config(config: Config) -> (TestServer, AppState) {
    let state = AppState::from_config(config).expect("open store");
    let app = create_app(state.clone());
    let server = TestServer::new(app).expect("server");
    (server, state)
}

pub(crate) fn setup_test_server() -> (TestServer, AppState, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = test_config_for_db_path(&temp_dir.path().join("db"));
    let (server, state) = test_server_for_config(config);
    (server, state, temp_dir)
}

pub(crate) fn memory_state(max_bins: usize) -> AppState {
    AppState::from_config(Config {
        storage: StorageKind::Memory,
        max_bins,
        ..Config::default()
    })
    .expect("memory store")
}
