//! HTTP and gRPC wiring for the pastebin service (router, handlers, shared state).

/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for the bin endpoints.
pub mod handlers;
/// gRPC service and transport.
pub mod rpc;

pub use pastebin_core::{config, models, AppError, Bin, BinStore, Config, DEFAULT_HTTP_PORT};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer, services::ServeDir, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

/// Shared state passed to HTTP handlers and the gRPC service.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<BinStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Construct shared application state around an existing store.
    pub fn new(config: Config, store: BinStore) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }

    /// Open the configured backend and build a store with the configured limits.
    ///
    /// # Errors
    /// Returns an error when the backend cannot be opened.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let backend = pastebin_core::db::open_backend(&config)?;
        let store = BinStore::new(backend, config.limits());
        Ok(Self::new(config, store))
    }
}

/// Run a blocking store operation off the async runtime, bounded by the
/// configured store timeout.
///
/// # Errors
/// Returns the operation's own error, [`AppError::StoreUnavailable`] when the
/// deadline passes first, or [`AppError::Internal`] if the worker panicked.
pub async fn call_store<T, F>(state: &AppState, op: F) -> Result<T, AppError>
where
    F: FnOnce(&BinStore) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    let deadline = state.config.store_timeout();
    let task = tokio::task::spawn_blocking(move || op(&store));
    match tokio::time::timeout(deadline, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => {
            tracing::error!("Store task failed: {}", join_err);
            Err(AppError::Internal)
        }
        Err(_) => Err(AppError::StoreUnavailable(format!(
            "store did not answer within {} ms",
            deadline.as_millis()
        ))),
    }
}

/// Create the application router with all routes and middleware.
///
/// When `static_dir` is configured, unmatched paths are served from it.
pub fn create_app(state: AppState) -> Router {
    let max_request_bytes = state.config.max_request_bytes;
    let static_dir = state.config.static_dir.clone();

    let mut router = Router::new()
        .route("/api/v1.0/getBins", get(handlers::bins::get_bins))
        .route("/api/v1.0/newBin", post(handlers::bins::new_bin))
        .with_state(state);

    if let Some(dir) = static_dir {
        tracing::info!("Serving static files from {}", dir);
        router = router.fallback_service(ServeDir::new(dir));
    }

    router.layer(
        tower::ServiceBuilder::new()
            .layer(DefaultBodyLimit::max(max_request_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            )),
    )
}

/// Resolve the HTTP listener address.
///
/// `bind_override` is the raw `BIND` value; an unparsable value falls back to
/// loopback on the configured port.
pub fn resolve_bind_address(config: &Config, bind_override: Option<&str>) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], config.port));
    match bind_override {
        Some(value) => match value.trim().parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid BIND='{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        None => default_bind,
    }
}

/// Run the Axum server with graceful shutdown support.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let app = create_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}

/// Install the process-wide rustls crypto provider used by both TLS servers.
///
/// Safe to call more than once.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Load the PEM certificate chain and key for the HTTPS listener.
///
/// # Errors
/// Returns an I/O error when either file is missing or not valid PEM.
pub async fn load_rustls_config(
    cert_path: &str,
    key_path: &str,
) -> Result<axum_server::tls_rustls::RustlsConfig, std::io::Error> {
    install_crypto_provider();
    axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path).await
}

/// Run the Axum server over TLS with graceful shutdown support.
///
/// # Errors
/// Returns any I/O error produced while binding or serving.
pub async fn serve_router_tls(
    addr: SocketAddr,
    tls: axum_server::tls_rustls::RustlsConfig,
    state: AppState,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let app = create_app(state);
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown_signal.await;
        shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
    });
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
}
