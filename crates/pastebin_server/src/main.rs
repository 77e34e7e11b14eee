//! Pastebin server entrypoint (HTTP always, gRPC when enabled).

use pastebin_core::{DEFAULT_GRPC_PORT, DEFAULT_HTTP_PORT};
use pastebin_server::{
    config::Config, load_rustls_config, resolve_bind_address, rpc, serve_router,
    serve_router_tls, AppState,
};
use std::fmt::Display;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => flags.help = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

fn grpc_address(config: &Config) -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], config.grpc_port))
}

/// Future that resolves once the shutdown channel fires.
fn wait_for_shutdown(mut rx: watch::Receiver<bool>) -> impl Future<Output = ()> + Send + 'static {
    async move {
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

/// Signal shutdown, then wait for the gRPC server to drain.
///
/// The HTTP server can stop on its own (bind or accept failure), so the
/// channel is fired here as well as from the signal handler.
async fn stop_grpc<E: Display>(
    task: Option<JoinHandle<Result<(), E>>>,
    shutdown_tx: &watch::Sender<bool>,
) {
    shutdown_tx.send_replace(true);
    if let Some(task) = task {
        match task.await {
            Ok(Ok(())) => tracing::info!("gRPC server stopped"),
            Ok(Err(err)) => tracing::error!("gRPC server failed: {}", err),
            Err(err) => tracing::error!("gRPC task panicked: {}", err),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pastebin=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli_flags = parse_cli_flags(&args)?;

    if cli_flags.help {
        print_help();
        return Ok(());
    }

    let config = Config::from_env();
    let state = AppState::from_config(config.clone())?;
    tracing::info!(
        max_bins = config.max_bins,
        storage = ?config.storage,
        "Bin store ready"
    );

    let tls_paths = config
        .tls_identity_paths()
        .map(|(cert, key)| (cert.to_string(), key.to_string()));
    let (http_tls, grpc_identity) = match &tls_paths {
        Some((cert, key)) => {
            let http_tls = load_rustls_config(cert, key).await?;
            let identity = if config.enable_grpc {
                Some(rpc::load_identity(cert, key).await?)
            } else {
                None
            };
            tracing::info!(cert = %cert, "TLS enabled");
            (Some(http_tls), identity)
        }
        None => (None, None),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let signal_tx = Arc::clone(&shutdown_tx);
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown requested");
        signal_tx.send_replace(true);
    });

    let grpc_task = if config.enable_grpc {
        let addr = grpc_address(&config);
        let state = state.clone();
        let shutdown = wait_for_shutdown(shutdown_rx.clone());
        Some(tokio::spawn(async move {
            rpc::serve_grpc(addr, state, grpc_identity, shutdown).await
        }))
    } else {
        tracing::info!("gRPC disabled; set ENABLE_GRPC=1 to serve it");
        None
    };

    let bind_override = std::env::var("BIND").ok();
    let bind_addr = resolve_bind_address(&config, bind_override.as_deref());
    let serve_result = match http_tls {
        Some(tls) => {
            tracing::info!("Pastebin running at https://{}", bind_addr);
            serve_router_tls(bind_addr, tls, state, wait_for_shutdown(shutdown_rx)).await
        }
        None => match tokio::net::TcpListener::bind(bind_addr).await {
            Ok(listener) => {
                let actual_addr = listener.local_addr().unwrap_or(bind_addr);
                tracing::info!("Pastebin running at http://{}", actual_addr);
                serve_router(listener, state, wait_for_shutdown(shutdown_rx)).await
            }
            Err(err) => Err(err),
        },
    };

    if let Err(err) = &serve_result {
        tracing::error!("HTTP server failed: {}", err);
    }
    stop_grpc(grpc_task, &shutdown_tx).await;

    serve_result?;
    tracing::info!("Exiting.");
    Ok(())
}

fn print_help() {
    println!("Pastebin Server\n");
    println!("Usage: pastebin-server [OPTIONS]\n");
    println!("Options:");
    println!("  --help            Show this help message");
    println!("\nEnvironment variables:");
    println!("  DB_PATH           Database directory (default: ~/.cache/pastebin/db)");
    println!("  STORAGE           redb or memory (default: redb)");
    println!(
        "  PORT              HTTP port (default: {})",
        DEFAULT_HTTP_PORT
    );
    println!(
        "  BIND              Override HTTP bind address (e.g. 0.0.0.0:{})",
        DEFAULT_HTTP_PORT
    );
    println!(
        "  GRPC_PORT         gRPC port (default: {})",
        DEFAULT_GRPC_PORT
    );
    println!("  ENABLE_GRPC       Start the gRPC server");
    println!("  MAX_BINS          Active bin capacity (default: 10)");
    println!("  TITLE_MAX         Title limit in bytes (default: 20)");
    println!("  CONTENT_MAX       Content limit in bytes (default: 256)");
    println!("  MAX_REQUEST_BYTES HTTP request body limit (default: 512)");
    println!("  STORE_TIMEOUT_MS  Per-call store deadline (default: 3000)");
    println!("  DISABLE_HTML_ESCAPE  Store submitted content unescaped");
    println!("  STATIC_DIR        Directory served at /");
    println!("  TLS_CERT          PEM certificate chain; serves HTTPS and gRPC over TLS");
    println!("  TLS_KEY           PEM private key (required with TLS_CERT)");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
