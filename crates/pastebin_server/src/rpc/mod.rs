//! gRPC transport for the bounded store.

/// Protobuf message types.
pub mod messages;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/pastebin.PasteBin.rs"));
}

pub use generated::paste_bin_client::PasteBinClient;
pub use generated::paste_bin_server::{PasteBin, PasteBinServer};

use self::messages::{Bin, GetBinsReply, GetBinsRequest, NewBinRequest, NewBinResponse};
use crate::{call_store, AppError, AppState};
use std::future::Future;
use std::net::SocketAddr;
use tonic::transport::{Identity, ServerTlsConfig};
use tonic::{Request, Response, Status};

/// Map a store error onto the closest gRPC status.
pub fn status_from_error(err: AppError) -> Status {
    match err {
        AppError::PayloadTooLarge { .. }
        | AppError::RequestTooLarge { .. }
        | AppError::BadRequest(_) => {
            Status::invalid_argument(err.to_string())
        }
        AppError::StoreUnavailable(_) => {
            tracing::warn!("gRPC store unavailable: {}", err);
            Status::unavailable(err.to_string())
        }
        AppError::Rejected(_) => Status::aborted(err.to_string()),
        other => {
            tracing::error!("gRPC internal error: {:?}", other);
            Status::internal("Internal server error")
        }
    }
}

/// [`PasteBin`] implementation backed by the shared [`AppState`].
#[derive(Clone)]
pub struct PasteBinService {
    state: AppState,
}

impl PasteBinService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[tonic::async_trait]
impl PasteBin for PasteBinService {
    async fn get_bins(
        &self,
        _request: Request<GetBinsRequest>,
    ) -> Result<Response<GetBinsReply>, Status> {
        tracing::info!("Received gRPC GetBins");
        let bins = call_store(&self.state, |store| store.list_active())
            .await
            .map_err(status_from_error)?;
        Ok(Response::new(GetBinsReply {
            data: bins.into_iter().map(Bin::from).collect(),
        }))
    }

    async fn new_bin(
        &self,
        request: Request<NewBinRequest>,
    ) -> Result<Response<NewBinResponse>, Status> {
        tracing::info!("Received gRPC NewBin");
        let NewBinRequest { title, content } = request.into_inner();
        call_store(&self.state, move |store| store.insert(&title, &content))
            .await
            .map_err(status_from_error)?;
        Ok(Response::new(NewBinResponse { status: 200 }))
    }
}

/// Read a PEM certificate chain and key into a TLS identity.
///
/// # Errors
/// Returns an I/O error when either file cannot be read.
pub async fn load_identity(cert_path: &str, key_path: &str) -> Result<Identity, std::io::Error> {
    let cert = tokio::fs::read(cert_path).await?;
    let key = tokio::fs::read(key_path).await?;
    Ok(Identity::from_pem(cert, key))
}

/// Serve the gRPC API on `addr` until `shutdown_signal` resolves.
///
/// Incoming messages are capped at the configured request size, matching
/// the HTTP body limit. With an `identity` the listener only accepts TLS.
///
/// # Errors
/// Returns any transport error produced while configuring TLS, binding, or
/// serving.
pub async fn serve_grpc(
    addr: SocketAddr,
    state: AppState,
    identity: Option<Identity>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), tonic::transport::Error> {
    let max_request_bytes = state.config.max_request_bytes;
    let service =
        PasteBinServer::new(PasteBinService::new(state)).max_decoding_message_size(max_request_bytes);

    let mut builder = tonic::transport::Server::builder();
    if let Some(identity) = identity {
        crate::install_crypto_provider();
        builder = builder.tls_config(ServerTlsConfig::new().identity(identity))?;
        tracing::info!("gRPC server listening at {} (TLS)", addr);
    } else {
        tracing::info!("gRPC server listening at {}", addr);
    }
    builder
        .add_service(service)
        .serve_with_shutdown(addr, shutdown_signal)
        .await
}
