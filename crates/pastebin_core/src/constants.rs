//! Shared constants used across pastebin crates.

/// Default HTTP API port.
pub const DEFAULT_HTTP_PORT: u16 = 8443;

/// Default gRPC port.
pub const DEFAULT_GRPC_PORT: u16 = 50051;

/// Default number of bins kept in the active set.
pub const DEFAULT_MAX_BINS: usize = 10;
/// Default title bound in bytes.
pub const DEFAULT_TITLE_MAX: usize = 20;
/// Default content bound in bytes.
pub const DEFAULT_CONTENT_MAX: usize = 256;

/// Default HTTP request body cap, enforced before the store is reached.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 512;

/// Default deadline for a single store call issued by a transport.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 3_000;

/// Default gRPC endpoint used by the CLI.
pub const DEFAULT_CLI_GRPC_ADDR: &str = "http://127.0.0.1:50051";
/// Default HTTP endpoint used by the CLI.
pub const DEFAULT_CLI_HTTP_ADDR: &str = "http://127.0.0.1:8443";
