//! Command-line client for the pastebin service (gRPC or HTTP).

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use pastebin_core::constants::{DEFAULT_CLI_GRPC_ADDR, DEFAULT_CLI_HTTP_ADDR};
use pastebin_core::Bin;
use pastebin_server::rpc::messages::{GetBinsRequest, NewBinRequest};
use pastebin_server::rpc::PasteBinClient;
use serde_json::Value;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};

#[derive(Parser)]
#[command(name = "pastebin-cli", about = "Command-line client for pastebin", version)]
struct Cli {
    /// Server address (can also be set via PASTEBIN_ADDR env var)
    #[arg(short, long, env = "PASTEBIN_ADDR", global = true)]
    address: Option<String>,

    /// Transport used to reach the server
    #[arg(long, value_enum, default_value_t = Transport::Grpc, global = true)]
    transport: Transport,

    /// Request timeout in seconds
    #[arg(short = 't', long, default_value = "1", global = true)]
    timeout: u64,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// PEM CA certificate trusted for https:// addresses
    #[arg(long, env = "PASTEBIN_CA_CERT", global = true)]
    ca_cert: Option<PathBuf>,

    /// Skip certificate verification (HTTP transport only)
    #[arg(long, global = true)]
    insecure: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    Grpc,
    Http,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Retrieve the active bins, oldest first
    #[command(alias = "getBins")]
    GetBins,
    /// Submit a new bin
    #[command(alias = "newBin")]
    NewBin { title: String, content: String },
}

/// Certificate settings applied when the address uses `https://`.
#[derive(Debug, Default, Clone)]
struct TlsOptions {
    ca_pem: Option<Vec<u8>>,
    insecure: bool,
}

impl TlsOptions {
    fn load(ca_cert: Option<PathBuf>, insecure: bool, transport: Transport) -> Result<Self, String> {
        if insecure && transport == Transport::Grpc {
            return Err("--insecure is only supported with --transport http".to_string());
        }
        let ca_pem = match ca_cert {
            Some(path) => Some(std::fs::read(&path).map_err(|err| {
                format!("could not read CA certificate '{}': {}", path.display(), err)
            })?),
            None => None,
        };
        Ok(Self { ca_pem, insecure })
    }
}

fn uses_tls(address: &str) -> bool {
    address
        .get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"))
}

fn grpc_tls_config(tls: &TlsOptions) -> ClientTlsConfig {
    let config = ClientTlsConfig::new().with_webpki_roots();
    match &tls.ca_pem {
        Some(pem) => config.ca_certificate(Certificate::from_pem(pem)),
        None => config,
    }
}

fn resolve_address(address: Option<String>, transport: Transport) -> String {
    let explicit = address
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let address = explicit.unwrap_or_else(|| match transport {
        Transport::Grpc => DEFAULT_CLI_GRPC_ADDR.to_string(),
        Transport::Http => DEFAULT_CLI_HTTP_ADDR.to_string(),
    });
    let mut address = if address.contains("://") {
        address
    } else {
        format!("http://{}", address)
    };
    while address.ends_with('/') {
        address.pop();
    }
    address
}

fn api_url(address: &str, endpoint: &str) -> Result<reqwest::Url, String> {
    let mut url = reqwest::Url::parse(address)
        .map_err(|err| format!("invalid server address '{}': {}", address, err))?;
    let mut path = url
        .path_segments_mut()
        .map_err(|_| format!("server address '{}' cannot be used as an API base", address))?;
    path.pop_if_empty();
    path.push("api");
    path.push("v1.0");
    path.push(endpoint);
    drop(path);
    Ok(url)
}

fn error_message_for_response(status: reqwest::StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string();
    }

    body.trim().to_string()
}

fn format_bin_line(bin: &Bin) -> String {
    format!(
        "time: {}\ttitle: {}\tcontent: {}",
        bin.timestamp, bin.title, bin.content
    )
}

fn format_bins_output(bins: &[Bin], json: bool) -> Result<String, String> {
    if json {
        return serde_json::to_string_pretty(bins)
            .map_err(|err| format!("response encoding error: {}", err));
    }
    Ok(bins.iter().map(format_bin_line).collect::<Vec<_>>().join("\n"))
}

fn format_new_bin_output(status: i32, json: bool) -> String {
    if json {
        serde_json::json!({ "status": status }).to_string()
    } else {
        "Success".to_string()
    }
}

async fn connect_grpc(
    address: &str,
    timeout: Duration,
    tls: &TlsOptions,
) -> Result<PasteBinClient<Channel>, String> {
    let mut endpoint = Endpoint::from_shared(address.to_string())
        .map_err(|err| format!("invalid server address '{}': {}", address, err))?
        .timeout(timeout)
        .connect_timeout(timeout);
    if uses_tls(address) {
        endpoint = endpoint
            .tls_config(grpc_tls_config(tls))
            .map_err(|err| format!("invalid TLS configuration: {}", err))?;
    }
    let channel = endpoint
        .connect()
        .await
        .map_err(|err| format!("did not connect: {}", err))?;
    Ok(PasteBinClient::new(channel))
}

async fn http_error(res: reqwest::Response, action: &str) -> String {
    let status = res.status();
    let body = match res.text().await {
        Ok(body) => body,
        Err(err) => format!("failed to read error response body: {}", err),
    };
    format!(
        "could not {} ({}): {}",
        action,
        status,
        error_message_for_response(status, &body)
    )
}

async fn get_bins(
    address: &str,
    transport: Transport,
    timeout: Duration,
    tls: &TlsOptions,
) -> Result<Vec<Bin>, String> {
    match transport {
        Transport::Grpc => {
            let mut client = connect_grpc(address, timeout, tls).await?;
            let reply = client
                .get_bins(GetBinsRequest {})
                .await
                .map_err(|status| format!("could not get bins: {}", status.message()))?;
            Ok(reply.into_inner().data.into_iter().map(Bin::from).collect())
        }
        Transport::Http => {
            let client = http_client(timeout, tls)?;
            let res = client
                .get(api_url(address, "getBins")?)
                .send()
                .await
                .map_err(|err| format!("could not get bins: {}", err))?;
            if !res.status().is_success() {
                return Err(http_error(res, "get bins").await);
            }
            res.json::<Vec<Bin>>()
                .await
                .map_err(|err| format!("could not decode bins: {}", err))
        }
    }
}

async fn new_bin(
    address: &str,
    transport: Transport,
    timeout: Duration,
    tls: &TlsOptions,
    title: String,
    content: String,
) -> Result<i32, String> {
    match transport {
        Transport::Grpc => {
            let mut client = connect_grpc(address, timeout, tls).await?;
            let reply = client
                .new_bin(NewBinRequest { title, content })
                .await
                .map_err(|status| format!("could not create bin: {}", status.message()))?;
            Ok(reply.into_inner().status)
        }
        Transport::Http => {
            let client = http_client(timeout, tls)?;
            let res = client
                .post(api_url(address, "newBin")?)
                .form(&[("title", title.as_str()), ("content", content.as_str())])
                .send()
                .await
                .map_err(|err| format!("could not create bin: {}", err))?;
            if !res.status().is_success() {
                return Err(http_error(res, "create bin").await);
            }
            Ok(i32::from(res.status().as_u16()))
        }
    }
}

fn http_client(timeout: Duration, tls: &TlsOptions) -> Result<reqwest::Client, String> {
    let mut builder = reqwest::Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(tls.insecure);
    if let Some(pem) = &tls.ca_pem {
        let cert = reqwest::Certificate::from_pem(pem)
            .map_err(|err| format!("invalid CA certificate: {}", err))?;
        builder = builder.add_root_certificate(cert);
    }
    builder
        .build()
        .map_err(|err| format!("could not build HTTP client: {}", err))
}

async fn run(cli: Cli) -> Result<(), String> {
    let Cli {
        address,
        transport,
        timeout,
        json,
        ca_cert,
        insecure,
        command,
    } = cli;
    let address = resolve_address(address, transport);
    let timeout = Duration::from_secs(timeout.max(1));
    let tls = TlsOptions::load(ca_cert, insecure, transport)?;

    match command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
        Commands::GetBins => {
            let bins = get_bins(&address, transport, timeout, &tls).await?;
            let output = format_bins_output(&bins, json)?;
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Commands::NewBin { title, content } => {
            let status = new_bin(&address, transport, timeout, &tls, title, content).await?;
            println!("{}", format_new_bin_output(status, json));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    pastebin_server::install_crypto_provider();
    if let Err(message) = run(Cli::parse()).await {
        eprintln!("ERROR: {}", message);
        std::process::exit(1);
    }
}
