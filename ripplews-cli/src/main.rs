//! ripplews-cli - send one JSON-RPC command to a ripple WebSocket server.

use clap::Parser;
use colored::Colorize;
use ripplews_client::{Client, ConnectionConfig, RetryPolicy, TlsClientConfig};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ripplews-cli")]
#[command(about = "Send JSON-RPC commands to a ripple WebSocket server")]
#[command(version)]
struct Cli {
    /// Server hostname
    #[arg(short = 'H', long, default_value = "s1.ripple.com", env = "RIPPLEWS_HOST")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 443)]
    port: u16,

    /// Use a plaintext connection instead of TLS
    #[arg(long)]
    no_tls: bool,

    /// Connect timeout in seconds
    #[arg(long, default_value_t = 10)]
    connect_timeout: u64,

    // ===== TLS Options =====
    /// Path to CA certificate for server verification
    #[arg(long, env = "RIPPLEWS_CA_CERT")]
    ca_cert: Option<PathBuf>,

    /// Skip server certificate verification (INSECURE)
    #[arg(long, short = 'k')]
    insecure: bool,

    /// Server name for TLS SNI (defaults to the hostname)
    #[arg(long)]
    server_name: Option<String>,

    /// Give up after this many rate-limited attempts
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Command to send (e.g. server_info, ledger, account_info)
    command: String,

    /// Command parameters as a JSON object
    #[arg(default_value = "{}")]
    params: String,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let params: Value = match serde_json::from_str(&cli.params) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("{}: params is not valid JSON: {}", "Error".red(), e);
            std::process::exit(1);
        }
    };
    if !params.is_object() {
        eprintln!("{}: params must be a JSON object", "Error".red());
        std::process::exit(1);
    }

    let mut tls = TlsClientConfig::new();
    if let Some(path) = cli.ca_cert {
        tls = tls.with_ca_cert(path);
    }
    if cli.insecure {
        tls = tls.with_insecure();
    }
    if let Some(name) = cli.server_name {
        tls = tls.with_server_name(name);
    }

    let config = ConnectionConfig::new(cli.host)
        .with_port(cli.port)
        .with_secure(!cli.no_tls)
        .with_connect_timeout(Duration::from_secs(cli.connect_timeout))
        .with_tls(tls);

    let mut retry = RetryPolicy::default();
    if let Some(n) = cli.max_attempts {
        retry = retry.with_max_attempts(n);
    }

    let mut client = Client::new(config).with_retry(retry);

    match client.call(&cli.command, params) {
        Ok(result) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&result).expect("result is valid JSON")
            );
            client.close();
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }
}
