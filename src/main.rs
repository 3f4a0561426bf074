//! Round-robin reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ :80  (plain)  ─┐
//!                               ├─▶ router ─▶ forwarder ─▶ rotation ─▶ Backend
//!     Client ──▶ :443 (TLS 1.3) ┘                 │
//!                                                 └─▶ pooled body ─▶ Client
//! ```
//!
//! Both listeners enable TCP keep-alive on every accepted connection. The
//! HTTPS listener presents a self-signed certificate generated at startup.

use std::path::PathBuf;

use clap::Parser;

use rr_proxy::config::{load_config, BackendsConfig, LogFormat, ProxyConfig};
use rr_proxy::observability::logging;
use rr_proxy::ProxyServer;

#[derive(Parser)]
#[command(name = "rr-proxy")]
#[command(about = "Round-robin HTTP/HTTPS reverse proxy", long_about = None)]
struct Cli {
    /// Comma-separated backends, e.g. `10.0.0.1,10.0.0.2:8080` [default: 172.17.0.2]
    #[arg(short, long)]
    backend: Option<String>,

    /// Plaintext listen address [default: 0.0.0.0:80]
    #[arg(long)]
    http_addr: Option<String>,

    /// TLS listen address [default: 0.0.0.0:443]
    #[arg(long)]
    https_addr: Option<String>,

    /// TOML configuration file; flags given here override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log output format [default: pretty]
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn into_config(self) -> Result<ProxyConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(list) = self.backend {
            config.backends = BackendsConfig::from_list(&list);
        }
        if let Some(addr) = self.http_addr {
            config.listener.http_address = addr;
        }
        if let Some(addr) = self.https_addr {
            config.listener.https_address = addr;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = cli.config.clone();

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            // Logging is not up yet.
            eprintln!("rr-proxy: failed to load configuration: {e}");
            return Err(e);
        }
    };

    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?config_path,
        http_address = %config.listener.http_address,
        https_address = %config.listener.https_address,
        "rr-proxy starting"
    );

    let bound = match ProxyServer::new(config).and_then(ProxyServer::bind) {
        Ok(bound) => bound,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    if let Err(e) = bound.serve().await {
        tracing::error!(error = %e, "Server stopped");
        return Err(e.into());
    }

    Ok(())
}
