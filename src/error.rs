//! Startup error taxonomy.
//!
//! Every variant is fatal: the process logs it and exits non-zero.
//! Per-request failures never surface here; they are rendered into the
//! client response by the forwarder.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::ConfigError;
use crate::load_balancer::BackendError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("backend configuration error: {0}")]
    Backends(#[from] BackendError),

    #[error("invalid listen address {addr:?}: {source}")]
    Address {
        addr: String,
        source: std::net::AddrParseError,
    },

    #[error("failed to generate TLS certificate: {0}")]
    Certificate(#[from] rcgen::Error),

    #[error("failed to build TLS configuration: {0}")]
    Tls(#[from] rustls::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("{listener} listener failed: {source}")]
    Serve {
        listener: &'static str,
        source: std::io::Error,
    },
}
