//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so an empty file is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the reverse proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (plaintext and TLS bind addresses).
    pub listener: ListenerConfig,

    /// Backend addresses (`host` or `host:port`), rotated in order.
    pub backends: BackendsConfig,

    /// Outbound transport tuning.
    pub transport: TransportConfig,

    /// Response body buffer pool.
    pub buffer_pool: BufferPoolConfig,

    /// Ephemeral certificate settings.
    pub tls: TlsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Plaintext HTTP bind address (e.g., "0.0.0.0:80").
    pub http_address: String,

    /// TLS bind address (e.g., "0.0.0.0:443").
    pub https_address: String,

    /// TCP keep-alive probe period for accepted connections, in seconds.
    pub keepalive_secs: u64,
}

impl ListenerConfig {
    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            http_address: "0.0.0.0:80".to_string(),
            https_address: "0.0.0.0:443".to_string(),
            keepalive_secs: crate::net::DEFAULT_KEEPALIVE.as_secs(),
        }
    }
}

/// Ordered backend list.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct BackendsConfig(pub Vec<String>);

impl Default for BackendsConfig {
    fn default() -> Self {
        Self(vec!["172.17.0.2".to_string()])
    }
}

impl BackendsConfig {
    /// Split a comma-separated flag value into entries.
    pub fn from_list(list: &str) -> Self {
        Self(list.split(',').map(|s| s.trim().to_string()).collect())
    }
}

/// Shared outbound transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// TCP keep-alive on backend connections in seconds.
    pub tcp_keepalive_secs: u64,

    /// How long an idle pooled backend connection is kept, in seconds.
    pub idle_timeout_secs: u64,

    /// Idle connections kept per backend.
    pub max_idle_per_host: usize,
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn tcp_keepalive(&self) -> Duration {
        Duration::from_secs(self.tcp_keepalive_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            tcp_keepalive_secs: 30,
            idle_timeout_secs: 30,
            max_idle_per_host: 500,
        }
    }
}

/// Buffer pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BufferPoolConfig {
    /// Size of each buffer in bytes.
    pub buffer_size: usize,

    /// Maximum number of idle buffers retained.
    pub max_idle: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            buffer_size: crate::buffer::pool::DEFAULT_BUFFER_SIZE,
            max_idle: crate::buffer::pool::DEFAULT_MAX_IDLE,
        }
    }
}

/// Self-signed certificate configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TlsConfig {
    /// Subject alternative names baked into the generated certificate.
    pub subject_alt_names: Vec<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            subject_alt_names: vec!["localhost".to_string()],
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// One JSON object per line for log aggregation.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
