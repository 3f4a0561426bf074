//! Round-robin reverse proxy library.
//!
//! Terminates HTTP and TLS 1.3 traffic and spreads requests over a fixed
//! list of plaintext HTTP backends.

pub mod buffer;
pub mod config;
pub mod error;
pub mod http;
pub mod load_balancer;
pub mod net;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use error::StartupError;
pub use http::{BoundServer, ProxyServer};
