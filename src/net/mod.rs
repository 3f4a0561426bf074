//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → tls.rs (generate self-signed identity, TLS 1.3 server config)
//!     → listener.rs (bind plaintext and TLS sockets, fatal on failure)
//!
//! Incoming TCP connection
//!     → connection.rs (connection ID, TCP keep-alive probe period)
//!     → RustlsAcceptor (TLS listener only: handshake)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Keep-alive is applied before the TLS handshake
//! - TLS identity is ephemeral; a restart means a new certificate
//! - No connection limits; one task per accepted connection

pub mod connection;
pub mod listener;
pub mod tls;

pub use connection::{ConnectionId, KeepAliveAcceptor, DEFAULT_KEEPALIVE};
pub use tls::SelfSignedCert;
