//! HTTP proxying subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, every request to the fallback handler)
//!     → forwarder.rs (pick backend, rewrite target)
//!     → transport.rs (pooled HTTP/1.1 client)
//!     → body.rs (stream response through a pooled buffer)
//!     → Send to client
//! ```

pub mod body;
pub mod forwarder;
pub mod server;
pub mod transport;

pub use body::PooledBody;
pub use forwarder::{Forwarder, ERROR_BODY_PREFIX};
pub use server::{BoundServer, ProxyServer};
pub use transport::{HttpTransport, Transport};
