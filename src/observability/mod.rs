//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields: backend, peer, connection_id, error)
//!     → logging.rs (filter + pretty/JSON formatter)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - No metrics or health endpoints; logs are the only signal
//! - Per-request spans come from tower-http's TraceLayer

pub mod logging;
