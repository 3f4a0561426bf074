//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup: --backend "a,b:8080,c"
//!     → backend.rs (parse into an immutable, non-empty BackendSet)
//!     → round_robin.rs (wrap the set with an atomic cursor)
//!
//! Per request:
//!     Forwarder → RoundRobin::next() → &Backend
//! ```
//!
//! # Design Decisions
//! - The backend set is fixed for the process lifetime
//! - Selection is a single atomic update; no background refill task
//! - No health tracking: every configured backend stays in rotation

pub mod backend;
pub mod round_robin;

pub use backend::{Backend, BackendError, BackendSet};
pub use round_robin::RoundRobin;
