//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)          command-line flags
//!     → loader.rs (parse & deserialize)     │
//!     → ProxyConfig ◀───────────────────────┘ (explicit flags override)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → consumed once by http::server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BackendsConfig, BufferPoolConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    ProxyConfig, TlsConfig, TransportConfig,
};
pub use validation::{validate_config, ValidationError};
