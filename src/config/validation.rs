//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, backend entries and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::load_balancer::Backend;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let http = config.listener.http_address.parse::<SocketAddr>();
    let https = config.listener.https_address.parse::<SocketAddr>();
    if let Err(e) = &http {
        errors.push(ValidationError::new("listener.http_address", e.to_string()));
    }
    if let Err(e) = &https {
        errors.push(ValidationError::new("listener.https_address", e.to_string()));
    }
    if let (Ok(http), Ok(https)) = (http, https) {
        if http == https && http.port() != 0 {
            errors.push(ValidationError::new(
                "listener.https_address",
                format!("must differ from listener.http_address ({})", http),
            ));
        }
    }
    if config.listener.keepalive_secs == 0 {
        errors.push(ValidationError::new("listener.keepalive_secs", "must be greater than 0"));
    }

    if config.backends.0.is_empty() {
        errors.push(ValidationError::new("backends", "at least one backend is required"));
    }
    for entry in &config.backends.0 {
        if let Err(e) = entry.parse::<Backend>() {
            errors.push(ValidationError::new("backends", e.to_string()));
        }
    }

    if config.transport.connect_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "transport.connect_timeout_secs",
            "must be greater than 0",
        ));
    }

    if config.buffer_pool.buffer_size == 0 {
        errors.push(ValidationError::new("buffer_pool.buffer_size", "must be greater than 0"));
    }

    if config.tls.subject_alt_names.is_empty() {
        errors.push(ValidationError::new(
            "tls.subject_alt_names",
            "at least one name is required",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
