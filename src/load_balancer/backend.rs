//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream authority (`host` or `host:port`)
//! - Parse the comma-separated backend list given at startup
//! - Guarantee the resulting set is never empty

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use axum::http::uri::Authority;
use thiserror::Error;

/// Errors raised while building a [`BackendSet`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend list is empty")]
    Empty,

    #[error("invalid backend {entry:?}: expected host or host:port")]
    Invalid { entry: String },
}

/// A single backend server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    authority: Authority,
}

impl Backend {
    /// The authority requests are rewritten to.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }
}

impl FromStr for Backend {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let entry = s.trim();
        let invalid = || BackendError::Invalid {
            entry: entry.to_string(),
        };
        if entry.is_empty() {
            return Err(invalid());
        }
        let authority = Authority::from_str(entry).map_err(|_| invalid())?;
        Ok(Self { authority })
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.authority, f)
    }
}

/// Ordered, non-empty set of backends. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSet {
    backends: Vec<Backend>,
}

impl BackendSet {
    pub fn new(backends: Vec<Backend>) -> Result<Self, BackendError> {
        if backends.is_empty() {
            return Err(BackendError::Empty);
        }
        Ok(Self { backends })
    }

    /// Parse a comma-separated list such as `"10.0.0.1,10.0.0.2:8080"`.
    pub fn parse(list: &str) -> Result<Self, BackendError> {
        if list.trim().is_empty() {
            return Err(BackendError::Empty);
        }
        let backends = list
            .split(',')
            .map(Backend::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(backends)
    }

    /// Build from already-split entries (config file form).
    pub fn from_entries<S: AsRef<str>>(entries: &[S]) -> Result<Self, BackendError> {
        let backends = entries
            .iter()
            .map(|e| e.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(backends)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Backend> {
        self.backends.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Backend> {
        self.backends.iter()
    }
}

impl Index<usize> for BackendSet {
    type Output = Backend;

    fn index(&self, index: usize) -> &Backend {
        &self.backends[index]
    }
}

impl fmt::Display for BackendSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, backend) in self.backends.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", backend)?;
        }
        Ok(())
    }
}
