//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::load_balancer::backend::{Backend, BackendSet};

/// Round-robin selector.
/// Stores an internal cursor to rotate through backends.
#[derive(Debug)]
pub struct RoundRobin {
    backends: BackendSet,
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new(backends: BackendSet) -> Self {
        Self {
            backends,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Hand out the next backend in rotation.
    ///
    /// Safe to call from any number of tasks. Every `len` consecutive
    /// selections cover each backend exactly once.
    pub fn next(&self) -> &Backend {
        let len = self.backends.len();
        // Keep the cursor in [0, len) so it never wraps at usize::MAX.
        let index = match self
            .cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| Some((c + 1) % len))
        {
            Ok(prev) | Err(prev) => prev,
        };
        &self.backends[index]
    }

    pub fn backends(&self) -> &BackendSet {
        &self.backends
    }
}
