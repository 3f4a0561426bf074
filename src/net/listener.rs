//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve the configured bind address
//! - Bind synchronously at startup so failures are fatal before serving begins
//! - Leave accepting to axum-server

use std::net::{SocketAddr, TcpListener};

use crate::error::StartupError;

/// Bind a listening socket ready to be handed to a Tokio-based server.
pub fn bind(address: &str) -> Result<TcpListener, StartupError> {
    let addr: SocketAddr = address.parse().map_err(|source| StartupError::Address {
        addr: address.to_string(),
        source,
    })?;

    let listener = TcpListener::bind(addr).map_err(|source| StartupError::Bind { addr, source })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| StartupError::Bind { addr, source })?;

    tracing::info!(
        address = %listener.local_addr().unwrap_or(addr),
        "Listener bound"
    );

    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_ephemeral_port() {
        let listener = bind("127.0.0.1:0").unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn bad_address_is_reported() {
        let err = bind("localhost:eighty").unwrap_err();
        assert!(matches!(err, StartupError::Address { .. }));
    }

    #[test]
    fn port_in_use_is_bind_error() {
        let first = bind("127.0.0.1:0").unwrap();
        let taken = first.local_addr().unwrap().to_string();
        let err = bind(&taken).unwrap_err();
        assert!(matches!(err, StartupError::Bind { .. }));
    }
}
