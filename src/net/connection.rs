//! Accepted connection setup.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Enable TCP keep-alive with a fixed probe period on every accepted socket
//! - Hand the configured stream on to the TLS acceptor or straight to HTTP

use std::future::{ready, Ready};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum_server::accept::Accept;
use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpStream;

/// Probe period applied to accepted connections unless configured otherwise.
pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(3 * 60);

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Acceptor that turns on TCP keep-alive before anything else touches the socket.
///
/// Sits innermost in the axum-server acceptor chain, so for the TLS listener the
/// option is set before the handshake starts. A socket that rejects the option
/// is dropped.
#[derive(Debug, Clone, Copy)]
pub struct KeepAliveAcceptor {
    period: Duration,
}

impl KeepAliveAcceptor {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Enable keep-alive with `period` as both idle time and probe interval.
    pub fn configure(&self, stream: &TcpStream) -> io::Result<()> {
        let keepalive = TcpKeepalive::new()
            .with_time(self.period)
            .with_interval(self.period);
        SockRef::from(stream).set_tcp_keepalive(&keepalive)
    }
}

impl Default for KeepAliveAcceptor {
    fn default() -> Self {
        Self::new(DEFAULT_KEEPALIVE)
    }
}

impl<S> Accept<TcpStream, S> for KeepAliveAcceptor {
    type Stream = TcpStream;
    type Service = S;
    type Future = Ready<io::Result<(TcpStream, S)>>;

    fn accept(&self, stream: TcpStream, service: S) -> Self::Future {
        let id = ConnectionId::new();
        let peer = stream.peer_addr().ok();

        match self.configure(&stream) {
            Ok(()) => {
                tracing::trace!(connection_id = %id, peer_addr = ?peer, "Connection accepted");
                ready(Ok((stream, service)))
            }
            Err(e) => {
                tracing::warn!(
                    connection_id = %id,
                    peer_addr = ?peer,
                    error = %e,
                    "Failed to enable TCP keep-alive, dropping connection"
                );
                ready(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{tls, SelfSignedCert};
    use axum_server::tls_rustls::RustlsAcceptor;
    use rustls::pki_types::ServerName;
    use rustls::{ClientConfig, RootCertStore};
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio_rustls::TlsConnector;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id2.as_u64() > id1.as_u64());
    }

    #[tokio::test]
    async fn accepted_stream_has_keepalive() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _client = TcpStream::connect(addr).await.unwrap();
        let (stream, _) = listener.accept().await.unwrap();

        let acceptor = KeepAliveAcceptor::default();
        let (stream, ()) = acceptor.accept(stream, ()).await.unwrap();

        let sock = SockRef::from(&stream);
        assert!(sock.keepalive().unwrap());
        assert_eq!(sock.keepalive_time().unwrap(), Duration::from_secs(180));
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        assert_eq!(sock.keepalive_interval().unwrap(), Duration::from_secs(180));
    }

    #[tokio::test]
    async fn custom_period_is_applied() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _client = TcpStream::connect(addr).await.unwrap();
        let (stream, _) = listener.accept().await.unwrap();

        let acceptor = KeepAliveAcceptor::new(Duration::from_secs(45));
        acceptor.configure(&stream).unwrap();

        assert_eq!(SockRef::from(&stream).keepalive_time().unwrap(), Duration::from_secs(45));
    }

    #[tokio::test]
    async fn tls_listener_streams_have_keepalive() {
        let identity = SelfSignedCert::generate(&["localhost".to_string()]).unwrap();
        let acceptor = RustlsAcceptor::new(tls::rustls_config(&identity).unwrap())
            .acceptor(KeepAliveAcceptor::new(Duration::from_secs(75)));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut roots = RootCertStore::empty();
        roots.add(identity.cert_der().clone()).unwrap();
        let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
        let client_config = ClientConfig::builder_with_provider(provider)
            .with_protocol_versions(&[&rustls::version::TLS13])
            .unwrap()
            .with_root_certificates(roots)
            .with_no_client_auth();
        let client = tokio::spawn(async move {
            let tcp = TcpStream::connect(addr).await.unwrap();
            let name = ServerName::try_from("localhost").unwrap();
            TlsConnector::from(Arc::new(client_config)).connect(name, tcp).await
        });

        let (stream, _) = listener.accept().await.unwrap();
        let (tls_stream, ()) = acceptor.accept(stream, ()).await.unwrap();
        let (tcp, _) = tls_stream.get_ref();

        let sock = SockRef::from(tcp);
        assert!(sock.keepalive().unwrap());
        assert_eq!(sock.keepalive_time().unwrap(), Duration::from_secs(75));
        assert!(client.await.unwrap().is_ok());
    }
}
