//! Outbound transport to backends.
//!
//! # Responsibilities
//! - Define the seam the forwarder sends requests through
//! - Provide the shared, connection-pooling HTTP/1.1 client used in production
//!
//! # Design Decisions
//! - One client per process, cloned cheaply; never built per request
//! - Injected into the forwarder so tests can substitute a fake
//! - Timeouts bound connection setup only; there is no end-to-end deadline,
//!   so a backend that stalls mid-body holds its forwarding task open

use axum::body::Body;
use axum::http::{Request, Response};
use axum::BoxError;
use futures_util::future::BoxFuture;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::{TokioExecutor, TokioTimer};

use crate::config::TransportConfig;

/// Something that can carry a rewritten request to a backend.
pub trait Transport: Send + Sync + 'static {
    fn round_trip(&self, request: Request<Body>)
        -> BoxFuture<'static, Result<Response<Body>, BoxError>>;
}

/// Pooled hyper client over plain TCP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client<HttpConnector, Body>,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.connect_timeout()));
        connector.set_keepalive(Some(config.tcp_keepalive()));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(config.idle_timeout())
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build(connector);

        tracing::debug!(
            connect_timeout = ?config.connect_timeout(),
            tcp_keepalive = ?config.tcp_keepalive(),
            idle_timeout = ?config.idle_timeout(),
            max_idle_per_host = config.max_idle_per_host,
            "Backend transport initialized"
        );

        Self { client }
    }
}

impl Transport for HttpTransport {
    fn round_trip(
        &self,
        request: Request<Body>,
    ) -> BoxFuture<'static, Result<Response<Body>, BoxError>> {
        let pending = self.client.request(request);
        Box::pin(async move {
            let response = pending.await?;
            Ok(response.map(Body::new))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refused_connection_is_an_error() {
        // Grab a free port, then close it so nothing is listening.
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let transport = HttpTransport::new(&TransportConfig::default());
        let request = Request::builder()
            .uri(format!("http://127.0.0.1:{port}/"))
            .body(Body::empty())
            .unwrap();

        let err = transport.round_trip(request).await.unwrap_err();
        assert!(err.to_string().contains("client error"));
    }
}
