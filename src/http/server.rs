//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build every subsystem from a validated `ProxyConfig`
//! - Create the Axum router that sends all traffic to the forwarder
//! - Bind the plaintext and TLS listeners (fatal on failure)
//! - Serve both listeners with the same router

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response},
    Router,
};
use axum_server::tls_rustls::{RustlsAcceptor, RustlsConfig};
use rustls::pki_types::CertificateDer;
use tower_http::trace::TraceLayer;

use crate::buffer::BufferPool;
use crate::config::{validate_config, ConfigError, ProxyConfig};
use crate::error::StartupError;
use crate::http::forwarder::Forwarder;
use crate::http::transport::{HttpTransport, Transport};
use crate::load_balancer::{BackendSet, RoundRobin};
use crate::net::{listener, tls, KeepAliveAcceptor, SelfSignedCert};

/// The reverse proxy, fully initialized but not yet bound.
pub struct ProxyServer {
    config: ProxyConfig,
    forwarder: Arc<Forwarder>,
    certificate: CertificateDer<'static>,
    tls: RustlsConfig,
}

impl ProxyServer {
    /// Build the proxy with the production transport.
    pub fn new(config: ProxyConfig) -> Result<Self, StartupError> {
        let transport = Arc::new(HttpTransport::new(&config.transport));
        Self::with_transport(config, transport)
    }

    /// Build the proxy around a caller-supplied transport.
    pub fn with_transport(
        config: ProxyConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, StartupError> {
        validate_config(&config).map_err(|errors| StartupError::Config(ConfigError::Validation(errors)))?;

        let rotation = RoundRobin::new(BackendSet::from_entries(&config.backends.0)?);
        tracing::info!(
            backends = %rotation.backends(),
            count = rotation.backends().len(),
            "Backend rotation configured"
        );

        let identity = SelfSignedCert::generate(&config.tls.subject_alt_names)?;
        let tls = tls::rustls_config(&identity)?;

        let pool = BufferPool::new(config.buffer_pool.buffer_size, config.buffer_pool.max_idle);
        let forwarder = Arc::new(Forwarder::new(rotation, transport, pool));

        Ok(Self {
            config,
            forwarder,
            certificate: identity.cert_der().clone(),
            tls,
        })
    }

    /// DER of the certificate generated for this run.
    pub fn certificate(&self) -> &CertificateDer<'static> {
        &self.certificate
    }

    /// The router both listeners serve.
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.forwarder))
    }

    /// Bind both listeners. Either failing aborts startup.
    pub fn bind(self) -> Result<BoundServer, StartupError> {
        let http = listener::bind(&self.config.listener.http_address)?;
        let https = listener::bind(&self.config.listener.https_address)?;
        let http_addr = local_addr(&http)?;
        let https_addr = local_addr(&https)?;

        Ok(BoundServer {
            router: self.router(),
            http,
            https,
            http_addr,
            https_addr,
            certificate: self.certificate,
            tls: self.tls,
            acceptor: KeepAliveAcceptor::new(self.config.listener.keepalive()),
        })
    }
}

/// A proxy whose listeners are bound and ready to serve.
pub struct BoundServer {
    router: Router,
    http: TcpListener,
    https: TcpListener,
    http_addr: SocketAddr,
    https_addr: SocketAddr,
    certificate: CertificateDer<'static>,
    tls: RustlsConfig,
    acceptor: KeepAliveAcceptor,
}

impl BoundServer {
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    pub fn https_addr(&self) -> SocketAddr {
        self.https_addr
    }

    /// `(http, https)` addresses actually bound.
    pub fn local_addrs(&self) -> (SocketAddr, SocketAddr) {
        (self.http_addr, self.https_addr)
    }

    pub fn certificate(&self) -> &CertificateDer<'static> {
        &self.certificate
    }

    /// Serve both listeners until one of them fails.
    pub async fn serve(self) -> Result<(), StartupError> {
        tracing::info!(
            http = %self.http_addr,
            https = %self.https_addr,
            keepalive = ?self.acceptor.period(),
            "Proxy serving"
        );

        let plain = axum_server::from_tcp(self.http)
            .acceptor(self.acceptor)
            .serve(self.router.clone().into_make_service());

        let secure = axum_server::from_tcp(self.https)
            .acceptor(
                RustlsAcceptor::new(self.tls)
                    .handshake_timeout(tls::HANDSHAKE_TIMEOUT)
                    .acceptor(self.acceptor),
            )
            .serve(self.router.into_make_service());

        tokio::select! {
            result = plain => result.map_err(|source| StartupError::Serve { listener: "http", source }),
            result = secure => result.map_err(|source| StartupError::Serve { listener: "https", source }),
        }
    }
}

fn local_addr(listener: &TcpListener) -> Result<SocketAddr, StartupError> {
    listener.local_addr().map_err(|source| StartupError::Serve {
        listener: "bind",
        source,
    })
}

/// Build the Axum router: every method and path goes to the forwarder.
fn build_router(forwarder: Arc<Forwarder>) -> Router {
    Router::new()
        .fallback(proxy_handler)
        .with_state(forwarder)
        .layer(TraceLayer::new_for_http())
}

/// Main proxy handler.
async fn proxy_handler(
    State(forwarder): State<Arc<Forwarder>>,
    request: Request<Body>,
) -> Response<Body> {
    forwarder.forward(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendsConfig;
    use axum::http::{Method, StatusCode};
    use axum::BoxError;
    use futures_util::future::BoxFuture;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    /// Answers every request with the backend authority and the request path.
    struct WhoAmI;

    impl Transport for WhoAmI {
        fn round_trip(
            &self,
            request: Request<Body>,
        ) -> BoxFuture<'static, Result<Response<Body>, BoxError>> {
            let text = format!(
                "{} {}",
                request.uri().authority().map(|a| a.as_str()).unwrap_or("-"),
                request.uri().path()
            );
            Box::pin(async move { Ok(Response::new(Body::from(text))) })
        }
    }

    fn test_config(backends: &str) -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.listener.http_address = "127.0.0.1:0".into();
        config.listener.https_address = "127.0.0.1:0".into();
        config.backends = BackendsConfig::from_list(backends);
        config
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn router_forwards_any_method_and_path() {
        let server = ProxyServer::with_transport(test_config("a,b"), Arc::new(WhoAmI)).unwrap();
        let router = server.router();

        let first = router
            .clone()
            .oneshot(Request::builder().method(Method::DELETE).uri("/x/y").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(body_text(first).await, "a /x/y");

        let second = router
            .oneshot(Request::builder().method(Method::PATCH).uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_text(second).await, "b /");
    }

    #[test]
    fn invalid_config_is_fatal() {
        let err = ProxyServer::with_transport(test_config(""), Arc::new(WhoAmI))
            .err()
            .unwrap();
        assert!(matches!(err, StartupError::Config(ConfigError::Validation(_))));
    }

    #[tokio::test]
    async fn bind_reports_ephemeral_addresses() {
        let server = ProxyServer::with_transport(test_config("a"), Arc::new(WhoAmI)).unwrap();
        let bound = server.bind().unwrap();
        assert_ne!(bound.http_addr().port(), 0);
        assert_ne!(bound.https_addr().port(), 0);
        assert_eq!(bound.local_addrs(), (bound.http_addr(), bound.https_addr()));
        assert_ne!(bound.http_addr(), bound.https_addr());
    }

    #[tokio::test]
    async fn bind_failure_is_fatal() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = test_config("a");
        config.listener.https_address = taken.local_addr().unwrap().to_string();

        let server = ProxyServer::with_transport(config, Arc::new(WhoAmI)).unwrap();
        let err = server.bind().err().unwrap();
        assert!(matches!(err, StartupError::Bind { .. }));
    }
}
