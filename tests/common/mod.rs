//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request, Response};
use axum::Router;
use rr_proxy::config::{BackendsConfig, ProxyConfig};
use rr_proxy::ProxyServer;
use rustls::pki_types::CertificateDer;
use tokio::net::TcpListener;

/// A proxy running in the background on ephemeral ports.
pub struct RunningProxy {
    pub http: SocketAddr,
    pub https: SocketAddr,
    pub certificate: CertificateDer<'static>,
}

/// Start an echo backend on an ephemeral port.
///
/// The response body is the request body. Every request header comes back
/// as `x-echo-<name>`, plus `x-echo-method`, `x-echo-uri` and
/// `x-backend: <tag>`.
pub async fn start_echo_backend(tag: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(move |request: Request<Body>| echo(tag, request));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

async fn echo(tag: &'static str, request: Request<Body>) -> Response<Body> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    let mut response = Response::new(Body::from(bytes));
    let headers = response.headers_mut();
    for (name, value) in &parts.headers {
        if let Ok(echoed) = HeaderName::try_from(format!("x-echo-{name}")) {
            headers.append(echoed, value.clone());
        }
    }
    headers.insert("x-echo-method", HeaderValue::from_str(parts.method.as_str()).unwrap());
    headers.insert("x-echo-uri", HeaderValue::from_str(&parts.uri.to_string()).unwrap());
    headers.insert("x-backend", HeaderValue::from_static(tag));
    response
}

/// An address with nothing listening on it.
pub fn closed_port() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Build, bind and serve a proxy in front of `backends`.
pub fn start_proxy(backends: &[SocketAddr]) -> RunningProxy {
    let list: Vec<String> = backends.iter().map(ToString::to_string).collect();

    let mut config = ProxyConfig::default();
    config.listener.http_address = "127.0.0.1:0".into();
    config.listener.https_address = "127.0.0.1:0".into();
    config.backends = BackendsConfig(list);

    let bound = ProxyServer::new(config).unwrap().bind().unwrap();
    let running = RunningProxy {
        http: bound.http_addr(),
        https: bound.https_addr(),
        certificate: bound.certificate().clone(),
    };

    tokio::spawn(async move {
        let _ = bound.serve().await;
    });

    running
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
