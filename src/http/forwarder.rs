//! Request forwarding.
//!
//! # Responsibilities
//! - Pick the next backend from the rotation
//! - Rewrite the request target (scheme + authority) and nothing else
//! - Send it over the shared transport
//! - Stream the backend response back through a pooled buffer
//! - Render transport failures into the response body
//!
//! # Design Decisions
//! - Single shot: no retries, a failed call produces an error body
//! - A failed call keeps the default 200 status and carries the error text
//!   in the body; clients must treat such a body as a failure signal

use std::error::Error as StdError;
use std::sync::Arc;

use axum::body::Body;
use axum::http::uri::{InvalidUriParts, PathAndQuery, Scheme};
use axum::http::{header, HeaderValue, Request, Response, Uri, Version};

use crate::buffer::BufferPool;
use crate::http::body::PooledBody;
use crate::http::transport::Transport;
use crate::load_balancer::{Backend, RoundRobin};

/// Prefix of every body produced by a failed backend call.
pub const ERROR_BODY_PREFIX: &str = "proxy error: ";

/// Forwards requests to backends in round-robin order.
pub struct Forwarder {
    rotation: RoundRobin,
    transport: Arc<dyn Transport>,
    pool: Arc<BufferPool>,
}

impl Forwarder {
    pub fn new(rotation: RoundRobin, transport: Arc<dyn Transport>, pool: Arc<BufferPool>) -> Self {
        Self {
            rotation,
            transport,
            pool,
        }
    }

    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    /// Forward one request and produce the response for the client.
    pub async fn forward(&self, request: Request<Body>) -> Response<Body> {
        let backend = self.rotation.next();

        tracing::debug!(
            backend = %backend,
            method = %request.method(),
            uri = %request.uri(),
            "Forwarding request"
        );

        let request = match rewrite_target(request, backend) {
            Ok(request) => request,
            Err(e) => return self.failure(backend, &e),
        };

        match self.transport.round_trip(request).await {
            Ok(response) => {
                tracing::debug!(backend = %backend, status = %response.status(), "Backend responded");
                let pool = &self.pool;
                response.map(|body| Body::new(PooledBody::new(body, pool.acquire())))
            }
            Err(e) => self.failure(backend, &*e),
        }
    }

    fn failure(&self, backend: &Backend, error: &(dyn StdError + 'static)) -> Response<Body> {
        let text = error_chain(error);
        tracing::warn!(backend = %backend, error = %text, "Backend request failed");
        error_response(&text)
    }
}

/// Point the request at `backend`.
///
/// Only the scheme and authority of the target change. Method, path, query,
/// headers (`Host` included) and body are left alone. The outbound hop is
/// always HTTP/1.1, so the version is normalized for HTTP/2 clients.
pub fn rewrite_target(
    request: Request<Body>,
    backend: &Backend,
) -> Result<Request<Body>, InvalidUriParts> {
    let (mut parts, body) = request.into_parts();

    let mut uri = parts.uri.into_parts();
    uri.scheme = Some(Scheme::HTTP);
    uri.authority = Some(backend.authority().clone());
    if uri.path_and_query.is_none() {
        uri.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = Uri::from_parts(uri)?;
    parts.version = Version::HTTP_11;

    Ok(Request::from_parts(parts, body))
}

/// Render an error and all of its sources on one line.
pub fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

fn error_response(text: &str) -> Response<Body> {
    let mut response = Response::new(Body::from(format!("{ERROR_BODY_PREFIX}{text}")));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
