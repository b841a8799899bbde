//! Upstream forwarding.
//!
//! # Responsibilities
//! - Send one dispatched request to its origin
//! - Stream the request body up and the response body back
//! - Enforce connect and response-header timeouts
//! - Classify failures: unreachable vs timed out
//!
//! # Design Decisions
//! - Single attempt; retries belong to outer middleware
//! - The in-flight future owns the upstream connection, so dropping it
//!   (client gone, outer timeout) releases the connection
//! - Response status, headers and body are returned verbatim

use std::error::Error as _;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;
use crate::observability::metrics;
use crate::routing::{MatchedRule, ProxyError};

/// Pooled HTTP/1.1 client used for all upstreams.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    upstream_timeout: Duration,
}

impl Forwarder {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self {
            client,
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
        }
    }

    /// Send a request produced by `DispatchTable::dispatch`.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let origin = request
            .extensions()
            .get::<MatchedRule>()
            .map(|m| m.origin.clone())
            .or_else(|| request.uri().authority().map(|a| a.to_string()))
            .unwrap_or_default();

        match tokio::time::timeout(self.upstream_timeout, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(into_body(response)),
            Ok(Err(e)) => {
                let reason = match e.source() {
                    Some(source) => format!("{}: {}", e, source),
                    None => e.to_string(),
                };
                metrics::record_upstream_failure(&origin, "unavailable");
                Err(ProxyError::UpstreamUnavailable { origin, reason })
            }
            Err(_) => {
                metrics::record_upstream_failure(&origin, "timeout");
                Err(ProxyError::UpstreamTimeout {
                    origin,
                    after: self.upstream_timeout,
                })
            }
        }
    }
}

/// Stream the upstream body through unchanged.
fn into_body(response: Response<Incoming>) -> Response<Body> {
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(body))
}
