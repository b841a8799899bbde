//! Mapping dispatch failures to HTTP responses.
//!
//! # Design Decisions
//! - No matching rule → 404 Not Found
//! - Upstream refused or unreachable → 502 Bad Gateway
//! - Upstream too slow → 504 Gateway Timeout
//! - Unbuildable forwarded request → 400 Bad Request

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::routing::ProxyError;

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::NoMatch { .. } => StatusCode::NOT_FOUND,
            ProxyError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match &self {
            ProxyError::NoMatch { .. } => "No matching route found".to_string(),
            ProxyError::UpstreamUnavailable { .. } => "Upstream request failed".to_string(),
            ProxyError::UpstreamTimeout { .. } => "Upstream request timed out".to_string(),
            ProxyError::InvalidRequest(reason) => format!("Invalid request: {}", reason),
        };
        (self.status_code(), body).into_response()
    }
}
