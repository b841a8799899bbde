//! Dispatch error types.

use std::time::Duration;

/// Rejected dispatch rule or table, raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("prefix {0:?} must be non-empty and start with '/'")]
    InvalidPrefix(String),

    #[error("target {target:?} is not a valid origin: {reason}")]
    InvalidOrigin { target: String, reason: String },

    #[error("rule {prefix:?} can never match: shadowed by earlier rule {shadowed_by:?}")]
    Shadowed { prefix: String, shadowed_by: String },
}

/// Failures while dispatching or forwarding one request.
///
/// `NoMatch` is a routing miss; the upstream variants mean a rule matched but
/// the backend could not be reached.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("no dispatch rule matches {path:?}")]
    NoMatch { path: String },

    #[error("upstream {origin} unavailable: {reason}")]
    UpstreamUnavailable { origin: String, reason: String },

    #[error("upstream {origin} did not respond within {after:?}")]
    UpstreamTimeout { origin: String, after: Duration },

    #[error("cannot build forwarded request: {0}")]
    InvalidRequest(String),
}

impl ProxyError {
    /// True for failures that happened after a rule matched.
    pub fn is_forwarding_failure(&self) -> bool {
        matches!(
            self,
            ProxyError::UpstreamUnavailable { .. } | ProxyError::UpstreamTimeout { .. }
        )
    }
}
