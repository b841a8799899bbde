//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every profile compiles into a dispatch table
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check the selected profile exists
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;

use crate::config::schema::{CorsConfig, GatewayConfig};
use crate::routing::{DispatchTable, RuleError};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("listener.max_connections must be greater than zero")]
    ZeroConnections,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),

    #[error("proxy.profile {0:?} is not defined")]
    UnknownProfile(String),

    #[error("profile {profile:?}: {source}")]
    Rule {
        profile: String,
        #[source]
        source: RuleError,
    },

    #[error("proxy.static_dir {0:?} is not a directory")]
    StaticDir(String),

    #[error("proxy.cors.allow_origin {0:?} is neither \"*\" nor a valid header value")]
    CorsOrigin(String),
}

/// Allowed CORS origin: `None` for any origin, otherwise the exact value.
pub fn cors_origin(cors: &CorsConfig) -> Result<Option<HeaderValue>, ValidationError> {
    if cors.allow_origin == "*" {
        return Ok(None);
    }
    HeaderValue::from_str(&cors.allow_origin)
        .map(Some)
        .map_err(|_| ValidationError::CorsOrigin(cors.allow_origin.clone()))
}

/// Check `config` and collect every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("connect_secs", timeouts.connect_secs),
        ("upstream_secs", timeouts.upstream_secs),
        ("request_secs", timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    let proxy = &config.proxy;
    if !proxy.profiles.contains_key(&proxy.profile) {
        errors.push(ValidationError::UnknownProfile(proxy.profile.clone()));
    }
    for (profile, rules) in &proxy.profiles {
        if let Err(source) = DispatchTable::from_config(rules, proxy.allow_shadowing) {
            errors.push(ValidationError::Rule {
                profile: profile.clone(),
                source,
            });
        }
    }

    if proxy.cors.enabled {
        if let Err(e) = cors_origin(&proxy.cors) {
            errors.push(e);
        }
    }

    if let Some(dir) = &proxy.static_dir {
        if !dir.is_dir() {
            errors.push(ValidationError::StaticDir(dir.display().to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
