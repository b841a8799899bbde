//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::routing::{Rewrite, RuleConfig};

/// Profile used when neither the config nor the caller names one.
pub const DEFAULT_PROFILE: &str = "default";

/// Root configuration for the console gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Dispatch profiles and the active selection.
    pub proxy: DispatchConfig,

    /// In-app navigation settings.
    pub navigation: NavigationConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:5173").
    pub bind_address: String,

    /// Maximum concurrent in-flight requests (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5173".to_string(),
            max_connections: 1_024,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to produce response headers, in seconds.
    pub upstream_secs: u64,

    /// Total request timeout enforced on the inbound side, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            request_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9464".to_string(),
        }
    }
}

/// Dispatch configuration: named rule profiles and which one is active.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Name of the active profile; overridable from the command line.
    pub profile: String,

    /// Environment variants, each an ordered rule list.
    pub profiles: BTreeMap<String, Vec<RuleConfig>>,

    /// Keep rules shadowed by an earlier prefix (logged) instead of failing.
    pub allow_shadowing: bool,

    /// Directory served for requests no rule matches (built browser client).
    pub static_dir: Option<PathBuf>,

    /// Cross-origin settings.
    pub cors: CorsConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            profiles: builtin_profiles(),
            allow_shadowing: false,
            static_dir: None,
            cors: CorsConfig::default(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Answer preflight requests and decorate responses.
    pub enabled: bool,

    /// Allowed origin, or "*" for any.
    pub allow_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_origin: "*".to_string(),
        }
    }
}

/// Navigation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Redirect hops followed before giving up.
    pub max_redirects: usize,

    /// View shown when a path does not resolve.
    pub fallback_view: Option<String>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            max_redirects: 1,
            fallback_view: None,
        }
    }
}

/// The two environment variants shipped with the console.
///
/// `default` covers domains, channels, users and messages; `full` adds the
/// clients service and the image upload server.
pub fn builtin_profiles() -> BTreeMap<String, Vec<RuleConfig>> {
    let base = vec![
        RuleConfig::new(
            "/Domains",
            "http://localhost:9003",
            Rewrite::Replace("/domains".to_string()),
        ),
        RuleConfig::new("/Channels", "http://localhost:9005", Rewrite::Strip),
        RuleConfig::new(
            "/Users",
            "http://localhost:80",
            Rewrite::Replace("/users".to_string()),
        ),
        RuleConfig::new("/Messages", "http://localhost:9011", Rewrite::Strip),
    ];

    let mut full = base.clone();
    full.push(RuleConfig::new("/Clients", "http://localhost:9006", Rewrite::Strip));
    full.push(RuleConfig::new("/image-upload", "http://localhost:18080", Rewrite::Strip));

    BTreeMap::from([
        (DEFAULT_PROFILE.to_string(), base),
        ("full".to_string(), full),
    ])
}
