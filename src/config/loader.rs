//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::routing::{DispatchTable, RuleError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("unknown profile {name:?} (available: {})", .available.join(", "))]
    UnknownProfile { name: String, available: Vec<String> },

    #[error("profile {profile:?}: {source}")]
    Rule {
        profile: String,
        #[source]
        source: RuleError,
    },
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load `path` when given, otherwise fall back to the built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(GatewayConfig::default()),
    }
}

/// Compile the dispatch table of the selected profile.
///
/// `selected` overrides `proxy.profile`; no profile is ever chosen
/// implicitly when the requested one is missing.
pub fn dispatch_table(
    config: &GatewayConfig,
    selected: Option<&str>,
) -> Result<(String, DispatchTable), ConfigError> {
    let name = selected.unwrap_or(&config.proxy.profile);
    let rules = config
        .proxy
        .profiles
        .get(name)
        .ok_or_else(|| ConfigError::UnknownProfile {
            name: name.to_string(),
            available: config.proxy.profiles.keys().cloned().collect(),
        })?;

    let table = DispatchTable::from_config(rules, config.proxy.allow_shadowing).map_err(|source| {
        ConfigError::Rule {
            profile: name.to_string(),
            source,
        }
    })?;
    Ok((name.to_string(), table))
}
