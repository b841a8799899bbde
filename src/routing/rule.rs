//! Dispatch rules: prefix, backend origin, path rewrite.
//!
//! # Design Decisions
//! - Prefix matching is literal `starts_with`, case-sensitive
//! - Rewrites are a closed set of pure transforms so tables stay data
//! - Origins carry scheme and authority only; no base path
//! - Plain `http` upstreams only, matching the connector used to forward

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::routing::error::RuleError;

/// How a matched path is transformed before forwarding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rewrite {
    /// Forward the path unchanged.
    #[default]
    Keep,
    /// Remove the matched prefix.
    Strip,
    /// Replace the matched prefix with the given text.
    Replace(String),
}

impl Rewrite {
    /// Apply to `path`, which must start with `prefix`.
    pub fn apply(&self, prefix: &str, path: &str) -> String {
        let rest = path.strip_prefix(prefix).unwrap_or(path);
        match self {
            Rewrite::Keep => path.to_string(),
            Rewrite::Strip => rest.to_string(),
            Rewrite::Replace(with) => format!("{}{}", with, rest),
        }
    }
}

/// Scheme + host + port of a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    url: Url,
    authority: String,
}

impl Origin {
    pub fn parse(target: &str) -> Result<Self, RuleError> {
        let invalid = |reason: &str| RuleError::InvalidOrigin {
            target: target.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(target).map_err(|e| invalid(&e.to_string()))?;
        if url.scheme() != "http" {
            return Err(invalid("scheme must be http"));
        }
        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
        if !url.username().is_empty() || url.password().is_some() {
            return Err(invalid("credentials are not allowed"));
        }
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("origin must not carry a path, query or fragment"));
        }

        // `Url` drops a port equal to the scheme default.
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Ok(Self { url, authority })
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// `host[:port]`, also used as the forwarded `Host` header.
    pub fn authority(&self) -> &str {
        &self.authority
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme(), self.authority)
    }
}

/// Rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleConfig {
    /// Literal path prefix, e.g. "/Domains".
    pub prefix: String,

    /// Backend origin, e.g. "http://localhost:9003".
    pub target: String,

    #[serde(default)]
    pub rewrite: Rewrite,
}

impl RuleConfig {
    pub fn new(prefix: &str, target: &str, rewrite: Rewrite) -> Self {
        Self {
            prefix: prefix.to_string(),
            target: target.to_string(),
            rewrite,
        }
    }
}

/// A validated dispatch rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRule {
    prefix: String,
    target: Origin,
    rewrite: Rewrite,
}

impl DispatchRule {
    pub fn new(prefix: &str, target: &str, rewrite: Rewrite) -> Result<Self, RuleError> {
        if !prefix.starts_with('/') {
            return Err(RuleError::InvalidPrefix(prefix.to_string()));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            target: Origin::parse(target)?,
            rewrite,
        })
    }

    pub fn from_config(config: &RuleConfig) -> Result<Self, RuleError> {
        Self::new(&config.prefix, &config.target, config.rewrite.clone())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn target(&self) -> &Origin {
        &self.target
    }

    pub fn rewrite(&self) -> &Rewrite {
        &self.rewrite
    }

    /// Literal prefix test.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Rewritten path for a path this rule matched.
    pub fn rewrite_path(&self, path: &str) -> String {
        self.rewrite.apply(&self.prefix, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_round_trips_any_suffix() {
        let rule = DispatchRule::new("/Messages", "http://host:9011", Rewrite::Strip).unwrap();
        for suffix in ["", "/", "/publish", "/a/b?c=d", "x"] {
            let path = format!("/Messages{}", suffix);
            assert_eq!(rule.rewrite_path(&path), suffix);
        }
    }

    #[test]
    fn replace_renames_prefix() {
        let rule = DispatchRule::new(
            "/Domains",
            "http://localhost:9003",
            Rewrite::Replace("/domains".into()),
        )
        .unwrap();
        assert_eq!(rule.rewrite_path("/Domains/abc"), "/domains/abc");
        assert_eq!(rule.rewrite_path("/Domains"), "/domains");
    }

    #[test]
    fn keep_leaves_path_alone() {
        assert_eq!(Rewrite::Keep.apply("/api", "/api/v1"), "/api/v1");
    }

    #[test]
    fn prefix_is_literal_and_case_sensitive() {
        let rule = DispatchRule::new("/Users", "http://localhost:80", Rewrite::Keep).unwrap();
        assert!(rule.matches("/Users/1"));
        assert!(rule.matches("/Users"));
        assert!(!rule.matches("/User/1"));
        assert!(!rule.matches("/Userx/1"));
        assert!(!rule.matches("/users/1"));
    }

    #[test]
    fn origin_authority_keeps_explicit_port() {
        let origin = Origin::parse("http://host:9011").unwrap();
        assert_eq!(origin.authority(), "host:9011");
        assert_eq!(origin.scheme(), "http");
        assert_eq!(origin.to_string(), "http://host:9011");

        let default_port = Origin::parse("http://localhost:80").unwrap();
        assert_eq!(default_port.authority(), "localhost");

        let trailing = Origin::parse("http://api.example.com/").unwrap();
        assert_eq!(trailing.authority(), "api.example.com");
    }

    #[test]
    fn origin_rejects_paths_and_other_schemes() {
        assert!(Origin::parse("http://host:1/base").is_err());
        assert!(Origin::parse("ftp://host").is_err());
        assert!(Origin::parse("https://host:443").is_err());
        assert!(Origin::parse("not a url").is_err());
        assert!(Origin::parse("http://u:p@host").is_err());
    }

    #[test]
    fn prefix_must_be_absolute() {
        assert_eq!(
            DispatchRule::new("Users", "http://h:1", Rewrite::Keep).unwrap_err(),
            RuleError::InvalidPrefix("Users".into())
        );
        assert!(DispatchRule::new("", "http://h:1", Rewrite::Keep).is_err());
    }

    #[test]
    fn rewrite_deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            rules: Vec<RuleConfig>,
        }
        let raw = r#"
            [[rules]]
            prefix = "/Domains"
            target = "http://localhost:9003"
            rewrite = { replace = "/domains" }

            [[rules]]
            prefix = "/Channels"
            target = "http://localhost:9005"
            rewrite = "strip"

            [[rules]]
            prefix = "/static"
            target = "http://localhost:8000"
        "#;
        let w: Wrapper = toml::from_str(raw).unwrap();
        assert_eq!(w.rules[0].rewrite, Rewrite::Replace("/domains".into()));
        assert_eq!(w.rules[1].rewrite, Rewrite::Strip);
        assert_eq!(w.rules[2].rewrite, Rewrite::Keep);
    }
}
