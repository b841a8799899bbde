//! Dispatch table: first-match prefix lookup and request rewriting.
//!
//! # Responsibilities
//! - Hold the ordered rule list for one profile
//! - Reject (or warn about) rules shadowed by an earlier prefix
//! - Find the first rule whose prefix literally prefixes the path
//! - Produce the forwarded request: rewritten path, origin authority, Host
//!
//! # Design Decisions
//! - Declaration order is the priority; no longest-prefix heuristic
//! - Immutable after construction (thread-safe without locks)
//! - Pure: no I/O happens here, see `http::forward`

use axum::http::header::{HeaderValue, HOST};
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Uri};

use crate::routing::error::{ProxyError, RuleError};
use crate::routing::rule::{DispatchRule, Origin, RuleConfig};

/// Which rule handled a forwarded request; attached as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRule {
    pub prefix: String,
    pub origin: String,
}

/// Pure lookup result for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub rule: &'a DispatchRule,
    /// Rewritten path, always absolute.
    pub path: String,
}

impl RouteMatch<'_> {
    /// Absolute upstream URI for this match, carrying `query` if any.
    pub fn upstream_uri(&self, query: Option<&str>) -> Result<Uri, ProxyError> {
        build_uri(self.rule.target(), &self.path, query)
    }

    /// Apply this match to the request it was looked up for.
    ///
    /// Method, headers, version and body are kept; the URI gets the origin's
    /// scheme and authority plus the rewritten path, and `Host` is set to the
    /// origin authority.
    pub fn rewrite_request<B>(&self, request: Request<B>) -> Result<Request<B>, ProxyError> {
        let uri = self.upstream_uri(request.uri().query())?;
        let origin = self.rule.target();
        let host = HeaderValue::from_str(origin.authority())
            .map_err(|e| ProxyError::InvalidRequest(e.to_string()))?;
        let matched = MatchedRule {
            prefix: self.rule.prefix().to_string(),
            origin: origin.to_string(),
        };

        let (mut parts, body) = request.into_parts();
        parts.uri = uri;
        parts.headers.insert(HOST, host);
        parts.extensions.insert(matched);
        Ok(Request::from_parts(parts, body))
    }
}

/// Ordered, immutable set of dispatch rules.
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    rules: Vec<DispatchRule>,
}

impl DispatchTable {
    /// Build a table, rejecting shadowed rules.
    pub fn new(rules: Vec<DispatchRule>) -> Result<Self, RuleError> {
        Self::with_shadowing(rules, false)
    }

    /// Build a table; when `allow_shadowing` is set, shadowed rules are kept
    /// and logged instead of rejected.
    pub fn with_shadowing(rules: Vec<DispatchRule>, allow_shadowing: bool) -> Result<Self, RuleError> {
        for (later, rule) in rules.iter().enumerate() {
            let Some(earlier) = rules[..later].iter().find(|r| rule.prefix().starts_with(r.prefix()))
            else {
                continue;
            };
            if !allow_shadowing {
                return Err(RuleError::Shadowed {
                    prefix: rule.prefix().to_string(),
                    shadowed_by: earlier.prefix().to_string(),
                });
            }
            tracing::warn!(
                prefix = %rule.prefix(),
                shadowed_by = %earlier.prefix(),
                "Dispatch rule is unreachable"
            );
        }
        Ok(Self { rules })
    }

    /// Compile configured rules.
    pub fn from_config(rules: &[RuleConfig], allow_shadowing: bool) -> Result<Self, RuleError> {
        let compiled = rules
            .iter()
            .map(DispatchRule::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Self::with_shadowing(compiled, allow_shadowing)
    }

    pub fn rules(&self) -> &[DispatchRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule, in declaration order, whose prefix matches `path`.
    pub fn find(&self, path: &str) -> Option<&DispatchRule> {
        self.rules.iter().find(|r| r.matches(path))
    }

    /// Look up and rewrite `path` without touching any request.
    pub fn lookup(&self, path: &str) -> Result<RouteMatch<'_>, ProxyError> {
        let rule = self.find(path).ok_or_else(|| ProxyError::NoMatch {
            path: path.to_string(),
        })?;
        Ok(RouteMatch {
            rule,
            path: absolute(rule.rewrite_path(path)),
        })
    }

    /// Turn an inbound request into the request to send upstream.
    pub fn dispatch<B>(&self, request: Request<B>) -> Result<Request<B>, ProxyError> {
        self.lookup(request.uri().path())?.rewrite_request(request)
    }
}

fn absolute(path: String) -> String {
    if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    }
}

fn build_uri(origin: &Origin, path: &str, query: Option<&str>) -> Result<Uri, ProxyError> {
    let path_and_query = match query {
        Some(q) => format!("{}?{}", path, q),
        None => path.to_string(),
    };
    let authority = Authority::try_from(origin.authority())
        .map_err(|e| ProxyError::InvalidRequest(e.to_string()))?;
    let path_and_query = PathAndQuery::try_from(path_and_query)
        .map_err(|e| ProxyError::InvalidRequest(e.to_string()))?;

    Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| ProxyError::InvalidRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::rule::Rewrite;
    use axum::body::Body;
    use axum::http::Method;

    fn rule(prefix: &str, target: &str, rewrite: Rewrite) -> DispatchRule {
        DispatchRule::new(prefix, target, rewrite).unwrap()
    }

    #[test]
    fn first_declared_rule_wins() {
        let table = DispatchTable::new(vec![
            rule("/Users", "http://a:1", Rewrite::Keep),
            rule("/User", "http://b:2", Rewrite::Keep),
        ])
        .unwrap();
        assert_eq!(table.find("/Users/1").unwrap().prefix(), "/Users");
        assert_eq!(table.find("/User/1").unwrap().prefix(), "/User");
    }

    #[test]
    fn no_match_is_reported() {
        let table = DispatchTable::new(vec![rule("/Users", "http://a:1", Rewrite::Keep)]).unwrap();
        assert!(matches!(
            table.lookup("/Userx/1"),
            Err(ProxyError::NoMatch { path }) if path == "/Userx/1"
        ));
    }

    #[test]
    fn shadowed_rule_is_rejected() {
        let err = DispatchTable::new(vec![
            rule("/User", "http://a:1", Rewrite::Keep),
            rule("/Users", "http://b:2", Rewrite::Keep),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            RuleError::Shadowed {
                prefix: "/Users".into(),
                shadowed_by: "/User".into()
            }
        );
    }

    #[test]
    fn shadowing_can_be_accepted() {
        let table = DispatchTable::with_shadowing(
            vec![
                rule("/User", "http://a:1", Rewrite::Keep),
                rule("/Users", "http://b:2", Rewrite::Keep),
            ],
            true,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.find("/Users/1").unwrap().prefix(), "/User");
    }

    #[test]
    fn duplicate_prefix_counts_as_shadowed() {
        assert!(DispatchTable::new(vec![
            rule("/A", "http://a:1", Rewrite::Keep),
            rule("/A", "http://b:2", Rewrite::Keep),
        ])
        .is_err());
    }

    #[test]
    fn lookup_makes_empty_rewrite_absolute() {
        let table = DispatchTable::new(vec![rule("/Messages", "http://host:9011", Rewrite::Strip)]).unwrap();
        assert_eq!(table.lookup("/Messages").unwrap().path, "/");
        assert_eq!(table.lookup("/Messagesx").unwrap().path, "/x");
    }

    #[test]
    fn dispatch_rewrites_uri_and_host() {
        let table = DispatchTable::new(vec![rule("/Messages", "http://host:9011", Rewrite::Strip)]).unwrap();
        let request = Request::builder()
            .method(Method::POST)
            .uri("http://localhost:5173/Messages/publish?qos=1")
            .header(HOST, "localhost:5173")
            .header("authorization", "Bearer t")
            .body(Body::from("payload"))
            .unwrap();

        let forwarded = table.dispatch(request).unwrap();
        assert_eq!(forwarded.method(), &Method::POST);
        assert_eq!(forwarded.uri().to_string(), "http://host:9011/publish?qos=1");
        assert_eq!(forwarded.headers()[HOST], "host:9011");
        assert_eq!(forwarded.headers()["authorization"], "Bearer t");
        assert_eq!(
            forwarded.extensions().get::<MatchedRule>(),
            Some(&MatchedRule {
                prefix: "/Messages".into(),
                origin: "http://host:9011".into()
            })
        );
    }

    #[test]
    fn dispatch_accepts_origin_form_uri() {
        let table = DispatchTable::new(vec![rule(
            "/Domains",
            "http://localhost:9003",
            Rewrite::Replace("/domains".into()),
        )])
        .unwrap();
        let request = Request::builder().uri("/Domains?limit=10").body(()).unwrap();
        let forwarded = table.dispatch(request).unwrap();
        assert_eq!(forwarded.uri().to_string(), "http://localhost:9003/domains?limit=10");
        assert_eq!(forwarded.headers()[HOST], "localhost:9003");
    }

    #[test]
    fn looked_up_route_rewrites_its_request() {
        let table = DispatchTable::new(vec![
            rule("/Users", "http://localhost:9002", Rewrite::Keep),
            rule("/Things", "http://localhost:9000", Rewrite::Strip),
        ])
        .unwrap();
        let route = table.lookup("/Things/9").unwrap();
        assert_eq!(route.rule.prefix(), "/Things");

        let request = Request::builder().uri("/Things/9?x=1").body(()).unwrap();
        let forwarded = route.rewrite_request(request).unwrap();
        assert_eq!(forwarded.uri().to_string(), "http://localhost:9000/9?x=1");
        assert_eq!(forwarded.headers()[HOST], "localhost:9000");
        assert_eq!(forwarded.extensions().get::<MatchedRule>().map(|m| m.prefix.as_str()), Some("/Things"));
    }
}
