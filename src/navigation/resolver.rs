//! Path resolution against a route tree.
//!
//! # Responsibilities
//! - Split a navigation path into segments (query and fragment ignored)
//! - Walk the tree depth-first, first matching child wins
//! - Collect the view stack and bound parameters (percent-decoded)
//! - Check root-level redirects before walking
//! - Follow redirects with cycle detection (`Navigator`)
//!
//! # Design Decisions
//! - `resolve` is a pure function of `(path, redirects, tree)`
//! - No backtracking once a child is chosen
//! - A failed walk still reports the partial stack and params; fallback
//!   policy belongs to the caller

use std::collections::BTreeMap;
use std::sync::Arc;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::navigation::tree::{RouteNode, RouteTree, Segment, ViewId};

/// Outcome of resolving one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRoute {
    /// Matched views, outermost first.
    pub view_stack: Vec<ViewId>,
    /// Parameter name → raw segment value.
    pub params: BTreeMap<String, String>,
    /// True when the whole path was consumed and ended on a view.
    pub matched: bool,
    /// Set when a redirect rule fired instead of a tree walk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ResolvedRoute {
    fn redirect_to(target: &str) -> Self {
        Self {
            view_stack: Vec::new(),
            params: BTreeMap::new(),
            matched: false,
            redirect: Some(target.to_string()),
        }
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect.is_some()
    }

    /// Convenience accessor for a bound parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The innermost view, the one the presentation layer shows in full.
    pub fn leaf(&self) -> Option<&ViewId> {
        self.view_stack.last()
    }

    /// Turn an unmatched result into `RouteNotFound`.
    pub fn require_match(self, path: &str) -> Result<Self, NavigationError> {
        if self.matched {
            Ok(self)
        } else {
            Err(NavigationError::RouteNotFound { path: path.to_string() })
        }
    }

    /// Replace an unmatched result with a single fallback view.
    pub fn or_fallback(self, view: &ViewId) -> Self {
        if self.matched {
            return self;
        }
        Self {
            view_stack: vec![view.clone()],
            params: BTreeMap::new(),
            matched: true,
            redirect: None,
        }
    }
}

/// Navigation failures surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("no route matches {path:?}")]
    RouteNotFound { path: String },

    #[error("redirect cycle: {}", chain.join(" -> "))]
    RedirectCycle { chain: Vec<String> },

    #[error("{path:?} needs more than {limit} redirect(s)")]
    TooManyRedirects { path: String, limit: usize },
}

/// An unconditional, parameterless redirect checked before the tree walk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Redirect {
    pub from: String,
    pub to: String,
}

impl Redirect {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}

/// Strip query and fragment, then split into non-empty segments.
pub fn segments(path: &str) -> Vec<&str> {
    let end = path.find(|c: char| c == '?' || c == '#').unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty()).collect()
}

/// Canonical form used to compare paths: `/a/b`, or `/` for the root.
pub fn normalize(path: &str) -> String {
    let segs = segments(path);
    if segs.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segs.join("/"))
    }
}

/// Resolve `path` against `tree`, checking `redirects` first.
pub fn resolve(path: &str, redirects: &[Redirect], tree: &RouteTree) -> ResolvedRoute {
    let normalized = normalize(path);
    if let Some(rule) = redirects.iter().find(|r| normalize(&r.from) == normalized) {
        return ResolvedRoute::redirect_to(&rule.to);
    }

    let mut stack = Vec::new();
    let mut params = BTreeMap::new();
    let root = tree.root();
    push_view(root, &mut stack);
    let matched = walk(root, &segments(path), &mut stack, &mut params);

    ResolvedRoute {
        view_stack: stack,
        params,
        matched,
        redirect: None,
    }
}

fn walk(
    mut node: &RouteNode,
    segs: &[&str],
    stack: &mut Vec<ViewId>,
    params: &mut BTreeMap<String, String>,
) -> bool {
    for seg in segs {
        let Some(child) = node.match_child(seg) else {
            return false;
        };
        if let Segment::Param(name) = &child.segment {
            params.insert(name.clone(), decode_param(seg));
        }
        push_view(child, stack);
        node = child;
    }

    match node.index_child() {
        Some(index) => {
            push_view(index, stack);
            index.view.is_some() || node.view.is_some()
        }
        None => node.view.is_some(),
    }
}

/// Percent-decode a bound segment. Bytes that do not decode to UTF-8 leave
/// the segment as written.
fn decode_param(seg: &str) -> String {
    match percent_decode_str(seg).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => seg.to_string(),
    }
}

fn push_view(node: &RouteNode, stack: &mut Vec<ViewId>) {
    if let Some(view) = &node.view {
        stack.push(view.clone());
    }
}

/// A route tree bundled with its redirect table.
///
/// Construct once at startup and share; every method takes `&self`.
#[derive(Debug, Clone)]
pub struct Navigator {
    tree: Arc<RouteTree>,
    redirects: Arc<[Redirect]>,
    max_redirects: usize,
}

impl Navigator {
    pub fn new(tree: RouteTree, redirects: Vec<Redirect>) -> Self {
        Self {
            tree: Arc::new(tree),
            redirects: redirects.into(),
            max_redirects: 1,
        }
    }

    /// Number of redirect hops `navigate` follows before giving up.
    pub fn with_max_redirects(mut self, limit: usize) -> Self {
        self.max_redirects = limit;
        self
    }

    pub fn tree(&self) -> &RouteTree {
        &self.tree
    }

    pub fn redirects(&self) -> &[Redirect] {
        &self.redirects
    }

    /// Single resolution step; a redirect is reported, not followed.
    pub fn resolve(&self, path: &str) -> ResolvedRoute {
        resolve(path, &self.redirects, &self.tree)
    }

    /// Resolve, following redirects.
    ///
    /// A redirect back to any path already visited is a `RedirectCycle`,
    /// even when the hop limit has not been reached.
    pub fn navigate(&self, path: &str) -> Result<ResolvedRoute, NavigationError> {
        let mut visited = vec![normalize(path)];
        let mut current = path.to_string();

        loop {
            let resolved = self.resolve(&current);
            let Some(target) = resolved.redirect.as_deref() else {
                return Ok(resolved);
            };

            let next = normalize(target);
            if visited.contains(&next) {
                visited.push(next);
                tracing::warn!(chain = ?visited, "Redirect cycle detected");
                return Err(NavigationError::RedirectCycle { chain: visited });
            }
            if visited.len() > self.max_redirects {
                return Err(NavigationError::TooManyRedirects {
                    path: path.to_string(),
                    limit: self.max_redirects,
                });
            }

            tracing::debug!(from = %current, to = %target, "Following redirect");
            visited.push(next);
            current = target.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(seg: &str) -> RouteNode {
        RouteNode::new(seg).unwrap()
    }

    fn sample() -> RouteTree {
        RouteTree::new(
            node("")
                .child(node("about").view("About"))
                .child(
                    node("users").child(node("").view("UserList")).child(
                        node(":userId")
                            .view("UserLayout")
                            .child(node("").view("UserHome"))
                            .child(node("posts").view("UserPosts")),
                    ),
                )
                .child(node(":slug").view("Page")),
        )
        .unwrap()
    }

    #[test]
    fn splits_and_normalizes() {
        assert_eq!(segments("//a/b/?x=1#top"), vec!["a", "b"]);
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/a//b/"), "/a/b");
    }

    #[test]
    fn literal_leaf() {
        let r = resolve("/about", &[], &sample());
        assert!(r.matched);
        assert_eq!(r.view_stack, vec![ViewId::from("About")]);
        assert!(r.params.is_empty());
    }

    #[test]
    fn grouping_segment_uses_index_child() {
        let r = resolve("/users", &[], &sample());
        assert!(r.matched);
        assert_eq!(r.view_stack, vec![ViewId::from("UserList")]);
    }

    #[test]
    fn nested_param_with_index() {
        let r = resolve("/users/9", &[], &sample());
        assert!(r.matched);
        assert_eq!(r.view_stack, vec![ViewId::from("UserLayout"), ViewId::from("UserHome")]);
        assert_eq!(r.param("userId"), Some("9"));
    }

    #[test]
    fn literal_declared_first_wins_over_param() {
        let r = resolve("/about", &[], &sample());
        assert_eq!(r.leaf(), Some(&ViewId::from("About")));

        let r = resolve("/contact", &[], &sample());
        assert_eq!(r.leaf(), Some(&ViewId::from("Page")));
        assert_eq!(r.param("slug"), Some("contact"));
    }

    #[test]
    fn unmatched_keeps_partial_stack_and_params() {
        let r = resolve("/users/9/missing", &[], &sample());
        assert!(!r.matched);
        assert_eq!(r.view_stack, vec![ViewId::from("UserLayout")]);
        assert_eq!(r.param("userId"), Some("9"));
    }

    #[test]
    fn no_backtracking_after_choosing_a_child() {
        // "about" matches the literal leaf, which has no children; the
        // later ":slug" sibling is never tried.
        let r = resolve("/about/more", &[], &sample());
        assert!(!r.matched);
        assert_eq!(r.view_stack, vec![ViewId::from("About")]);
        assert!(r.params.is_empty());
    }

    #[test]
    fn root_without_index_does_not_match() {
        let r = resolve("/", &[], &sample());
        assert!(!r.matched);
        assert!(r.view_stack.is_empty());
    }

    #[test]
    fn redirect_checked_before_walk() {
        let redirects = vec![Redirect::new("/about", "/users")];
        let r = resolve("/about/", &redirects, &sample());
        assert_eq!(r.redirect.as_deref(), Some("/users"));
        assert!(r.view_stack.is_empty());
        assert!(!r.matched);
    }

    #[test]
    fn navigate_follows_one_redirect() {
        let nav = Navigator::new(sample(), vec![Redirect::new("/", "/about")]);
        let r = nav.navigate("/").unwrap();
        assert!(r.matched);
        assert_eq!(r.leaf(), Some(&ViewId::from("About")));
    }

    #[test]
    fn navigate_detects_cycle() {
        let nav = Navigator::new(
            sample(),
            vec![Redirect::new("/", "/about"), Redirect::new("/about", "/")],
        );
        assert_eq!(
            nav.navigate("/").unwrap_err(),
            NavigationError::RedirectCycle {
                chain: vec!["/".into(), "/about".into(), "/".into()]
            }
        );
    }

    #[test]
    fn navigate_detects_self_redirect() {
        let nav = Navigator::new(sample(), vec![Redirect::new("/about", "/about/")]);
        assert!(matches!(
            nav.navigate("/about"),
            Err(NavigationError::RedirectCycle { .. })
        ));
    }

    #[test]
    fn navigate_enforces_hop_limit() {
        let redirects = vec![Redirect::new("/a", "/b"), Redirect::new("/b", "/about")];
        let nav = Navigator::new(sample(), redirects.clone());
        assert_eq!(
            nav.navigate("/a").unwrap_err(),
            NavigationError::TooManyRedirects { path: "/a".into(), limit: 1 }
        );

        let nav = Navigator::new(sample(), redirects).with_max_redirects(2);
        assert!(nav.navigate("/a").unwrap().matched);
    }

    #[test]
    fn require_match_and_fallback() {
        let r = resolve("/nope/deeper", &[], &sample());
        assert_eq!(
            r.clone().require_match("/nope/deeper").unwrap_err(),
            NavigationError::RouteNotFound { path: "/nope/deeper".into() }
        );
        let fallback = r.or_fallback(&ViewId::from("NotFound"));
        assert!(fallback.matched);
        assert_eq!(fallback.view_stack, vec![ViewId::from("NotFound")]);
    }
}
