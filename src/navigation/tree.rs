//! Route tree definitions.
//!
//! # Responsibilities
//! - Represent one path segment pattern (index, literal, parameter)
//! - Hold the view bound to each node and its ordered children
//! - Validate sibling and chain invariants once, when the tree is built
//!
//! # Design Decisions
//! - Trees are plain data: buildable in code or deserialized from config
//! - A validated `RouteTree` is immutable; share it behind `Arc`
//! - Declaration order of children is preserved and significant

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a view rendered by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ViewId(String);

impl ViewId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A single segment pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Segment {
    /// Empty segment: the default child shown when the parent path is exhausted.
    Index,
    /// Matches on exact string equality.
    Literal(String),
    /// `:name`, matches any non-empty segment and binds it.
    Param(String),
}

impl Segment {
    /// Whether this pattern accepts `segment`.
    pub fn matches(&self, segment: &str) -> bool {
        match self {
            Segment::Index => false,
            Segment::Literal(lit) => lit == segment,
            Segment::Param(_) => !segment.is_empty(),
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index)
    }
}

impl FromStr for Segment {
    type Err = TreeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.contains('/') {
            return Err(TreeError::InvalidSegment(raw.to_string()));
        }
        match raw {
            "" => Ok(Segment::Index),
            ":" => Err(TreeError::EmptyParamName),
            _ => match raw.strip_prefix(':') {
                Some(name) => Ok(Segment::Param(name.to_string())),
                None => Ok(Segment::Literal(raw.to_string())),
            },
        }
    }
}

impl TryFrom<String> for Segment {
    type Error = TreeError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Segment> for String {
    fn from(segment: Segment) -> Self {
        segment.to_string()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Index => Ok(()),
            Segment::Literal(lit) => f.write_str(lit),
            Segment::Param(name) => write!(f, ":{}", name),
        }
    }
}

/// Tree invariant violations, reported when a tree is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("segment pattern {0:?} must not contain '/'")]
    InvalidSegment(String),

    #[error("parameter segment has an empty name")]
    EmptyParamName,

    #[error("node {parent:?} declares more than one index child")]
    DuplicateIndex { parent: String },

    #[error("node {parent:?} declares literal child {segment:?} twice")]
    DuplicateLiteral { parent: String, segment: String },

    #[error("parameter {name:?} is bound twice on the chain {chain:?}")]
    ParamRebound { name: String, chain: String },

    #[error("index child under {parent:?} must not declare children")]
    IndexWithChildren { parent: String },

    #[error("tree root must use the index segment")]
    RootNotIndex,
}

/// One node of the navigation tree.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteNode {
    pub segment: Segment,

    /// View rendered when this node is on the matched chain. `None` for
    /// pure grouping segments.
    #[serde(default)]
    pub view: Option<ViewId>,

    #[serde(default)]
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    /// Create a node from a raw pattern (`""`, `"login"`, `":id"`).
    pub fn new(segment: &str) -> Result<Self, TreeError> {
        Ok(Self {
            segment: segment.parse()?,
            view: None,
            children: Vec::new(),
        })
    }

    pub fn view(mut self, view: impl Into<ViewId>) -> Self {
        self.view = Some(view.into());
        self
    }

    pub fn child(mut self, child: RouteNode) -> Self {
        self.children.push(child);
        self
    }

    /// The index child, if declared.
    pub fn index_child(&self) -> Option<&RouteNode> {
        self.children.iter().find(|c| c.segment.is_index())
    }

    /// First child, in declaration order, accepting `segment`.
    pub fn match_child(&self, segment: &str) -> Option<&RouteNode> {
        self.children.iter().find(|c| c.segment.matches(segment))
    }
}

/// A validated, immutable navigation tree.
#[derive(Debug, Clone)]
pub struct RouteTree {
    root: RouteNode,
}

impl RouteTree {
    /// Validate `root` and freeze it.
    ///
    /// The root must use the index segment; its own view (if any) forms the
    /// bottom of every view stack.
    pub fn new(root: RouteNode) -> Result<Self, TreeError> {
        if !root.segment.is_index() {
            return Err(TreeError::RootNotIndex);
        }
        let mut bound = Vec::new();
        validate_node(&root, "", &mut bound)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &RouteNode {
        &self.root
    }
}

fn validate_node(node: &RouteNode, chain: &str, bound: &mut Vec<String>) -> Result<(), TreeError> {
    let mut literals = HashSet::new();
    let mut has_index = false;

    for child in &node.children {
        match &child.segment {
            Segment::Index => {
                if has_index {
                    return Err(TreeError::DuplicateIndex { parent: display_chain(chain) });
                }
                if !child.children.is_empty() {
                    return Err(TreeError::IndexWithChildren { parent: display_chain(chain) });
                }
                has_index = true;
            }
            Segment::Literal(lit) => {
                if !literals.insert(lit.as_str()) {
                    return Err(TreeError::DuplicateLiteral {
                        parent: display_chain(chain),
                        segment: lit.clone(),
                    });
                }
            }
            Segment::Param(name) => {
                if name.is_empty() {
                    return Err(TreeError::EmptyParamName);
                }
            }
        }
    }

    for child in &node.children {
        if child.segment.is_index() {
            continue;
        }
        let child_chain = format!("{}/{}", chain, child.segment);
        let param = match &child.segment {
            Segment::Param(name) => Some(name.clone()),
            _ => None,
        };
        if let Some(name) = &param {
            if bound.contains(name) {
                return Err(TreeError::ParamRebound {
                    name: name.clone(),
                    chain: child_chain,
                });
            }
            bound.push(name.clone());
        }
        let result = validate_node(child, &child_chain, bound);
        if param.is_some() {
            bound.pop();
        }
        result?;
    }
    Ok(())
}

fn display_chain(chain: &str) -> String {
    if chain.is_empty() {
        "/".to_string()
    } else {
        chain.to_string()
    }
}
