//! In-app navigation subsystem.
//!
//! # Data Flow
//! ```text
//! Navigation path ("/domain/42/channels/7/chart?x=1")
//!     → resolver.rs (redirect check, segment split)
//!     → tree.rs (first matching child per level)
//!     → ResolvedRoute { view_stack, params, matched, redirect }
//!     → presentation layer renders the stack
//!
//! Tree construction (at startup):
//!     RouteNode declarations (console.rs or config)
//!     → RouteTree::new (invariant checks)
//!     → Navigator (tree + redirects), immutable, shared via Arc
//! ```
//!
//! # Design Decisions
//! - The tree is data, the resolver is a generic walk
//! - No global router: navigators are constructed and passed explicitly
//! - Redirect cycles are errors, never loops

pub mod console;
pub mod resolver;
pub mod tree;

pub use resolver::{resolve, NavigationError, Navigator, Redirect, ResolvedRoute};
pub use tree::{RouteNode, RouteTree, Segment, TreeError, ViewId};
