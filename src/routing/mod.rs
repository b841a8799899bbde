//! Proxy dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query, headers, body)
//!     → table.rs (first rule whose prefix matches, declaration order)
//!     → rule.rs (rewrite path, resolve origin)
//!     → Return: forwarded Request or NoMatch
//!
//! Table Compilation (at startup):
//!     RuleConfig[] of the selected profile
//!     → Validate prefixes and origins
//!     → Reject rules shadowed by an earlier prefix
//!     → Freeze as immutable DispatchTable
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - Literal prefix matching only, no regex
//! - Deterministic: same path always selects the same rule
//! - Explicit NoMatch rather than silent default

pub mod error;
pub mod rule;
pub mod table;

pub use error::{ProxyError, RuleError};
pub use rule::{DispatchRule, Origin, Rewrite, RuleConfig};
pub use table::{DispatchTable, MatchedRule, RouteMatch};
