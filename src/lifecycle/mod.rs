//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Select profile → Build table → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then tables, then listener
//! - No reload signal: dispatch rules are fixed for the process lifetime

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
