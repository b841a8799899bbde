//! IoT console gateway and navigation library.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 CONSOLE GATEWAY               │
//!   Browser request    │  ┌────────┐    ┌──────────┐    ┌──────────┐  │
//!   ───────────────────┼─▶│  http  │───▶│ routing  │───▶│  http    │──┼──▶ Backend
//!                      │  │ server │    │ dispatch │    │ forward  │  │    service
//!                      │  └───┬────┘    └──────────┘    └──────────┘  │
//!                      │      │ no rule                               │
//!                      │      ▼                                       │
//!                      │  static client (index.html fallback)         │
//!                      └──────────────────────────────────────────────┘
//!
//!   In-app path ──▶ navigation (redirects → tree walk) ──▶ view stack + params
//! ```
//!
//! The navigation resolver and the dispatch table share no state; each is
//! built once and passed explicitly to whoever needs it.

// Core subsystems
pub mod navigation;
pub mod routing;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use navigation::{Navigator, ResolvedRoute};
pub use routing::DispatchTable;
