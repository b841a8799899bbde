//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID assigned and propagated)
//!     → [routing::DispatchTable picks rule, rewrites URI and Host]
//!     → forward.rs (single upstream attempt, timeouts)
//!     → response.rs (dispatch failures → status codes)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::Forwarder;
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, GatewayServer};
