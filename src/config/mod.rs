//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, every profile compiled)
//!     → GatewayConfig (validated, immutable)
//!     → loader::dispatch_table (selected profile → DispatchTable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no hot reload of dispatch rules
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Profiles are explicit environment variants; selection is never implicit

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{dispatch_table, load_config, load_or_default, ConfigError};
pub use schema::{
    CorsConfig, DispatchConfig, GatewayConfig, ListenerConfig, NavigationConfig,
    ObservabilityConfig, TimeoutConfig, DEFAULT_PROFILE,
};
pub use validation::ValidationError;
