//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → routing table compiled once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; route changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    DispatcherConfig, GatewayConfig, IdentityConfig, ListenerConfig, PrincipalConfig,
    ReleaseConfig, RouteConfig, VendorConfig,
};
