//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (ordered route scan)
//!     → matcher.rs (regex full match or directory prefix)
//!     → Return: Resolution (static file + expiration, or dispatcher name)
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Compile matchers, parse expirations and constraints
//!     → Require a trailing catch-all
//!     → Freeze as immutable RoutingTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Declaration order is precedence; first match wins
//! - Deterministic: same path always resolves to the same route
//! - Access constraints are carried on the route and enforced by `security`

pub mod expiration;
pub mod matcher;
pub mod path;
pub mod router;

pub use path::{canonical_path, PathError};
pub use router::{Login, Resolution, ResolvedTarget, Route, RouteError, RouteTarget, RoutingTable, SecurePolicy};
