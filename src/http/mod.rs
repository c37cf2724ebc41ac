//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, timeout, instance limit)
//!     → routing table (resolve path → route)
//!     → security (transport policy, admin gate)
//!     → static_files.rs (static targets)
//!       or inbound.rs + dispatch.rs (script targets)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod inbound;
pub mod middleware;
pub mod server;
pub mod static_files;

pub use dispatch::{Dispatchers, X_GATEWAY_ADMIN};
pub use server::{AppState, HttpServer};
