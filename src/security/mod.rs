//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Resolved route:
//!     → transport.rs (secure policy: proceed / redirect / reject)
//!     → identity.rs (bearer token → principal)
//!     → access.rs (admin gate)
//!     → Pass to static server or dispatcher
//! ```
//!
//! # Design Decisions
//! - Fail closed: a refused request never reaches a dispatcher
//! - Plaintext tolerance is a per-route property, never a global switch
//! - No trust in client input; forwarded-proto headers are opt-in

pub mod access;
pub mod identity;
pub mod transport;

pub use access::{authorize, AccessError};
pub use identity::{IdentityStore, Principal};
pub use transport::{enforce, Transport, TransportDecision};
