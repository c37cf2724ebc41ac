//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Compile routes → Start listeners
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C / SIGTERM, or any listener exiting (supervisor.rs) → broadcast → listeners stop accepting → drain → exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Every listener subscribes to the same shutdown broadcast

pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use shutdown::Shutdown;
pub use supervisor::{supervise, LifecycleError};
