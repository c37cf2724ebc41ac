//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Plaintext listener (tokio TcpListener)  → requests tagged Transport::Plaintext
//! Encrypted listener (axum-server rustls) → requests tagged Transport::Encrypted
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - TLS is optional; a terminating load balancer can be trusted via X-Forwarded-Proto instead
//! - Both listeners share one router state and one shutdown broadcast

pub mod tls;
