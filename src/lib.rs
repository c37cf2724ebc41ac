//! Codereview Gateway Library

// Request path
pub mod config;
pub mod http;
pub mod net;
pub mod routing;
pub mod security;

// Release tooling
pub mod pipeline;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::RoutingTable;
