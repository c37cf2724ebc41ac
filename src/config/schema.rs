//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway
//! and the release pipeline. All types derive Serde traits for
//! deserialization from `gateway.toml`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Per-instance request handling.
    pub instance: InstanceConfig,

    /// Directory static targets are resolved against.
    pub static_root: String,

    /// Expiration applied to static targets without their own value.
    pub default_expiration: String,

    /// Inbound service hooks the application accepts (`mail`, `xmpp_message`, `warmup`).
    pub inbound_services: Vec<String>,

    /// Dynamic request handlers, keyed by the name routes refer to.
    pub dispatchers: BTreeMap<String, DispatcherConfig>,

    /// Ordered routing table. First match wins.
    pub routes: Vec<RouteConfig>,

    /// Caller identities for admin-gated routes.
    pub identity: IdentityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Build and release pipeline settings.
    pub release: ReleaseConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            instance: InstanceConfig::default(),
            static_root: ".".to_string(),
            default_expiration: "7d".to_string(),
            inbound_services: Vec::new(),
            dispatchers: BTreeMap::new(),
            routes: Vec::new(),
            identity: IdentityConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            release: ReleaseConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Plaintext bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional encrypted listener.
    pub tls: Option<TlsConfig>,

    /// Honor `X-Forwarded-Proto` set by a terminating load balancer.
    pub trust_forwarded_proto: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            trust_forwarded_proto: false,
        }
    }
}

/// TLS configuration for the encrypted listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Encrypted bind address (e.g., "0.0.0.0:8443").
    pub bind_address: String,

    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Instance-level request handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// When false, the instance handles at most one request at a time.
    pub threadsafe: bool,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self { threadsafe: true }
    }
}

/// A dynamic request handler reachable over HTTP.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatcherConfig {
    /// Upstream address (e.g., "127.0.0.1:9000").
    pub address: String,
}

/// One entry of the routing table.
///
/// Exactly one of `static_files`, `static_dir` and `script` must be set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Full-match regular expression, or a literal prefix for `static_dir`.
    pub url: String,

    /// File path template; `\1`..`\9` refer to capture groups of `url`.
    pub static_files: Option<String>,

    /// Directory serving everything under the `url` prefix.
    pub static_dir: Option<String>,

    /// Name of the dispatcher handling the request.
    pub script: Option<String>,

    /// `"admin"` restricts the route to administrators.
    pub login: Option<String>,

    /// Cache expiration for static targets (e.g., "1h", "1d 12h").
    pub expiration: Option<String>,

    /// Transport policy: "optional" (default), "always" or "never".
    pub secure: Option<String>,
}

/// Caller identities.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub principals: Vec<PrincipalConfig>,
}

/// A caller known to the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrincipalConfig {
    /// Principal name forwarded to dispatchers (usually an email).
    pub name: String,

    /// Bearer token presented by the caller.
    pub token: String,

    /// Holds administrative privilege.
    #[serde(default)]
    pub admin: bool,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Build and release pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Application id on the deployment target.
    pub application_id: String,

    /// SDK locations probed in order; `~` and `$VAR` are expanded.
    pub sdk_candidates: Vec<String>,

    /// Revision marker file, relative to the application root.
    pub revision_marker: String,

    /// Application root handed to the SDK tools.
    pub app_root: String,

    /// Address the development server binds when serving remotely.
    pub remote_address: String,

    /// Extra flags for the development server.
    pub dev_appserver_flags: Vec<String>,

    /// Extra flags for the deploy tool.
    pub appcfg_flags: Vec<String>,

    /// Python interpreter for the test runner.
    pub python: String,

    /// Coverage tool.
    pub coverage: String,

    /// Test runner script, relative to the application root.
    pub test_runner: String,

    /// Source include pattern for coverage reports.
    pub coverage_include: String,

    /// Pinned third-party sources fetched before every upload.
    pub vendor: Vec<VendorConfig>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            application_id: "codereview".to_string(),
            sdk_candidates: vec![
                "~/google_appengine".to_string(),
                "/usr/local/google_appengine".to_string(),
                "/opt/google_appengine".to_string(),
            ],
            revision_marker: "REVISION".to_string(),
            app_root: ".".to_string(),
            remote_address: "0.0.0.0".to_string(),
            dev_appserver_flags: Vec::new(),
            appcfg_flags: Vec::new(),
            python: "python".to_string(),
            coverage: "coverage".to_string(),
            test_runner: "tests/run_tests.py".to_string(),
            coverage_include: "codereview/*".to_string(),
            vendor: Vec::new(),
        }
    }
}

/// A third-party source checkout pinned to a revision, with an optional local patch.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VendorConfig {
    pub name: String,
    pub repository: String,
    pub revision: String,
    /// Patch applied after checkout, relative to the application root.
    #[serde(default)]
    pub patch: Option<String>,
    /// Checkout destination, relative to the application root. Defaults to `name`.
    #[serde(default)]
    pub destination: Option<String>,
}
