//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (script routes name declared dispatchers)
//! - Validate value formats (url patterns, expirations, addresses)
//! - Guarantee routing coverage (trailing catch-all)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;
use crate::routing::expiration::{parse_expiration, ExpirationError};
use crate::routing::router::{Route, RouteError};

/// Inbound service hooks the gateway knows how to route.
pub const KNOWN_INBOUND_SERVICES: &[&str] = &["mail", "xmpp_message", "warmup"];

/// A single semantic problem in the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("route #{index} ({url:?}): {source}")]
    Route {
        index: usize,
        url: String,
        #[source]
        source: RouteError,
    },
    #[error("routes: {0}")]
    Coverage(RouteError),
    #[error("default_expiration: {0}")]
    DefaultExpiration(ExpirationError),
    #[error("dispatcher {name:?}: invalid address {address:?}")]
    DispatcherAddress { name: String, address: String },
    #[error("listener: invalid bind address {0:?}")]
    BindAddress(String),
    #[error("identity: token for {0:?} is empty or shared with another principal")]
    Token(String),
    #[error("inbound_services: unknown service {0:?}")]
    InboundService(String),
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut last = None;
    for (index, route) in config.routes.iter().enumerate() {
        last = match Route::compile(index, route, &config.dispatchers) {
            Ok(route) => Some(route),
            Err(source) => {
                errors.push(ValidationError::Route {
                    index,
                    url: route.url.clone(),
                    source,
                });
                None
            }
        };
    }
    // A last route that failed to compile is already reported above.
    if config.routes.is_empty() || last.as_ref().is_some_and(|r| !r.is_catch_all()) {
        errors.push(ValidationError::Coverage(RouteError::MissingCatchAll));
    }

    if let Err(e) = parse_expiration(&config.default_expiration) {
        errors.push(ValidationError::DefaultExpiration(e));
    }

    for (name, dispatcher) in &config.dispatchers {
        if dispatcher.address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::DispatcherAddress {
                name: name.clone(),
                address: dispatcher.address.clone(),
            });
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if let Some(tls) = &config.listener.tls {
        if tls.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::BindAddress(tls.bind_address.clone()));
        }
    }

    let mut seen = HashSet::new();
    for principal in &config.identity.principals {
        if principal.token.is_empty() || !seen.insert(principal.token.as_str()) {
            errors.push(ValidationError::Token(principal.name.clone()));
        }
    }

    for service in &config.inbound_services {
        if !KNOWN_INBOUND_SERVICES.contains(&service.as_str()) {
            errors.push(ValidationError::InboundService(service.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{DispatcherConfig, PrincipalConfig, RouteConfig};

    fn valid() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.dispatchers.insert(
            "main".into(),
            DispatcherConfig {
                address: "127.0.0.1:9000".into(),
            },
        );
        config.routes.push(RouteConfig {
            url: ".*".into(),
            script: Some("main".into()),
            ..Default::default()
        });
        config
    }

    #[test]
    fn test_minimal_config_is_valid() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_missing_catch_all() {
        let mut config = valid();
        config.routes[0].url = "/only".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::Coverage(RouteError::MissingCatchAll)]
        ));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid();
        config.default_expiration = "soon".into();
        config.dispatchers.insert(
            "backend".into(),
            DispatcherConfig {
                address: "not-an-address".into(),
            },
        );
        config.inbound_services.push("channel_presence".into());
        config.identity.principals = vec![
            PrincipalConfig {
                name: "a@example.com".into(),
                token: "t".into(),
                admin: true,
            },
            PrincipalConfig {
                name: "b@example.com".into(),
                token: "t".into(),
                admin: false,
            },
        ];
        config.routes.insert(
            0,
            RouteConfig {
                url: "/(".into(),
                script: Some("main".into()),
                ..Default::default()
            },
        );

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Route { index: 0, .. })));
    }
}
