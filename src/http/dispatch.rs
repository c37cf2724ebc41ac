//! Forwarding to dispatchers.
//!
//! # Responsibilities
//! - Hold one upstream address per configured dispatcher
//! - Rewrite the request URI to the dispatcher and stream the body through
//! - Assert the admin principal to the dispatcher on admin-gated routes
//! - Map upstream failures to 502 Bad Gateway
//!
//! # Design Decisions
//! - The incoming `X-Gateway-Admin` header is always stripped; only the gate sets it
//! - No retries: dispatchers may not be idempotent

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::str::FromStr;

use axum::{
    body::Body,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        HeaderName, HeaderValue, Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::schema::DispatcherConfig;
use crate::security::Principal;

/// Header carrying the admin principal to the dispatcher.
pub const X_GATEWAY_ADMIN: HeaderName = HeaderName::from_static("x-gateway-admin");

/// Named upstream dispatchers sharing one HTTP client.
#[derive(Clone)]
pub struct Dispatchers {
    client: Client<HttpConnector, Body>,
    upstreams: HashMap<String, SocketAddr>,
}

impl Dispatchers {
    /// Build from validated config; unparsable addresses are logged and skipped.
    pub fn from_config(config: &BTreeMap<String, DispatcherConfig>) -> Self {
        let upstreams = config
            .iter()
            .filter_map(|(name, d)| match d.address.parse::<SocketAddr>() {
                Ok(addr) => Some((name.clone(), addr)),
                Err(e) => {
                    tracing::error!(dispatcher = %name, address = %d.address, error = %e, "Invalid dispatcher address");
                    None
                }
            })
            .collect();

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, upstreams }
    }

    pub fn address(&self, name: &str) -> Option<SocketAddr> {
        self.upstreams.get(name).copied()
    }

    /// Forward `request` to the named dispatcher.
    pub async fn forward(
        &self,
        name: &str,
        request: Request<Body>,
        admin: Option<&Principal>,
    ) -> Response {
        let Some(addr) = self.address(name) else {
            tracing::error!(dispatcher = %name, "Dispatcher not configured");
            return (StatusCode::BAD_GATEWAY, "Dispatcher not configured").into_response();
        };

        let (mut parts, body) = request.into_parts();

        let mut uri_parts = parts.uri.clone().into_parts();
        uri_parts.scheme = Some(Scheme::HTTP);
        if let Ok(authority) = Authority::from_str(&addr.to_string()) {
            uri_parts.authority = Some(authority);
        }
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        parts.uri = match Uri::from_parts(uri_parts) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!(dispatcher = %name, error = %e, "Cannot rewrite request URI");
                return (StatusCode::BAD_REQUEST, "Invalid request URI").into_response();
            }
        };

        parts.headers.remove(&X_GATEWAY_ADMIN);
        if let Some(principal) = admin {
            if let Ok(value) = HeaderValue::from_str(&principal.name) {
                parts.headers.insert(X_GATEWAY_ADMIN, value);
            }
        }

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                let (parts, body) = response.into_parts();
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(dispatcher = %name, upstream = %addr, error = %e, "Dispatcher request failed");
                (StatusCode::BAD_GATEWAY, "Dispatcher request failed").into_response()
            }
        }
    }
}

impl std::fmt::Debug for Dispatchers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatchers")
            .field("upstreams", &self.upstreams)
            .finish()
    }
}
