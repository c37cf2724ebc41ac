//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the gateway handler as fallback
//! - Wire up middleware (tracing, timeout, request ID, instance concurrency)
//! - Serve the plaintext and optional encrypted listeners
//! - Canonicalize the request path, rejecting ambiguous encodings with 400
//! - Resolve each request against the routing table
//! - Enforce transport policy and the admin gate before any dispatch
//! - Serve static targets or forward to a dispatcher
//! - Observability (metrics, request IDs)

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    middleware, Extension, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::schema::{GatewayConfig, TlsConfig};
use crate::http::dispatch::Dispatchers;
use crate::http::inbound::InboundServices;
use crate::http::middleware::instance_limit::{serialize_requests, InstanceLimit};
use crate::http::static_files::serve_static;
use crate::lifecycle::shutdown;
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::routing::{canonical_path, Login, Resolution, ResolvedTarget, RouteError, RoutingTable};
use crate::security::{authorize, enforce, IdentityStore, Transport, TransportDecision};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RoutingTable>,
    pub identities: Arc<IdentityStore>,
    pub dispatchers: Dispatchers,
    pub inbound: Arc<InboundServices>,
    pub static_root: Arc<PathBuf>,
    pub trust_forwarded_proto: bool,
}

/// HTTP front for the routing table.
pub struct HttpServer {
    state: AppState,
    config: GatewayConfig,
    instance_limit: InstanceLimit,
}

impl HttpServer {
    /// Compile the routing table and build shared state.
    pub fn new(config: GatewayConfig) -> Result<Self, RouteError> {
        let table = Arc::new(RoutingTable::from_config(&config)?);
        let identities = Arc::new(IdentityStore::from_config(&config.identity));
        let dispatchers = Dispatchers::from_config(&config.dispatchers);
        let inbound = Arc::new(InboundServices::new(config.inbound_services.iter().cloned()));

        tracing::info!(
            principals = identities.len(),
            inbound_services = ?config.inbound_services,
            threadsafe = config.instance.threadsafe,
            "Gateway state initialized"
        );

        let state = AppState {
            table,
            identities,
            dispatchers,
            inbound,
            static_root: Arc::new(PathBuf::from(&config.static_root)),
            trust_forwarded_proto: config.listener.trust_forwarded_proto,
        };

        // Shared by both listeners: the limit is per instance, not per transport.
        let instance_limit = InstanceLimit::single();

        Ok(Self {
            state,
            config,
            instance_limit,
        })
    }

    /// Build the Axum router for a listener of the given transport.
    #[allow(deprecated)]
    pub fn router(&self, transport: Transport) -> Router {
        let router = Router::new()
            .fallback(gateway_handler)
            .with_state(self.state.clone())
            .layer(Extension(transport))
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        if self.config.instance.threadsafe {
            router
        } else {
            router.layer(middleware::from_fn_with_state(
                self.instance_limit.clone(),
                serialize_requests,
            ))
        }
    }

    /// Serve plaintext traffic until shutdown.
    pub async fn run(
        &self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, transport = "http", "HTTP server starting");

        axum::serve(listener, self.router(Transport::Plaintext))
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }

    /// Serve encrypted traffic until shutdown.
    pub async fn run_tls(
        &self,
        tls: &TlsConfig,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr: SocketAddr = tls
            .bind_address
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;

        let handle = axum_server::Handle::new();
        let stopper = handle.clone();
        tokio::spawn(async move {
            shutdown::wait(shutdown_rx).await;
            stopper.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        tracing::info!(address = %addr, transport = "https", "HTTPS server starting");
        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(self.router(Transport::Encrypted).into_make_service())
            .await?;

        tracing::info!(address = %addr, "HTTPS server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Single entry point for every request.
async fn gateway_handler(
    State(state): State<AppState>,
    Extension(transport): Extension<Transport>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();

    let path = match canonical_path(request.uri().path()) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(method = %method, path = %request.uri().path(), error = %e, "Rejected request path");
            metrics::record_request(&method, 400, "none", metrics::UNROUTED, start_time);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let resolution = state.table.resolve(&path);
    let kind = resolution.route.kind().to_string();
    let url = resolution.route.url.clone();

    tracing::debug!(
        method = %method,
        path = %path,
        route = resolution.route.index,
        url = %url,
        target = %kind,
        "Route resolved"
    );

    let response = handle_resolved(&state, resolution, &path, transport, request).await;
    metrics::record_request(&method, response.status().as_u16(), &kind, &url, start_time);
    response
}

async fn handle_resolved(
    state: &AppState,
    resolution: Resolution<'_>,
    path: &str,
    transport: Transport,
    request: Request<Body>,
) -> Response {
    let route = resolution.route;
    let transport = transport.effective(request.headers(), state.trust_forwarded_proto);
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    match enforce(
        route.secure,
        transport,
        request.method(),
        request.headers(),
        path_and_query,
    ) {
        TransportDecision::Proceed => {}
        TransportDecision::Redirect(location) => {
            tracing::debug!(route = route.index, location = %location, "Redirecting to required scheme");
            return (StatusCode::FOUND, [(header::LOCATION, location)]).into_response();
        }
        TransportDecision::Reject => {
            return (StatusCode::FORBIDDEN, "Request must use the required scheme").into_response();
        }
    }

    let principal = state.identities.authenticate(request.headers()).cloned();
    if let Err(e) = authorize(route.login, principal.as_ref()) {
        tracing::warn!(
            route = route.index,
            path = %path,
            error = %e,
            "Access denied before dispatch"
        );
        let status = e.status();
        let mut response = (status, e.to_string()).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Bearer"));
        }
        return response;
    }

    match resolution.target {
        ResolvedTarget::StaticFile { path, expiration } => {
            serve_static(&state.static_root, &path, expiration, request).await
        }
        ResolvedTarget::Dispatch { dispatcher } => {
            if !state.inbound.admits(path) {
                tracing::debug!(path = %path, "Inbound service not declared");
                return (StatusCode::NOT_FOUND, "Inbound service not enabled").into_response();
            }
            let admin = principal.as_ref().filter(|_| route.login == Login::Admin);
            state.dispatchers.forward(dispatcher, request, admin).await
        }
    }
}
