//! Request serialization for non-threadsafe instances.

use std::time::Duration;

use tokio::net::TcpListener;

use codereview_gateway::config::{parse_config, GatewayConfig};
use codereview_gateway::http::HttpServer;
use codereview_gateway::lifecycle::{shutdown, Shutdown};
use codereview_gateway::security::Transport;

mod common;

const SHIPPED_CONFIG: &str = include_str!("../gateway.toml");

fn config(dispatcher: &common::SlowDispatcher, threadsafe: bool) -> GatewayConfig {
    let mut config = parse_config(SHIPPED_CONFIG).unwrap();
    config.dispatchers.get_mut("main").unwrap().address = dispatcher.addr.to_string();
    config.instance.threadsafe = threadsafe;
    config
}

/// Serve the plaintext and encrypted routers of one instance on two local
/// ports, the way both listeners share state in production.
async fn serve_both(server: HttpServer, shutdown: &Shutdown) -> (String, String) {
    let mut bases = Vec::new();
    for transport in [Transport::Plaintext, Transport::Encrypted] {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        bases.push(format!("http://{}", listener.local_addr().unwrap()));
        let router = server.router(transport);
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown::wait(rx))
                .await;
        });
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    (bases.remove(0), bases.remove(0))
}

async fn concurrent_pair(first: &str, second: &str) {
    let client = common::client();
    let (a, b) = tokio::join!(
        client.get(format!("{}/issue/1", first)).send(),
        client.get(format!("{}/issue/2", second)).send(),
    );
    assert_eq!(a.unwrap().status(), 200);
    assert_eq!(b.unwrap().status(), 200);
}

#[tokio::test]
async fn test_non_threadsafe_instance_serializes_requests() {
    let dispatcher = common::start_slow_dispatcher(Duration::from_millis(300)).await;
    let shutdown = Shutdown::new();
    let addr = common::start_gateway(config(&dispatcher, false), &shutdown).await;
    let base = format!("http://{}", addr);

    concurrent_pair(&base, &base).await;
    assert_eq!(dispatcher.peak(), 1);
}

#[tokio::test]
async fn test_permit_is_shared_across_listeners() {
    let dispatcher = common::start_slow_dispatcher(Duration::from_millis(300)).await;
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config(&dispatcher, false)).unwrap();
    let (plain, encrypted) = serve_both(server, &shutdown).await;

    concurrent_pair(&plain, &encrypted).await;
    assert_eq!(dispatcher.peak(), 1);
}

#[tokio::test]
async fn test_threadsafe_instance_runs_concurrently() {
    let dispatcher = common::start_slow_dispatcher(Duration::from_millis(300)).await;
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config(&dispatcher, true)).unwrap();
    let (plain, encrypted) = serve_both(server, &shutdown).await;

    concurrent_pair(&plain, &plain).await;
    assert_eq!(dispatcher.peak(), 2);
    concurrent_pair(&plain, &encrypted).await;
    assert_eq!(dispatcher.peak(), 2);
}
