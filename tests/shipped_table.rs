//! The shipped `gateway.toml` route table.

use std::path::Path;
use std::time::Duration;

use codereview_gateway::config::parse_config;
use codereview_gateway::routing::{canonical_path, Login, ResolvedTarget, RoutingTable, SecurePolicy};

const SHIPPED_CONFIG: &str = include_str!("../gateway.toml");
const WEEK: Duration = Duration::from_secs(7 * 24 * 3600);

fn table() -> RoutingTable {
    let config = parse_config(SHIPPED_CONFIG).unwrap();
    RoutingTable::from_config(&config).unwrap()
}

fn static_path(table: &RoutingTable, request: &str) -> Option<(String, Duration)> {
    match table.resolve(request).target {
        ResolvedTarget::StaticFile { path, expiration } => {
            Some((path.display().to_string(), expiration))
        }
        ResolvedTarget::Dispatch { .. } => None,
    }
}

fn dispatcher<'a>(table: &'a RoutingTable, request: &str) -> Option<&'a str> {
    match table.resolve(request).target {
        ResolvedTarget::Dispatch { dispatcher } => Some(dispatcher),
        ResolvedTarget::StaticFile { .. } => None,
    }
}

#[test]
fn test_static_literals() {
    let table = table();
    for file in ["robots.txt", "favicon.ico", "google7db36eb2cc527940.html"] {
        let (path, expiration) = static_path(&table, &format!("/{}", file)).unwrap();
        assert_eq!(Path::new(&path), Path::new("static").join(file));
        assert_eq!(expiration, WEEK);
    }
}

#[test]
fn test_static_assets() {
    let table = table();
    assert_eq!(
        static_path(&table, "/static/styles.css"),
        Some(("static/styles.css".to_string(), Duration::from_secs(3600)))
    );
    assert_eq!(
        static_path(&table, "/static/script.js"),
        Some(("static/script.js".to_string(), Duration::from_secs(3600)))
    );
    assert_eq!(
        static_path(&table, "/static/img/logo.png"),
        Some(("static/img/logo.png".to_string(), WEEK))
    );
    assert_eq!(dispatcher(&table, "/static/upload.py"), Some("main"));
}

#[test]
fn test_restricted_and_lifecycle_constraints() {
    let table = table();

    let restricted = table.resolve("/restricted/set-client-id-and-secret").route;
    assert_eq!(restricted.login, Login::Admin);
    assert_eq!(restricted.secure, SecurePolicy::Always);
    assert_eq!(dispatcher(&table, "/restricted/set-client-id-and-secret"), Some("main"));

    for hook in ["/_ah/start", "/_ah/stop"] {
        let route = table.resolve(hook).route;
        assert_eq!(route.login, Login::Admin);
        assert_eq!(route.secure, SecurePolicy::Optional);
        assert_eq!(dispatcher(&table, hook), Some("backend"));
    }
}

#[test]
fn test_everything_else_reaches_main() {
    let table = table();
    for path in ["/", "/anything/else", "/_ah/warmup", "/restricted", "/robots.txt.bak"] {
        let resolution = table.resolve(path);
        assert!(resolution.route.is_catch_all(), "{} should hit the catch-all", path);
        assert_eq!(dispatcher(&table, path), Some("main"));
    }
}

#[test]
fn test_encoded_restricted_paths_resolve_to_admin_route() {
    let table = table();
    for raw in [
        "/%72estricted/set-client-id-and-secret",
        "/r%65stricted/set-client-id-and-secret",
        "//restricted//set-client-id-and-secret",
    ] {
        let path = canonical_path(raw).unwrap();
        let route = table.resolve(&path).route;
        assert_eq!(route.login, Login::Admin, "{} resolved to route #{}", raw, route.index);
        assert!(!route.is_catch_all());
    }
}
