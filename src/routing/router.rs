//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Compile `RouteConfig` entries into matchers and targets
//! - Look up the matching route for a request path
//! - Resolve static targets to file paths and script targets to dispatchers
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) ordered scan; first match wins
//! - The last route must be a catch-all, so lookup is total

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::schema::{DispatcherConfig, GatewayConfig, RouteConfig};
use crate::routing::expiration::{parse_expiration, ExpirationError};
use crate::routing::matcher::{Matcher, PathPrefixMatcher, RegexMatcher};

/// Error compiling a single route, or the table as a whole.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("url must not be empty")]
    EmptyUrl,
    #[error("must set exactly one of static_files, static_dir or script (found {found})")]
    TargetCount { found: usize },
    #[error("invalid url pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("unknown dispatcher {0:?}")]
    UnknownDispatcher(String),
    #[error(transparent)]
    Expiration(#[from] ExpirationError),
    #[error("expiration only applies to static targets")]
    ExpirationOnScript,
    #[error("unsupported login requirement {0:?} (expected \"admin\")")]
    Login(String),
    #[error("unsupported secure policy {0:?} (expected \"optional\", \"always\" or \"never\")")]
    Secure(String),
    #[error("static_files refers to group \\{group} but url has {available} group(s)")]
    Backreference { group: usize, available: usize },
    #[error("last route must be a catch-all (url = \".*\")")]
    MissingCatchAll,
}

/// Who may reach a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Login {
    #[default]
    Anyone,
    Admin,
}

/// How a route treats the request's transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurePolicy {
    /// Served over either transport, never redirected.
    #[default]
    Optional,
    /// Plaintext requests are redirected to https.
    Always,
    /// Encrypted requests are redirected to http.
    Never,
}

/// What a route hands the request to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    /// A file path template with `\N` back-references.
    StaticFiles { template: String },
    /// A directory serving everything below the route prefix.
    StaticDir { dir: String },
    /// A named dispatcher.
    Script { dispatcher: String },
}

/// A compiled routing table entry.
#[derive(Debug)]
pub struct Route {
    /// Position in declaration order.
    pub index: usize,
    /// The url pattern as written.
    pub url: String,
    pub target: RouteTarget,
    pub login: Login,
    pub secure: SecurePolicy,
    /// Route-specific expiration overriding the table default.
    pub expiration: Option<Duration>,
    matcher: Box<dyn Matcher>,
}

impl Route {
    /// Compile a configured route. `dispatchers` are the names script targets may use.
    pub fn compile(
        index: usize,
        config: &RouteConfig,
        dispatchers: &BTreeMap<String, DispatcherConfig>,
    ) -> Result<Self, RouteError> {
        if config.url.is_empty() {
            return Err(RouteError::EmptyUrl);
        }

        let found = [
            config.static_files.is_some(),
            config.static_dir.is_some(),
            config.script.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();

        let (target, matcher): (RouteTarget, Box<dyn Matcher>) =
            match (&config.static_files, &config.static_dir, &config.script) {
                (Some(template), None, None) => {
                    let matcher = RegexMatcher::new(&config.url)?;
                    if let Some(group) = highest_backreference(template) {
                        if group > matcher.capture_groups() {
                            return Err(RouteError::Backreference {
                                group,
                                available: matcher.capture_groups(),
                            });
                        }
                    }
                    (
                        RouteTarget::StaticFiles {
                            template: template.clone(),
                        },
                        Box::new(matcher),
                    )
                }
                (None, Some(dir), None) => (
                    RouteTarget::StaticDir { dir: dir.clone() },
                    Box::new(PathPrefixMatcher::new(config.url.as_str())),
                ),
                (None, None, Some(dispatcher)) => {
                    if !dispatchers.contains_key(dispatcher) {
                        return Err(RouteError::UnknownDispatcher(dispatcher.clone()));
                    }
                    if config.expiration.is_some() {
                        return Err(RouteError::ExpirationOnScript);
                    }
                    (
                        RouteTarget::Script {
                            dispatcher: dispatcher.clone(),
                        },
                        Box::new(RegexMatcher::new(&config.url)?),
                    )
                }
                _ => return Err(RouteError::TargetCount { found }),
            };

        let login = match config.login.as_deref() {
            None | Some("optional") => Login::Anyone,
            Some("admin") => Login::Admin,
            Some(other) => return Err(RouteError::Login(other.to_string())),
        };

        let secure = match config.secure.as_deref() {
            None | Some("optional") => SecurePolicy::Optional,
            Some("always") => SecurePolicy::Always,
            Some("never") => SecurePolicy::Never,
            Some(other) => return Err(RouteError::Secure(other.to_string())),
        };

        let expiration = config
            .expiration
            .as_deref()
            .map(parse_expiration)
            .transpose()?;

        Ok(Self {
            index,
            url: config.url.clone(),
            target,
            login,
            secure,
            expiration,
            matcher,
        })
    }

    /// True if this route matches every request path.
    pub fn is_catch_all(&self) -> bool {
        self.matcher.is_catch_all()
    }

    /// Label used in logs and metrics: `static` or the dispatcher name.
    pub fn kind(&self) -> &str {
        match &self.target {
            RouteTarget::StaticFiles { .. } | RouteTarget::StaticDir { .. } => "static",
            RouteTarget::Script { dispatcher } => dispatcher.as_str(),
        }
    }
}

/// Checks that a compiled table ends in a catch-all.
pub fn check_catch_all(routes: &[Route]) -> Result<(), RouteError> {
    match routes.last() {
        Some(route) if route.is_catch_all() => Ok(()),
        _ => Err(RouteError::MissingCatchAll),
    }
}

/// Where a resolved request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget<'a> {
    /// A file relative to the static root.
    StaticFile { path: PathBuf, expiration: Duration },
    /// A dispatcher by name.
    Dispatch { dispatcher: &'a str },
}

/// The outcome of routing one request path.
#[derive(Debug)]
pub struct Resolution<'a> {
    pub route: &'a Route,
    pub target: ResolvedTarget<'a>,
}

/// Ordered, immutable routing table.
#[derive(Debug)]
pub struct RoutingTable {
    routes: Vec<Route>,
    default_expiration: Duration,
}

impl RoutingTable {
    /// Compile the routing table from configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RouteError> {
        let routes = config
            .routes
            .iter()
            .enumerate()
            .map(|(index, route)| Route::compile(index, route, &config.dispatchers))
            .collect::<Result<Vec<_>, _>>()?;
        check_catch_all(&routes)?;

        let default_expiration = parse_expiration(&config.default_expiration)?;

        tracing::info!(
            routes = routes.len(),
            default_expiration_secs = default_expiration.as_secs(),
            "Routing table compiled"
        );

        Ok(Self {
            routes,
            default_expiration,
        })
    }

    /// Resolve a request path to its route and target.
    ///
    /// Total by construction: the catch-all guarantees a match.
    pub fn resolve(&self, path: &str) -> Resolution<'_> {
        for route in &self.routes {
            let Some(m) = route.matcher.match_path(path) else {
                continue;
            };
            let expiration = route.expiration.unwrap_or(self.default_expiration);
            let target = match &route.target {
                RouteTarget::StaticFiles { template } => ResolvedTarget::StaticFile {
                    path: PathBuf::from(expand_template(template, &m.captures)),
                    expiration,
                },
                RouteTarget::StaticDir { dir } => {
                    let remainder = m.remainder.unwrap_or_default();
                    let mut path = PathBuf::from(dir);
                    if !remainder.is_empty() {
                        path.push(remainder);
                    }
                    ResolvedTarget::StaticFile { path, expiration }
                }
                RouteTarget::Script { dispatcher } => ResolvedTarget::Dispatch {
                    dispatcher: dispatcher.as_str(),
                },
            };
            return Resolution { route, target };
        }
        unreachable!("routing table without catch-all: {path}")
    }

    /// Compiled routes in declaration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn default_expiration(&self) -> Duration {
        self.default_expiration
    }
}

/// Substitute `\N` back-references in a static file template.
fn expand_template(template: &str, captures: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(group) = chars.peek().and_then(|d| d.to_digit(10)) {
                chars.next();
                if let Some(value) = captures.get(group as usize) {
                    out.push_str(value);
                }
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn highest_backreference(template: &str) -> Option<usize> {
    let bytes = template.as_bytes();
    bytes
        .windows(2)
        .filter(|w| w[0] == b'\\' && w[1].is_ascii_digit())
        .map(|w| (w[1] - b'0') as usize)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatchers() -> BTreeMap<String, DispatcherConfig> {
        let mut map = BTreeMap::new();
        map.insert(
            "main".to_string(),
            DispatcherConfig {
                address: "127.0.0.1:9000".to_string(),
            },
        );
        map
    }

    fn route(url: &str) -> RouteConfig {
        RouteConfig {
            url: url.to_string(),
            ..Default::default()
        }
    }

    fn table(routes: Vec<RouteConfig>) -> RoutingTable {
        let config = GatewayConfig {
            routes,
            dispatchers: dispatchers(),
            ..Default::default()
        };
        RoutingTable::from_config(&config).unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let table = table(vec![
            RouteConfig {
                script: Some("main".into()),
                ..route("/static/upload.py")
            },
            RouteConfig {
                static_dir: Some("static".into()),
                ..route("/static")
            },
            RouteConfig {
                script: Some("main".into()),
                ..route(".*")
            },
        ]);

        let r = table.resolve("/static/upload.py");
        assert_eq!(r.route.index, 0);
        assert_eq!(r.target, ResolvedTarget::Dispatch { dispatcher: "main" });

        let r = table.resolve("/static/css/site.css");
        assert_eq!(r.route.index, 1);
        assert_eq!(
            r.target,
            ResolvedTarget::StaticFile {
                path: PathBuf::from("static/css/site.css"),
                expiration: Duration::from_secs(7 * 86_400),
            }
        );

        assert_eq!(table.resolve("/anything/else").route.index, 2);
    }

    #[test]
    fn test_static_files_backreference_and_expiration() {
        let table = table(vec![
            RouteConfig {
                static_files: Some("static/\\1".into()),
                expiration: Some("1h".into()),
                ..route("/static/(script\\.js|styles\\.css)")
            },
            RouteConfig {
                script: Some("main".into()),
                ..route(".*")
            },
        ]);

        let r = table.resolve("/static/styles.css");
        assert_eq!(
            r.target,
            ResolvedTarget::StaticFile {
                path: PathBuf::from("static/styles.css"),
                expiration: Duration::from_secs(3600),
            }
        );
        assert_eq!(r.route.kind(), "static");
    }

    #[test]
    fn test_compile_errors() {
        let d = dispatchers();

        let err = Route::compile(0, &route("/x"), &d).unwrap_err();
        assert!(matches!(err, RouteError::TargetCount { found: 0 }));

        let both = RouteConfig {
            script: Some("main".into()),
            static_dir: Some("static".into()),
            ..route("/x")
        };
        assert!(matches!(
            Route::compile(0, &both, &d).unwrap_err(),
            RouteError::TargetCount { found: 2 }
        ));

        let unknown = RouteConfig {
            script: Some("mystery".into()),
            ..route("/x")
        };
        assert!(matches!(
            Route::compile(0, &unknown, &d).unwrap_err(),
            RouteError::UnknownDispatcher(_)
        ));

        let bad_ref = RouteConfig {
            static_files: Some("static/\\2".into()),
            ..route("/(a)")
        };
        assert!(matches!(
            Route::compile(0, &bad_ref, &d).unwrap_err(),
            RouteError::Backreference { group: 2, available: 1 }
        ));

        let bad_login = RouteConfig {
            script: Some("main".into()),
            login: Some("required".into()),
            ..route("/x")
        };
        assert!(matches!(
            Route::compile(0, &bad_login, &d).unwrap_err(),
            RouteError::Login(_)
        ));
    }

    #[test]
    fn test_table_requires_catch_all() {
        let config = GatewayConfig {
            routes: vec![RouteConfig {
                script: Some("main".into()),
                ..route("/only")
            }],
            dispatchers: dispatchers(),
            ..Default::default()
        };
        assert!(matches!(
            RoutingTable::from_config(&config).unwrap_err(),
            RouteError::MissingCatchAll
        ));
    }

    #[test]
    fn test_expand_template() {
        let caps = vec!["/a/b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(expand_template("x/\\2/\\1", &caps), "x/b/a");
        assert_eq!(expand_template("no refs", &caps), "no refs");
        assert_eq!(expand_template("trailing\\", &caps), "trailing\\");
    }
}
