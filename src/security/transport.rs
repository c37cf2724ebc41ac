//! Transport policy.
//!
//! Each listener tags its requests with the transport they arrived on. A
//! route's [`SecurePolicy`] then decides whether the request proceeds or is
//! redirected to the other scheme. `Optional` routes are never redirected,
//! which health-check callers that cannot follow redirects rely on.

use axum::http::{header, HeaderMap, Method};

use crate::routing::SecurePolicy;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// The channel a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Plaintext,
    Encrypted,
}

impl Transport {
    pub fn scheme(&self) -> &'static str {
        match self {
            Transport::Plaintext => "http",
            Transport::Encrypted => "https",
        }
    }

    /// The transport as seen by the client. A terminating proxy's
    /// `X-Forwarded-Proto` is only honored when `trust_forwarded` is set.
    pub fn effective(self, headers: &HeaderMap, trust_forwarded: bool) -> Transport {
        if !trust_forwarded {
            return self;
        }
        match headers
            .get(X_FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("https") => Transport::Encrypted,
            Some("http") => Transport::Plaintext,
            _ => self,
        }
    }
}

/// Outcome of applying a route's transport policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportDecision {
    Proceed,
    /// Redirect the client to this absolute URL.
    Redirect(String),
    /// The request cannot be redirected (non-idempotent method or no Host).
    Reject,
}

/// Apply `policy` to a request that arrived over `transport`.
pub fn enforce(
    policy: SecurePolicy,
    transport: Transport,
    method: &Method,
    headers: &HeaderMap,
    path_and_query: &str,
) -> TransportDecision {
    let wanted = match (policy, transport) {
        (SecurePolicy::Optional, _)
        | (SecurePolicy::Always, Transport::Encrypted)
        | (SecurePolicy::Never, Transport::Plaintext) => return TransportDecision::Proceed,
        (SecurePolicy::Always, Transport::Plaintext) => Transport::Encrypted,
        (SecurePolicy::Never, Transport::Encrypted) => Transport::Plaintext,
    };

    if *method != Method::GET && *method != Method::HEAD {
        return TransportDecision::Reject;
    }
    let Some(host) = headers.get(header::HOST).and_then(|h| h.to_str().ok()) else {
        return TransportDecision::Reject;
    };
    TransportDecision::Redirect(format!("{}://{}{}", wanted.scheme(), host, path_and_query))
}
