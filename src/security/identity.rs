//! Caller identity.
//!
//! Callers authenticate with `Authorization: Bearer <token>`. Tokens map to
//! configured principals; a principal either holds administrative privilege
//! or it does not.

use std::collections::HashMap;

use axum::http::{header, HeaderMap};

use crate::config::schema::IdentityConfig;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub admin: bool,
}

/// Token → principal lookup, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct IdentityStore {
    by_token: HashMap<String, Principal>,
}

impl IdentityStore {
    pub fn from_config(config: &IdentityConfig) -> Self {
        let by_token = config
            .principals
            .iter()
            .map(|p| {
                (
                    p.token.clone(),
                    Principal {
                        name: p.name.clone(),
                        admin: p.admin,
                    },
                )
            })
            .collect();
        Self { by_token }
    }

    /// Identify the caller from request headers. Unknown or malformed credentials yield `None`.
    pub fn authenticate(&self, headers: &HeaderMap) -> Option<&Principal> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let token = value.strip_prefix("Bearer ")?.trim();
        self.by_token.get(token)
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}
