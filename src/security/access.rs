//! Admin gate for restricted routes.

use axum::http::StatusCode;

use crate::routing::Login;
use crate::security::identity::Principal;

/// Why a request was refused before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("{0} is not an administrator")]
    NotAdmin(String),
}

impl AccessError {
    pub fn status(&self) -> StatusCode {
        match self {
            AccessError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AccessError::NotAdmin(_) => StatusCode::FORBIDDEN,
        }
    }
}

/// Decide whether `principal` may reach a route with the given login requirement.
pub fn authorize(login: Login, principal: Option<&Principal>) -> Result<(), AccessError> {
    match (login, principal) {
        (Login::Anyone, _) => Ok(()),
        (Login::Admin, None) => Err(AccessError::Unauthenticated),
        (Login::Admin, Some(p)) if p.admin => Ok(()),
        (Login::Admin, Some(p)) => Err(AccessError::NotAdmin(p.name.clone())),
    }
}
