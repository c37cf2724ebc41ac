//! Static asset serving.
//!
//! # Responsibilities
//! - Serve a resolved file below the static root
//! - Attach the route's cache expiration as `Cache-Control`
//! - Refuse paths that escape the static root
//!
//! # Design Decisions
//! - Static targets never touch a dispatcher, even when the file is missing (404)
//! - Conditional requests and ranges are handled by tower-http's `ServeFile`

use std::path::{Component, Path};
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// Serve `relative` from `root` with the given cache expiration.
pub async fn serve_static(
    root: &Path,
    relative: &Path,
    expiration: Duration,
    request: Request<Body>,
) -> Response {
    if !is_contained(relative) {
        tracing::warn!(path = %relative.display(), "Rejected static path outside root");
        return (StatusCode::BAD_REQUEST, "Invalid path").into_response();
    }

    let full_path = root.join(relative);
    let mut response = match ServeFile::new(&full_path).oneshot(request).await {
        Ok(res) => res.into_response(),
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Unhandled internal error: {}", err),
            )
                .into_response()
        }
    };

    let status = response.status();
    if status.is_success() || status == StatusCode::NOT_MODIFIED {
        if let Ok(value) = HeaderValue::from_str(&cache_control(expiration)) {
            response.headers_mut().insert(header::CACHE_CONTROL, value);
        }
    } else {
        tracing::debug!(path = %full_path.display(), status = %status, "Static file not served");
    }
    response
}

/// `Cache-Control` value for an expiration.
pub fn cache_control(expiration: Duration) -> String {
    format!("public, max-age={}", expiration.as_secs())
}

/// True if `relative` stays below the directory it is joined to.
fn is_contained(relative: &Path) -> bool {
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
