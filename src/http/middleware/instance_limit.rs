//! Single-request instances.
//!
//! When the application is not threadsafe, an instance handles one request
//! at a time; later requests wait for the permit in arrival order.

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use tokio::sync::Semaphore;

/// Permits shared by every listener of one instance.
#[derive(Clone, Debug)]
pub struct InstanceLimit {
    permits: Arc<Semaphore>,
}

impl InstanceLimit {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight)),
        }
    }

    pub fn single() -> Self {
        Self::new(1)
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

pub async fn serialize_requests(
    State(limit): State<InstanceLimit>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // The semaphore is never closed, so acquire only fails if that invariant breaks.
    let _permit = limit.permits.clone().acquire_owned().await.ok();
    next.run(request).await
}
