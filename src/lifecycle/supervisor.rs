//! Listener supervision.
//!
//! The gateway runs until a shutdown signal arrives or any listener exits,
//! whichever happens first. A listener that fails at startup (a port in use,
//! missing TLS files) takes the whole process down instead of leaving it
//! half-up.

use std::future::Future;
use std::io;

use tokio::task::{JoinError, JoinSet};

use crate::lifecycle::Shutdown;

/// A listener that stopped abnormally.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("listener failed: {0}")]
    Listener(#[from] io::Error),
    #[error("listener task panicked or was cancelled: {0}")]
    Task(#[from] JoinError),
}

fn flatten(joined: Result<io::Result<()>, JoinError>) -> Result<(), LifecycleError> {
    joined??;
    Ok(())
}

/// Wait for `signal` or the first listener exit, then stop and drain the rest.
///
/// Returns the first listener error, if any.
pub async fn supervise<F>(
    shutdown: &Shutdown,
    mut listeners: JoinSet<io::Result<()>>,
    signal: F,
) -> Result<(), LifecycleError>
where
    F: Future<Output = ()>,
{
    let mut first_error = None;

    tokio::select! {
        _ = signal => {}
        Some(joined) = listeners.join_next() => {
            match flatten(joined) {
                Ok(()) => tracing::warn!("Listener stopped before shutdown was requested"),
                Err(e) => {
                    tracing::error!(error = %e, "Listener failed; shutting down");
                    first_error = Some(e);
                }
            }
        }
    }

    shutdown.trigger();
    while let Some(joined) = listeners.join_next().await {
        if let Err(e) = flatten(joined) {
            tracing::error!(error = %e, "Listener failed during shutdown");
            first_error.get_or_insert(e);
        }
    }

    first_error.map_or(Ok(()), Err)
}
