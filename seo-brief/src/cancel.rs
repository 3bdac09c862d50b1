//! Cancellation for long-running operations.
//!
//! Every analysis or article run takes a [`CancellationToken`]; a front end
//! keeps a clone and calls `cancel()` to abort between external calls.

use std::future::Future;
use std::time::Duration;

pub use tokio_util::sync::CancellationToken;

use crate::error::{BriefError, BriefResult};

/// Await `fut` unless the token fires first
pub async fn run_cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> BriefResult<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BriefError::Cancelled),
        out = fut => Ok(out),
    }
}

/// Sleep for the throttle delay, waking early on cancellation
pub async fn throttle(cancel: &CancellationToken, delay: Duration) -> BriefResult<()> {
    if delay.is_zero() {
        return if cancel.is_cancelled() {
            Err(BriefError::Cancelled)
        } else {
            Ok(())
        };
    }
    run_cancellable(cancel, tokio::time::sleep(delay)).await
}
