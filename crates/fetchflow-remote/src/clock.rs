//! Cancellation-aware waiting

use std::time::Duration;

use fetchflow_core::{Error, Result};
use tokio_util::sync::CancellationToken;

/// Sleep for `duration` unless `cancel` fires first.
///
/// Returns [`Error::Cancelled`] as soon as the token is cancelled, including
/// when it was already cancelled before the call.
pub async fn sleep(cancel: &CancellationToken, duration: Duration) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
