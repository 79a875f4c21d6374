//! Bounded upstream calls.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::{AdapterError, AdapterResult};

/// Runs an upstream call with a hard deadline. Expiry becomes
/// [`AdapterError::Timeout`] so callers treat it like any other failure.
pub async fn bounded<F, T>(duration: Duration, operation: &str, future: F) -> AdapterResult<T>
where
    F: Future<Output = AdapterResult<T>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, ?duration, "Upstream call timed out");
            Err(AdapterError::Timeout(format!(
                "{} timed out after {:?}",
                operation, duration
            )))
        }
    }
}
