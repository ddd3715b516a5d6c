// src/error_recovery.rs
//! Recovery strategies for upstream calls: bounded retry with exponential
//! backoff for transient failures, and one-shot session renewal for
//! expired cookies.

use crate::api::SessionHandle;
use crate::constants::{RETRY_INITIAL_DELAY_MS, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_MS};
use crate::error::AppError;
use crate::types::SessionToken;
use rand::Rng;
use std::time::Duration;

/// Retries an async operation with exponential backoff.
///
/// Only errors classified transient by [`AppError::is_retryable`] are
/// retried; everything else propagates on the first failure. The delay
/// doubles per attempt up to the cap, with up to 25% random jitter so
/// parallel extractions don't retry in lockstep.
pub async fn retry_with_backoff<F, T, Fut>(
    mut operation: F,
    max_attempts: u32,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
{
    let mut delay = Duration::from_millis(RETRY_INITIAL_DELAY_MS);
    let max_delay = Duration::from_millis(RETRY_MAX_DELAY_MS);

    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && e.is_retryable() => {
                log::warn!(
                    "Attempt {}/{} failed ({}), retrying after {:?}",
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(jittered(delay)).await;
                delay = std::cmp::min(delay * 2, max_delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Retries with the engine's standard attempt bound.
pub async fn retry_standard<F, T, Fut>(operation: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
{
    retry_with_backoff(operation, RETRY_MAX_ATTEMPTS).await
}

/// Runs an operation with the current session token; if the upstream
/// reports the session expired, renews it once and retries the call with
/// the fresh token. A second authorization failure propagates as fatal.
pub async fn with_session_renewal<T, F, Fut>(
    session: &SessionHandle,
    mut operation: F,
) -> Result<T, AppError>
where
    F: FnMut(SessionToken) -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
{
    match operation(session.current()).await {
        Err(e) if e.is_session_expired() => {
            let fresh = session.renew().await?;
            operation(fresh).await
        }
        other => other,
    }
}

fn jittered(delay: Duration) -> Duration {
    let jitter_cap = delay.as_millis() as u64 / 4;
    if jitter_cap == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::rng().random_range(0..=jitter_cap))
}
