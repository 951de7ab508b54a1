//! Retry-with-backoff utility.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Run `op` up to `max_attempts` times, sleeping `delay_for(attempt)`
/// between failed attempts.
///
/// `op` receives the 1-based attempt number. Attempts are sequential, never
/// concurrent. When all attempts fail, the last error is returned.
pub async fn retry_with_backoff<T, E, F, Fut, D>(
    max_attempts: u32,
    delay_for: D,
    mut op: F,
) -> std::result::Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    D: Fn(u32) -> Duration,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(attempt, max_attempts, error = %e, "attempt failed");
                if attempt >= max_attempts {
                    return Err(e);
                }
                tokio::time::sleep(delay_for(attempt)).await;
                attempt += 1;
            }
        }
    }
}

/// Linear backoff: `attempt * base`.
pub fn linear_backoff(base: Duration) -> impl Fn(u32) -> Duration {
    move |attempt| base * attempt
}
