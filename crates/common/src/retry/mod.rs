use std::{future::Future, time::Duration};

use tokio::time::sleep;
use tracing::{error, warn};

pub mod policies;

/// Runs a fallible async operation with a backoff retry.
///
/// The operation is attempted once and then retried up to `max_retries` more
/// times, sleeping between attempts according to `backoff`. The closure gets
/// the zero-based attempt number.
///
/// Logs a warning on each failure and an error if all retries are exhausted,
/// in which case the last error is returned.
///
/// # Example
///
/// ```rust
/// use cswatch_common::retry::{policies::FixedBackoff, retry_with_backoff};
///
/// # async fn run() {
/// let res: Result<(), &str> = retry_with_backoff(
///     "my_task",
///     3,
///     &FixedBackoff::new(500),
///     |_attempt| async { Err("failed to do something") },
/// )
/// .await;
/// # }
/// ```
pub async fn retry_with_backoff<R, E, F, Fut>(
    name: &str,
    max_retries: u16,
    backoff: &impl Backoff,
    mut operation: F,
) -> Result<R, E>
where
    F: FnMut(u16) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: std::fmt::Display,
{
    let mut delay = backoff.base_delay_ms();
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_retries => {
                warn!(
                    %name,
                    attempt = attempt + 1,
                    %err,
                    delay_ms = delay,
                    "attempt failed, retrying"
                );
                sleep(Duration::from_millis(delay)).await;
                delay = backoff.next_delay_ms(delay);
                attempt += 1;
            }
            Err(err) => {
                error!(%name, attempts = u32::from(attempt) + 1, %err, "max retries exceeded");
                return Err(err);
            }
        }
    }
}

pub trait Backoff {
    /// Base delay in ms.
    fn base_delay_ms(&self) -> u64;

    /// Generates next delay given current delay.
    fn next_delay_ms(&self, curr_delay_ms: u64) -> u64;
}
