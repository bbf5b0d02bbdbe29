//! Hard wall-clock bound on a provider call.

use std::{future::Future, panic, time::Duration};

use thiserror::Error;
use tracing::*;

/// Deadline applied when the caller doesn't pick one.
pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(60_000);

#[derive(Debug, Error)]
pub enum DeadlineError {
    #[error("timeout after {limit_ms} ms")]
    Elapsed { limit_ms: u64 },

    /// The runtime dropped the operation before it settled.
    #[error("operation aborted before settling")]
    Aborted,
}

/// Runs `op` racing a timer of `limit`.
///
/// `op` is spawned onto the runtime rather than polled in place. If the timer
/// wins, the operation is left running detached and whatever it produces later
/// is dropped with its task. A panic inside `op` is resumed on the caller.
pub async fn with_deadline<F, T>(op: F, limit: Duration) -> Result<T, DeadlineError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let mut handle = tokio::spawn(op);

    match tokio::time::timeout(limit, &mut handle).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) if err.is_panic() => panic::resume_unwind(err.into_panic()),
        Ok(Err(_)) => Err(DeadlineError::Aborted),
        Err(_) => {
            let limit_ms = limit.as_millis() as u64;
            warn!(%limit_ms, "operation did not settle in time, detaching it");
            Err(DeadlineError::Elapsed { limit_ms })
        }
    }
}

/// [`with_deadline`] with [`DEFAULT_DEADLINE`].
pub async fn with_default_deadline<F, T>(op: F) -> Result<T, DeadlineError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    with_deadline(op, DEFAULT_DEADLINE).await
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use tokio::time::{sleep, Instant};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fast_op_wins() {
        let res = with_deadline(
            async {
                sleep(Duration::from_millis(10)).await;
                42
            },
            Duration::from_millis(1_000),
        )
        .await;

        assert_eq!(res.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_deadline_is_one_minute() {
        let started = Instant::now();
        let res = with_default_deadline(std::future::pending::<()>()).await;

        assert!(matches!(res, Err(DeadlineError::Elapsed { limit_ms: 60_000 })));
        assert_eq!(started.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_op_times_out() {
        let start = Instant::now();
        let res = with_deadline(std::future::pending::<()>(), Duration::from_millis(50)).await;

        match res {
            Err(DeadlineError::Elapsed { limit_ms }) => assert_eq!(limit_ms, 50),
            other => panic!("expected timeout, got {other:?}"),
        }
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(50) && waited < Duration::from_millis(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_op_keeps_running() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let res = with_deadline(
            async move {
                sleep(Duration::from_millis(200)).await;
                flag.store(true, Ordering::SeqCst);
            },
            Duration::from_millis(50),
        )
        .await;
        assert!(matches!(res, Err(DeadlineError::Elapsed { .. })));
        assert!(!finished.load(Ordering::SeqCst));

        sleep(Duration::from_millis(500)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    #[should_panic(expected = "boom")]
    async fn test_panic_propagates() {
        let _ = with_deadline(async { panic!("boom") }, Duration::from_secs(1)).await;
    }

    #[test]
    fn test_error_message_carries_limit() {
        let err = DeadlineError::Elapsed { limit_ms: 60_000 };
        assert_eq!(err.to_string(), "timeout after 60000 ms");
    }
}
