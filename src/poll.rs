// Bounded polling primitive. Max attempts and interval are explicit
// parameters so call sites carry no inlined magic numbers and the behavior
// is testable under a paused clock.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("gave up polling after {attempts} attempts")]
pub struct PollTimeout {
    pub attempts: u32,
}

/// Polls `op` up to `max_attempts` times, `interval` apart, until it yields
/// `Some`. No trailing sleep after the final attempt.
pub async fn poll_until<T, F, Fut>(
    max_attempts: u32,
    interval: Duration,
    mut op: F,
) -> Result<T, PollTimeout>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let attempts = max_attempts.max(1);
    for attempt in 1..=attempts {
        if let Some(value) = op().await {
            return Ok(value);
        }
        if attempt < attempts {
            sleep(interval).await;
        }
    }
    Err(PollTimeout { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn returns_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in = Arc::clone(&calls);
        let result = poll_until(10, Duration::from_millis(300), move || {
            let calls = Arc::clone(&calls_in);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n == 3 {
                    Some(n)
                } else {
                    None
                }
            }
        })
        .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in = Arc::clone(&calls);
        let result: Result<(), _> = poll_until(4, Duration::from_millis(300), move || {
            let calls = Arc::clone(&calls_in);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                None
            }
        })
        .await;
        assert_eq!(result, Err(PollTimeout { attempts: 4 }));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
