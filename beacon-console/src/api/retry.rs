use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::fetch::FetchError;

/// Retry budget for transient request failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

/// Runs `attempt` until it succeeds, fails permanently, exhausts the
/// retry budget, or `cancel` fires during the delay between attempts.
pub async fn retry<T, F, Fut>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut retries = 0u32;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && retries < policy.max_retries => {
                retries += 1;
                warn!(attempt = retries, error = %err, "request failed, retrying");
                tokio::select! {
                    _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                    _ = tokio::time::sleep(policy.delay) => {}
                }
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn status(code: u16) -> FetchError {
        FetchError::Status {
            status: code,
            message: "backend says no".to_string(),
        }
    }

    fn policy(max_retries: u32, delay: Duration) -> RetryPolicy {
        RetryPolicy { max_retries, delay }
    }

    #[tokio::test]
    async fn server_error_then_success_retries_once() {
        let calls = AtomicU32::new(0);
        let result = retry(policy(2, Duration::from_millis(1)), &CancellationToken::new(), || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(status(503))
                } else {
                    Ok("body")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "body");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_errors_are_returned_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> =
            retry(policy(3, Duration::from_millis(1)), &CancellationToken::new(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(status(404)) }
            })
            .await;

        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn budget_bounds_the_number_of_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> =
            retry(policy(2, Duration::from_millis(1)), &CancellationToken::new(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(status(502)) }
            })
            .await;

        assert!(matches!(result, Err(FetchError::Status { status: 502, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cancelling_during_the_delay_stops_retrying() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                cancel.cancel();
            })
        };

        let result: Result<(), _> = retry(policy(5, Duration::from_secs(30)), &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(FetchError::Timeout(Duration::from_secs(1))) }
        })
        .await;

        canceller.await.unwrap();
        assert!(matches!(result, Err(FetchError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
