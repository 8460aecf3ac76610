//! Fetches tied to user selections, where a newer selection always wins.
//!
//! Every request runs under a [`CancellationToken`] owned by a
//! [`FetchSlot`]. Starting a new request on a slot cancels the previous
//! token, which both aborts the in-flight future and makes its result
//! uncommittable. All tokens descend from one root token so tearing down
//! the owner cancels everything outstanding.

mod cascade;
mod dependent;
mod slot;

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub use cascade::{Cascade, CascadeError, CascadeSource, LevelSnapshot, SelectOption};
pub use dependent::{Dependent, DependentSource, FetchKey};
pub use slot::{Commit, FetchSlot, LoadState, Ticket};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request cancelled")]
    Cancelled,
    #[error("{0}")]
    Source(String),
}

impl FetchError {
    /// Failures worth retrying: transport errors and 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Timeout(_) => true,
            FetchError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Drives `fut` until it resolves, `token` is cancelled, or `timeout`
/// elapses. Cancellation drops `fut`, aborting the underlying request.
pub async fn guarded<T, F>(
    token: &CancellationToken,
    timeout: Option<Duration>,
    fut: F,
) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    let bounded = async move {
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(limit)),
            },
            None => fut.await,
        }
    };

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(FetchError::Cancelled),
        result = bounded => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guarded_returns_cancelled_when_token_fires() {
        let token = CancellationToken::new();
        token.cancel();

        let result: Result<(), _> = guarded(&token, None, std::future::pending()).await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }

    #[tokio::test]
    async fn guarded_times_out() {
        let token = CancellationToken::new();
        let result: Result<(), _> = guarded(
            &token,
            Some(Duration::from_millis(10)),
            std::future::pending(),
        )
        .await;

        assert!(matches!(result, Err(FetchError::Timeout(_))));
        assert!(FetchError::Timeout(Duration::from_millis(10)).is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        let not_found = FetchError::Status {
            status: 404,
            message: "missing".into(),
        };
        let unavailable = FetchError::Status {
            status: 503,
            message: "down".into(),
        };

        assert!(!not_found.is_transient());
        assert!(unavailable.is_transient());
        assert!(!FetchError::Cancelled.is_transient());
    }
}
