use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{Commit, FetchError, FetchSlot, LoadState, guarded};

/// Key of a dependent lookup. A blank key clears the lookup instead of
/// issuing a request.
pub trait FetchKey: Clone + Send + Sync + std::fmt::Debug + 'static {
    fn is_blank(&self) -> bool;
}

impl FetchKey for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl FetchKey for (String, String) {
    fn is_blank(&self) -> bool {
        self.0.is_blank() || self.1.is_blank()
    }
}

#[async_trait]
pub trait DependentSource<K, V>: Send + Sync + 'static {
    async fn fetch(&self, key: &K, cancel: CancellationToken) -> Result<V, FetchError>;
}

struct Inner<K, V> {
    key: Option<K>,
    slot: FetchSlot<V>,
}

/// Data fetched for a single, changing key.
pub struct Dependent<K, V, S> {
    source: Arc<S>,
    inner: Arc<Mutex<Inner<K, V>>>,
    root: CancellationToken,
    timeout: Option<Duration>,
}

impl<K, V, S> Clone for Dependent<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            inner: Arc::clone(&self.inner),
            root: self.root.clone(),
            timeout: self.timeout,
        }
    }
}

impl<K, V, S> Dependent<K, V, S>
where
    K: FetchKey,
    V: Send + 'static,
    S: DependentSource<K, V>,
{
    pub fn new(source: S, owner: &CancellationToken) -> Self {
        Self {
            source: Arc::new(source),
            inner: Arc::new(Mutex::new(Inner {
                key: None,
                slot: FetchSlot::new(),
            })),
            root: owner.child_token(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fetches data for `key`, superseding any earlier request.
    pub async fn fetch_dependent(&self, key: Option<K>) -> Commit {
        let Some(key) = key.filter(|key| !key.is_blank()) else {
            let mut inner = self.inner.lock().await;
            inner.key = None;
            inner.slot.reset();
            return Commit::Applied;
        };

        let ticket = {
            let mut inner = self.inner.lock().await;
            inner.key = Some(key.clone());
            inner.slot.begin(&self.root)
        };

        let result = guarded(
            ticket.token(),
            self.timeout,
            self.source.fetch(&key, ticket.token().clone()),
        )
        .await;

        if let Err(err) = &result
            && !matches!(err, FetchError::Cancelled)
            && !ticket.token().is_cancelled()
        {
            warn!(key = ?key, error = %err, "dependent fetch failed");
        }

        let mut inner = self.inner.lock().await;
        let commit = inner.slot.commit(&ticket, result);
        if commit == Commit::Superseded {
            debug!(key = ?key, "discarded stale dependent result");
        }
        commit
    }

    pub async fn key(&self) -> Option<K> {
        self.inner.lock().await.key.clone()
    }

    pub async fn state(&self) -> LoadState<V>
    where
        V: Clone,
    {
        self.inner.lock().await.slot.state().clone()
    }

    pub fn shutdown(&self) {
        self.root.cancel();
    }
}
