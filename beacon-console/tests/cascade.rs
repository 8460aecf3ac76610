use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use beacon_console::fetch::{
    Cascade, CascadeError, CascadeSource, Commit, Dependent, DependentSource, FetchError,
    LoadState, SelectOption,
};
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

const LEVELS: &[&str] = &["region", "country", "district"];

/// Options are derived from the parent value: `east` has countries
/// `east.0` and `east.1`. Requests for a gated parent block until released.
#[derive(Clone, Default)]
struct GatedSource {
    inner: Arc<Gates>,
}

#[derive(Default)]
struct Gates {
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    entered: Notify,
    calls: AtomicUsize,
}

impl Gates {
    async fn gate(&self, key: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .await
            .insert(key.to_string(), Arc::clone(&gate));
        gate
    }

    /// Blocks while `key` is gated, or until `cancel` fires.
    async fn pass(&self, key: &str, cancel: &CancellationToken) -> Result<(), FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().await.get(key).cloned();
        if let Some(gate) = gate {
            self.entered.notify_one();
            tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = gate.notified() => {}
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CascadeSource for GatedSource {
    fn levels(&self) -> &[&'static str] {
        LEVELS
    }

    async fn options(
        &self,
        _level: usize,
        parents: &[String],
        cancel: CancellationToken,
    ) -> Result<Vec<SelectOption>, FetchError> {
        let Some(parent) = parents.last() else {
            return Ok(vec![SelectOption::new("east"), SelectOption::new("west")]);
        };

        self.inner.pass(parent, &cancel).await?;
        Ok((0..2)
            .map(|i| SelectOption::new(format!("{parent}.{i}")))
            .collect())
    }
}

fn values(options: &LoadState<Vec<SelectOption>>) -> Vec<String> {
    options
        .loaded()
        .map(|options| options.iter().map(|option| option.value.clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn changing_region_clears_lower_levels() {
    let owner = CancellationToken::new();
    let cascade = Cascade::new(GatedSource::default(), &owner);

    assert_eq!(cascade.load_root().await, Commit::Applied);
    cascade.select(0, "east").await.unwrap();
    cascade.select(1, "east.1").await.unwrap();
    cascade.select(2, "east.1.0").await.unwrap();
    assert_eq!(
        cascade.selection_path().await,
        vec!["east", "east.1", "east.1.0"]
    );

    cascade.select(0, "west").await.unwrap();

    let snapshot = cascade.snapshot().await;
    assert_eq!(snapshot[0].selected.as_deref(), Some("west"));
    assert_eq!(snapshot[1].selected, None);
    assert_eq!(values(&snapshot[1].options), vec!["west.0", "west.1"]);
    assert_eq!(
        snapshot[1].options.loaded().map(|options| options[0].clone()),
        Some(SelectOption::new("west.0"))
    );
    assert_eq!(snapshot[2].selected, None);
    assert_eq!(snapshot[2].options, LoadState::Idle);
}

#[tokio::test]
async fn late_response_for_an_old_selection_is_discarded() {
    let source = GatedSource::default();
    let owner = CancellationToken::new();
    let cascade = Cascade::new(source.clone(), &owner);
    cascade.load_root().await;

    let east_gate = source.inner.gate("east").await;
    let slow = tokio::spawn({
        let cascade = cascade.clone();
        async move { cascade.select(0, "east").await }
    });
    source.inner.entered.notified().await;

    assert_eq!(cascade.select(0, "west").await.unwrap(), Commit::Applied);
    east_gate.notify_one();

    assert_eq!(slow.await.unwrap().unwrap(), Commit::Superseded);

    let snapshot = cascade.snapshot().await;
    assert_eq!(snapshot[0].selected.as_deref(), Some("west"));
    assert_eq!(values(&snapshot[1].options), vec!["west.0", "west.1"]);
}

#[tokio::test]
async fn auto_select_walks_to_the_leaf() {
    let owner = CancellationToken::new();
    let cascade = Cascade::new(GatedSource::default(), &owner).auto_select_first(true);

    assert_eq!(cascade.load_root().await, Commit::Applied);
    assert_eq!(
        cascade.selection_path().await,
        vec!["east", "east.0", "east.0.0"]
    );

    cascade.select(1, "east.1").await.unwrap();
    assert_eq!(
        cascade.selection_path().await,
        vec!["east", "east.1", "east.1.0"]
    );
}

#[tokio::test]
async fn selections_must_come_from_loaded_options() {
    let owner = CancellationToken::new();
    let cascade = Cascade::new(GatedSource::default(), &owner);

    assert!(matches!(
        cascade.select(0, "east").await,
        Err(CascadeError::UnknownOption { level: "region", .. })
    ));

    cascade.load_root().await;
    assert!(matches!(
        cascade.select(0, "north").await,
        Err(CascadeError::UnknownOption { .. })
    ));
    assert!(matches!(
        cascade.select(3, "east").await,
        Err(CascadeError::NoSuchLevel { level: 3, depth: 3 })
    ));
}

#[tokio::test]
async fn owner_teardown_cancels_in_flight_requests() {
    let source = GatedSource::default();
    let owner = CancellationToken::new();
    let cascade = Cascade::new(source.clone(), &owner);
    cascade.load_root().await;

    let _gate = source.inner.gate("east").await;
    let pending = tokio::spawn({
        let cascade = cascade.clone();
        async move { cascade.select(0, "east").await }
    });
    source.inner.entered.notified().await;

    owner.cancel();
    assert_eq!(pending.await.unwrap().unwrap(), Commit::Superseded);
    assert!(cascade.snapshot().await[1].options.loaded().is_none());
}

#[derive(Clone, Default)]
struct Echo {
    inner: Arc<Gates>,
}

#[async_trait]
impl DependentSource<String, String> for Echo {
    async fn fetch(&self, key: &String, cancel: CancellationToken) -> Result<String, FetchError> {
        match key.as_str() {
            "missing" => {
                return Err(FetchError::Status {
                    status: 404,
                    message: "no such district".to_string(),
                });
            }
            "hang" => std::future::pending::<()>().await,
            _ => {}
        }

        self.inner.pass(key, &cancel).await?;
        Ok(format!("summary of {key}"))
    }
}

#[tokio::test]
async fn blank_key_clears_without_fetching() {
    let source = Echo::default();
    let owner = CancellationToken::new();
    let dependent: Dependent<String, String, _> = Dependent::new(source.clone(), &owner);

    dependent.fetch_dependent(Some("kampala".to_string())).await;
    assert_eq!(
        dependent.state().await,
        LoadState::Loaded("summary of kampala".to_string())
    );

    assert_eq!(dependent.fetch_dependent(Some("  ".to_string())).await, Commit::Applied);
    assert_eq!(dependent.state().await, LoadState::Idle);
    assert_eq!(dependent.key().await, None);
    assert_eq!(source.inner.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn newest_key_wins() {
    let source = Echo::default();
    let gate = source.inner.gate("wakiso").await;

    let owner = CancellationToken::new();
    let dependent: Dependent<String, String, _> = Dependent::new(source.clone(), &owner);

    let slow = tokio::spawn({
        let dependent = dependent.clone();
        async move { dependent.fetch_dependent(Some("wakiso".to_string())).await }
    });
    source.inner.entered.notified().await;

    assert_eq!(
        dependent.fetch_dependent(Some("jinja".to_string())).await,
        Commit::Applied
    );
    gate.notify_one();
    assert_eq!(slow.await.unwrap(), Commit::Superseded);

    assert_eq!(
        dependent.state().await,
        LoadState::Loaded("summary of jinja".to_string())
    );
    assert_eq!(dependent.key().await.as_deref(), Some("jinja"));
}

#[tokio::test]
async fn failures_and_timeouts_become_error_state() {
    let owner = CancellationToken::new();
    let dependent: Dependent<String, String, _> =
        Dependent::new(Echo::default(), &owner).with_timeout(Duration::from_millis(20));

    dependent.fetch_dependent(Some("missing".to_string())).await;
    let state = dependent.state().await;
    assert_eq!(state.error(), Some("server responded with 404: no such district"));

    dependent.fetch_dependent(Some("hang".to_string())).await;
    let state = dependent.state().await;
    assert!(state.error().is_some_and(|message| message.contains("timed out")));
}

#[tokio::test]
async fn shutdown_stops_commits() {
    let source = Echo::default();
    let owner = CancellationToken::new();
    let dependent: Dependent<String, String, _> = Dependent::new(source.clone(), &owner);

    dependent.shutdown();
    assert_eq!(
        dependent.fetch_dependent(Some("kampala".to_string())).await,
        Commit::Superseded
    );
    assert!(dependent.state().await.loaded().is_none());
}
