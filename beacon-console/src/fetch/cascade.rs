use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Commit, FetchError, FetchSlot, LoadState, Ticket, guarded};

/// An entry of a selection dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
}

impl SelectOption {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Supplies the options of each level of a cascade.
#[async_trait]
pub trait CascadeSource: Send + Sync + 'static {
    /// Level names, top first.
    fn levels(&self) -> &[&'static str];

    /// Options for `level`, given the selected value of every level above.
    async fn options(
        &self,
        level: usize,
        parents: &[String],
        cancel: CancellationToken,
    ) -> Result<Vec<SelectOption>, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
    #[error("level {level} does not exist in a {depth}-level cascade")]
    NoSuchLevel { level: usize, depth: usize },
    #[error("`{value}` is not an available {level}")]
    UnknownOption { level: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelSnapshot {
    pub name: &'static str,
    pub selected: Option<String>,
    pub options: LoadState<Vec<SelectOption>>,
}

#[derive(Debug, Default)]
struct Level {
    selected: Option<String>,
    options: FetchSlot<Vec<SelectOption>>,
}

/// A dependent selection chain such as region, country, district.
///
/// Selecting at level `n` clears every level below `n` and refetches the
/// options of level `n + 1`. Only the newest request of a level may commit.
pub struct Cascade<S> {
    source: Arc<S>,
    levels: Arc<Mutex<Vec<Level>>>,
    root: CancellationToken,
    timeout: Option<Duration>,
    auto_select_first: bool,
}

impl<S> Clone for Cascade<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            levels: Arc::clone(&self.levels),
            root: self.root.clone(),
            timeout: self.timeout,
            auto_select_first: self.auto_select_first,
        }
    }
}

impl<S: CascadeSource> Cascade<S> {
    /// `owner` is the teardown token of the view holding the cascade.
    pub fn new(source: S, owner: &CancellationToken) -> Self {
        let depth = source.levels().len();
        Self {
            source: Arc::new(source),
            levels: Arc::new(Mutex::new((0..depth).map(|_| Level::default()).collect())),
            root: owner.child_token(),
            timeout: None,
            auto_select_first: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Select the first option of each level as soon as it loads.
    pub fn auto_select_first(mut self, enabled: bool) -> Self {
        self.auto_select_first = enabled;
        self
    }

    pub fn depth(&self) -> usize {
        self.source.levels().len()
    }

    /// Clears every level and fetches the top-level options.
    pub async fn load_root(&self) -> Commit {
        if self.depth() == 0 {
            return Commit::Applied;
        }

        let ticket = {
            let mut levels = self.levels.lock().await;
            for level in levels.iter_mut() {
                level.selected = None;
                level.options.reset();
            }
            levels[0].options.begin(&self.root)
        };

        self.fetch_from(0, ticket, Vec::new()).await
    }

    /// Selects `value` at `level`, clearing and refetching everything below.
    pub async fn select<V: Into<String>>(
        &self,
        level: usize,
        value: V,
    ) -> Result<Commit, CascadeError> {
        let value = value.into();
        let depth = self.depth();
        if level >= depth {
            return Err(CascadeError::NoSuchLevel { level, depth });
        }

        let (ticket, parents) = {
            let mut levels = self.levels.lock().await;

            let known = levels[level]
                .options
                .state()
                .loaded()
                .is_some_and(|options| options.iter().any(|option| option.value == value));
            if !known {
                return Err(CascadeError::UnknownOption {
                    level: self.source.levels()[level],
                    value,
                });
            }

            info!(level = self.source.levels()[level], value = %value, "selection changed");
            levels[level].selected = Some(value);
            for lower in levels.iter_mut().skip(level + 1) {
                lower.selected = None;
                lower.options.reset();
            }

            if level + 1 == depth {
                return Ok(Commit::Applied);
            }

            let parents: Vec<String> = levels[..=level]
                .iter()
                .filter_map(|level| level.selected.clone())
                .collect();
            (levels[level + 1].options.begin(&self.root), parents)
        };

        Ok(self.fetch_from(level + 1, ticket, parents).await)
    }

    /// Fetches the options of `level`, following auto-selection downwards.
    async fn fetch_from(
        &self,
        mut level: usize,
        mut ticket: Ticket,
        mut parents: Vec<String>,
    ) -> Commit {
        let depth = self.depth();
        let name = |level: usize| self.source.levels()[level];

        loop {
            let result = guarded(
                ticket.token(),
                self.timeout,
                self.source.options(level, &parents, ticket.token().clone()),
            )
            .await;

            if let Err(err) = &result
                && !matches!(err, FetchError::Cancelled)
            {
                warn!(level = name(level), error = %err, "failed to load options");
            }

            let first = match &result {
                Ok(options) if self.auto_select_first => {
                    options.first().map(|option| option.value.clone())
                }
                _ => None,
            };

            let mut levels = self.levels.lock().await;
            if levels[level].options.commit(&ticket, result) == Commit::Superseded {
                debug!(level = name(level), epoch = ticket.epoch(), "discarded stale options");
                return Commit::Superseded;
            }

            let Some(first) = first else {
                return Commit::Applied;
            };

            debug!(level = name(level), value = %first, "auto-selected first option");
            levels[level].selected = Some(first.clone());
            if level + 1 == depth {
                return Commit::Applied;
            }

            parents.push(first);
            level += 1;
            ticket = levels[level].options.begin(&self.root);
        }
    }

    pub async fn snapshot(&self) -> Vec<LevelSnapshot> {
        let levels = self.levels.lock().await;
        levels
            .iter()
            .zip(self.source.levels().iter().copied())
            .map(|(level, name)| LevelSnapshot {
                name,
                selected: level.selected.clone(),
                options: level.options.state().clone(),
            })
            .collect()
    }

    pub async fn selected(&self, level: usize) -> Option<String> {
        let levels = self.levels.lock().await;
        levels.get(level).and_then(|level| level.selected.clone())
    }

    /// Selected values from the top down to the first unselected level.
    pub async fn selection_path(&self) -> Vec<String> {
        let levels = self.levels.lock().await;
        levels
            .iter()
            .map_while(|level| level.selected.clone())
            .collect()
    }

    /// Cancels every outstanding request; nothing commits afterwards.
    pub fn shutdown(&self) {
        self.root.cancel();
    }
}
