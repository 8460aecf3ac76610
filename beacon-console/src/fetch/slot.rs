use tokio_util::sync::CancellationToken;

use super::FetchError;

/// Lifecycle of fetched data. `Loaded` with an empty payload is a real
/// empty result, distinct from `Idle` and `Loading`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Outcome of trying to commit a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Applied,
    /// A newer request or a teardown replaced this one; nothing changed.
    Superseded,
}

/// Permission to commit into a [`FetchSlot`], valid until the slot starts
/// another request or is reset.
#[derive(Debug, Clone)]
pub struct Ticket {
    epoch: u64,
    token: CancellationToken,
}

impl Ticket {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// One piece of fetched state with at most one committable request.
#[derive(Debug)]
pub struct FetchSlot<T> {
    state: LoadState<T>,
    epoch: u64,
    inflight: Option<CancellationToken>,
}

impl<T> Default for FetchSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FetchSlot<T> {
    pub fn new() -> Self {
        Self {
            state: LoadState::Idle,
            epoch: 0,
            inflight: None,
        }
    }

    pub fn state(&self) -> &LoadState<T> {
        &self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Starts a new epoch, cancelling whatever was in flight.
    pub fn begin(&mut self, parent: &CancellationToken) -> Ticket {
        self.cancel_inflight();
        self.epoch += 1;

        let token = parent.child_token();
        self.inflight = Some(token.clone());
        self.state = LoadState::Loading;

        Ticket {
            epoch: self.epoch,
            token,
        }
    }

    /// Clears the slot and invalidates any outstanding ticket.
    pub fn reset(&mut self) {
        self.cancel_inflight();
        self.epoch += 1;
        self.state = LoadState::Idle;
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.epoch == self.epoch && !ticket.token.is_cancelled()
    }

    /// Stores `result` if `ticket` still belongs to the current epoch.
    pub fn commit(&mut self, ticket: &Ticket, result: Result<T, FetchError>) -> Commit {
        if !self.is_current(ticket) {
            return Commit::Superseded;
        }

        self.inflight = None;
        self.state = match result {
            Ok(value) => LoadState::Loaded(value),
            Err(err) => LoadState::Failed(err.to_string()),
        };

        Commit::Applied
    }

    fn cancel_inflight(&mut self) {
        if let Some(token) = self.inflight.take() {
            token.cancel();
        }
    }
}
