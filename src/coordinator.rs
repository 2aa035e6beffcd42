//! Query coordinator: one per displayed query.
//!
//! Every `submit` takes a fresh generation and moves the state to `Loading`.
//! The fetch runs in the background; when it settles, its result is applied
//! only if its generation is still the latest. Older fetches are not aborted,
//! they finish and are dropped. This holds whatever order the replies
//! arrive in.
//!
//! State is published through a `tokio::sync::watch` channel so readers can
//! either sample it or wait for a generation to settle.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domains::Domain;
use crate::fetch::{FetchError, Fetcher};
use crate::models::{Generation, QueryParams};
use crate::state::QueryState;

// ---

/// Presentation state for domain `D`.
pub type DomainState<D> = QueryState<<D as Domain>::Records, <D as Domain>::Derived>;

/// What happened to a settled fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The result became the current state.
    Applied,
    /// A newer submission superseded it; the result was dropped.
    Stale,
}

/// Handle to one accepted submission.
#[derive(Debug)]
pub struct Submission {
    // ---
    pub generation: Generation,
    pub task: JoinHandle<Settlement>,
}

pub struct QueryCoordinator<D: Domain> {
    // ---
    fetcher: Arc<dyn Fetcher>,
    current: Mutex<Generation>,
    state: watch::Sender<DomainState<D>>,
    _domain: PhantomData<fn() -> D>,
}

impl<D: Domain> QueryCoordinator<D> {
    // ---
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        // ---
        let (state, _) = watch::channel(QueryState::Idle);
        Self {
            fetcher,
            current: Mutex::new(Generation::default()),
            state,
            _domain: PhantomData,
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> DomainState<D> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DomainState<D>> {
        self.state.subscribe()
    }

    /// Latest accepted generation (`#0` before the first submission).
    pub fn current_generation(&self) -> Generation {
        *self.lock_current()
    }

    /// Accept `params` and start fetching in the background.
    ///
    /// Identical params are not de-duplicated: every call is a new generation
    /// and a new fetch.
    pub fn submit(self: &Arc<Self>, params: QueryParams) -> Submission {
        // ---
        let generation = self.begin(&params);
        let this = Arc::clone(self);
        let task = tokio::spawn(async move { this.run(generation, params).await });
        Submission { generation, task }
    }

    /// Take the next generation and enter `Loading`, without fetching.
    ///
    /// `submit` is `begin` followed by a spawned `run`.
    pub fn begin(&self, params: &QueryParams) -> Generation {
        // ---
        let mut current = self.lock_current();
        *current = current.next();
        let generation = *current;
        self.state.send_modify(|s| s.begin(generation));

        debug!(
            "{} query {} accepted for {}",
            D::KIND.label(),
            generation,
            params
        );
        generation
    }

    /// Fetch for an accepted generation and settle it.
    pub async fn run(&self, generation: Generation, params: QueryParams) -> Settlement {
        // ---
        let outcome = self.fetcher.fetch(D::KIND, &params).await;
        self.on_fetch_settled(generation, outcome)
    }

    /// Apply a fetch outcome if `generation` is still current.
    ///
    /// Stale outcomes are dropped without touching the state. Transport and
    /// adapter failures become `Failed` with a readable reason.
    pub fn on_fetch_settled(
        &self,
        generation: Generation,
        outcome: Result<Value, FetchError>,
    ) -> Settlement {
        // ---
        if generation != self.current_generation() {
            debug!(
                "Discarding stale {} result {} (current {})",
                D::KIND.label(),
                generation,
                self.current_generation()
            );
            return Settlement::Stale;
        }

        let result = outcome
            .and_then(|payload| D::adapt(&payload).map_err(FetchError::from))
            .map(|records| {
                let derived = D::synthesize(&records);
                (records, derived)
            })
            .map_err(|e| format!("{}: {}", D::KIND.label(), e));

        // Re-check under the lock; a submit may have landed while adapting
        let current = self.lock_current();
        if generation != *current {
            debug!(
                "Discarding stale {} result {} (current {})",
                D::KIND.label(),
                generation,
                *current
            );
            return Settlement::Stale;
        }

        match &result {
            Ok(_) => info!("{} query {} ready", D::KIND.label(), generation),
            Err(reason) => warn!("{} query {} failed: {}", D::KIND.label(), generation, reason),
        }

        if self.state.send_if_modified(|s| s.settle(generation, result)) {
            Settlement::Applied
        } else {
            Settlement::Stale
        }
    }

    /// Wait until `generation` settles or is superseded, then return the
    /// state at that moment.
    pub async fn settled(&self, generation: Generation) -> DomainState<D> {
        // ---
        let mut rx = self.subscribe();
        let waited = rx
            .wait_for(|s| {
                s.is_settled_for(generation) || s.generation().is_some_and(|g| g > generation)
            })
            .await
            .map(|s| s.clone());

        // The sender lives as long as `self`, so this only falls back on teardown
        waited.unwrap_or_else(|_| self.state())
    }

    fn lock_current(&self) -> MutexGuard<'_, Generation> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
