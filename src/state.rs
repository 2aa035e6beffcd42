//! Presentation state for one query.
//!
//! `Idle -> Loading -> Ready | Failed`, and back to `Loading` on every new
//! submission. A settlement only applies while the state is `Loading` for the
//! same generation, so `Ready`/`Failed` are never entered from each other or
//! from a stale fetch.

use serde::Serialize;

use crate::models::Generation;

// ---

/// What the UI layer reads to decide what to render.
///
/// `R` is the adapted record type, `M` the derived metrics type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryState<R, M> {
    Idle,
    Loading {
        generation: Generation,
    },
    Ready {
        generation: Generation,
        records: R,
        derived: M,
    },
    Failed {
        generation: Generation,
        reason: String,
    },
}

impl<R, M> Default for QueryState<R, M> {
    fn default() -> Self {
        QueryState::Idle
    }
}

impl<R, M> QueryState<R, M> {
    // ---
    pub fn generation(&self) -> Option<Generation> {
        match self {
            QueryState::Idle => None,
            QueryState::Loading { generation }
            | QueryState::Ready { generation, .. }
            | QueryState::Failed { generation, .. } => Some(*generation),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            QueryState::Idle => "idle",
            QueryState::Loading { .. } => "loading",
            QueryState::Ready { .. } => "ready",
            QueryState::Failed { .. } => "failed",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading { .. })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, QueryState::Ready { .. })
    }

    /// True once `generation` has reached `Ready` or `Failed`.
    pub fn is_settled_for(&self, generation: Generation) -> bool {
        match self {
            QueryState::Ready { generation: g, .. } | QueryState::Failed { generation: g, .. } => {
                *g == generation
            }
            _ => false,
        }
    }

    /// Enter `Loading` for a newly accepted submission. Legal from any state.
    pub fn begin(&mut self, generation: Generation) {
        *self = QueryState::Loading { generation };
    }

    /// Apply the outcome of `generation`'s fetch. Returns `false` and leaves
    /// the state untouched unless it is `Loading` for that generation.
    pub fn settle(&mut self, generation: Generation, outcome: Result<(R, M), String>) -> bool {
        // ---
        match self {
            QueryState::Loading { generation: current } if *current == generation => {}
            _ => return false,
        }

        *self = match outcome {
            Ok((records, derived)) => QueryState::Ready {
                generation,
                records,
                derived,
            },
            Err(reason) => QueryState::Failed { generation, reason },
        };
        true
    }
}
