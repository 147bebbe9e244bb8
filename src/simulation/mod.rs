//! Simulation lifecycle and the transactional trace that makes a run
//! resumable without re-querying the LLM (`spec.md` §4.1, §9).
//!
//! Grounded in `original_source/tinytroupe/control.py`'s `Simulation`
//! class: `begin`/`checkpoint`/`end`, a monotonically increasing
//! fresh-id counter reset on `begin`, and a cache-backed trace that
//! [`Transaction`] consults before invoking a side-effecting call.

pub mod runtime;
pub mod trace;
pub mod transaction;

use std::sync::Arc;

pub use runtime::{ObjectKind, Runtime};
pub use trace::TraceNode;
pub use transaction::{Transaction, TransactionalState};

use crate::cache::Cache;
use crate::error::SimulationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SimulationStatus {
    Stopped,
    Started,
}

/// One simulation run: a lifecycle (`begin`/`checkpoint`/`end`) guarding a
/// hash-chained [`TraceNode`] sequence. At most one `begin` may be active at
/// a time (`spec.md` §4.1 "at-most-one-started invariant").
pub struct Simulation {
    pub id: String,
    status: SimulationStatus,
    next_fresh_id: u64,
    /// The trace loaded from `trace_store` at `begin` — read-only source
    /// consulted for cache hits during replay.
    replay_source: Vec<TraceNode>,
    /// The trace being built by this run; identical to `replay_source` up
    /// to the point where execution first diverges from it.
    live_trace: Vec<TraceNode>,
    trace_store: Arc<dyn Cache<String, Vec<TraceNode>>>,
    /// Agent/world/factory name registries, cleared on every `begin`
    /// (`spec.md` §4.7). [`Transaction`] consults and populates this so
    /// name collisions and dangling references are caught for real, not
    /// just in isolation.
    runtime: Runtime,
    /// Recorded from `begin` for diagnostics; the actual cache file is the
    /// one `trace_store` was built against.
    cache_path: Option<String>,
    auto_checkpoint: bool,
}

impl Simulation {
    pub fn new(id: impl Into<String>, trace_store: Arc<dyn Cache<String, Vec<TraceNode>>>) -> Self {
        Self {
            id: id.into(),
            status: SimulationStatus::Stopped,
            next_fresh_id: 0,
            replay_source: Vec::new(),
            live_trace: Vec::new(),
            trace_store,
            runtime: Runtime::new(),
            cache_path: None,
            auto_checkpoint: false,
        }
    }

    /// Starts the simulation, loading whatever trace was previously
    /// checkpointed under this id as the replay source. `cache_path` is
    /// recorded for diagnostics only — the cache file itself is whatever
    /// `trace_store` was constructed against. When `auto_checkpoint` is
    /// set, every cache-miss call inside a [`Transaction`] flushes the
    /// trace to disk as soon as it is recorded (`spec.md` §4.7 step 4).
    pub async fn begin(&mut self, cache_path: Option<String>, auto_checkpoint: bool) -> Result<(), SimulationError> {
        if self.status == SimulationStatus::Started {
            return Err(SimulationError::AlreadyStarted);
        }
        self.status = SimulationStatus::Started;
        self.next_fresh_id = 0;
        self.cache_path = cache_path;
        self.auto_checkpoint = auto_checkpoint;
        self.runtime = Runtime::new();
        self.replay_source = self.trace_store.get(&self.id).await.unwrap_or_default();
        self.live_trace.clear();
        Ok(())
    }

    pub fn end(&mut self) -> Result<(), SimulationError> {
        if self.status == SimulationStatus::Stopped {
            return Err(SimulationError::AlreadyStopped);
        }
        self.status = SimulationStatus::Stopped;
        Ok(())
    }

    pub fn cache_path(&self) -> Option<&str> {
        self.cache_path.as_deref()
    }

    pub fn auto_checkpoint(&self) -> bool {
        self.auto_checkpoint
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Persists the live trace so a future run with the same id can replay
    /// it. Idempotent; may be called as often as the caller likes mid-run.
    pub async fn checkpoint(&self) -> Result<(), SimulationError> {
        self.trace_store
            .set(self.id.clone(), self.live_trace.clone())
            .await
            .map_err(|e| SimulationError::CacheIo(e.to_string()))?;
        self.trace_store
            .flush()
            .await
            .map_err(|e| SimulationError::CacheIo(e.to_string()))
    }

    /// A monotonically increasing id, reset to zero on every `begin`, for
    /// naming entities created fresh during the run.
    pub fn fresh_id(&mut self) -> u64 {
        let id = self.next_fresh_id;
        self.next_fresh_id += 1;
        id
    }

    pub fn trace(&self) -> &[TraceNode] {
        &self.live_trace
    }

    pub fn is_started(&self) -> bool {
        self.status == SimulationStatus::Started
    }
}
