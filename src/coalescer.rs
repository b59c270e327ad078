//! Debounced, coalesced persistence of board and graph edits.
//!
//! Two independent save paths, both last-write-wins within their debounce
//! window:
//!
//! - [`BoardSaver`]: a single pending snapshot of the board list, extras and
//!   active id. A snapshot whose comparison key equals the last successful
//!   save is dropped before any timer starts.
//! - [`GraphSaver`]: a pending map of changed columns, flushed as one batch
//!   of independent per-column writes. One failing column never cancels the
//!   others.
//!
//! Timers are generation-counted: every new schedule bumps the generation
//! and spawns a fresh timer task; a timer that wakes to find a newer
//! generation does nothing. Failed writes are logged and emitted as
//! non-fatal events; local state stays authoritative and is retried only by
//! the next natural edit.
//!
//! Both savers are cheap cloneable handles over shared state, so the engine
//! and the spawned timer tasks observe the same pending buffers.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::events::{EventEmitter, SyncEventKind};
use crate::store::{ColumnPatch, ColumnStore, TablePatch};

/// Debounced saver for the table-level board snapshot.
#[derive(Clone)]
pub struct BoardSaver {
    inner: Arc<BoardSaverInner>,
}

struct BoardSaverInner {
    store: Arc<dyn ColumnStore>,
    table_id: String,
    debounce: Duration,
    events: EventEmitter,
    state: Mutex<BoardSaverState>,
}

#[derive(Default)]
struct BoardSaverState {
    pending: Option<PendingBoardSave>,
    last_saved_key: Option<String>,
    generation: u64,
}

struct PendingBoardSave {
    key: String,
    patch: TablePatch,
}

impl BoardSaver {
    pub fn new(
        store: Arc<dyn ColumnStore>,
        table_id: impl Into<String>,
        debounce: Duration,
        events: EventEmitter,
    ) -> Self {
        Self {
            inner: Arc::new(BoardSaverInner {
                store,
                table_id: table_id.into(),
                debounce,
                events,
                state: Mutex::new(BoardSaverState::default()),
            }),
        }
    }

    /// Schedules a snapshot write. No-op when `key` matches the last
    /// successful save and nothing newer is pending; otherwise replaces the
    /// pending snapshot and restarts the debounce timer.
    pub async fn schedule(&self, key: String, patch: TablePatch) {
        let generation = {
            let mut state = self.inner.state.lock().await;
            if state.pending.is_none() && state.last_saved_key.as_deref() == Some(key.as_str()) {
                return;
            }
            state.generation += 1;
            state.pending = Some(PendingBoardSave { key, patch });
            state.generation
        };
        let deadline = tokio::time::Instant::now() + self.inner.debounce;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(inner.flush_after(generation, deadline));
    }
}

impl BoardSaverInner {
    async fn flush_after(self: Arc<Self>, generation: u64, deadline: tokio::time::Instant) {
        tokio::time::sleep_until(deadline).await;
        let pending = {
            let mut state = self.state.lock().await;
            if state.generation != generation {
                return;
            }
            state.pending.take()
        };
        let Some(PendingBoardSave { key, patch }) = pending else {
            return;
        };
        match self.store.override_table(&self.table_id, patch).await {
            Ok(()) => {
                self.state.lock().await.last_saved_key = Some(key);
                self.events.emit(SyncEventKind::BoardSaved);
            }
            Err(error) => {
                tracing::warn!(%error, table = %self.table_id, "board save failed");
                self.events.emit(SyncEventKind::BoardSaveFailed {
                    reason: error.to_string(),
                });
            }
        }
    }
}

/// Debounced, batched saver for per-column graph overrides.
#[derive(Clone)]
pub struct GraphSaver {
    inner: Arc<GraphSaverInner>,
}

struct GraphSaverInner {
    store: Arc<dyn ColumnStore>,
    table_id: String,
    debounce: Duration,
    events: EventEmitter,
    state: Mutex<GraphSaverState>,
}

#[derive(Default)]
struct GraphSaverState {
    pending: FxHashMap<String, Value>,
    generation: u64,
}

impl GraphSaver {
    pub fn new(
        store: Arc<dyn ColumnStore>,
        table_id: impl Into<String>,
        debounce: Duration,
        events: EventEmitter,
    ) -> Self {
        Self {
            inner: Arc::new(GraphSaverInner {
                store,
                table_id: table_id.into(),
                debounce,
                events,
                state: Mutex::new(GraphSaverState::default()),
            }),
        }
    }

    /// Accumulates one column's serialized graph and restarts the debounce
    /// timer for the whole pending batch.
    pub async fn schedule(&self, column: impl Into<String>, graph: Value) {
        let generation = {
            let mut state = self.inner.state.lock().await;
            state.pending.insert(column.into(), graph);
            state.generation += 1;
            state.generation
        };
        let deadline = tokio::time::Instant::now() + self.inner.debounce;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(inner.flush_after(generation, deadline));
    }
}

impl GraphSaverInner {
    async fn flush_after(self: Arc<Self>, generation: u64, deadline: tokio::time::Instant) {
        tokio::time::sleep_until(deadline).await;
        let batch = {
            let mut state = self.state.lock().await;
            if state.generation != generation {
                return;
            }
            std::mem::take(&mut state.pending)
        };
        if batch.is_empty() {
            return;
        }
        // Independent requests: one failing column must not cancel the rest.
        let saves = batch.into_iter().map(|(column, graph)| {
            let store = Arc::clone(&self.store);
            let table_id = self.table_id.clone();
            async move {
                let result = store
                    .override_column(&table_id, &column, ColumnPatch::workflow_graph(graph))
                    .await;
                (column, result)
            }
        });
        for (column, result) in join_all(saves).await {
            match result {
                Ok(()) => self.events.emit(SyncEventKind::ColumnGraphSaved { column }),
                Err(error) => {
                    tracing::warn!(%error, %column, "column graph save failed");
                    self.events.emit(SyncEventKind::ColumnGraphSaveFailed {
                        column,
                        reason: error.to_string(),
                    });
                }
            }
        }
    }
}
