//! The synchronization engine facade.
//!
//! [`SyncEngine`] owns the in-memory state (column records, boards, extras,
//! hydrated per-column graphs, the selection echo guard) and exposes the
//! reducer-style operations the surrounding UI calls into. All merge work
//! goes through the pure functions in [`crate::graph`], [`crate::boards`]
//! and [`crate::adapter`]; all durable writes go through the debounced
//! savers in [`crate::coalescer`]. The UI reads immutable
//! [`PanelSnapshot`] views and never touches the state directly.
//!
//! Error taxonomy: a failed initial load is blocking ([`EngineError::Load`],
//! not retried automatically); failed saves are non-fatal events; failed
//! run/estimate requests are surfaced per column while the rest of the
//! batch proceeds; malformed persisted overrides degrade to fresh
//! derivation.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use thiserror::Error;

use crate::adapter;
use crate::boards::{BoardError, BoardExtras, BoardSet, BoardState};
use crate::coalescer::{BoardSaver, GraphSaver};
use crate::column::{ChecklistGroup, ColumnRecord, TableRef, checklist_groups};
use crate::config::SyncConfig;
use crate::events::{EventBus, SyncEventKind};
use crate::graph::{StepParams, WorkflowEdge, WorkflowGraph, WorkflowNode, hydrate_column};
use crate::persist;
use crate::selection::SelectionSync;
use crate::store::{
    ColumnStore, EstimateResponse, RunBackend, RunOptions, RunResponse, RunSelectedRequest,
    StoreError,
};
use crate::types::{BoardId, NodeStatus, StepKind};

/// Errors surfaced by engine operations.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    /// The metadata fetch/initialize failed. Blocking for the whole panel.
    #[error("metadata load failed: {source}")]
    #[diagnostic(
        code(colweave::engine::load),
        help("The column record store is unreachable or returned an invalid payload.")
    )]
    Load {
        #[source]
        source: StoreError,
    },

    #[error("no board is active")]
    #[diagnostic(code(colweave::engine::no_active_board))]
    NoActiveBoard,

    #[error("unknown column: {0}")]
    #[diagnostic(code(colweave::engine::unknown_column))]
    UnknownColumn(String),

    /// A run/estimate request failed for the addressed column.
    #[error("run request failed: {source}")]
    #[diagnostic(code(colweave::engine::run))]
    Run {
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Board(#[from] BoardError),
}

/// Immutable view of the panel state for the UI.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelSnapshot {
    pub table: TableRef,
    pub boards: Vec<BoardState>,
    pub active_board_id: Option<BoardId>,
    /// Combined node/edge list for the active board: hydrated per-column
    /// graphs plus board extras.
    pub canvas: WorkflowGraph,
    /// Active board columns grouped by semantic type for the checklist.
    pub checklist: Vec<ChecklistGroup>,
}

/// The column workflow graph synchronization engine.
pub struct SyncEngine {
    table: TableRef,
    columns: Vec<ColumnRecord>,
    boards: BoardSet,
    extras: FxHashMap<BoardId, BoardExtras>,
    graphs: FxHashMap<String, WorkflowGraph>,
    selection: SelectionSync,
    board_saver: BoardSaver,
    graph_saver: GraphSaver,
    backend: Arc<dyn RunBackend>,
    events: EventBus,
}

impl SyncEngine {
    /// Loads the table and builds the engine.
    ///
    /// Fetches the column records (falling back to `initialize` when the
    /// table has none yet), leniently parses the persisted board state,
    /// reconciles it against the current column set, and hydrates every
    /// column's graph with its layout slot inside its owning board.
    pub async fn load(
        store: Arc<dyn ColumnStore>,
        backend: Arc<dyn RunBackend>,
        table_id: &str,
        config: SyncConfig,
    ) -> Result<Self, EngineError> {
        let payload = store
            .get(table_id)
            .await
            .map_err(|source| EngineError::Load { source })?;
        let payload = if payload.columns.is_empty() {
            store
                .initialize(table_id)
                .await
                .map_err(|source| EngineError::Load { source })?
        } else {
            payload
        };

        let table_name = if payload.table.name.is_empty() {
            table_id
        } else {
            payload.table.name.as_str()
        };
        let table = TableRef::new(table_id, table_name);
        let column_names: Vec<String> = payload
            .columns
            .iter()
            .map(|c| c.column_name.clone())
            .collect();

        let boards = BoardSet::reconcile_on_load(
            persist::parse_boards(&payload.table.overrides),
            persist::parse_active_board(&payload.table.overrides),
            &column_names,
        );
        let mut extras = persist::parse_extras(&payload.table.overrides);
        extras.retain(|id, _| boards.get(id).is_some());

        let by_name: FxHashMap<&str, &ColumnRecord> = payload
            .columns
            .iter()
            .map(|c| (c.column_name.as_str(), c))
            .collect();
        let mut graphs: FxHashMap<String, WorkflowGraph> = FxHashMap::default();
        for board in boards.boards() {
            for (layout_index, name) in board.column_names.iter().enumerate() {
                if let Some(column) = by_name.get(name.as_str()) {
                    graphs.insert(name.clone(), hydrate_column(&table, column, layout_index));
                }
            }
        }

        let events = EventBus::new(config.event_capacity);
        let board_saver = BoardSaver::new(
            Arc::clone(&store),
            table_id,
            config.board_debounce,
            events.emitter(),
        );
        let graph_saver = GraphSaver::new(store, table_id, config.graph_debounce, events.emitter());

        Ok(Self {
            table,
            columns: payload.columns,
            boards,
            extras,
            graphs,
            selection: SelectionSync::with_window(config.echo_window),
            board_saver,
            graph_saver,
            backend,
            events,
        })
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    #[must_use]
    pub fn table(&self) -> &TableRef {
        &self.table
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnRecord] {
        &self.columns
    }

    #[must_use]
    pub fn boards(&self) -> &[BoardState] {
        self.boards.boards()
    }

    #[must_use]
    pub fn active_board(&self) -> Option<&BoardState> {
        self.boards.active_board()
    }

    #[must_use]
    pub fn column_graph(&self, column_name: &str) -> Option<&WorkflowGraph> {
        self.graphs.get(column_name)
    }

    #[must_use]
    pub fn board_extras(&self, id: &BoardId) -> Option<&BoardExtras> {
        self.extras.get(id)
    }

    /// The diagnostic event bus (save/run outcomes).
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Builds the immutable snapshot the UI renders from.
    #[must_use]
    pub fn snapshot(&self) -> PanelSnapshot {
        let (canvas, checklist) = match self.boards.active_board() {
            Some(board) => {
                let empty = BoardExtras::default();
                let extras = self.extras.get(&board.id).unwrap_or(&empty);
                let canvas = adapter::compose_board_graph(board, &self.graphs, extras);
                let records: Vec<&ColumnRecord> = board
                    .column_names
                    .iter()
                    .filter_map(|name| self.column(name))
                    .collect();
                let checklist = checklist_groups(records, &board.selected_columns);
                (canvas, checklist)
            }
            None => (WorkflowGraph::default(), Vec::new()),
        };
        PanelSnapshot {
            table: self.table.clone(),
            boards: self.boards.boards().to_vec(),
            active_board_id: self.boards.active_id().cloned(),
            canvas,
            checklist,
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Checklist toggle for one column of the active board.
    ///
    /// Arms the echo guard before applying, so the canvas event this toggle
    /// triggers is recognized as an echo and not re-applied.
    pub async fn toggle_column(
        &mut self,
        column_name: &str,
        now: Instant,
    ) -> Result<(), EngineError> {
        {
            let Some(active) = self.boards.active_board_mut() else {
                return Err(EngineError::NoActiveBoard);
            };
            if !active.column_names.iter().any(|c| c == column_name) {
                return Err(EngineError::UnknownColumn(column_name.to_string()));
            }
            self.selection.note_list_toggle(now);
            active.toggle_selection(column_name);
        }
        self.schedule_board_save().await;
        Ok(())
    }

    /// Canvas-originated selection event carrying the selected node ids.
    ///
    /// Empty events are dropped outright (canvases report empty selection
    /// transiently); the first event after a checklist toggle is consumed as
    /// its echo; anything else is translated node id -> owning column and
    /// becomes the active board's new selection.
    pub async fn canvas_selection(
        &mut self,
        node_ids: &[String],
        now: Instant,
    ) -> Result<(), EngineError> {
        if node_ids.is_empty() {
            return Ok(());
        }
        if self.selection.on_canvas_event(now).is_suppressed() {
            return Ok(());
        }
        let selected = {
            let active = self.boards.active_board().ok_or(EngineError::NoActiveBoard)?;
            adapter::columns_for_selection(node_ids, active, &self.graphs)
        };
        if let Some(active) = self.boards.active_board_mut() {
            active.selected_columns = selected;
        }
        self.schedule_board_save().await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Canvas content
    // ------------------------------------------------------------------

    /// Canvas content callback: the editor's full current node/edge list.
    ///
    /// Splits the list by owning column, updates the graphs that actually
    /// changed (scheduling a per-column graph save for each) and the active
    /// board's extras (scheduling a board save when they changed).
    pub async fn canvas_changed(
        &mut self,
        nodes: Vec<WorkflowNode>,
        edges: Vec<WorkflowEdge>,
    ) -> Result<(), EngineError> {
        let active_id = self
            .boards
            .active_id()
            .cloned()
            .ok_or(EngineError::NoActiveBoard)?;
        let board_columns: FxHashSet<String> = self
            .boards
            .get(&active_id)
            .map(|b| b.column_names.iter().cloned().collect())
            .unwrap_or_default();

        let split = adapter::split_canvas_graph(nodes, edges);

        for (column, graph) in split.columns {
            if !board_columns.contains(&column) {
                tracing::debug!(%column, "ignoring canvas nodes for a column not on the active board");
                continue;
            }
            if self.graphs.get(&column).is_some_and(|g| *g == graph) {
                continue;
            }
            match persist::graph_value(&graph) {
                Ok(value) => {
                    self.graphs.insert(column.clone(), graph);
                    self.graph_saver.schedule(column, value).await;
                }
                Err(error) => {
                    tracing::warn!(%error, %column, "failed to serialize column graph");
                }
            }
        }

        let extras_changed = match self.extras.get(&active_id) {
            Some(current) => *current != split.extras,
            None => !split.extras.is_empty(),
        };
        if extras_changed {
            self.extras.insert(active_id, split.extras);
            self.schedule_board_save().await;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Boards
    // ------------------------------------------------------------------

    /// Moves the active board's unselected columns to a new, fully selected
    /// board, which becomes active. With everything selected there is
    /// nothing to move and the call is a no-op returning `Ok(None)`.
    pub async fn split_active_board(
        &mut self,
        new_name: &str,
    ) -> Result<Option<BoardId>, EngineError> {
        let active_id = self
            .boards
            .active_id()
            .cloned()
            .ok_or(EngineError::NoActiveBoard)?;
        let to_move = self
            .boards
            .get(&active_id)
            .map(BoardState::unselected_columns)
            .unwrap_or_default();
        let created = self.boards.split_board(&active_id, &to_move, new_name)?;
        if created.is_some() {
            self.repair_boards();
            self.schedule_board_save().await;
        }
        Ok(created)
    }

    /// Creates a board owning `columns`, reassigning them from their current
    /// boards.
    pub async fn create_board(
        &mut self,
        name: &str,
        columns: Vec<String>,
        selected: Option<Vec<String>>,
    ) -> Result<BoardId, EngineError> {
        for column in &columns {
            if self.column(column).is_none() {
                return Err(EngineError::UnknownColumn(column.clone()));
            }
        }
        let id = self.boards.create_board(name, columns, selected)?;
        self.repair_boards();
        self.schedule_board_save().await;
        Ok(id)
    }

    pub async fn set_active_board(&mut self, id: &BoardId) -> Result<(), EngineError> {
        self.boards.set_active(id)?;
        self.schedule_board_save().await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Run / estimate orchestration
    // ------------------------------------------------------------------

    /// Requests token estimates for the active board's selected columns,
    /// concurrently. Partial success is valid; each column's outcome is
    /// returned and emitted as an event.
    pub async fn estimate_columns(
        &self,
    ) -> Result<Vec<(String, Result<EstimateResponse, StoreError>)>, EngineError> {
        let columns = self.active_selected()?;
        let requests: Vec<_> = columns
            .iter()
            .map(|column| {
                let backend = Arc::clone(&self.backend);
                let table_id = self.table.id.clone();
                let column = column.clone();
                async move {
                    let result = backend.estimate(&table_id, &column).await;
                    (column, result)
                }
            })
            .collect();
        let results = join_all(requests).await;
        for (column, result) in &results {
            match result {
                Ok(estimate) => self.events.emitter().emit(SyncEventKind::EstimateReady {
                    column: column.clone(),
                    total_tokens: estimate.total_tokens,
                }),
                Err(error) => self.events.emitter().emit(SyncEventKind::EstimateFailed {
                    column: column.clone(),
                    reason: error.to_string(),
                }),
            }
        }
        Ok(results)
    }

    /// Runs the active board's selected columns, concurrently.
    ///
    /// Node statuses transition idle -> running -> success/error in memory;
    /// one failing column never blocks the others.
    pub async fn run_columns(
        &mut self,
    ) -> Result<Vec<(String, Result<RunResponse, StoreError>)>, EngineError> {
        let columns = self.active_selected()?;
        for column in &columns {
            self.set_column_status(column, NodeStatus::Running);
        }
        let requests: Vec<_> = columns
            .iter()
            .map(|column| {
                let backend = Arc::clone(&self.backend);
                let table_id = self.table.id.clone();
                let options = RunOptions {
                    focus: self.column_focus(column),
                };
                let column = column.clone();
                async move {
                    let result = backend.run(&table_id, &column, options).await;
                    (column, result)
                }
            })
            .collect();
        let results = join_all(requests).await;
        for (column, result) in &results {
            self.apply_run_result(column, result);
        }
        Ok(results)
    }

    /// Re-runs a chosen subset of one column's workflow tool calls.
    pub async fn run_column_tools(
        &mut self,
        column_name: &str,
        tool_calls: Vec<Value>,
    ) -> Result<RunResponse, EngineError> {
        if self.column(column_name).is_none() {
            return Err(EngineError::UnknownColumn(column_name.to_string()));
        }
        self.set_column_status(column_name, NodeStatus::Running);
        let request = RunSelectedRequest {
            tool_calls,
            focus: self.column_focus(column_name),
        };
        let result = self
            .backend
            .run_selected(&self.table.id, column_name, request)
            .await;
        self.apply_run_result(column_name, &result);
        result.map_err(|source| EngineError::Run { source })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn column(&self, column_name: &str) -> Option<&ColumnRecord> {
        self.columns.iter().find(|c| c.column_name == column_name)
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.column_name.clone()).collect()
    }

    fn active_selected(&self) -> Result<Vec<String>, EngineError> {
        Ok(self
            .boards
            .active_board()
            .ok_or(EngineError::NoActiveBoard)?
            .selected_columns
            .clone())
    }

    fn repair_boards(&mut self) {
        let universe = self.column_names();
        self.boards.repair(&universe);
        let Self { boards, extras, .. } = self;
        extras.retain(|id, _| boards.get(id).is_some());
    }

    fn column_focus(&self, column_name: &str) -> Option<String> {
        self.graphs
            .get(column_name)?
            .nodes
            .iter()
            .find_map(|node| match &node.data.params {
                StepParams::GenerateInsights { focus } => Some(focus.clone()),
                _ => None,
            })
    }

    fn set_column_status(&mut self, column_name: &str, status: NodeStatus) {
        if let Some(graph) = self.graphs.get_mut(column_name) {
            for node in &mut graph.nodes {
                if node.kind() != StepKind::Comment {
                    node.data.status = status;
                }
            }
        }
    }

    fn apply_run_result(&mut self, column: &str, result: &Result<RunResponse, StoreError>) {
        match result {
            Ok(response) => {
                let status = if response.succeeded() {
                    NodeStatus::Success
                } else {
                    NodeStatus::Error
                };
                self.set_column_status(column, status);
                self.events.emitter().emit(SyncEventKind::RunFinished {
                    column: column.to_string(),
                    workflow_id: response.workflow_id.clone(),
                    status,
                });
            }
            Err(error) => {
                self.set_column_status(column, NodeStatus::Error);
                self.events.emitter().emit(SyncEventKind::RunFailed {
                    column: column.to_string(),
                    reason: error.to_string(),
                });
            }
        }
    }

    async fn schedule_board_save(&self) {
        match persist::board_snapshot(&self.boards, &self.extras) {
            Ok(snapshot) => self.board_saver.schedule(snapshot.key, snapshot.patch).await,
            Err(error) => tracing::warn!(%error, "failed to serialize board snapshot"),
        }
    }
}
