//! Board partitioning of a table's columns.
//!
//! A board is a named, user-defined partition of the table's columns with
//! its own layout and selection. The hard invariant maintained here is
//! ownership: every column of the table appears in exactly one board's
//! `column_names`. [`BoardSet::repair`] restores it after every mutation by
//! deduplicating (first board wins), re-adding orphaned columns to the first
//! board, and pruning boards left with zero columns.

use miette::Diagnostic;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{WorkflowEdge, WorkflowNode};
use crate::types::BoardId;

/// Name of the board created when no persisted board survives a reconcile.
pub const DEFAULT_BOARD_NAME: &str = "Board 1";

/// Errors raised by board mutations.
#[derive(Debug, Error, Diagnostic)]
pub enum BoardError {
    /// A board is never created with an empty column set.
    #[error("a board must own at least one column")]
    #[diagnostic(code(colweave::boards::empty_board))]
    EmptyBoard,

    #[error("unknown board: {0}")]
    #[diagnostic(code(colweave::boards::unknown_board))]
    UnknownBoard(String),

    /// Split moves only columns that are owned by the source board and not
    /// currently selected.
    #[error("column `{column}` cannot be split off: not an unselected column of the source board")]
    #[diagnostic(
        code(colweave::boards::invalid_split),
        help("Only unselected columns of the source board can move to a new board.")
    )]
    InvalidSplit { column: String },
}

/// One board: a named slice of the table's columns plus its selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    pub id: BoardId,
    pub name: String,
    #[serde(default)]
    pub column_names: Vec<String>,
    /// Subset of `column_names`, kept in column order.
    #[serde(default)]
    pub selected_columns: Vec<String>,
}

impl BoardState {
    /// Creates a board owning `columns`. Selection defaults to all columns
    /// when none is given; a given selection is filtered to the column set
    /// and reordered to column order.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        selected: Option<Vec<String>>,
    ) -> Result<Self, BoardError> {
        if columns.is_empty() {
            return Err(BoardError::EmptyBoard);
        }
        let mut board = Self {
            id: BoardId::new(),
            name: name.into(),
            selected_columns: selected.unwrap_or_else(|| columns.clone()),
            column_names: columns,
        };
        board.normalize_selection();
        Ok(board)
    }

    #[must_use]
    pub fn is_selected(&self, column_name: &str) -> bool {
        self.selected_columns.iter().any(|c| c == column_name)
    }

    /// The board's columns that are not currently selected, in column order.
    /// This is what the "split" verb moves to a new board.
    #[must_use]
    pub fn unselected_columns(&self) -> Vec<String> {
        self.column_names
            .iter()
            .filter(|c| !self.is_selected(c))
            .cloned()
            .collect()
    }

    /// Toggles one column's selection, keeping the selection in column order.
    pub fn toggle_selection(&mut self, column_name: &str) {
        if self.is_selected(column_name) {
            self.selected_columns.retain(|c| c != column_name);
        } else {
            let next: Vec<String> = {
                let mut keep: FxHashSet<&str> =
                    self.selected_columns.iter().map(String::as_str).collect();
                keep.insert(column_name);
                self.column_names
                    .iter()
                    .filter(|c| keep.contains(c.as_str()))
                    .cloned()
                    .collect()
            };
            self.selected_columns = next;
        }
    }

    // Selection := column order filtered to the current selection set.
    fn normalize_selection(&mut self) {
        let next: Vec<String> = {
            let keep: FxHashSet<&str> =
                self.selected_columns.iter().map(String::as_str).collect();
            self.column_names
                .iter()
                .filter(|c| keep.contains(c.as_str()))
                .cloned()
                .collect()
        };
        self.selected_columns = next;
    }
}

/// Board-owned nodes and edges that belong to no single column: free-floating
/// annotations and cross-column connectors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardExtras {
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

impl BoardExtras {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// The full board list plus the active board id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoardSet {
    boards: Vec<BoardState>,
    active: Option<BoardId>,
}

impl BoardSet {
    /// Rebuilds the board set from persisted state against the current
    /// column universe.
    ///
    /// Each persisted board is filtered to columns that still exist (a
    /// column claimed by two boards stays with the first), boards left empty
    /// are dropped, and columns assigned to no board are appended to the
    /// first surviving board - or to a fresh default board when none
    /// survive. The persisted active id is honored when it still names a
    /// board.
    #[must_use]
    pub fn reconcile_on_load(
        persisted: Option<Vec<BoardState>>,
        active: Option<BoardId>,
        current_columns: &[String],
    ) -> Self {
        let mut set = Self {
            boards: persisted.unwrap_or_default(),
            active,
        };
        set.repair(current_columns);
        set
    }

    #[must_use]
    pub fn boards(&self) -> &[BoardState] {
        &self.boards
    }

    #[must_use]
    pub fn active_id(&self) -> Option<&BoardId> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn active_board(&self) -> Option<&BoardState> {
        let id = self.active.as_ref()?;
        self.boards.iter().find(|b| &b.id == id)
    }

    pub fn active_board_mut(&mut self) -> Option<&mut BoardState> {
        let id = self.active.clone()?;
        self.boards.iter_mut().find(|b| b.id == id)
    }

    #[must_use]
    pub fn get(&self, id: &BoardId) -> Option<&BoardState> {
        self.boards.iter().find(|b| &b.id == id)
    }

    pub fn set_active(&mut self, id: &BoardId) -> Result<(), BoardError> {
        if self.boards.iter().any(|b| &b.id == id) {
            self.active = Some(id.clone());
            Ok(())
        } else {
            Err(BoardError::UnknownBoard(id.to_string()))
        }
    }

    /// Creates a board owning `columns`, reassigning them away from any
    /// board that currently owns them. Returns the new board's id.
    pub fn create_board(
        &mut self,
        name: impl Into<String>,
        columns: Vec<String>,
        selected: Option<Vec<String>>,
    ) -> Result<BoardId, BoardError> {
        let board = BoardState::new(name, columns, selected)?;
        let moving: FxHashSet<&str> = board.column_names.iter().map(String::as_str).collect();
        for existing in &mut self.boards {
            existing.column_names.retain(|c| !moving.contains(c.as_str()));
            existing.normalize_selection();
        }
        self.boards.retain(|b| !b.column_names.is_empty());
        let id = board.id.clone();
        self.boards.push(board);
        self.fix_active();
        Ok(id)
    }

    /// Moves `columns_to_move` off the source board onto a new, fully
    /// selected board, which becomes active.
    ///
    /// The moved columns must be owned by the source board and not currently
    /// selected (the UI verb is "move everything I haven't selected to a new
    /// board"). An empty move list is a no-op returning `Ok(None)`.
    pub fn split_board(
        &mut self,
        source: &BoardId,
        columns_to_move: &[String],
        new_name: impl Into<String>,
    ) -> Result<Option<BoardId>, BoardError> {
        let index = self
            .boards
            .iter()
            .position(|b| &b.id == source)
            .ok_or_else(|| BoardError::UnknownBoard(source.to_string()))?;
        if columns_to_move.is_empty() {
            return Ok(None);
        }
        {
            let src = &self.boards[index];
            for column in columns_to_move {
                let owned = src.column_names.iter().any(|c| c == column);
                if !owned || src.is_selected(column) {
                    return Err(BoardError::InvalidSplit {
                        column: column.clone(),
                    });
                }
            }
        }
        // Move in source-board column order.
        let moving: Vec<String> = self.boards[index]
            .column_names
            .iter()
            .filter(|c| columns_to_move.contains(c))
            .cloned()
            .collect();
        {
            let src = &mut self.boards[index];
            src.column_names.retain(|c| !columns_to_move.contains(c));
            src.normalize_selection();
        }
        let board = BoardState::new(new_name, moving, None)?;
        let id = board.id.clone();
        self.boards.push(board);
        self.boards.retain(|b| !b.column_names.is_empty());
        self.active = Some(id.clone());
        Ok(Some(id))
    }

    /// Restores the ownership invariant against `universe`: filters each
    /// board to existing columns, dedupes across boards (first board wins),
    /// prunes emptied boards, appends orphaned columns to the first
    /// surviving board (creating a default board when none survive), and
    /// revalidates the active id.
    ///
    /// The board carrying the orphans falls back to an all-columns selection
    /// only when its filtered selection would otherwise be empty.
    pub fn repair(&mut self, universe: &[String]) {
        let known: FxHashSet<&str> = universe.iter().map(String::as_str).collect();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        for board in &mut self.boards {
            board
                .column_names
                .retain(|c| known.contains(c.as_str()) && seen.insert(c.clone()));
            board.normalize_selection();
        }
        self.boards.retain(|b| !b.column_names.is_empty());

        let unassigned: Vec<String> = universe
            .iter()
            .filter(|c| !seen.contains(c.as_str()))
            .cloned()
            .collect();
        if !unassigned.is_empty() {
            if self.boards.is_empty() {
                self.boards.push(BoardState {
                    id: BoardId::new(),
                    name: DEFAULT_BOARD_NAME.to_string(),
                    selected_columns: unassigned.clone(),
                    column_names: unassigned,
                });
            } else {
                let first = &mut self.boards[0];
                first.column_names.extend(unassigned);
                if first.selected_columns.is_empty() {
                    first.selected_columns = first.column_names.clone();
                }
            }
        }
        self.fix_active();
    }

    /// Test hook: `true` when every column of `universe` appears in exactly
    /// one board and boards own nothing else.
    #[must_use]
    pub fn is_partition_of(&self, universe: &[String]) -> bool {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for board in &self.boards {
            for column in &board.column_names {
                if !seen.insert(column.as_str()) {
                    return false;
                }
            }
        }
        seen.len() == universe.len() && universe.iter().all(|c| seen.contains(c.as_str()))
    }

    fn fix_active(&mut self) {
        let valid = self
            .active
            .as_ref()
            .is_some_and(|id| self.boards.iter().any(|b| &b.id == id));
        if !valid {
            self.active = self.boards.first().map(|b| b.id.clone());
        }
    }
}
