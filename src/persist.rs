/*!
Persistence glue for board and graph state: explicit serde-friendly shapes
decoupled from the in-memory representations, lenient parsers for loading,
and stable comparison keys for the save coalescer.

This module intentionally does NOT perform I/O. It is pure data
transformation and (de)serialization.

Design notes:
- Loading is lenient: a persisted value whose shape no longer matches is
  treated as absent, so a bad override degrades to fresh derivation rather
  than failing the whole panel.
- Saving is canonical: extras are keyed by board id through a `BTreeMap`, so
  two equal snapshots always serialize to the same comparison key no matter
  what map order the in-memory state iterates in.
*/

use std::collections::BTreeMap;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use crate::boards::{BoardExtras, BoardSet, BoardState};
use crate::column::TableOverrides;
use crate::graph::WorkflowGraph;
use crate::store::TablePatch;
use crate::types::BoardId;

/// Serialization errors for persistence shapes.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistError {
    #[error("JSON serialization failed: {source}")]
    #[diagnostic(
        code(colweave::persist::serde),
        help("The in-memory state contained a value serde_json cannot represent.")
    )]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

/// A serialized board snapshot ready for the save coalescer: the full table
/// patch plus its stable comparison key.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardSnapshot {
    pub key: String,
    pub patch: TablePatch,
}

/// Serializes the current boards/extras/active-id into a [`BoardSnapshot`].
///
/// Extras are filtered to boards that still exist and dropped when empty,
/// then sorted by board id so the comparison key is stable.
pub fn board_snapshot(
    boards: &BoardSet,
    extras: &FxHashMap<BoardId, BoardExtras>,
) -> Result<BoardSnapshot, PersistError> {
    let boards_value = serde_json::to_value(boards.boards())?;
    let sorted: BTreeMap<&str, &BoardExtras> = extras
        .iter()
        .filter(|(id, extra)| !extra.is_empty() && boards.get(id).is_some())
        .map(|(id, extra)| (id.as_str(), extra))
        .collect();
    let extras_value = serde_json::to_value(&sorted)?;
    let patch = TablePatch {
        workflow_boards: Some(boards_value),
        workflow_board_extras: Some(extras_value),
        workflow_active_board_id: boards.active_id().map(|id| id.as_str().to_string()),
    };
    let key = serde_json::to_string(&patch)?;
    Ok(BoardSnapshot { key, patch })
}

/// Lenient parse of the persisted board list. Malformed -> `None`.
#[must_use]
pub fn parse_boards(overrides: &TableOverrides) -> Option<Vec<BoardState>> {
    overrides
        .workflow_boards
        .as_ref()
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

/// Lenient parse of the persisted extras map. Malformed -> empty.
#[must_use]
pub fn parse_extras(overrides: &TableOverrides) -> FxHashMap<BoardId, BoardExtras> {
    overrides
        .workflow_board_extras
        .as_ref()
        .and_then(|value| serde_json::from_value::<FxHashMap<String, BoardExtras>>(value.clone()).ok())
        .map(|map| {
            map.into_iter()
                .map(|(id, extras)| (BoardId::from_raw(id), extras))
                .collect()
        })
        .unwrap_or_default()
}

/// Lenient parse of the persisted active board id. Malformed -> `None`.
#[must_use]
pub fn parse_active_board(overrides: &TableOverrides) -> Option<BoardId> {
    overrides
        .workflow_active_board_id
        .as_ref()
        .and_then(Value::as_str)
        .map(BoardId::from_raw)
}

/// Serializes a column's graph into the value stored under
/// `overrides.workflow_graph`.
pub fn graph_value(graph: &WorkflowGraph) -> Result<Value, PersistError> {
    Ok(serde_json::to_value(graph)?)
}
