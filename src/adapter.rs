//! The graph-editor adapter boundary.
//!
//! The canvas renders one combined node/edge list for the active board and
//! reports the full list back on every change. This module translates in
//! both directions: [`compose_board_graph`] builds the combined list from
//! per-column hydrated graphs plus the board's extras, and
//! [`split_canvas_graph`] partitions a reported list back into per-column
//! graphs and extras.
//!
//! Edge ownership on the way back in is deliberately asymmetric: an edge
//! between two column-owned nodes of *different* columns is dropped (it has
//! no owner to persist under), while any edge touching an extras node is
//! kept in the board's extras - including cross-column connectors drawn
//! through annotation nodes.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::boards::{BoardExtras, BoardState};
use crate::graph::{WorkflowEdge, WorkflowGraph, WorkflowNode};

/// Builds the combined canvas document for one board: each owned column's
/// hydrated graph in board column order, then the board's extras.
#[must_use]
pub fn compose_board_graph(
    board: &BoardState,
    graphs: &FxHashMap<String, WorkflowGraph>,
    extras: &BoardExtras,
) -> WorkflowGraph {
    let mut nodes: Vec<WorkflowNode> = Vec::new();
    let mut edges: Vec<WorkflowEdge> = Vec::new();
    for column in &board.column_names {
        if let Some(graph) = graphs.get(column) {
            nodes.extend(graph.nodes.iter().cloned());
            edges.extend(graph.edges.iter().cloned());
        }
    }
    nodes.extend(extras.nodes.iter().cloned());
    edges.extend(extras.edges.iter().cloned());
    WorkflowGraph::new(nodes, edges)
}

/// The result of partitioning a canvas-reported node/edge list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CanvasSplit {
    /// Per-column graphs, keyed by owning column.
    pub columns: FxHashMap<String, WorkflowGraph>,
    /// Board-owned leftovers: identity-less nodes and every edge touching
    /// one.
    pub extras: BoardExtras,
}

/// Splits the canvas's full node/edge list by owning column.
///
/// Nodes with a column identity go to that column's graph; identity-less
/// nodes go to extras. Edges resolve as:
///
/// - both endpoints owned by the same column -> that column's graph
/// - both endpoints owned by different columns -> dropped
/// - any endpoint is an extras node -> extras
/// - any endpoint missing from the canvas -> dropped
#[must_use]
pub fn split_canvas_graph(nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) -> CanvasSplit {
    let mut split = CanvasSplit::default();
    let mut owner: FxHashMap<String, String> = FxHashMap::default();
    let mut extra_ids: FxHashSet<String> = FxHashSet::default();

    for node in nodes {
        match node.column_name().map(str::to_string) {
            Some(column) => {
                owner.insert(node.id.clone(), column.clone());
                split.columns.entry(column).or_default().nodes.push(node);
            }
            None => {
                extra_ids.insert(node.id.clone());
                split.extras.nodes.push(node);
            }
        }
    }

    for edge in edges {
        let known = |id: &str| owner.contains_key(id) || extra_ids.contains(id);
        if !known(&edge.source) || !known(&edge.target) {
            continue;
        }
        match (owner.get(&edge.source), owner.get(&edge.target)) {
            (Some(a), Some(b)) if a == b => {
                if let Some(graph) = split.columns.get_mut(a) {
                    graph.edges.push(edge);
                }
            }
            // Cross-column edge between two derived nodes: no owner to
            // persist under.
            (Some(_), Some(_)) => {}
            _ => split.extras.edges.push(edge),
        }
    }

    split
}

/// Translates a canvas node-id selection into the board's column selection,
/// ordered by the board's column order.
#[must_use]
pub fn columns_for_selection(
    node_ids: &[String],
    board: &BoardState,
    graphs: &FxHashMap<String, WorkflowGraph>,
) -> Vec<String> {
    board
        .column_names
        .iter()
        .filter(|column| {
            graphs
                .get(*column)
                .is_some_and(|graph| node_ids.iter().any(|id| graph.contains_node(id)))
        })
        .cloned()
        .collect()
}
