//! Hydration: merging a derived graph with a persisted user-edited graph.
//!
//! This merge is the load-bearing invariant of the whole engine. It is a
//! pure function over copies (no error can corrupt in-memory state), it is
//! idempotent (hydrating an already-hydrated graph with itself yields the
//! same graph), and it never drops a user customization that still has a
//! valid target node.
//!
//! Merge rules, per node of the derived base graph:
//!
//! - A stored node with the same id overlays its title (when non-empty),
//!   status, step parameters (when the stored variant matches the derived
//!   kind) and position onto the derived defaults.
//! - Identity fields (`column_name`, `column_type`, `column_confidence`,
//!   `table_id`, and the source node's `table_name`) are force-refreshed
//!   from the *current* column record; they must never go stale even when
//!   the user edited other fields.
//! - Stored nodes absent from the base graph (e.g. an extra analysis step
//!   the user inserted into the chain) are kept verbatim, stamped with the
//!   same fresh identity. Comment nodes keep no identity.
//! - The stored edge list is filtered to edges whose endpoints exist in the
//!   merged node set; if that empties the list, the freshly derived edges
//!   are used instead, so a column's chain is never left fully
//!   disconnected.

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;

use crate::column::{ColumnRecord, TableRef};
use crate::graph::{
    ColumnIdentity, StepParams, WorkflowEdge, WorkflowGraph, WorkflowNode, derive_graph,
    parse_stored_graph,
};
use crate::types::StepKind;

/// Merges `base` (freshly derived) with a persisted `stored` override.
///
/// A missing or shape-invalid override returns `base` unchanged.
///
/// # Examples
///
/// ```
/// use colweave::column::{ColumnRecord, TableRef};
/// use colweave::graph::{derive_graph, hydrate};
/// use colweave::types::SemanticType;
///
/// let table = TableRef::new("tbl_1", "orders");
/// let price = ColumnRecord::new("price", SemanticType::Numeric, 0.9);
/// let base = derive_graph(&table, &price, 0);
///
/// // A renamed node survives hydration.
/// let mut edited = base.clone();
/// edited.nodes[1].data.title = "Charts".to_string();
/// let stored = serde_json::to_value(&edited).unwrap();
///
/// let hydrated = hydrate(&table, &price, &base, Some(&stored));
/// assert_eq!(hydrated.nodes[1].data.title, "Charts");
/// assert_eq!(hydrated.edges, base.edges);
/// ```
#[must_use]
pub fn hydrate(
    table: &TableRef,
    column: &ColumnRecord,
    base: &WorkflowGraph,
    stored: Option<&Value>,
) -> WorkflowGraph {
    let Some(stored_graph) = stored.and_then(parse_stored_graph) else {
        return base.clone();
    };

    let identity = ColumnIdentity::of(table, column);
    let stored_by_id: FxHashMap<&str, &WorkflowNode> = stored_graph
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n))
        .collect();

    let mut merged: Vec<WorkflowNode> = Vec::with_capacity(base.nodes.len());
    for base_node in &base.nodes {
        let mut node = base_node.clone();
        if let Some(stored_node) = stored_by_id.get(node.id.as_str()) {
            node.position = stored_node.position;
            if !stored_node.data.title.is_empty() {
                node.data.title = stored_node.data.title.clone();
            }
            node.data.status = stored_node.data.status;
            if stored_node.kind() == node.kind() {
                node.data.params = stored_node.data.params.clone();
            }
        }
        refresh_identity(&mut node, &identity, table);
        merged.push(node);
    }

    // User-inserted nodes: anything stored that derivation no longer (or
    // never) produces is kept verbatim.
    let base_ids: FxHashSet<&str> = base.nodes.iter().map(|n| n.id.as_str()).collect();
    for stored_node in &stored_graph.nodes {
        if base_ids.contains(stored_node.id.as_str()) {
            continue;
        }
        let mut node = stored_node.clone();
        refresh_identity(&mut node, &identity, table);
        merged.push(node);
    }

    let edges = {
        let merged_ids: FxHashSet<&str> = merged.iter().map(|n| n.id.as_str()).collect();
        let kept: Vec<WorkflowEdge> = stored_graph
            .edges
            .iter()
            .filter(|e| merged_ids.contains(e.source.as_str()) && merged_ids.contains(e.target.as_str()))
            .cloned()
            .collect();
        if kept.is_empty() { base.edges.clone() } else { kept }
    };

    WorkflowGraph::new(merged, edges)
}

/// Derives and hydrates a column in one step, reading the stored override
/// from the column's own `overrides.workflow_graph`.
#[must_use]
pub fn hydrate_column(table: &TableRef, column: &ColumnRecord, layout_index: usize) -> WorkflowGraph {
    let base = derive_graph(table, column, layout_index);
    hydrate(table, column, &base, column.overrides.workflow_graph.as_ref())
}

fn refresh_identity(node: &mut WorkflowNode, identity: &ColumnIdentity, table: &TableRef) {
    if node.kind() == StepKind::Comment {
        return;
    }
    node.data.identity = Some(identity.clone());
    if let StepParams::DataSource { table_name } = &mut node.data.params {
        *table_name = table.name.clone();
    }
}
