//! Deterministic derivation of a column's default workflow graph.
//!
//! Derivation is a pure function of the column record and its layout slot:
//! no I/O, no randomness, no clock. The same column always yields the same
//! node ids (see [`node_id`](crate::graph::node_id)), which is what lets
//! hydration reconcile a persisted graph with a freshly derived one.
//!
//! # Layout
//!
//! Columns are laid out on a two-column grid keyed by `layout_index`, so a
//! board renders predictably before any user drag. Within a cell, chain
//! steps advance horizontally; steps that create a new derived column
//! (row-level extraction, image description) sit on a second lane offset
//! vertically.
//!
//! # Examples
//!
//! ```
//! use colweave::column::{ColumnRecord, TableRef};
//! use colweave::graph::derive_graph;
//! use colweave::types::{SemanticType, StepKind};
//!
//! let table = TableRef::new("tbl_1", "orders");
//!
//! // Low-confidence text column: source, hint, summarize.
//! let notes = ColumnRecord::new("notes", SemanticType::Text, 0.4);
//! let graph = derive_graph(&table, &notes, 0);
//! let kinds: Vec<StepKind> = graph.nodes.iter().map(|n| n.kind()).collect();
//! assert_eq!(
//!     kinds,
//!     vec![StepKind::DataSource, StepKind::ColumnHint, StepKind::SummarizeText]
//! );
//! ```

use crate::column::{ColumnRecord, TableRef};
use crate::graph::{
    ColumnIdentity, NodeData, Position, StepParams, WorkflowEdge, WorkflowGraph, WorkflowNode,
    node_id,
};
use crate::types::{NodeStatus, SemanticType, StepKind};

/// Number of grid columns boards are laid out on.
pub const GRID_COLUMNS: usize = 2;
/// Horizontal spacing between grid cells.
pub const CELL_WIDTH: f64 = 560.0;
/// Vertical spacing between grid cells.
pub const CELL_HEIGHT: f64 = 340.0;
/// Horizontal spacing between consecutive chain steps.
pub const STEP_SPACING: f64 = 180.0;
/// Vertical offset of the derived-column lane below the main lane.
pub const LANE_SPACING: f64 = 150.0;
/// Columns classified below this confidence get a `column_hint` step.
pub const HINT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Base grid position for a column's chain, from its slot on the board.
#[must_use]
pub fn base_position(layout_index: usize) -> Position {
    Position::new(
        ((layout_index % GRID_COLUMNS) as f64) * CELL_WIDTH,
        ((layout_index / GRID_COLUMNS) as f64) * CELL_HEIGHT,
    )
}

/// Which lane of the grid cell a step sits on.
enum Lane {
    Main,
    /// Reserved for steps that create a new derived column.
    Derived,
}

/// Derives the default workflow graph for one column.
///
/// Always starts with a `data_source` node; inserts a `column_hint` right
/// after it when `confidence < 0.6`; then branches on the semantic type:
///
/// - numeric | temporal | categorical -> `generate_visuals` then
///   `generate_insights` focused on the column
/// - text -> `summarize_text`, plus `row_level_extract` on the derived lane
///   when an extraction instruction override exists
/// - image -> `describe_images` on the derived lane
/// - id | binary | spatial | unknown -> `basic_stats`
///
/// Edges connect consecutive chain steps only; the result is a DAG.
#[must_use]
pub fn derive_graph(table: &TableRef, column: &ColumnRecord, layout_index: usize) -> WorkflowGraph {
    let mut chain = Chain::new(table, column, layout_index);

    chain.push(
        Lane::Main,
        StepParams::DataSource {
            table_name: table.name.clone(),
        },
    );

    if column.confidence < HINT_CONFIDENCE_THRESHOLD {
        chain.push(
            Lane::Main,
            StepParams::ColumnHint {
                hint: column.overrides.hint.clone(),
            },
        );
    }

    match column.semantic_type {
        SemanticType::Numeric | SemanticType::Temporal | SemanticType::Categorical => {
            chain.push(Lane::Main, StepParams::GenerateVisuals);
            chain.push(
                Lane::Main,
                StepParams::GenerateInsights {
                    focus: "column".to_string(),
                },
            );
        }
        SemanticType::Text => {
            chain.push(Lane::Main, StepParams::SummarizeText);
            if let Some(instruction) = &column.overrides.extract_instruction {
                let output_column = column
                    .overrides
                    .extract_output_column
                    .clone()
                    .unwrap_or_else(|| format!("{}_extracted", column.column_name));
                chain.push(
                    Lane::Derived,
                    StepParams::RowLevelExtract {
                        instruction: instruction.clone(),
                        output_column,
                        output_schema: column.overrides.extract_output_schema.clone(),
                    },
                );
            }
        }
        SemanticType::Image => {
            chain.push(
                Lane::Derived,
                StepParams::DescribeImages {
                    settings: column.overrides.image_description.clone().unwrap_or_default(),
                },
            );
        }
        SemanticType::Id | SemanticType::Binary | SemanticType::Spatial | SemanticType::Unknown => {
            chain.push(Lane::Main, StepParams::BasicStats);
        }
    }

    chain.finish()
}

/// Accumulates the chain under construction: nodes in order, edges between
/// consecutive pushes.
struct Chain {
    origin: Position,
    identity: ColumnIdentity,
    column_name: String,
    nodes: Vec<WorkflowNode>,
}

impl Chain {
    fn new(table: &TableRef, column: &ColumnRecord, layout_index: usize) -> Self {
        Self {
            origin: base_position(layout_index),
            identity: ColumnIdentity::of(table, column),
            column_name: column.column_name.clone(),
            nodes: Vec::new(),
        }
    }

    fn push(&mut self, lane: Lane, params: StepParams) {
        let kind = params.kind();
        let slot = self.nodes.len();
        let y = match lane {
            Lane::Main => self.origin.y,
            Lane::Derived => self.origin.y + LANE_SPACING,
        };
        let title = if kind == StepKind::DataSource {
            self.column_name.clone()
        } else {
            kind.default_title().to_string()
        };
        self.nodes.push(WorkflowNode {
            id: node_id(kind, &self.column_name),
            position: Position::new(self.origin.x + (slot as f64) * STEP_SPACING, y),
            data: NodeData {
                title,
                status: NodeStatus::Idle,
                identity: Some(self.identity.clone()),
                params,
            },
        });
    }

    fn finish(self) -> WorkflowGraph {
        let edges = self
            .nodes
            .windows(2)
            .map(|pair| WorkflowEdge::new(pair[0].id.clone(), pair[1].id.clone()))
            .collect();
        WorkflowGraph::new(self.nodes, edges)
    }
}
