//! Workflow graph documents.
//!
//! A [`WorkflowGraph`] is the *document* describing what should run for a
//! column: a list of typed step nodes and the directed edges chaining them.
//! This module defines the document model; [`derivation`] builds the default
//! document from column semantics and [`hydration`] merges it with a
//! persisted user-edited copy.
//!
//! # Node identity
//!
//! Node ids are derived deterministically from `(step kind, normalized
//! column name)`, so re-deriving a column always yields the same ids and the
//! hydration merge can reconcile stored nodes with fresh ones.
//!
//! # Typed step parameters
//!
//! Instead of an open `data` map, every node carries a [`StepParams`] tagged
//! union with one variant per step kind. The node's kind is derived from the
//! variant, so the discriminator and the payload cannot drift apart, and the
//! derivation/hydration branches get compile-time coverage.

pub mod derivation;
pub mod hydration;

pub use derivation::derive_graph;
pub use hydration::{hydrate, hydrate_column};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::column::{ColumnRecord, ImageDescribeSettings, TableRef};
use crate::types::{NodeStatus, SemanticType, StepKind};
use crate::utils::normalize_column_name;

/// Canvas position of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The column a node belongs to, denormalized onto the node so the canvas
/// can resolve ownership without a lookup.
///
/// These fields are force-refreshed from the current column record on every
/// hydration; they must never go stale even when the user edited the rest of
/// the node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnIdentity {
    pub column_name: String,
    pub column_type: SemanticType,
    pub column_confidence: f64,
    pub table_id: String,
}

impl ColumnIdentity {
    #[must_use]
    pub fn of(table: &TableRef, column: &ColumnRecord) -> Self {
        Self {
            column_name: column.column_name.clone(),
            column_type: column.semantic_type,
            column_confidence: column.confidence,
            table_id: table.id.clone(),
        }
    }
}

fn default_focus() -> String {
    "column".to_string()
}

/// Step-specific parameters, one variant per step kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepParams {
    DataSource {
        #[serde(default)]
        table_name: String,
    },
    ColumnHint {
        #[serde(default)]
        hint: Option<String>,
    },
    GenerateVisuals,
    GenerateInsights {
        #[serde(default = "default_focus")]
        focus: String,
    },
    SummarizeText,
    RowLevelExtract {
        instruction: String,
        output_column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_schema: Option<Value>,
    },
    DescribeImages {
        #[serde(default)]
        settings: ImageDescribeSettings,
    },
    BasicStats,
    Comment {
        #[serde(default)]
        text: String,
    },
}

impl StepParams {
    /// The step kind implied by this parameter variant.
    #[must_use]
    pub fn kind(&self) -> StepKind {
        match self {
            StepParams::DataSource { .. } => StepKind::DataSource,
            StepParams::ColumnHint { .. } => StepKind::ColumnHint,
            StepParams::GenerateVisuals => StepKind::GenerateVisuals,
            StepParams::GenerateInsights { .. } => StepKind::GenerateInsights,
            StepParams::SummarizeText => StepKind::SummarizeText,
            StepParams::RowLevelExtract { .. } => StepKind::RowLevelExtract,
            StepParams::DescribeImages { .. } => StepKind::DescribeImages,
            StepParams::BasicStats => StepKind::BasicStats,
            StepParams::Comment { .. } => StepKind::Comment,
        }
    }
}

/// Everything the canvas renders inside a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: NodeStatus,
    /// `Some` for every node owned by a column; `None` for comments and
    /// board extras.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<ColumnIdentity>,
    #[serde(flatten)]
    pub params: StepParams,
}

/// One node of a workflow graph document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    pub position: Position,
    pub data: NodeData,
}

impl WorkflowNode {
    /// The step kind, derived from the typed parameters.
    #[must_use]
    pub fn kind(&self) -> StepKind {
        self.data.params.kind()
    }

    /// The owning column, if any.
    #[must_use]
    pub fn column_name(&self) -> Option<&str> {
        self.data.identity.as_ref().map(|i| i.column_name.as_str())
    }

    /// Returns `true` for nodes that belong to a board rather than a column.
    #[must_use]
    pub fn is_extra(&self) -> bool {
        self.data.identity.is_none()
    }
}

/// A directed edge between two nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub source: String,
    pub target: String,
}

impl WorkflowEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A workflow graph document: nodes plus directed edges.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
}

impl WorkflowGraph {
    #[must_use]
    pub fn new(nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) -> Self {
        Self { nodes, edges }
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Deterministic node id for a derived step.
///
/// ```
/// use colweave::graph::node_id;
/// use colweave::types::StepKind;
///
/// assert_eq!(node_id(StepKind::DataSource, "Unit Price"), "data_source--unit_price");
/// ```
#[must_use]
pub fn node_id(kind: StepKind, column_name: &str) -> String {
    format!("{}--{}", kind.key(), normalize_column_name(column_name))
}

/// Validates and parses a persisted `workflow_graph` override.
///
/// The value is accepted only when it is an object carrying both `nodes` and
/// `edges` as arrays and the whole shape deserializes into a
/// [`WorkflowGraph`]. Anything else is treated as absent, letting hydration
/// fall back to the freshly derived graph instead of failing the load.
#[must_use]
pub fn parse_stored_graph(value: &Value) -> Option<WorkflowGraph> {
    let obj = value.as_object()?;
    if !obj.get("nodes").is_some_and(Value::is_array) {
        return None;
    }
    if !obj.get("edges").is_some_and(Value::is_array) {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}
