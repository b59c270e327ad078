//! Column records and table payload shapes served by the column record
//! store.
//!
//! A [`ColumnRecord`] is read-only to this engine except for
//! `overrides.workflow_graph`, which holds the persisted user-edited graph
//! and is written back through the persistence coalescer. The override
//! struct keeps typed fields for every tunable the engine interprets and a
//! flattened pass-through map for everything else, so round-tripping a
//! record never drops fields owned by other features.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::SemanticType;

/// One column of the table, as served by the metadata service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnRecord {
    /// Unique per table.
    pub column_name: String,
    pub semantic_type: SemanticType,
    /// Classifier confidence in `semantic_type`, 0-1.
    pub confidence: f64,
    #[serde(default)]
    pub overrides: ColumnOverrides,
}

impl ColumnRecord {
    pub fn new(column_name: &str, semantic_type: SemanticType, confidence: f64) -> Self {
        Self {
            column_name: column_name.to_string(),
            semantic_type,
            confidence,
            overrides: ColumnOverrides::default(),
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: &str) -> Self {
        self.overrides.hint = Some(hint.to_string());
        self
    }

    #[must_use]
    pub fn with_extract_instruction(mut self, instruction: &str) -> Self {
        self.overrides.extract_instruction = Some(instruction.to_string());
        self
    }

    #[must_use]
    pub fn with_workflow_graph(mut self, graph: Value) -> Self {
        self.overrides.workflow_graph = Some(graph);
        self
    }
}

/// Per-column tunables.
///
/// `workflow_graph` is kept as a raw JSON value on purpose: its shape is
/// validated at hydration time, and a malformed value degrades to "no
/// override" instead of failing the whole payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnOverrides {
    /// Free-form hint text seeding the `column_hint` node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Row-level extraction instruction; its presence adds a
    /// `row_level_extract` step to text columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_output_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_output_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_description: Option<ImageDescribeSettings>,
    /// Persisted user-edited workflow graph, validated by hydration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_graph: Option<Value>,
    /// Fields owned by other features, carried through untouched.
    #[serde(flatten)]
    pub rest: FxHashMap<String, Value>,
}

/// Settings for the `describe_images` step.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageDescribeSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Identity of the table whose columns are being synchronized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub id: String,
    pub name: String,
}

impl TableRef {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// Table-level record carried alongside the column list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub overrides: TableOverrides,
}

/// Table-level overrides.
///
/// The three `workflow_*` fields belong to this engine; they are raw values
/// because a malformed persisted shape must degrade to "absent" rather than
/// failing the load (see the persistence module for the lenient parsers).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_boards: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_board_extras: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_active_board_id: Option<Value>,
    #[serde(flatten)]
    pub rest: FxHashMap<String, Value>,
}

/// The payload served by `ColumnStore::get` / `ColumnStore::initialize`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TablePayload {
    #[serde(default)]
    pub columns: Vec<ColumnRecord>,
    #[serde(default)]
    pub table: TableRecord,
}

/// One checklist row: a column with its selection state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChecklistEntry {
    pub column_name: String,
    pub confidence: f64,
    pub selected: bool,
}

/// Checklist rows grouped under one semantic type heading.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChecklistGroup {
    pub semantic_type: SemanticType,
    pub entries: Vec<ChecklistEntry>,
}

/// Groups columns by semantic type for the checklist UI, in the fixed
/// [`SemanticType::ALL`] display order. Types with no columns are omitted.
pub fn checklist_groups<'a, I>(columns: I, selected: &[String]) -> Vec<ChecklistGroup>
where
    I: IntoIterator<Item = &'a ColumnRecord>,
{
    let columns: Vec<&ColumnRecord> = columns.into_iter().collect();
    SemanticType::ALL
        .iter()
        .filter_map(|semantic_type| {
            let entries: Vec<ChecklistEntry> = columns
                .iter()
                .filter(|c| c.semantic_type == *semantic_type)
                .map(|c| ChecklistEntry {
                    column_name: c.column_name.clone(),
                    confidence: c.confidence,
                    selected: selected.iter().any(|s| s == &c.column_name),
                })
                .collect();
            if entries.is_empty() {
                None
            } else {
                Some(ChecklistGroup {
                    semantic_type: *semantic_type,
                    entries,
                })
            }
        })
        .collect()
}
