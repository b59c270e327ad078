//! External collaborator boundaries: the column record store and the
//! workflow execution backend.
//!
//! Both collaborators are specified only at their interface: async traits
//! plus the wire DTOs they exchange. The engine never talks to a network
//! directly, which keeps every merge and save path testable against
//! in-memory doubles.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::column::TablePayload;
use crate::types::SemanticType;

/// Errors crossing a collaborator boundary.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    /// The collaborator rejected or failed the request.
    #[error("store request failed ({operation}): {message}")]
    #[diagnostic(code(colweave::store::request))]
    Request {
        operation: &'static str,
        message: String,
    },

    #[error("table not found: {0}")]
    #[diagnostic(code(colweave::store::not_found))]
    NotFound(String),

    /// Payload (de)serialization error.
    #[error(transparent)]
    #[diagnostic(code(colweave::store::serde))]
    Serde(#[from] serde_json::Error),
}

/// Partial override for one column. Only populated fields are written.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_graph: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ColumnPatch {
    /// A patch carrying only the persisted workflow graph.
    #[must_use]
    pub fn workflow_graph(value: Value) -> Self {
        Self {
            workflow_graph: Some(value),
            ..Self::default()
        }
    }
}

/// Partial table-level override. Only populated fields are written.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_boards: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_board_extras: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_active_board_id: Option<String>,
}

/// The column record store: serves column records and accepts partial
/// overrides at column and table scope.
#[async_trait]
pub trait ColumnStore: Send + Sync {
    async fn get(&self, table_id: &str) -> Result<TablePayload, StoreError>;

    /// Used when the table has no column records yet.
    async fn initialize(&self, table_id: &str) -> Result<TablePayload, StoreError>;

    async fn override_column(
        &self,
        table_id: &str,
        column_name: &str,
        patch: ColumnPatch,
    ) -> Result<(), StoreError>;

    async fn override_table(&self, table_id: &str, patch: TablePatch) -> Result<(), StoreError>;
}

/// One step's share of a token estimate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEstimate {
    pub step: String,
    pub tokens: u64,
}

/// Token estimate for running one column's workflow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstimateResponse {
    pub column: String,
    pub semantic_type: SemanticType,
    pub total_tokens: u64,
    #[serde(default)]
    pub estimates: Vec<StepEstimate>,
}

/// Outcome of a run request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunResponse {
    pub workflow_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_logs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_tool_calls: Option<Vec<Value>>,
}

impl RunResponse {
    /// Whether the backend reported a non-failure status.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        !matches!(self.status.as_str(), "error" | "failed")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
}

/// Request body for re-running a chosen subset of a workflow's tool calls.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSelectedRequest {
    pub tool_calls: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
}

/// The workflow execution backend. Requests for different columns are
/// issued concurrently and fail independently; partial success is valid.
#[async_trait]
pub trait RunBackend: Send + Sync {
    async fn estimate(&self, table_id: &str, column_name: &str)
    -> Result<EstimateResponse, StoreError>;

    async fn run(
        &self,
        table_id: &str,
        column_name: &str,
        options: RunOptions,
    ) -> Result<RunResponse, StoreError>;

    async fn run_selected(
        &self,
        table_id: &str,
        column_name: &str,
        request: RunSelectedRequest,
    ) -> Result<RunResponse, StoreError>;
}
