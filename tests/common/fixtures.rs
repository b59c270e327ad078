#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use colweave::column::{ColumnRecord, TablePayload, TableRecord, TableRef};
use colweave::config::SyncConfig;
use colweave::engine::SyncEngine;
use colweave::graph::{NodeData, Position, StepParams, WorkflowNode};
use colweave::store::{
    ColumnPatch, ColumnStore, EstimateResponse, RunBackend, RunOptions, RunResponse,
    RunSelectedRequest, StepEstimate, StoreError, TablePatch,
};
use colweave::types::{NodeStatus, SemanticType};

pub const TABLE_ID: &str = "tbl_1";

pub fn table() -> TableRef {
    TableRef::new(TABLE_ID, "orders")
}

pub fn price_column() -> ColumnRecord {
    ColumnRecord::new("price", SemanticType::Numeric, 0.9)
}

pub fn notes_column() -> ColumnRecord {
    ColumnRecord::new("notes", SemanticType::Text, 0.4)
}

pub fn photo_column() -> ColumnRecord {
    ColumnRecord::new("photo", SemanticType::Image, 0.8)
}

pub fn sku_column() -> ColumnRecord {
    ColumnRecord::new("sku", SemanticType::Id, 0.7)
}

pub fn created_at_column() -> ColumnRecord {
    ColumnRecord::new("created_at", SemanticType::Temporal, 0.95)
}

pub fn category_column() -> ColumnRecord {
    ColumnRecord::new("category", SemanticType::Categorical, 0.75)
}

/// A free-floating comment node, owned by a board rather than a column.
pub fn comment_node(id: &str, text: &str) -> WorkflowNode {
    WorkflowNode {
        id: id.to_string(),
        position: Position::new(40.0, -120.0),
        data: NodeData {
            title: "Comment".to_string(),
            status: NodeStatus::Idle,
            identity: None,
            params: StepParams::Comment {
                text: text.to_string(),
            },
        },
    }
}

/// Test config with the production default windows, independent of env vars.
pub fn test_config() -> SyncConfig {
    SyncConfig {
        board_debounce: Duration::from_millis(600),
        graph_debounce: Duration::from_millis(800),
        echo_window: Duration::from_millis(150),
        event_capacity: 256,
    }
}

/// In-memory recording double for the column record store.
pub struct MemoryStore {
    pub get_payload: Mutex<TablePayload>,
    pub init_payload: Mutex<TablePayload>,
    pub table_patches: Mutex<Vec<TablePatch>>,
    pub column_patches: Mutex<Vec<(String, ColumnPatch)>>,
    pub fail_get: Mutex<bool>,
    pub fail_table_saves: Mutex<bool>,
    pub fail_columns: Mutex<Vec<String>>,
    pub initialized: Mutex<bool>,
}

impl MemoryStore {
    pub fn with_payload(payload: TablePayload) -> Arc<Self> {
        Arc::new(Self {
            get_payload: Mutex::new(payload.clone()),
            init_payload: Mutex::new(payload),
            table_patches: Mutex::new(Vec::new()),
            column_patches: Mutex::new(Vec::new()),
            fail_get: Mutex::new(false),
            fail_table_saves: Mutex::new(false),
            fail_columns: Mutex::new(Vec::new()),
            initialized: Mutex::new(false),
        })
    }

    pub fn with_columns(columns: Vec<ColumnRecord>) -> Arc<Self> {
        Self::with_payload(TablePayload {
            columns,
            table: TableRecord {
                name: "orders".to_string(),
                ..TableRecord::default()
            },
        })
    }

    /// A table with no column records yet: `get` returns nothing, the seeded
    /// columns arrive through `initialize`.
    pub fn uninitialized(init_columns: Vec<ColumnRecord>) -> Arc<Self> {
        let record = TableRecord {
            name: "orders".to_string(),
            ..TableRecord::default()
        };
        Arc::new(Self {
            get_payload: Mutex::new(TablePayload {
                columns: Vec::new(),
                table: record.clone(),
            }),
            init_payload: Mutex::new(TablePayload {
                columns: init_columns,
                table: record,
            }),
            table_patches: Mutex::new(Vec::new()),
            column_patches: Mutex::new(Vec::new()),
            fail_get: Mutex::new(false),
            fail_table_saves: Mutex::new(false),
            fail_columns: Mutex::new(Vec::new()),
            initialized: Mutex::new(false),
        })
    }
}

#[async_trait]
impl ColumnStore for MemoryStore {
    async fn get(&self, table_id: &str) -> Result<TablePayload, StoreError> {
        if *self.fail_get.lock().await {
            return Err(StoreError::Request {
                operation: "get",
                message: format!("metadata unavailable for {table_id}"),
            });
        }
        Ok(self.get_payload.lock().await.clone())
    }

    async fn initialize(&self, _table_id: &str) -> Result<TablePayload, StoreError> {
        *self.initialized.lock().await = true;
        Ok(self.init_payload.lock().await.clone())
    }

    async fn override_column(
        &self,
        _table_id: &str,
        column_name: &str,
        patch: ColumnPatch,
    ) -> Result<(), StoreError> {
        if self
            .fail_columns
            .lock()
            .await
            .iter()
            .any(|c| c == column_name)
        {
            return Err(StoreError::Request {
                operation: "override_column",
                message: format!("write rejected for {column_name}"),
            });
        }
        self.column_patches
            .lock()
            .await
            .push((column_name.to_string(), patch));
        Ok(())
    }

    async fn override_table(&self, _table_id: &str, patch: TablePatch) -> Result<(), StoreError> {
        if *self.fail_table_saves.lock().await {
            return Err(StoreError::Request {
                operation: "override_table",
                message: "write rejected".to_string(),
            });
        }
        self.table_patches.lock().await.push(patch);
        Ok(())
    }
}

/// Canned execution backend; columns listed in `fail_columns` fail every
/// request.
pub struct StubBackend {
    pub fail_columns: Vec<String>,
    pub runs: Mutex<Vec<(String, RunOptions)>>,
    pub selected_runs: Mutex<Vec<(String, RunSelectedRequest)>>,
}

impl StubBackend {
    pub fn ok() -> Arc<Self> {
        Self::failing(&[])
    }

    pub fn failing(columns: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            fail_columns: columns.iter().map(|c| c.to_string()).collect(),
            runs: Mutex::new(Vec::new()),
            selected_runs: Mutex::new(Vec::new()),
        })
    }

    fn check(&self, operation: &'static str, column_name: &str) -> Result<(), StoreError> {
        if self.fail_columns.iter().any(|c| c == column_name) {
            return Err(StoreError::Request {
                operation,
                message: format!("backend rejected {column_name}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RunBackend for StubBackend {
    async fn estimate(
        &self,
        _table_id: &str,
        column_name: &str,
    ) -> Result<EstimateResponse, StoreError> {
        self.check("estimate", column_name)?;
        Ok(EstimateResponse {
            column: column_name.to_string(),
            semantic_type: SemanticType::Unknown,
            total_tokens: 1200,
            estimates: vec![StepEstimate {
                step: "generate_insights".to_string(),
                tokens: 1200,
            }],
        })
    }

    async fn run(
        &self,
        _table_id: &str,
        column_name: &str,
        options: RunOptions,
    ) -> Result<RunResponse, StoreError> {
        self.check("run", column_name)?;
        self.runs
            .lock()
            .await
            .push((column_name.to_string(), options));
        Ok(RunResponse {
            workflow_id: format!("wf_{column_name}"),
            status: "completed".to_string(),
            workflow_logs: None,
            workflow_tool_calls: None,
        })
    }

    async fn run_selected(
        &self,
        _table_id: &str,
        column_name: &str,
        request: RunSelectedRequest,
    ) -> Result<RunResponse, StoreError> {
        self.check("run_selected", column_name)?;
        self.selected_runs
            .lock()
            .await
            .push((column_name.to_string(), request));
        Ok(RunResponse {
            workflow_id: format!("wf_{column_name}_selected"),
            status: "completed".to_string(),
            workflow_logs: None,
            workflow_tool_calls: None,
        })
    }
}

/// Loads an engine against the given doubles with the test config.
pub async fn load_engine(store: Arc<MemoryStore>, backend: Arc<StubBackend>) -> SyncEngine {
    SyncEngine::load(
        store as Arc<dyn ColumnStore>,
        backend as Arc<dyn RunBackend>,
        TABLE_ID,
        test_config(),
    )
    .await
    .expect("engine load")
}

/// Lets spawned saver tasks run without advancing the paused clock.
pub async fn settle() {
    for _ in 0..25 {
        tokio::task::yield_now().await;
    }
}
