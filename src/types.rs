//! Core types for the colweave synchronization engine.
//!
//! This module defines the fundamental identifiers used throughout the
//! system: the semantic type of a column, the kind of a workflow step, the
//! execution status carried on every node, and the opaque board id.
//!
//! # Examples
//!
//! ```rust
//! use colweave::types::{SemanticType, StepKind};
//!
//! let kind = StepKind::GenerateInsights;
//! assert_eq!(kind.key(), "generate_insights");
//!
//! // Unknown encodings fall back to SemanticType::Unknown.
//! assert_eq!(SemanticType::from("geo_point"), SemanticType::Unknown);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// The semantic type assigned to a column by the metadata service.
///
/// Semantic types drive graph derivation: chartable types get the
/// visuals/insights chain, text gets summarization, images get description,
/// and everything else falls back to basic statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Numeric,
    Temporal,
    Categorical,
    Text,
    Image,
    Id,
    Binary,
    Spatial,
    Unknown,
}

impl SemanticType {
    /// All semantic types in checklist display order.
    pub const ALL: [SemanticType; 9] = [
        SemanticType::Numeric,
        SemanticType::Temporal,
        SemanticType::Categorical,
        SemanticType::Text,
        SemanticType::Image,
        SemanticType::Id,
        SemanticType::Binary,
        SemanticType::Spatial,
        SemanticType::Unknown,
    ];

    /// The persisted string form of this semantic type.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            SemanticType::Numeric => "numeric",
            SemanticType::Temporal => "temporal",
            SemanticType::Categorical => "categorical",
            SemanticType::Text => "text",
            SemanticType::Image => "image",
            SemanticType::Id => "id",
            SemanticType::Binary => "binary",
            SemanticType::Spatial => "spatial",
            SemanticType::Unknown => "unknown",
        }
    }

    /// Returns `true` for types whose derived chain charts the column
    /// (numeric, temporal, categorical).
    #[must_use]
    pub fn is_chartable(&self) -> bool {
        matches!(
            self,
            SemanticType::Numeric | SemanticType::Temporal | SemanticType::Categorical
        )
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// Forward compatibility: unrecognized encodings become Unknown rather than
// failing the whole payload.
impl From<&str> for SemanticType {
    fn from(s: &str) -> Self {
        match s {
            "numeric" => SemanticType::Numeric,
            "temporal" => SemanticType::Temporal,
            "categorical" => SemanticType::Categorical,
            "text" => SemanticType::Text,
            "image" => SemanticType::Image,
            "id" => SemanticType::Id,
            "binary" => SemanticType::Binary,
            "spatial" => SemanticType::Spatial,
            _ => SemanticType::Unknown,
        }
    }
}

/// The kind of a workflow step node.
///
/// Every node in a workflow graph is one of these kinds. The kind is not a
/// free-standing field on the node: it is derived from the node's typed
/// parameters (see [`crate::graph::StepParams`]), so the discriminator can
/// never drift from the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// The column's data feed; every column chain starts here.
    DataSource,
    /// User-correction step inserted for low-confidence columns.
    ColumnHint,
    GenerateVisuals,
    GenerateInsights,
    SummarizeText,
    /// Produces a new derived column from row-level extraction.
    RowLevelExtract,
    /// Produces a new derived column of image descriptions.
    DescribeImages,
    BasicStats,
    /// Free-floating annotation; belongs to a board, never to a column.
    Comment,
}

impl StepKind {
    /// The persisted string form of this step kind, used in node ids.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            StepKind::DataSource => "data_source",
            StepKind::ColumnHint => "column_hint",
            StepKind::GenerateVisuals => "generate_visuals",
            StepKind::GenerateInsights => "generate_insights",
            StepKind::SummarizeText => "summarize_text",
            StepKind::RowLevelExtract => "row_level_extract",
            StepKind::DescribeImages => "describe_images",
            StepKind::BasicStats => "basic_stats",
            StepKind::Comment => "comment",
        }
    }

    /// Default node title for this step kind.
    #[must_use]
    pub fn default_title(&self) -> &'static str {
        match self {
            StepKind::DataSource => "Data source",
            StepKind::ColumnHint => "Column hint",
            StepKind::GenerateVisuals => "Generate visuals",
            StepKind::GenerateInsights => "Generate insights",
            StepKind::SummarizeText => "Summarize text",
            StepKind::RowLevelExtract => "Row-level extract",
            StepKind::DescribeImages => "Describe images",
            StepKind::BasicStats => "Basic stats",
            StepKind::Comment => "Comment",
        }
    }

    /// Returns `true` if this is a [`Comment`](Self::Comment) node kind.
    #[must_use]
    pub fn is_comment(&self) -> bool {
        matches!(self, Self::Comment)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Execution status surfaced on every workflow node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Idle,
    Running,
    Success,
    Error,
    Skipped,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::Idle => "idle",
            NodeStatus::Running => "running",
            NodeStatus::Success => "success",
            NodeStatus::Error => "error",
            NodeStatus::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}

/// Opaque identifier of a board.
///
/// Freshly created boards get a v4 UUID; ids loaded from the store are kept
/// verbatim so persisted extras keyed by board id keep resolving.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardId(String);

impl BoardId {
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wraps an id loaded from the store without validation.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BoardId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BoardId {
    fn from(s: &str) -> Self {
        Self::from_raw(s)
    }
}
