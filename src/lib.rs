//! # Colweave: Column Workflow Graph Synchronization Engine
//!
//! Colweave attaches a small automated-analysis workflow to every column of a
//! tabular dataset and keeps three views of that workflow consistent: the
//! deterministic graph *derived* from column semantics, the graph the user has
//! *edited* on a freeform canvas, and the copy *persisted* in a remote column
//! record store.
//!
//! ## Core Concepts
//!
//! - **Derivation**: a pure function from a column record to its default
//!   workflow graph, deterministic down to node ids and positions
//! - **Hydration**: the lossless merge of a derived graph with a previously
//!   persisted user-edited graph
//! - **Boards**: named partitions of a table's columns, each with its own
//!   layout and selection
//! - **Selection synchronization**: echo-guarded reconciliation between a
//!   checklist and a graph canvas that can each originate selection changes
//! - **Coalesced persistence**: debounced, batched, failure-tolerant writes
//!   back to the column record store
//!
//! ## Quick Start
//!
//! ### Deriving and hydrating a column graph
//!
//! ```
//! use colweave::column::{ColumnRecord, TableRef};
//! use colweave::graph::{derive_graph, hydrate};
//! use colweave::types::{SemanticType, StepKind};
//!
//! let table = TableRef::new("tbl_demo", "listings");
//! let price = ColumnRecord::new("price", SemanticType::Numeric, 0.92);
//!
//! // Numeric columns derive a three-step chain.
//! let derived = derive_graph(&table, &price, 0);
//! assert_eq!(derived.nodes.len(), 3);
//! assert_eq!(derived.nodes[0].kind(), StepKind::DataSource);
//!
//! // With no stored override, hydration returns the derived graph unchanged.
//! let hydrated = hydrate(&table, &price, &derived, None);
//! assert_eq!(hydrated, derived);
//! ```
//!
//! ### Driving the engine
//!
//! The [`engine::SyncEngine`] owns the in-memory state and exposes the
//! reducer-style operations the surrounding UI calls into: checklist toggles,
//! canvas selection and content callbacks, board management, and run/estimate
//! orchestration. All network traffic goes through the [`store::ColumnStore`]
//! and [`store::RunBackend`] traits, so the engine is testable without a
//! server.
//!
//! ## Module Guide
//!
//! - [`types`] - semantic types, step kinds, node statuses, board ids
//! - [`column`] - column records, overrides, and table payload shapes
//! - [`graph`] - workflow graph documents, derivation, and hydration
//! - [`boards`] - board partitioning and the ownership invariant
//! - [`selection`] - the list/canvas echo guard
//! - [`adapter`] - composing and splitting the canvas node/edge list
//! - [`persist`] - serde glue for persisted board and graph shapes
//! - [`coalescer`] - debounced board and per-column graph savers
//! - [`store`] - external collaborator traits and wire DTOs
//! - [`engine`] - the synchronization engine facade
//! - [`events`] - diagnostic event channel for save/run outcomes

pub mod adapter;
pub mod boards;
pub mod coalescer;
pub mod column;
pub mod config;
pub mod engine;
pub mod events;
pub mod graph;
pub mod persist;
pub mod selection;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod utils;
