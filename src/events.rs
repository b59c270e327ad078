//! Diagnostic event channel for save and run outcomes.
//!
//! Save failures are non-fatal by design: local state stays authoritative
//! and the failure is surfaced as an event instead of an error. The bus is a
//! bounded flume channel; emission is best-effort (a full buffer drops the
//! event rather than blocking an edit path) and every emission is mirrored
//! to `tracing` for log capture.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::NodeStatus;

/// Default bounded capacity of the event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// A timestamped diagnostic event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncEvent {
    #[serde(default = "chrono::Utc::now")]
    pub when: DateTime<Utc>,
    pub kind: SyncEventKind,
}

/// What happened.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEventKind {
    BoardSaved,
    BoardSaveFailed {
        reason: String,
    },
    ColumnGraphSaved {
        column: String,
    },
    ColumnGraphSaveFailed {
        column: String,
        reason: String,
    },
    EstimateReady {
        column: String,
        total_tokens: u64,
    },
    EstimateFailed {
        column: String,
        reason: String,
    },
    RunFinished {
        column: String,
        workflow_id: String,
        status: NodeStatus,
    },
    RunFailed {
        column: String,
        reason: String,
    },
}

/// Cloneable sending half handed to the savers and the engine internals.
#[derive(Clone, Debug)]
pub struct EventEmitter {
    tx: flume::Sender<SyncEvent>,
}

impl EventEmitter {
    /// Emits an event, best-effort. A disconnected or full channel drops the
    /// event; the tracing mirror still fires.
    pub fn emit(&self, kind: SyncEventKind) {
        tracing::debug!(event = ?kind, "sync event");
        let _ = self.tx.try_send(SyncEvent {
            when: Utc::now(),
            kind,
        });
    }
}

/// The event bus: owns the receiving half, hands out emitters.
#[derive(Debug)]
pub struct EventBus {
    tx: flume::Sender<SyncEvent>,
    rx: flume::Receiver<SyncEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_EVENT_CAPACITY
        } else {
            capacity
        };
        let (tx, rx) = flume::bounded(capacity);
        Self { tx, rx }
    }

    #[must_use]
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            tx: self.tx.clone(),
        }
    }

    /// A cloned receiver for consumers that want to await events.
    #[must_use]
    pub fn receiver(&self) -> flume::Receiver<SyncEvent> {
        self.rx.clone()
    }

    /// Drains everything currently buffered. Test convenience.
    #[must_use]
    pub fn drain(&self) -> Vec<SyncEvent> {
        self.rx.try_iter().collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
