//! Echo-guarded selection synchronization between the checklist and the
//! canvas.
//!
//! Two surfaces can originate a selection change: the per-column checklist
//! and the graph canvas. Toggling the checklist programmatically updates the
//! canvas selection, and the canvas reports selection changes back, so a
//! naive bidirectional binding oscillates. The guard here is an explicit
//! finite-state machine rather than an ad hoc timer: a checklist toggle arms
//! it, and the very next canvas event inside the window is treated as the
//! echo of that toggle and suppressed - exactly once.
//!
//! The clock is injected (`now: Instant`), so the suppression window is
//! testable without sleeping.

use std::time::{Duration, Instant};

/// Default width of the echo suppression window.
pub const DEFAULT_ECHO_WINDOW: Duration = Duration::from_millis(150);

/// Which surface most recently originated a selection change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EchoGuard {
    /// No list toggle pending; canvas events apply normally.
    Idle,
    /// A checklist toggle was just applied; the next canvas event within the
    /// window is its echo.
    AwaitingEcho { since: Instant },
}

/// What to do with a canvas-originated selection event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasDisposition {
    /// The event is the echo of a checklist toggle; drop it.
    Suppressed,
    /// A genuine canvas selection; translate and apply it.
    Apply,
}

impl CanvasDisposition {
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed)
    }
}

/// The selection synchronizer's guard state.
#[derive(Clone, Debug)]
pub struct SelectionSync {
    guard: EchoGuard,
    window: Duration,
}

impl Default for SelectionSync {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionSync {
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(DEFAULT_ECHO_WINDOW)
    }

    #[must_use]
    pub fn with_window(window: Duration) -> Self {
        Self {
            guard: EchoGuard::Idle,
            window,
        }
    }

    #[must_use]
    pub fn guard(&self) -> EchoGuard {
        self.guard
    }

    /// Records that a checklist toggle is about to be applied. Arms the echo
    /// guard; the next canvas event within the window will be suppressed.
    pub fn note_list_toggle(&mut self, now: Instant) {
        self.guard = EchoGuard::AwaitingEcho { since: now };
    }

    /// Classifies a canvas-originated selection event.
    ///
    /// The guard is consumed by the first canvas event regardless of
    /// disposition: an armed guard suppresses exactly one event, and an
    /// expired guard simply resets.
    ///
    /// Callers must drop empty canvas selections *before* calling this -
    /// canvases routinely report empty selection transiently, and those
    /// events neither propagate nor consume the window.
    pub fn on_canvas_event(&mut self, now: Instant) -> CanvasDisposition {
        match self.guard {
            EchoGuard::AwaitingEcho { since } => {
                self.guard = EchoGuard::Idle;
                if now.duration_since(since) <= self.window {
                    CanvasDisposition::Suppressed
                } else {
                    CanvasDisposition::Apply
                }
            }
            EchoGuard::Idle => CanvasDisposition::Apply,
        }
    }
}
