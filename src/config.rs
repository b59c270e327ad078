//! Engine configuration: debounce windows and the selection echo window.

use std::time::Duration;

use crate::events::DEFAULT_EVENT_CAPACITY;

pub const DEFAULT_BOARD_DEBOUNCE_MS: u64 = 600;
pub const DEFAULT_GRAPH_DEBOUNCE_MS: u64 = 800;
pub const DEFAULT_ECHO_WINDOW_MS: u64 = 150;

/// Tunables for the synchronization engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Debounce for the board/extras/active-id snapshot save.
    pub board_debounce: Duration,
    /// Debounce for the batched per-column graph save.
    pub graph_debounce: Duration,
    /// Width of the list-toggle echo suppression window.
    pub echo_window: Duration,
    /// Bounded capacity of the diagnostic event channel.
    pub event_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl SyncConfig {
    /// Resolves configuration from the environment (reading `.env` when
    /// present), falling back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            board_debounce: Duration::from_millis(env_ms(
                "COLWEAVE_BOARD_DEBOUNCE_MS",
                DEFAULT_BOARD_DEBOUNCE_MS,
            )),
            graph_debounce: Duration::from_millis(env_ms(
                "COLWEAVE_GRAPH_DEBOUNCE_MS",
                DEFAULT_GRAPH_DEBOUNCE_MS,
            )),
            echo_window: Duration::from_millis(env_ms(
                "COLWEAVE_ECHO_WINDOW_MS",
                DEFAULT_ECHO_WINDOW_MS,
            )),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    #[must_use]
    pub fn with_board_debounce(mut self, debounce: Duration) -> Self {
        self.board_debounce = debounce;
        self
    }

    #[must_use]
    pub fn with_graph_debounce(mut self, debounce: Duration) -> Self {
        self.graph_debounce = debounce;
        self
    }

    #[must_use]
    pub fn with_echo_window(mut self, window: Duration) -> Self {
        self.echo_window = window;
        self
    }
}

fn env_ms(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
