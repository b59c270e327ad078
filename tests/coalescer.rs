use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use colweave::coalescer::{BoardSaver, GraphSaver};
use colweave::events::{EventBus, SyncEventKind};
use colweave::store::{ColumnStore, TablePatch};

mod common;
use common::*;

const BOARD_DEBOUNCE: Duration = Duration::from_millis(600);
const GRAPH_DEBOUNCE: Duration = Duration::from_millis(800);

fn patch(marker: u64) -> TablePatch {
    TablePatch {
        workflow_boards: Some(json!([marker])),
        workflow_board_extras: Some(json!({})),
        workflow_active_board_id: Some("b1".to_string()),
    }
}

fn board_saver(store: &Arc<MemoryStore>, bus: &EventBus) -> BoardSaver {
    BoardSaver::new(
        Arc::clone(store) as Arc<dyn ColumnStore>,
        TABLE_ID,
        BOARD_DEBOUNCE,
        bus.emitter(),
    )
}

fn graph_saver(store: &Arc<MemoryStore>, bus: &EventBus) -> GraphSaver {
    GraphSaver::new(
        Arc::clone(store) as Arc<dyn ColumnStore>,
        TABLE_ID,
        GRAPH_DEBOUNCE,
        bus.emitter(),
    )
}

/********************
 * Board saver
 ********************/

#[tokio::test(start_paused = true)]
async fn board_save_waits_for_the_debounce_window() {
    let store = MemoryStore::with_columns(vec![]);
    let bus = EventBus::new(64);
    let saver = board_saver(&store, &bus);

    saver.schedule("k1".to_string(), patch(1)).await;

    tokio::time::advance(Duration::from_millis(500)).await;
    settle().await;
    assert!(store.table_patches.lock().await.is_empty());

    tokio::time::advance(Duration::from_millis(200)).await;
    settle().await;
    let saved = store.table_patches.lock().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0], patch(1));
    drop(saved);

    assert!(
        bus.drain()
            .iter()
            .any(|e| e.kind == SyncEventKind::BoardSaved)
    );
}

#[tokio::test(start_paused = true)]
async fn a_newer_change_resets_the_timer_and_wins() {
    let store = MemoryStore::with_columns(vec![]);
    let bus = EventBus::new(64);
    let saver = board_saver(&store, &bus);

    saver.schedule("k1".to_string(), patch(1)).await;
    tokio::time::advance(Duration::from_millis(300)).await;
    saver.schedule("k2".to_string(), patch(2)).await;

    // t=650: the first timer has expired but was superseded.
    tokio::time::advance(Duration::from_millis(350)).await;
    settle().await;
    assert!(store.table_patches.lock().await.is_empty());

    // t=950: the second timer fires with the latest snapshot.
    tokio::time::advance(Duration::from_millis(300)).await;
    settle().await;
    let saved = store.table_patches.lock().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0], patch(2));
}

#[tokio::test(start_paused = true)]
async fn unchanged_snapshot_is_not_rewritten() {
    let store = MemoryStore::with_columns(vec![]);
    let bus = EventBus::new(64);
    let saver = board_saver(&store, &bus);

    saver.schedule("k1".to_string(), patch(1)).await;
    tokio::time::advance(Duration::from_millis(700)).await;
    settle().await;
    assert_eq!(store.table_patches.lock().await.len(), 1);

    // Same comparison key: nothing happens, no timer starts.
    saver.schedule("k1".to_string(), patch(1)).await;
    tokio::time::advance(Duration::from_millis(700)).await;
    settle().await;
    assert_eq!(store.table_patches.lock().await.len(), 1);

    // A genuinely new snapshot writes again.
    saver.schedule("k2".to_string(), patch(2)).await;
    tokio::time::advance(Duration::from_millis(700)).await;
    settle().await;
    assert_eq!(store.table_patches.lock().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_board_save_is_nonfatal_and_retried_on_the_next_edit() {
    let store = MemoryStore::with_columns(vec![]);
    let bus = EventBus::new(64);
    let saver = board_saver(&store, &bus);

    *store.fail_table_saves.lock().await = true;
    saver.schedule("k1".to_string(), patch(1)).await;
    tokio::time::advance(Duration::from_millis(700)).await;
    settle().await;
    assert!(store.table_patches.lock().await.is_empty());
    assert!(
        bus.drain()
            .iter()
            .any(|e| matches!(e.kind, SyncEventKind::BoardSaveFailed { .. }))
    );

    // The key was not recorded, so the same snapshot saves on the next edit.
    *store.fail_table_saves.lock().await = false;
    saver.schedule("k1".to_string(), patch(1)).await;
    tokio::time::advance(Duration::from_millis(700)).await;
    settle().await;
    assert_eq!(store.table_patches.lock().await.len(), 1);
}

/********************
 * Graph saver
 ********************/

#[tokio::test(start_paused = true)]
async fn graph_saves_coalesce_into_one_batch() {
    let store = MemoryStore::with_columns(vec![]);
    let bus = EventBus::new(64);
    let saver = graph_saver(&store, &bus);

    saver.schedule("price", json!({"nodes": [], "edges": []})).await;
    tokio::time::advance(Duration::from_millis(300)).await;
    saver.schedule("notes", json!({"nodes": [], "edges": []})).await;

    // t=900: the first timer expired superseded, nothing written yet.
    tokio::time::advance(Duration::from_millis(600)).await;
    settle().await;
    assert!(store.column_patches.lock().await.is_empty());

    // t=1100: the batch flushes both pending columns.
    tokio::time::advance(Duration::from_millis(200)).await;
    settle().await;
    let saved = store.column_patches.lock().await;
    assert_eq!(saved.len(), 2);
    let mut columns: Vec<&str> = saved.iter().map(|(c, _)| c.as_str()).collect();
    columns.sort_unstable();
    assert_eq!(columns, vec!["notes", "price"]);
    assert!(saved.iter().all(|(_, p)| p.workflow_graph.is_some()));
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_to_one_column_keep_only_the_latest() {
    let store = MemoryStore::with_columns(vec![]);
    let bus = EventBus::new(64);
    let saver = graph_saver(&store, &bus);

    saver.schedule("price", json!({"nodes": [1], "edges": []})).await;
    tokio::time::advance(Duration::from_millis(100)).await;
    saver.schedule("price", json!({"nodes": [2], "edges": []})).await;

    tokio::time::advance(Duration::from_millis(900)).await;
    settle().await;
    let saved = store.column_patches.lock().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(
        saved[0].1.workflow_graph,
        Some(json!({"nodes": [2], "edges": []}))
    );
}

#[tokio::test(start_paused = true)]
async fn one_failing_column_does_not_cancel_the_batch() {
    let store = MemoryStore::with_columns(vec![]);
    store.fail_columns.lock().await.push("price".to_string());
    let bus = EventBus::new(64);
    let saver = graph_saver(&store, &bus);

    saver.schedule("price", json!({"nodes": [], "edges": []})).await;
    saver.schedule("notes", json!({"nodes": [], "edges": []})).await;

    tokio::time::advance(Duration::from_millis(900)).await;
    settle().await;

    let saved = store.column_patches.lock().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "notes");
    drop(saved);

    let events = bus.drain();
    assert!(events.iter().any(
        |e| matches!(&e.kind, SyncEventKind::ColumnGraphSaveFailed { column, .. } if column == "price")
    ));
    assert!(events.iter().any(
        |e| matches!(&e.kind, SyncEventKind::ColumnGraphSaved { column } if column == "notes")
    ));
}
