use std::time::{Duration, Instant};

use colweave::selection::{CanvasDisposition, EchoGuard, SelectionSync};

#[test]
fn canvas_event_inside_the_window_is_suppressed_once() {
    let mut sync = SelectionSync::new();
    let t0 = Instant::now();

    sync.note_list_toggle(t0);
    assert!(matches!(sync.guard(), EchoGuard::AwaitingEcho { .. }));

    let first = sync.on_canvas_event(t0 + Duration::from_millis(100));
    assert_eq!(first, CanvasDisposition::Suppressed);
    assert_eq!(sync.guard(), EchoGuard::Idle);

    // Consumed exactly once: the next event applies even inside the window.
    let second = sync.on_canvas_event(t0 + Duration::from_millis(120));
    assert_eq!(second, CanvasDisposition::Apply);
}

#[test]
fn canvas_event_after_the_window_applies() {
    let mut sync = SelectionSync::new();
    let t0 = Instant::now();

    sync.note_list_toggle(t0);
    let disposition = sync.on_canvas_event(t0 + Duration::from_millis(200));

    assert_eq!(disposition, CanvasDisposition::Apply);
    assert_eq!(sync.guard(), EchoGuard::Idle);
}

#[test]
fn idle_guard_always_applies() {
    let mut sync = SelectionSync::new();
    assert_eq!(
        sync.on_canvas_event(Instant::now()),
        CanvasDisposition::Apply
    );
}

#[test]
fn a_new_toggle_rearms_the_guard() {
    let mut sync = SelectionSync::new();
    let t0 = Instant::now();

    sync.note_list_toggle(t0);
    let _ = sync.on_canvas_event(t0 + Duration::from_millis(10));

    sync.note_list_toggle(t0 + Duration::from_millis(300));
    let echoed = sync.on_canvas_event(t0 + Duration::from_millis(350));
    assert_eq!(echoed, CanvasDisposition::Suppressed);
}

#[test]
fn window_width_is_configurable() {
    let mut sync = SelectionSync::with_window(Duration::from_millis(20));
    let t0 = Instant::now();

    sync.note_list_toggle(t0);
    let disposition = sync.on_canvas_event(t0 + Duration::from_millis(100));
    assert_eq!(disposition, CanvasDisposition::Apply);
}
