use std::time::Duration;
use window_event_bridge::host::mock::{HostCall, MockHost};
use window_event_bridge::host::{ModalSession, NativeEventKind};
use window_event_bridge::{
    BridgeEvent, EventBridge, EventLog, LogicalWindow, Point, Rect, Settings, WindowId,
};

fn bridge_with(host: &MockHost, log: &EventLog) -> EventBridge {
    EventBridge::new(Box::new(host.clone()), Box::new(log.clone()), Settings::default())
}

#[test]
fn sessions_tear_down_in_reverse_order() {
    let host = MockHost::new();
    let log = EventLog::new();
    let mut bridge = bridge_with(&host, &log);
    let [a, b, c] = [1, 2, 3].map(|id| {
        host.add_window(WindowId(id), Rect::new(0, 0, 100, 100));
        LogicalWindow::new(WindowId(id))
    });
    for window in [&a, &b, &c] {
        bridge.register_window(window);
        bridge.begin_modal_session(window);
    }
    host.take_calls();

    assert_eq!(bridge.end_modal_session(&b), 0);
    assert_eq!(bridge.end_modal_session(&a), 0);
    assert!(host.calls().is_empty());
    assert_eq!(bridge.modal_sessions().len(), 3);

    assert_eq!(bridge.end_modal_session(&c), 3);
    assert_eq!(
        host.take_calls(),
        vec![
            HostCall::EndModal(ModalSession(3)),
            HostCall::Hide(WindowId(3)),
            HostCall::EndModal(ModalSession(2)),
            HostCall::Hide(WindowId(2)),
            HostCall::EndModal(ModalSession(1)),
            HostCall::Hide(WindowId(1)),
        ]
    );
    assert!(bridge.modal_sessions().is_empty());
}

#[test]
fn begin_releases_pointer_before_session() {
    let host = MockHost::new();
    let log = EventLog::new();
    let mut bridge = bridge_with(&host, &log);
    host.add_window(WindowId(1), Rect::new(0, 0, 100, 100));
    let main = LogicalWindow::new(WindowId(1));
    let dialog = LogicalWindow::new(WindowId(2));
    bridge.register_window(&main);
    bridge.register_window(&dialog);

    host.push_mouse(NativeEventKind::MouseMoved, Point::new(10, 10));
    host.push_mouse(NativeEventKind::MouseDown { button: 0 }, Point::new(10, 10));
    while bridge.wait_for_event(Duration::ZERO, false) {}
    log.clear();

    bridge.begin_modal_session(&dialog);
    assert_eq!(
        log.events(),
        vec![
            BridgeEvent::Release {
                window: WindowId(1),
                button: 0,
                synthesized: true
            },
            BridgeEvent::Leave(WindowId(1)),
        ]
    );
    assert!(bridge.mouse_window().is_none());
    assert_eq!(bridge.pointer_state().buttons, 0);
    assert!(bridge.modal_sessions().contains(WindowId(2)));
}

#[test]
fn wait_pumps_the_innermost_session() {
    let host = MockHost::new();
    let log = EventLog::new();
    let mut bridge = bridge_with(&host, &log);
    let outer = LogicalWindow::new(WindowId(1));
    let inner = LogicalWindow::new(WindowId(2));
    bridge.begin_modal_session(&outer);
    bridge.begin_modal_session(&inner);
    host.take_calls();

    bridge.wait_for_event(Duration::ZERO, false);
    assert_eq!(host.take_calls(), vec![HostCall::RunModal(ModalSession(2))]);

    bridge.end_modal_session(&inner);
    host.take_calls();
    bridge.wait_for_event(Duration::ZERO, false);
    assert_eq!(host.take_calls(), vec![HostCall::RunModal(ModalSession(1))]);
}

#[test]
fn window_move_uses_moving_frame_then_resyncs() {
    let host = MockHost::new();
    let log = EventLog::new();
    let mut bridge = bridge_with(&host, &log);
    host.add_window(WindowId(1), Rect::new(100, 100, 200, 200));
    let window = LogicalWindow::new(WindowId(1));
    bridge.register_window(&window);

    host.push_mouse(NativeEventKind::MouseMoved, Point::new(150, 110));
    host.push_mouse(NativeEventKind::MouseDown { button: 0 }, Point::new(150, 110));
    while bridge.wait_for_event(Duration::ZERO, false) {}
    log.clear();

    host.set_pending_move(Rect::new(300, 100, 200, 200), Point::new(360, 120));
    bridge.track_window_move(&window);

    assert!(!window.is_moving());
    assert!(host.calls().contains(&HostCall::TrackWindowMove(WindowId(1))));
    assert_eq!(
        log.events(),
        vec![
            BridgeEvent::Release {
                window: WindowId(1),
                button: 0,
                synthesized: true
            },
            BridgeEvent::Move {
                window: WindowId(1),
                position: Point::new(60, 20)
            },
        ]
    );
    assert_eq!(
        bridge.window_at(Point::new(360, 120)).map(|w| w.id()),
        Some(WindowId(1))
    );
}

#[test]
fn moving_frame_override_drives_hit_testing() {
    let host = MockHost::new();
    let log = EventLog::new();
    let mut bridge = bridge_with(&host, &log);
    host.add_window(WindowId(1), Rect::new(0, 0, 200, 200));
    let window = LogicalWindow::new(WindowId(1));
    bridge.register_window(&window);

    bridge.set_moving_frame(&window, Some(Rect::new(50, 0, 200, 200)));
    assert!(bridge.window_at(Point::new(20, 20)).is_none());
    assert_eq!(bridge.window_at(Point::new(60, 20)), Some(window.clone()));

    bridge.set_moving_frame(&window, None);
    assert_eq!(bridge.window_at(Point::new(20, 20)), Some(window));
}
