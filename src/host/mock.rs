use super::{
    EventMask, HostWaker, HostWindowing, ModalSession, Modifiers, NativeEvent, NativeEventKind,
    WaitObserver,
};
use crate::coords::native_from_logical;
use crate::geometry::{NativePoint, NativeRect, Point, Rect};
use crate::window::WindowId;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Side effects requested by the bridge, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    OrderBelow {
        window: WindowId,
        relative_to: WindowId,
    },
    Hide(WindowId),
    DisableScreenUpdates,
    EnableScreenUpdates,
    ResetCursor,
    BeginModal {
        window: WindowId,
        session: ModalSession,
    },
    RunModal(ModalSession),
    EndModal(ModalSession),
    TrackWindowMove(WindowId),
}

#[derive(Debug, Clone)]
struct MockWindow {
    id: WindowId,
    frame: NativeRect,
    foreign: bool,
    visible: bool,
}

#[derive(Default)]
struct MockState {
    screens: Vec<NativeRect>,
    /// Front to back.
    windows: Vec<MockWindow>,
    pointer: NativePoint,
    modifiers: Modifiers,
    now_ms: u64,
    calls: Vec<HostCall>,
    observer: Option<WaitObserver>,
    observer_fired: usize,
    next_session: u64,
    pending_move: Option<(NativeRect, NativePoint)>,
}

#[derive(Default)]
struct EventQueue {
    events: Mutex<VecDeque<NativeEvent>>,
    ready: Condvar,
}

impl EventQueue {
    fn lock(&self) -> MutexGuard<'_, VecDeque<NativeEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct MockWaker {
    queue: Arc<EventQueue>,
}

impl HostWaker for MockWaker {
    fn post_wake_event(&self) {
        self.queue.lock().push_front(NativeEvent::wake());
        self.queue.ready.notify_all();
    }
}

/// In-memory host used by tests and benchmarks.
///
/// Clones share state, so a test can keep one clone while the bridge owns
/// another. Geometry helpers take logical coordinates and convert using the
/// mock's own screens.
#[derive(Clone)]
pub struct MockHost {
    state: Rc<RefCell<MockState>>,
    queue: Arc<EventQueue>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    /// A host with a single 1920x1080 screen.
    pub fn new() -> Self {
        Self::with_screens(vec![NativeRect::new(0.0, 0.0, 1920.0, 1080.0)])
    }

    pub fn with_screens(screens: Vec<NativeRect>) -> Self {
        let state = MockState {
            screens,
            next_session: 1,
            ..MockState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            queue: Arc::new(EventQueue::default()),
        }
    }

    fn desktop_height(&self) -> f64 {
        self.state
            .borrow()
            .screens
            .iter()
            .map(NativeRect::max_y)
            .fold(0.0, f64::max)
    }

    fn native_rect(&self, frame: Rect) -> NativeRect {
        let height = self.desktop_height();
        NativeRect::new(
            frame.x as f64,
            height - (frame.y + frame.height) as f64,
            frame.width as f64,
            frame.height as f64,
        )
    }

    pub fn native_point(&self, p: Point) -> NativePoint {
        native_from_logical(self.desktop_height(), p)
    }

    pub fn set_screens(&self, screens: Vec<NativeRect>) {
        self.state.borrow_mut().screens = screens;
    }

    /// Place one of our windows in front of all others.
    pub fn add_window(&self, id: WindowId, frame: Rect) {
        self.insert_window(id, frame, false);
    }

    /// Place a window owned by another application in front of all others.
    pub fn add_foreign_window(&self, id: WindowId, frame: Rect) {
        self.insert_window(id, frame, true);
    }

    fn insert_window(&self, id: WindowId, frame: Rect, foreign: bool) {
        let frame = self.native_rect(frame);
        let mut state = self.state.borrow_mut();
        state.windows.retain(|w| w.id != id);
        state.windows.insert(
            0,
            MockWindow {
                id,
                frame,
                foreign,
                visible: true,
            },
        );
    }

    pub fn is_visible(&self, id: WindowId) -> bool {
        self.state
            .borrow()
            .windows
            .iter()
            .any(|w| w.id == id && w.visible)
    }

    /// Every window id, front to back, including foreign and hidden ones.
    pub fn stacking_order(&self) -> Vec<WindowId> {
        self.state.borrow().windows.iter().map(|w| w.id).collect()
    }

    pub fn set_pointer(&self, p: Point) {
        let native = self.native_point(p);
        self.state.borrow_mut().pointer = native;
    }

    pub fn set_modifiers(&self, modifiers: Modifiers) {
        self.state.borrow_mut().modifiers = modifiers;
    }

    pub fn set_time(&self, now_ms: u64) {
        self.state.borrow_mut().now_ms = now_ms;
    }

    /// Frame and pointer location the next window-move loop ends with.
    pub fn set_pending_move(&self, frame: Rect, pointer: Point) {
        let frame = self.native_rect(frame);
        let pointer = self.native_point(pointer);
        self.state.borrow_mut().pending_move = Some((frame, pointer));
    }

    pub fn push_event(&self, event: NativeEvent) {
        self.queue.lock().push_back(event);
        self.queue.ready.notify_all();
    }

    /// Queue a pointer event at a logical location, stamped with the mock's
    /// current time and modifiers.
    pub fn push_mouse(&self, kind: NativeEventKind, p: Point) {
        let (modifiers, now) = {
            let state = self.state.borrow();
            (state.modifiers, state.now_ms)
        };
        let event = NativeEvent::new(kind, self.native_point(p))
            .with_modifiers(modifiers)
            .at(now);
        self.push_event(event);
    }

    pub fn queued_events(&self) -> Vec<NativeEvent> {
        self.queue.lock().iter().cloned().collect()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state.borrow().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<HostCall> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }

    pub fn has_wait_observer(&self) -> bool {
        self.state.borrow().observer.is_some()
    }

    pub fn observer_fired(&self) -> usize {
        self.state.borrow().observer_fired
    }

    fn record(&self, call: HostCall) {
        self.state.borrow_mut().calls.push(call);
    }

    fn fire_observer(&self) {
        let observer = self.state.borrow_mut().observer.take();
        if let Some(mut observer) = observer {
            observer();
            let mut state = self.state.borrow_mut();
            state.observer_fired += 1;
            if state.observer.is_none() {
                state.observer = Some(observer);
            }
        }
    }

    /// Make the dequeued event the "current" one, as a real host would.
    fn note_current(&self, event: &NativeEvent) {
        let mut state = self.state.borrow_mut();
        if event.timestamp_ms != 0 {
            state.now_ms = event.timestamp_ms;
        }
        match event.kind {
            NativeEventKind::ApplicationDefined { .. } | NativeEventKind::ScreenParametersChanged => {}
            NativeEventKind::ModifiersChanged => state.modifiers = event.modifiers,
            _ => {
                state.pointer = event.location;
                state.modifiers = event.modifiers;
            }
        }
    }
}

impl HostWindowing for MockHost {
    fn screen_frames(&self) -> Vec<NativeRect> {
        self.state.borrow().screens.clone()
    }

    fn window_at(&self, point: NativePoint) -> Option<WindowId> {
        self.state
            .borrow()
            .windows
            .iter()
            .filter(|w| w.visible)
            .find(|w| {
                point.x >= w.frame.x
                    && point.x <= w.frame.x + w.frame.width
                    && point.y >= w.frame.y
                    && point.y <= w.frame.y + w.frame.height
            })
            .map(|w| w.id)
    }

    fn content_rect(&self, window: WindowId) -> Option<NativeRect> {
        self.state
            .borrow()
            .windows
            .iter()
            .find(|w| w.id == window && !w.foreign)
            .map(|w| w.frame)
    }

    fn window_order(&self) -> Vec<WindowId> {
        self.state
            .borrow()
            .windows
            .iter()
            .filter(|w| w.visible && !w.foreign)
            .map(|w| w.id)
            .collect()
    }

    fn order_below(&mut self, window: WindowId, relative_to: WindowId) {
        self.record(HostCall::OrderBelow {
            window,
            relative_to,
        });
        let mut state = self.state.borrow_mut();
        let Some(from) = state.windows.iter().position(|w| w.id == window) else {
            return;
        };
        let moved = state.windows.remove(from);
        match state.windows.iter().position(|w| w.id == relative_to) {
            Some(anchor) => state.windows.insert(anchor + 1, moved),
            None => state.windows.insert(from, moved),
        }
    }

    fn hide_window(&mut self, window: WindowId) {
        self.record(HostCall::Hide(window));
        let mut state = self.state.borrow_mut();
        if let Some(w) = state.windows.iter_mut().find(|w| w.id == window) {
            w.visible = false;
        }
    }

    fn disable_screen_updates(&mut self) {
        self.record(HostCall::DisableScreenUpdates);
    }

    fn enable_screen_updates(&mut self) {
        self.record(HostCall::EnableScreenUpdates);
    }

    fn pointer_location(&self) -> NativePoint {
        self.state.borrow().pointer
    }

    fn modifier_state(&self) -> Modifiers {
        self.state.borrow().modifiers
    }

    fn event_time_ms(&self) -> u64 {
        self.state.borrow().now_ms
    }

    fn reset_cursor(&mut self) {
        self.record(HostCall::ResetCursor);
    }

    fn next_event(&mut self, timeout: Duration, mask: EventMask) -> Option<NativeEvent> {
        let deadline = Instant::now() + timeout;
        let mut observed_len = 0;
        let mut queue = self.queue.lock();
        loop {
            if let Some(pos) = queue.iter().position(|e| e.matches(mask)) {
                let event = queue.remove(pos);
                drop(queue);
                if let Some(event) = &event {
                    self.note_current(event);
                }
                return event;
            }

            // Events arrived that this wait does not accept: the run loop woke
            // up, so the observer gets a chance to break the wait.
            if queue.len() > observed_len {
                observed_len = queue.len();
                drop(queue);
                self.fire_observer();
                queue = self.queue.lock();
                continue;
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            queue = self
                .queue
                .ready
                .wait_timeout(queue, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn set_wait_observer(&mut self, observer: WaitObserver) {
        self.state.borrow_mut().observer = Some(observer);
    }

    fn waker(&self) -> Arc<dyn HostWaker> {
        Arc::new(MockWaker {
            queue: Arc::clone(&self.queue),
        })
    }

    fn begin_modal_session(&mut self, window: WindowId) -> ModalSession {
        let session = {
            let mut state = self.state.borrow_mut();
            let session = ModalSession(state.next_session);
            state.next_session += 1;
            session
        };
        self.record(HostCall::BeginModal { window, session });
        session
    }

    fn run_modal_session(&mut self, session: ModalSession) {
        self.record(HostCall::RunModal(session));
    }

    fn end_modal_session(&mut self, session: ModalSession) {
        self.record(HostCall::EndModal(session));
    }

    fn track_window_move(&mut self, window: WindowId) {
        self.record(HostCall::TrackWindowMove(window));
        let mut state = self.state.borrow_mut();
        if let Some((frame, pointer)) = state.pending_move.take() {
            if let Some(w) = state.windows.iter_mut().find(|w| w.id == window) {
                w.frame = frame;
            }
            state.pointer = pointer;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_at_prefers_front_window() {
        let host = MockHost::new();
        host.add_window(WindowId(1), Rect::new(0, 0, 200, 200));
        host.add_window(WindowId(2), Rect::new(100, 100, 200, 200));
        assert_eq!(host.window_at(host.native_point(Point::new(150, 150))), Some(WindowId(2)));
        assert_eq!(host.window_at(host.native_point(Point::new(50, 50))), Some(WindowId(1)));
        assert_eq!(host.window_at(host.native_point(Point::new(900, 900))), None);
    }

    #[test]
    fn order_below_moves_window_behind_anchor() {
        let mut host = MockHost::new();
        host.add_window(WindowId(1), Rect::new(0, 0, 10, 10));
        host.add_window(WindowId(2), Rect::new(0, 0, 10, 10));
        host.add_window(WindowId(3), Rect::new(0, 0, 10, 10));
        assert_eq!(host.window_order(), vec![WindowId(3), WindowId(2), WindowId(1)]);

        host.order_below(WindowId(3), WindowId(1));
        assert_eq!(host.window_order(), vec![WindowId(2), WindowId(1), WindowId(3)]);
    }

    #[test]
    fn next_event_respects_mask_and_timeout() {
        let mut host = MockHost::new();
        host.push_mouse(NativeEventKind::MouseMoved, Point::new(1, 1));

        let none = host.next_event(Duration::from_millis(5), EventMask::ApplicationDefined);
        assert!(none.is_none());
        assert_eq!(host.queued_events().len(), 1);

        let some = host.next_event(Duration::from_millis(5), EventMask::Any);
        assert!(matches!(some.map(|e| e.kind), Some(NativeEventKind::MouseMoved)));
    }

    #[test]
    fn waker_posts_at_head() {
        let mut host = MockHost::new();
        host.push_mouse(NativeEventKind::MouseMoved, Point::new(1, 1));
        host.waker().post_wake_event();
        let first = host.next_event(Duration::ZERO, EventMask::Any).unwrap();
        assert!(first.is_wake());
    }
}
