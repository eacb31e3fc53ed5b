//! The event bridge: one owned context tying the host, the application sink
//! and every piece of pointer/window bookkeeping together.

use crate::backdrop::BackdropSync;
use crate::coords::CoordinateMapper;
use crate::events::EventSink;
use crate::geometry::{NativePoint, NativeRect, Point, Rect};
use crate::host::{HostWindowing, NativeEvent, NativeEventKind};
use crate::locator::WindowLocator;
use crate::modal::ModalSessionStack;
use crate::pointer::{PointerEnv, PointerState, PointerTracker};
use crate::settings::Settings;
use crate::wait::{WaitCoordinator, WaitHandle};
use crate::window::{LogicalWindow, WindowId};
use std::time::Duration;

pub struct EventBridge {
    host: Box<dyn HostWindowing>,
    sink: Box<dyn EventSink>,
    settings: Settings,
    mapper: CoordinateMapper,
    locator: WindowLocator,
    pointer: PointerTracker,
    modal: ModalSessionStack,
    wait: WaitCoordinator,
    backdrop: BackdropSync,
}

impl EventBridge {
    pub fn new(host: Box<dyn HostWindowing>, sink: Box<dyn EventSink>, settings: Settings) -> Self {
        let wait = WaitCoordinator::new(host.waker());
        Self {
            host,
            sink,
            settings,
            mapper: CoordinateMapper::new(),
            locator: WindowLocator::new(),
            pointer: PointerTracker::new(),
            modal: ModalSessionStack::new(),
            wait,
            backdrop: BackdropSync::new(),
        }
    }

    fn with_pointer<R>(&mut self, f: impl FnOnce(&mut PointerTracker, &mut PointerEnv<'_>) -> R) -> R {
        let mut env = PointerEnv {
            host: self.host.as_mut(),
            sink: self.sink.as_mut(),
            locator: &self.locator,
            mapper: &self.mapper,
            settings: &self.settings.pointer,
        };
        f(&mut self.pointer, &mut env)
    }

    // Waiting

    /// Wait up to `duration` for one native event and dispatch it. Returns
    /// whether an event was retrieved.
    pub fn wait_for_event(&mut self, duration: Duration, blocking: bool) -> bool {
        let session = self.modal.current();
        match self.wait.wait(self.host.as_mut(), session, duration, blocking) {
            Some(event) => {
                self.dispatch_event(&event);
                true
            }
            None => false,
        }
    }

    pub fn wait_handle(&self) -> WaitHandle {
        self.wait.handle()
    }

    pub fn break_wait(&self) {
        self.wait.handle().break_wait();
    }

    pub fn schedule_callback<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.wait.handle().schedule_callback(callback);
    }

    pub fn last_mouse_event(&self) -> Option<&NativeEvent> {
        self.wait.last_mouse_event()
    }

    /// Route one native event into the pointer state machine.
    pub fn dispatch_event(&mut self, event: &NativeEvent) {
        if event.is_wake() {
            return;
        }
        match event.kind {
            NativeEventKind::MouseMoved | NativeEventKind::MouseDragged { .. } => {
                let screen = self.mapper.to_logical(self.host.as_ref(), event.location);
                self.with_pointer(|p, env| p.handle_motion(env, screen));
            }
            NativeEventKind::MouseDown { button } | NativeEventKind::MouseUp { button } => {
                let pressed = matches!(event.kind, NativeEventKind::MouseDown { .. });
                let screen = self.mapper.to_logical(self.host.as_ref(), event.location);
                self.with_pointer(|p, env| {
                    p.handle_motion(env, screen);
                    p.handle_button(env, button, pressed);
                });
            }
            NativeEventKind::Scroll { dx, dy } => {
                self.with_pointer(|p, env| p.handle_scroll(env, dx, dy));
            }
            NativeEventKind::ModifiersChanged => {
                let modifiers = event.modifiers;
                self.with_pointer(|p, env| p.handle_modifiers(env, modifiers));
            }
            NativeEventKind::ScreenParametersChanged => self.invalidate_screens(),
            NativeEventKind::ApplicationDefined { tag } => {
                tracing::trace!(tag, "ignoring application-defined event");
            }
        }
    }

    // Pointer

    pub fn grab_pointer(&mut self, window: &LogicalWindow) -> bool {
        self.pointer.grab(window)
    }

    pub fn ungrab_pointer(&mut self) {
        self.pointer.ungrab();
    }

    pub fn lock_cursor(&mut self) {
        self.pointer.lock_cursor();
    }

    pub fn unlock_cursor(&mut self) {
        self.pointer.unlock_cursor();
    }

    pub fn sync_pointer(&mut self) {
        self.with_pointer(|p, env| p.sync(env));
    }

    pub fn mouse_window(&self) -> Option<&LogicalWindow> {
        self.pointer.mouse_window()
    }

    pub fn pointer_state(&self) -> &PointerState {
        self.pointer.state()
    }

    // Modal sessions and host loops

    pub fn begin_modal_session(&mut self, window: &LogicalWindow) {
        self.with_pointer(|p, env| p.sync_before_tracking(env));
        self.modal.begin(self.host.as_mut(), window.clone());
    }

    /// Returns the number of sessions torn down.
    pub fn end_modal_session(&mut self, window: &LogicalWindow) -> usize {
        self.modal.end(self.host.as_mut(), window)
    }

    pub fn modal_sessions(&self) -> &ModalSessionStack {
        &self.modal
    }

    /// Let the host drag `window` around in its own loop, then resynchronize.
    pub fn track_window_move(&mut self, window: &LogicalWindow) {
        let id = window.id();
        window.set_moving(true);
        let frame = self.host.content_rect(id);
        self.locator.set_moving_frame(id, frame);
        tracing::debug!(window = %id, "window move tracking started");

        self.host.track_window_move(id);

        self.locator.set_moving_frame(id, None);
        window.set_moving(false);
        tracing::debug!(window = %id, "window move tracking finished");
        self.sync_pointer();
    }

    /// Override the frame used to hit-test `window` while it is moving.
    pub fn set_moving_frame(&mut self, window: &LogicalWindow, frame: Option<Rect>) {
        let native = frame.map(|r| self.mapper.rect_to_native(self.host.as_ref(), r));
        self.locator.set_moving_frame(window.id(), native);
    }

    // Backdrop

    pub fn configure_backdrop(&mut self, backdrop: Option<&LogicalWindow>) {
        self.backdrop.configure(self.host.as_mut(), backdrop.cloned());
    }

    pub fn resync_backdrop(&mut self) {
        self.backdrop.resync(self.host.as_mut());
    }

    pub fn backdrop(&self) -> Option<&LogicalWindow> {
        self.backdrop.window()
    }

    // Windows

    pub fn register_window(&mut self, window: &LogicalWindow) {
        self.locator.register(window.clone());
    }

    /// Forget a closing window: it stops owning the pointer and stops being
    /// the backdrop.
    pub fn unregister_window(&mut self, id: WindowId) -> Option<LogicalWindow> {
        self.pointer.forget_window(self.sink.as_mut(), id);
        if self.backdrop.forget(id) {
            tracing::debug!(window = %id, "backdrop window unregistered");
        }
        self.locator.unregister(id)
    }

    pub fn window_by_id(&self, id: WindowId) -> Option<LogicalWindow> {
        self.locator.window_by_id(id)
    }

    pub fn window_at(&self, screen: Point) -> Option<LogicalWindow> {
        self.locator.window_at(self.host.as_ref(), &self.mapper, screen)
    }

    // Coordinates

    pub fn to_native(&self, p: Point) -> NativePoint {
        self.mapper.to_native(self.host.as_ref(), p)
    }

    pub fn to_logical(&self, p: NativePoint) -> Point {
        self.mapper.to_logical(self.host.as_ref(), p)
    }

    pub fn rect_to_native(&self, r: Rect) -> NativeRect {
        self.mapper.rect_to_native(self.host.as_ref(), r)
    }

    pub fn rect_to_logical(&self, r: NativeRect) -> Rect {
        self.mapper.rect_to_logical(self.host.as_ref(), r)
    }

    /// Display geometry changed: recompute the desktop height and restack.
    pub fn invalidate_screens(&mut self) {
        tracing::debug!("screen parameters changed");
        self.mapper.invalidate();
        self.resync_backdrop();
    }

    // Settings

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn update_settings(&mut self, settings: Settings) {
        tracing::debug!(pointer = ?settings.pointer, "pointer settings updated");
        self.settings = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{BridgeEvent, EventLog};
    use crate::host::mock::MockHost;

    #[test]
    fn wake_events_are_ignored() {
        let host = MockHost::new();
        let log = EventLog::new();
        let mut bridge = EventBridge::new(Box::new(host.clone()), Box::new(log.clone()), Settings::default());
        bridge.break_wait();
        assert!(bridge.wait_for_event(Duration::ZERO, false));
        assert!(log.events().is_empty());
        assert!(!bridge.wait_for_event(Duration::ZERO, false));
    }

    #[test]
    fn unregister_clears_owner() {
        let host = MockHost::new();
        host.add_window(WindowId(1), Rect::new(0, 0, 100, 100));
        let log = EventLog::new();
        let mut bridge = EventBridge::new(Box::new(host.clone()), Box::new(log.clone()), Settings::default());
        let window = LogicalWindow::new(WindowId(1));
        bridge.register_window(&window);
        host.push_mouse(NativeEventKind::MouseMoved, Point::new(5, 5));
        bridge.wait_for_event(Duration::ZERO, false);
        assert_eq!(bridge.mouse_window(), Some(&window));

        bridge.unregister_window(WindowId(1));
        assert!(bridge.mouse_window().is_none());
        assert_eq!(log.events().last(), Some(&BridgeEvent::Leave(WindowId(1))));
        assert_eq!(window.retain_count(), 1);
    }
}
