use crate::geometry::Point;
use crate::host::Modifiers;
use crate::window::{LogicalWindow, WindowId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Receiver of the normalized pointer stream.
///
/// Window arguments are borrowed; a sink that needs a window beyond the call
/// clones the handle.
pub trait EventSink {
    fn mouse_down(&mut self, window: &LogicalWindow, button: u8, click_count: u32);
    fn mouse_up(&mut self, window: &LogicalWindow, button: u8, click_count: u32);
    /// Button let go outside the window that saw the press, or released by a
    /// resynchronization (`synthesized`).
    fn mouse_release(&mut self, window: &LogicalWindow, button: u8, synthesized: bool);
    fn mouse_move(&mut self, window: &LogicalWindow, position: Point);
    fn mouse_drag(&mut self, window: &LogicalWindow, button: u8);
    fn mouse_enter(&mut self, window: &LogicalWindow);
    fn mouse_leave(&mut self, window: &LogicalWindow);
    fn mouse_scroll(&mut self, window: &LogicalWindow, dx: i32, dy: i32);
    fn modifiers_changed(&mut self, modifiers: Modifiers);
    /// Re-evaluate the cursor shown over `window`.
    fn cursor_update(&mut self, _window: &LogicalWindow) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    Down {
        window: WindowId,
        button: u8,
        click_count: u32,
    },
    Up {
        window: WindowId,
        button: u8,
        click_count: u32,
    },
    Release {
        window: WindowId,
        button: u8,
        synthesized: bool,
    },
    Move {
        window: WindowId,
        position: Point,
    },
    Drag {
        window: WindowId,
        button: u8,
    },
    Enter(WindowId),
    Leave(WindowId),
    Scroll {
        window: WindowId,
        dx: i32,
        dy: i32,
    },
    Modifiers(Modifiers),
    CursorUpdate(WindowId),
}

/// Sink that records every callback as a [`BridgeEvent`].
///
/// Clones share one log, so a test keeps a clone while the bridge owns the
/// other. Cursor updates are dropped unless requested with
/// [`EventLog::with_cursor_updates`].
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<BridgeEvent>>>,
    record_cursor: bool,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cursor_updates(mut self) -> Self {
        self.record_cursor = true;
        self
    }

    pub fn events(&self) -> Vec<BridgeEvent> {
        self.lock().clone()
    }

    pub fn take(&self) -> Vec<BridgeEvent> {
        std::mem::take(&mut *self.lock())
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, event: BridgeEvent) {
        self.lock().push(event);
    }

    // A panicking assertion on another thread must not hide later events.
    fn lock(&self) -> MutexGuard<'_, Vec<BridgeEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for EventLog {
    fn mouse_down(&mut self, window: &LogicalWindow, button: u8, click_count: u32) {
        self.push(BridgeEvent::Down {
            window: window.id(),
            button,
            click_count,
        });
    }

    fn mouse_up(&mut self, window: &LogicalWindow, button: u8, click_count: u32) {
        self.push(BridgeEvent::Up {
            window: window.id(),
            button,
            click_count,
        });
    }

    fn mouse_release(&mut self, window: &LogicalWindow, button: u8, synthesized: bool) {
        self.push(BridgeEvent::Release {
            window: window.id(),
            button,
            synthesized,
        });
    }

    fn mouse_move(&mut self, window: &LogicalWindow, position: Point) {
        self.push(BridgeEvent::Move {
            window: window.id(),
            position,
        });
    }

    fn mouse_drag(&mut self, window: &LogicalWindow, button: u8) {
        self.push(BridgeEvent::Drag {
            window: window.id(),
            button,
        });
    }

    fn mouse_enter(&mut self, window: &LogicalWindow) {
        self.push(BridgeEvent::Enter(window.id()));
    }

    fn mouse_leave(&mut self, window: &LogicalWindow) {
        self.push(BridgeEvent::Leave(window.id()));
    }

    fn mouse_scroll(&mut self, window: &LogicalWindow, dx: i32, dy: i32) {
        self.push(BridgeEvent::Scroll {
            window: window.id(),
            dx,
            dy,
        });
    }

    fn modifiers_changed(&mut self, modifiers: Modifiers) {
        self.push(BridgeEvent::Modifiers(modifiers));
    }

    fn cursor_update(&mut self, window: &LogicalWindow) {
        if self.record_cursor {
            self.push(BridgeEvent::CursorUpdate(window.id()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_log() {
        let log = EventLog::new();
        let mut sink = log.clone();
        let w = LogicalWindow::new(WindowId(5));
        sink.mouse_enter(&w);
        sink.cursor_update(&w);
        assert_eq!(log.events(), vec![BridgeEvent::Enter(WindowId(5))]);
        assert_eq!(log.take().len(), 1);
        assert!(log.events().is_empty());
    }

    #[test]
    fn poisoned_log_keeps_recording() {
        let log = EventLog::new();
        let mut sink = log.clone();
        sink.mouse_enter(&LogicalWindow::new(WindowId(1)));

        let shared = log.clone();
        let poisoner = std::thread::spawn(move || {
            let _guard = shared.events.lock().unwrap();
            panic!("poison the log");
        });
        assert!(poisoner.join().is_err());
        assert!(log.events.is_poisoned());

        sink.mouse_leave(&LogicalWindow::new(WindowId(1)));
        assert_eq!(
            log.events(),
            vec![BridgeEvent::Enter(WindowId(1)), BridgeEvent::Leave(WindowId(1))]
        );
        log.clear();
        assert!(log.take().is_empty());
    }

    #[test]
    fn cursor_updates_recorded_on_request() {
        let mut sink = EventLog::new().with_cursor_updates();
        let w = LogicalWindow::new(WindowId(2));
        sink.cursor_update(&w);
        assert_eq!(sink.events(), vec![BridgeEvent::CursorUpdate(WindowId(2))]);
    }
}
