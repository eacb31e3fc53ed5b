use crate::host::{HostWindowing, ModalSession};
use crate::window::{LogicalWindow, WindowId};

#[derive(Debug)]
pub struct ModalSessionEntry {
    pub window: LogicalWindow,
    pub session: ModalSession,
    pub completed: bool,
}

/// Nested modal sessions, most recent last.
///
/// A session ended out of order is only marked complete; it is torn down once
/// every session above it has ended too.
#[derive(Debug, Default)]
pub struct ModalSessionStack {
    entries: Vec<ModalSessionEntry>,
}

impl ModalSessionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for `window`. The pointer must already have been
    /// released from any window.
    pub fn begin(&mut self, host: &mut dyn HostWindowing, window: LogicalWindow) -> ModalSession {
        // Keep the host from centering the window when the session starts.
        window.set_frame_locked(true);
        let session = host.begin_modal_session(window.id());
        window.set_frame_locked(false);

        tracing::debug!(window = %window.id(), depth = self.entries.len() + 1, "modal session started");
        self.entries.push(ModalSessionEntry {
            window,
            session,
            completed: false,
        });
        session
    }

    /// Mark the session of `window` complete and tear down every completed
    /// session at the top of the stack. Returns how many were torn down.
    pub fn end(&mut self, host: &mut dyn HostWindowing, window: &LogicalWindow) -> usize {
        let Some(entry) = self.entries.iter_mut().find(|e| &e.window == window) else {
            tracing::trace!(window = %window.id(), "no modal session for window");
            return 0;
        };
        entry.completed = true;

        let mut torn_down = 0;
        while self.entries.last().is_some_and(|e| e.completed) {
            let Some(entry) = self.entries.pop() else {
                break;
            };
            host.end_modal_session(entry.session);
            host.hide_window(entry.window.id());
            tracing::debug!(window = %entry.window.id(), "modal session ended");
            torn_down += 1;
        }
        torn_down
    }

    /// Session pumped by the wait loop.
    pub fn current(&self) -> Option<ModalSession> {
        self.entries.last().map(|e| e.session)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.entries.iter().any(|e| e.window.id() == id)
    }
}
