use crate::host::HostWindowing;
use crate::window::{LogicalWindow, WindowId};

/// Keeps the backdrop window behind every other application window.
#[derive(Debug, Default)]
pub struct BackdropSync {
    backdrop: Option<LogicalWindow>,
}

impl BackdropSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(&self) -> Option<&LogicalWindow> {
        self.backdrop.as_ref()
    }

    /// Replace the backdrop and restack.
    pub fn configure(&mut self, host: &mut dyn HostWindowing, backdrop: Option<LogicalWindow>) {
        tracing::debug!(backdrop = ?backdrop.as_ref().map(LogicalWindow::id), "backdrop configured");
        self.backdrop = backdrop;
        self.resync(host);
    }

    /// Restack our windows in their current order with the backdrop last.
    pub fn resync(&self, host: &mut dyn HostWindowing) {
        let Some(backdrop) = &self.backdrop else {
            return;
        };
        let backdrop = backdrop.id();

        host.disable_screen_updates();
        let mut previous: Option<WindowId> = None;
        for window in host.window_order() {
            if window == backdrop {
                continue;
            }
            if let Some(above) = previous {
                host.order_below(window, above);
            }
            previous = Some(window);
        }
        if let Some(last) = previous {
            host.order_below(backdrop, last);
        }
        host.enable_screen_updates();
        tracing::trace!("backdrop resynced");
    }

    /// Drop the backdrop if it is the window `id`.
    pub fn forget(&mut self, id: WindowId) -> bool {
        if self.backdrop.as_ref().map(LogicalWindow::id) == Some(id) {
            self.backdrop = None;
            true
        } else {
            false
        }
    }
}
