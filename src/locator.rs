use crate::coords::CoordinateMapper;
use crate::geometry::{NativeRect, Point, Rect};
use crate::host::HostWindowing;
use crate::window::{LogicalWindow, WindowId};
use std::collections::HashMap;

/// Resolves screen points and native ids to application windows.
#[derive(Debug, Default)]
pub struct WindowLocator {
    windows: HashMap<WindowId, LogicalWindow>,
    moving: Option<(WindowId, NativeRect)>,
}

impl WindowLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window, returning any previous window with the same id.
    pub fn register(&mut self, window: LogicalWindow) -> Option<LogicalWindow> {
        tracing::trace!(window = %window.id(), "window registered");
        self.windows.insert(window.id(), window)
    }

    pub fn unregister(&mut self, id: WindowId) -> Option<LogicalWindow> {
        if matches!(self.moving, Some((moving, _)) if moving == id) {
            self.moving = None;
        }
        self.windows.remove(&id)
    }

    pub fn window_by_id(&self, id: WindowId) -> Option<LogicalWindow> {
        self.windows.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Override the frame used for `id` while the host is still moving it.
    pub fn set_moving_frame(&mut self, id: WindowId, frame: Option<NativeRect>) {
        self.moving = frame.map(|frame| (id, frame));
    }

    pub fn moving_frame(&self, id: WindowId) -> Option<NativeRect> {
        match self.moving {
            Some((moving, frame)) if moving == id => Some(frame),
            _ => None,
        }
    }

    fn native_content_rect(&self, host: &dyn HostWindowing, id: WindowId) -> Option<NativeRect> {
        self.moving_frame(id).or_else(|| host.content_rect(id))
    }

    /// Content rectangle of `window` in logical coordinates.
    pub fn content_rect(
        &self,
        host: &dyn HostWindowing,
        mapper: &CoordinateMapper,
        window: &LogicalWindow,
    ) -> Option<Rect> {
        self.native_content_rect(host, window.id())
            .map(|r| mapper.rect_to_logical(host, r))
    }

    /// The application window under `point`, if the topmost window there is
    /// ours and the point is inside its content area.
    pub fn window_at(
        &self,
        host: &dyn HostWindowing,
        mapper: &CoordinateMapper,
        point: Point,
    ) -> Option<LogicalWindow> {
        let native = mapper.to_native(host, point);
        let id = host.window_at(native)?;
        let window = self.windows.get(&id)?;

        // The host hit-test includes every edge of the frame; the content test
        // runs in native space, so the logical top row falls outside.
        let content = self.native_content_rect(host, id)?;
        if content.intersects_pixel(native) {
            Some(window.clone())
        } else {
            None
        }
    }

    /// Translate a screen point into `window`'s content coordinates.
    pub fn screen_to_window(
        &self,
        host: &dyn HostWindowing,
        mapper: &CoordinateMapper,
        window: &LogicalWindow,
        point: Point,
    ) -> Point {
        match self.content_rect(host, mapper, window) {
            Some(content) => Point::new(point.x - content.x, point.y - content.y),
            None => point,
        }
    }
}
