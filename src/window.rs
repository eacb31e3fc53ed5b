use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Native identifier of a host window (the window number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct WindowInner {
    id: WindowId,
    frame_locked: Cell<bool>,
    moving: Cell<bool>,
}

/// Shared handle to an application window.
///
/// Cloning retains the window and dropping a clone releases it. Two handles
/// are equal only when they point at the same window object, so a window that
/// was closed and recreated with the same native id is a different window.
#[derive(Debug, Clone)]
pub struct LogicalWindow(Rc<WindowInner>);

impl LogicalWindow {
    pub fn new(id: WindowId) -> Self {
        Self(Rc::new(WindowInner {
            id,
            frame_locked: Cell::new(false),
            moving: Cell::new(false),
        }))
    }

    pub fn id(&self) -> WindowId {
        self.0.id
    }

    /// While locked the host must not reposition the window on its own
    /// (e.g. centering it when a modal session starts).
    pub fn is_frame_locked(&self) -> bool {
        self.0.frame_locked.get()
    }

    pub fn set_frame_locked(&self, locked: bool) {
        self.0.frame_locked.set(locked);
    }

    pub fn is_moving(&self) -> bool {
        self.0.moving.get()
    }

    pub fn set_moving(&self, moving: bool) {
        self.0.moving.set(moving);
    }

    /// Number of live handles to this window.
    pub fn retain_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl PartialEq for LogicalWindow {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for LogicalWindow {}
