//! Interface to the native windowing system.
//!
//! Everything the bridge needs from the host goes through [`HostWindowing`],
//! so the state machines can run against [`mock::MockHost`] without a live
//! display.

pub mod mock;

use crate::geometry::{NativePoint, NativeRect};
use crate::window::WindowId;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;
use std::sync::Arc;
use std::time::Duration;

/// Subtype carried by the synthetic event posted to break a wait.
pub const WAKE_EVENT_TAG: u32 = 0x7761_6b65;

/// Keyboard modifier mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(1 << 0);
    pub const CONTROL: Modifiers = Modifiers(1 << 1);
    pub const OPTION: Modifiers = Modifiers(1 << 2);
    pub const COMMAND: Modifiers = Modifiers(1 << 3);
    pub const CAPS_LOCK: Modifiers = Modifiers(1 << 4);

    pub const fn contains(self, other: Modifiers) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

/// A single modifier key, used where configuration names one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKey {
    Shift,
    Control,
    Option,
    Command,
}

impl ModifierKey {
    pub fn mask(self) -> Modifiers {
        match self {
            ModifierKey::Shift => Modifiers::SHIFT,
            ModifierKey::Control => Modifiers::CONTROL,
            ModifierKey::Option => Modifiers::OPTION,
            ModifierKey::Command => Modifiers::COMMAND,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeEventKind {
    MouseDown { button: u8 },
    MouseUp { button: u8 },
    MouseDragged { button: u8 },
    MouseMoved,
    Scroll { dx: f64, dy: f64 },
    ModifiersChanged,
    ScreenParametersChanged,
    ApplicationDefined { tag: u32 },
}

/// An event as retrieved from the host queue.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeEvent {
    pub kind: NativeEventKind,
    /// Pointer location in native screen coordinates.
    pub location: NativePoint,
    pub modifiers: Modifiers,
    pub timestamp_ms: u64,
}

impl NativeEvent {
    pub fn new(kind: NativeEventKind, location: NativePoint) -> Self {
        Self {
            kind,
            location,
            modifiers: Modifiers::NONE,
            timestamp_ms: 0,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn at(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// The no-op event used to wake a blocked wait.
    pub fn wake() -> Self {
        Self::new(
            NativeEventKind::ApplicationDefined {
                tag: WAKE_EVENT_TAG,
            },
            NativePoint::default(),
        )
    }

    pub fn is_wake(&self) -> bool {
        matches!(
            self.kind,
            NativeEventKind::ApplicationDefined {
                tag: WAKE_EVENT_TAG
            }
        )
    }

    pub fn matches(&self, mask: EventMask) -> bool {
        match mask {
            EventMask::Any => true,
            EventMask::ApplicationDefined => {
                matches!(self.kind, NativeEventKind::ApplicationDefined { .. })
            }
        }
    }
}

/// Which events a wait is willing to dequeue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMask {
    Any,
    ApplicationDefined,
}

/// Handle to a host modal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModalSession(pub u64);

/// Observer fired by the host after each native wait cycle.
pub type WaitObserver = Box<dyn FnMut()>;

/// Thread-safe way to post the wake event at the head of the host queue.
pub trait HostWaker: Send + Sync {
    fn post_wake_event(&self);
}

pub trait HostWindowing {
    /// Frames of all attached screens in native coordinates.
    fn screen_frames(&self) -> Vec<NativeRect>;

    /// Topmost visible window (ours or foreign) at the given point. The host
    /// test is inclusive of all edges.
    fn window_at(&self, point: NativePoint) -> Option<WindowId>;

    /// Content rectangle of one of our windows.
    fn content_rect(&self, window: WindowId) -> Option<NativeRect>;

    /// Our visible windows, front to back.
    fn window_order(&self) -> Vec<WindowId>;

    /// Move `window` directly behind `relative_to`.
    fn order_below(&mut self, window: WindowId, relative_to: WindowId);

    fn hide_window(&mut self, window: WindowId);

    fn disable_screen_updates(&mut self);

    fn enable_screen_updates(&mut self);

    /// Current pointer location in native coordinates.
    fn pointer_location(&self) -> NativePoint;

    /// Modifiers of the event currently being processed.
    fn modifier_state(&self) -> Modifiers;

    /// Timestamp of the event currently being processed.
    fn event_time_ms(&self) -> u64;

    fn reset_cursor(&mut self);

    /// Dequeue the next event matching `mask`, waiting at most `timeout`.
    fn next_event(&mut self, timeout: Duration, mask: EventMask) -> Option<NativeEvent>;

    fn set_wait_observer(&mut self, observer: WaitObserver);

    fn waker(&self) -> Arc<dyn HostWaker>;

    fn begin_modal_session(&mut self, window: WindowId) -> ModalSession;

    /// Pump exactly one iteration of the session.
    fn run_modal_session(&mut self, session: ModalSession);

    fn end_modal_session(&mut self, session: ModalSession);

    /// Run the host's nested window-move tracking loop until the user lets go.
    fn track_window_move(&mut self, window: WindowId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_contains() {
        let mods = Modifiers::CONTROL | Modifiers::SHIFT;
        assert!(mods.contains(Modifiers::CONTROL));
        assert!(mods.contains(Modifiers::SHIFT));
        assert!(!mods.contains(Modifiers::COMMAND));
        assert!(!mods.contains(Modifiers::NONE));
    }

    #[test]
    fn wake_event_only_matches_application_mask_as_wake() {
        let wake = NativeEvent::wake();
        assert!(wake.is_wake());
        assert!(wake.matches(EventMask::ApplicationDefined));
        assert!(wake.matches(EventMask::Any));

        let moved = NativeEvent::new(NativeEventKind::MouseMoved, NativePoint::default());
        assert!(!moved.is_wake());
        assert!(!moved.matches(EventMask::ApplicationDefined));
    }

    #[test]
    fn modifier_key_serializes_snake_case() {
        let json = serde_json::to_string(&ModifierKey::Control).unwrap();
        assert_eq!(json, "\"control\"");
    }
}
