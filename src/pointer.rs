//! Pointer/window interaction state machine.
//!
//! Turns raw button, motion, scroll and modifier notifications into the
//! normalized callbacks of [`EventSink`], tracking which window owns the
//! pointer, implicit and explicit grabs, click counting and drag detection.

use crate::coords::CoordinateMapper;
use crate::events::EventSink;
use crate::geometry::Point;
use crate::host::{HostWindowing, Modifiers};
use crate::locator::WindowLocator;
use crate::settings::PointerSettings;
use crate::window::{LogicalWindow, WindowId};

/// Number of tracked buttons: 0 primary, 1 secondary, 2 tertiary.
pub const BUTTON_COUNT: u8 = 3;

/// Button reported in place of a primary press made with the secondary-click
/// modifier held.
const REMAPPED_BUTTON: u8 = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointerState {
    pub screen_position: Point,
    /// Last position reported to the owner, in its content coordinates.
    pub window_position: Point,
    /// Bit `n` set while button `n` is down.
    pub buttons: u8,
    pub grabbed: bool,
    pub grabbed_explicitly: bool,
    pub drag_button: Option<u8>,
    pub click_count: u32,
    pub last_click_time: u64,
    pub last_click_position: Point,
    pub last_click_button: Option<u8>,
    /// Set while a primary press is being reported as button 2.
    pub secondary_remap: bool,
    pub cursor_locked: bool,
    pub modifiers: Modifiers,
}

impl PointerState {
    pub fn any_button_down(&self) -> bool {
        self.buttons != 0
    }

    pub fn is_button_down(&self, button: u8) -> bool {
        button < BUTTON_COUNT && self.buttons & (1 << button) != 0
    }

    fn reported_button(&self, button: u8) -> u8 {
        if button == 0 && self.secondary_remap {
            REMAPPED_BUTTON
        } else {
            button
        }
    }

    fn clear_grab(&mut self) {
        self.grabbed = false;
        self.grabbed_explicitly = false;
        self.drag_button = None;
    }

    fn clear_clicks(&mut self) {
        self.secondary_remap = false;
        self.click_count = 0;
        self.last_click_time = 0;
    }
}

/// Everything a pointer operation needs besides the tracker itself.
pub struct PointerEnv<'a> {
    pub host: &'a mut dyn HostWindowing,
    pub sink: &'a mut dyn EventSink,
    pub locator: &'a WindowLocator,
    pub mapper: &'a CoordinateMapper,
    pub settings: &'a PointerSettings,
}

#[derive(Debug, Default)]
pub struct PointerTracker {
    state: PointerState,
    mouse_window: Option<LogicalWindow>,
}

fn direction(delta: f64) -> i32 {
    if delta > 0.0 {
        1
    } else if delta < 0.0 {
        -1
    } else {
        0
    }
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PointerState {
        &self.state
    }

    /// The window currently owning the pointer.
    pub fn mouse_window(&self) -> Option<&LogicalWindow> {
        self.mouse_window.as_ref()
    }

    pub fn handle_button(&mut self, env: &mut PointerEnv<'_>, button: u8, pressed: bool) {
        if button >= BUTTON_COUNT {
            tracing::trace!(button, "ignoring unsupported button");
            return;
        }
        let bit = 1u8 << button;
        if (self.state.buttons & bit != 0) == pressed {
            return;
        }
        if pressed && self.mouse_window.is_none() {
            tracing::trace!(button, "press outside any window");
            return;
        }

        let was_explicit = self.state.grabbed_explicitly;
        if pressed {
            self.state.buttons |= bit;
        } else {
            self.state.buttons &= !bit;
        }
        if self.state.buttons == 0 {
            self.state.clear_grab();
        } else {
            self.state.grabbed = true;
        }

        if pressed {
            self.press(env, button);
        } else {
            self.release(env, button, was_explicit);
        }
    }

    fn press(&mut self, env: &mut PointerEnv<'_>, button: u8) {
        let Some(window) = self.mouse_window.clone() else {
            return;
        };
        let settings = env.settings;
        let now = env.host.event_time_ms();
        let position = self.state.screen_position;
        let last = self.state.last_click_position;

        let repeat = self.state.last_click_button == Some(button)
            && now.saturating_sub(self.state.last_click_time) < settings.double_click_interval_ms
            && (position.x - last.x).abs() < settings.double_click_radius
            && (position.y - last.y).abs() < settings.double_click_radius;
        self.state.click_count = if repeat { self.state.click_count + 1 } else { 0 };
        self.state.last_click_button = Some(button);
        self.state.last_click_position = position;

        let remap = button == 0
            && settings
                .secondary_click_modifier
                .is_some_and(|key| env.host.modifier_state().contains(key.mask()));
        if remap {
            self.state.secondary_remap = true;
        }
        let reported = self.state.reported_button(button);

        tracing::trace!(window = %window.id(), button = reported, clicks = self.state.click_count, "mouse down");
        env.sink.mouse_down(&window, reported, self.state.click_count);
    }

    fn release(&mut self, env: &mut PointerEnv<'_>, button: u8, was_explicit: bool) {
        let reported = self.state.reported_button(button);
        if reported != button {
            self.state.secondary_remap = false;
        }
        let Some(window) = self.mouse_window.clone() else {
            return;
        };

        let under = env
            .locator
            .window_at(&*env.host, env.mapper, self.state.screen_position);
        if under.as_ref() == Some(&window) || was_explicit {
            if self.state.last_click_button == Some(button) {
                self.state.last_click_time = env.host.event_time_ms();
            }
            tracing::trace!(window = %window.id(), button = reported, "mouse up");
            env.sink.mouse_up(&window, reported, self.state.click_count);
        } else {
            self.state.click_count = 0;
            self.state.last_click_time = 0;
            tracing::trace!(window = %window.id(), button = reported, "mouse released outside");
            env.sink.mouse_release(&window, reported, false);
        }
    }

    pub fn handle_motion(&mut self, env: &mut PointerEnv<'_>, screen: Point) {
        let owner = if self.state.grabbed {
            self.mouse_window.clone()
        } else {
            env.locator.window_at(&*env.host, env.mapper, screen)
        };

        let changed = owner != self.mouse_window;
        if changed {
            if let Some(old) = &self.mouse_window {
                env.sink.mouse_leave(old);
            }
            match &owner {
                Some(new) => env.sink.mouse_enter(new),
                None if !self.state.cursor_locked => env.host.reset_cursor(),
                None => {}
            }
            self.mouse_window = owner;
        }

        self.state.screen_position = screen;

        let Some(window) = self.mouse_window.clone() else {
            return;
        };

        let local = env
            .locator
            .screen_to_window(&*env.host, env.mapper, &window, screen);
        if changed || local != self.state.window_position {
            self.state.window_position = local;
            env.sink.mouse_move(&window, local);
        }

        if self.state.any_button_down() && self.state.drag_button.is_none() {
            let origin = self.state.last_click_position;
            let radius = env.settings.drag_radius;
            if (screen.x - origin.x).abs() > radius || (screen.y - origin.y).abs() > radius {
                if let Some(button) = self.state.last_click_button {
                    self.state.drag_button = Some(button);
                    tracing::trace!(window = %window.id(), button, "drag started");
                    env.sink.mouse_drag(&window, button);
                }
            }
        }

        if !self.state.cursor_locked {
            env.sink.cursor_update(&window);
        }
    }

    pub fn handle_scroll(&mut self, env: &mut PointerEnv<'_>, dx: f64, dy: f64) {
        let Some(window) = &self.mouse_window else {
            return;
        };
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        env.sink.mouse_scroll(window, direction(dx), direction(dy));
    }

    pub fn handle_modifiers(&mut self, env: &mut PointerEnv<'_>, modifiers: Modifiers) {
        if modifiers == self.state.modifiers {
            return;
        }
        self.state.modifiers = modifiers;
        env.sink.modifiers_changed(modifiers);
    }

    fn release_held_buttons(&mut self, sink: &mut dyn EventSink) {
        for button in 0..BUTTON_COUNT {
            let bit = 1u8 << button;
            if self.state.buttons & bit == 0 {
                continue;
            }
            self.state.buttons &= !bit;
            if let Some(window) = &self.mouse_window {
                sink.mouse_release(window, self.state.reported_button(button), true);
            }
        }
        self.state.clear_grab();
        self.state.clear_clicks();
    }

    /// Bring tracked state back in line with the host after it ran its own
    /// event loop: release every held button, then re-evaluate the pointer
    /// position and modifiers.
    pub fn sync(&mut self, env: &mut PointerEnv<'_>) {
        tracing::debug!(buttons = self.state.buttons, "resynchronizing pointer");
        self.release_held_buttons(env.sink);
        let location = env.host.pointer_location();
        let screen = env.mapper.to_logical(&*env.host, location);
        self.handle_motion(env, screen);
        let modifiers = env.host.modifier_state();
        self.handle_modifiers(env, modifiers);
    }

    /// Release everything and leave the owner before the host takes over the
    /// pointer with a nested loop.
    pub fn sync_before_tracking(&mut self, env: &mut PointerEnv<'_>) {
        self.release_held_buttons(env.sink);
        if let Some(old) = self.mouse_window.take() {
            tracing::debug!(window = %old.id(), "leaving window before tracking");
            env.sink.mouse_leave(&old);
        }
    }

    /// Grab the pointer for `window`. Only the current owner can grab.
    pub fn grab(&mut self, window: &LogicalWindow) -> bool {
        if self.mouse_window.as_ref() != Some(window) {
            tracing::debug!(window = %window.id(), "grab refused: not the mouse window");
            return false;
        }
        self.state.grabbed = true;
        self.state.grabbed_explicitly = true;
        tracing::debug!(window = %window.id(), "pointer grabbed");
        true
    }

    /// Release an explicit grab. Deferred until every button is up.
    pub fn ungrab(&mut self) {
        if self.state.any_button_down() {
            return;
        }
        self.state.grabbed = false;
        self.state.grabbed_explicitly = false;
        tracing::debug!("pointer ungrabbed");
    }

    pub fn lock_cursor(&mut self) {
        self.state.cursor_locked = true;
    }

    pub fn unlock_cursor(&mut self) {
        self.state.cursor_locked = false;
    }

    /// Drop the owner if it is the window `id`, which is going away.
    pub fn forget_window(&mut self, sink: &mut dyn EventSink, id: WindowId) {
        if self.mouse_window.as_ref().map(LogicalWindow::id) != Some(id) {
            return;
        }
        if let Some(old) = self.mouse_window.take() {
            sink.mouse_leave(&old);
        }
        self.state.buttons = 0;
        self.state.clear_grab();
        self.state.clear_clicks();
    }
}
