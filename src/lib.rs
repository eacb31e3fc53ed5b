pub mod backdrop;
pub mod bridge;
pub mod coords;
pub mod events;
pub mod geometry;
pub mod host;
pub mod locator;
pub mod logging;
pub mod modal;
pub mod pointer;
pub mod settings;
pub mod wait;
pub mod window;

pub use bridge::EventBridge;
pub use events::{BridgeEvent, EventLog, EventSink};
pub use geometry::{NativePoint, NativeRect, Point, Rect};
pub use settings::{PointerSettings, Settings};
pub use window::{LogicalWindow, WindowId};
