use serde::{Deserialize, Serialize};

/// A point in logical screen space: origin at the top of the desktop, y grows
/// downwards, integer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in logical space, `(x, y)` being the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A point in the host's native space: origin at the bottom of the primary
/// screen, y grows upwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NativePoint {
    pub x: f64,
    pub y: f64,
}

impl NativePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A native rectangle, `(x, y)` being the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NativeRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NativeRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the one-pixel square with its bottom-left corner at `p` overlaps
    /// this rectangle by a positive area. Points on the left and bottom edges
    /// hit, points on the right and top edges do not.
    pub fn intersects_pixel(&self, p: NativePoint) -> bool {
        p.x < self.max_x() && p.x + 1.0 > self.x && p.y < self.max_y() && p.y + 1.0 > self.y
    }
}
