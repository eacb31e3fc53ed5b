//! Mapping between logical (top-left origin, y down) and native (bottom-left
//! origin, y up) screen coordinates.

use crate::geometry::{NativePoint, NativeRect, Point, Rect};
use crate::host::HostWindowing;
use std::cell::Cell;

pub fn native_from_logical(desktop_height: f64, p: Point) -> NativePoint {
    NativePoint::new(p.x as f64, desktop_height - p.y as f64)
}

pub fn logical_from_native(desktop_height: f64, p: NativePoint) -> Point {
    Point::new(p.x.round() as i32, (desktop_height - p.y).round() as i32)
}

pub fn native_rect_from_logical(desktop_height: f64, r: Rect) -> NativeRect {
    NativeRect::new(
        r.x as f64,
        desktop_height - (r.y + r.height) as f64,
        r.width as f64,
        r.height as f64,
    )
}

pub fn logical_rect_from_native(desktop_height: f64, r: NativeRect) -> Rect {
    Rect::new(
        r.x.round() as i32,
        (desktop_height - r.max_y()).round() as i32,
        r.width.round() as i32,
        r.height.round() as i32,
    )
}

/// Coordinate mapper with a lazily computed desktop height.
///
/// The height is the maximum vertical extent over all screens. It stays fixed
/// until [`CoordinateMapper::invalidate`] is called, so every mapping between
/// two display changes agrees.
#[derive(Debug, Default)]
pub struct CoordinateMapper {
    desktop_height: Cell<Option<f64>>,
}

impl CoordinateMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn desktop_height(&self, host: &dyn HostWindowing) -> f64 {
        if let Some(height) = self.desktop_height.get() {
            return height;
        }
        let height = host
            .screen_frames()
            .iter()
            .map(NativeRect::max_y)
            .fold(0.0, f64::max);
        tracing::debug!(height, "desktop height computed");
        self.desktop_height.set(Some(height));
        height
    }

    /// Forget the cached height; call on any display geometry change.
    pub fn invalidate(&self) {
        self.desktop_height.set(None);
    }

    pub fn to_native(&self, host: &dyn HostWindowing, p: Point) -> NativePoint {
        native_from_logical(self.desktop_height(host), p)
    }

    pub fn to_logical(&self, host: &dyn HostWindowing, p: NativePoint) -> Point {
        logical_from_native(self.desktop_height(host), p)
    }

    pub fn rect_to_native(&self, host: &dyn HostWindowing, r: Rect) -> NativeRect {
        native_rect_from_logical(self.desktop_height(host), r)
    }

    pub fn rect_to_logical(&self, host: &dyn HostWindowing, r: NativeRect) -> Rect {
        logical_rect_from_native(self.desktop_height(host), r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;

    #[test]
    fn point_round_trip_for_many_heights() {
        let heights = [0.0, 1.0, 768.0, 1080.0, 1440.5, 2160.0, 4321.25];
        let points = [
            Point::new(0, 0),
            Point::new(100, 100),
            Point::new(-50, 2000),
            Point::new(1919, 1079),
            Point::new(7, -3),
        ];
        for h in heights {
            for p in points {
                assert_eq!(logical_from_native(h, native_from_logical(h, p)), p, "h={h} p={p:?}");
            }
        }
    }

    #[test]
    fn rect_maps_origin_to_bottom_left() {
        let r = Rect::new(10, 20, 100, 50);
        let native = native_rect_from_logical(1000.0, r);
        assert_eq!(native, NativeRect::new(10.0, 930.0, 100.0, 50.0));
        assert_eq!(logical_rect_from_native(1000.0, native), r);
    }

    #[test]
    fn height_is_max_extent_of_all_screens() {
        let host = MockHost::with_screens(vec![
            NativeRect::new(0.0, 0.0, 1920.0, 1080.0),
            NativeRect::new(1920.0, -200.0, 1280.0, 1440.0),
        ]);
        let mapper = CoordinateMapper::new();
        assert_eq!(mapper.desktop_height(&host), 1240.0);
    }

    #[test]
    fn cached_height_survives_until_invalidated() {
        let host = MockHost::new();
        let mapper = CoordinateMapper::new();
        assert_eq!(mapper.to_native(&host, Point::new(0, 80)).y, 1000.0);

        host.set_screens(vec![NativeRect::new(0.0, 0.0, 2560.0, 1440.0)]);
        assert_eq!(mapper.to_native(&host, Point::new(0, 80)).y, 1000.0);

        mapper.invalidate();
        assert_eq!(mapper.to_native(&host, Point::new(0, 80)).y, 1360.0);
    }
}
