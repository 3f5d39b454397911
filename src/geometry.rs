use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// On-screen bounding box of the rendered image element, in viewport pixels.
///
/// The box already reflects any zoom applied to the element.
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Box covering an image drawn 1:1 at the viewport origin.
    pub fn identity(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    /// The box an element laid out at `self` occupies after being scaled by
    /// `zoom` about its center.
    pub fn zoomed_about_center(&self, zoom: f32) -> Self {
        let cx = self.left + self.width * 0.5;
        let cy = self.top + self.height * 0.5;
        let width = self.width * zoom;
        let height = self.height * zoom;
        Self::new(cx - width * 0.5, cy - height * 0.5, width, height)
    }

    /// Zero, negative or non-finite extent: the element is not laid out.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite()) || self.width <= 0.0 || self.height <= 0.0
    }
}

/// Maps a viewport pointer position into canonical image pixels.
///
/// `image_size` is the native `(W, H)` of the mounted image. Zoom is never
/// applied here: `display` already measures the zoomed element. Returns the
/// origin when nothing is mounted or the box has no area.
pub fn to_canonical(pointer: Point, display: &DisplayRect, image_size: Option<(u32, u32)>) -> Point {
    let Some((w, h)) = image_size else {
        return Point::ORIGIN;
    };
    if display.is_degenerate() || w == 0 || h == 0 {
        return Point::ORIGIN;
    }
    Point::new(
        (pointer.x - display.left) * (w as f32 / display.width),
        (pointer.y - display.top) * (h as f32 / display.height),
    )
}

/// Inverse of [`to_canonical`]: where a canonical point appears on screen.
pub fn to_display(canonical: Point, display: &DisplayRect, image_size: (u32, u32)) -> Point {
    let (w, h) = image_size;
    if w == 0 || h == 0 {
        return Point::new(display.left, display.top);
    }
    Point::new(
        display.left + canonical.x * (display.width / w as f32),
        display.top + canonical.y * (display.height / h as f32),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn scales_display_offset_into_native_pixels() {
        // 400x200 image shown at half size, offset by (10, 20)
        let rect = DisplayRect::new(10.0, 20.0, 200.0, 100.0);
        let p = to_canonical(Point::new(110.0, 70.0), &rect, Some((400, 200)));
        assert!(close(p, Point::new(200.0, 100.0)));
    }

    #[test]
    fn round_trip_recovers_canonical_point_at_any_zoom() {
        let layout = DisplayRect::new(37.0, 12.5, 320.0, 240.0);
        let size = (1280, 960);
        let known = Point::new(311.25, 702.5);
        for zoom in [0.5, 0.75, 1.0, 1.3, 2.0, 3.0] {
            let rect = layout.zoomed_about_center(zoom);
            let on_screen = to_display(known, &rect, size);
            let back = to_canonical(on_screen, &rect, Some(size));
            assert!(close(back, known), "zoom {zoom}: {back:?}");
        }
    }

    #[test]
    fn zoom_changes_screen_position_but_not_mapping() {
        let layout = DisplayRect::new(0.0, 0.0, 100.0, 100.0);
        let zoomed = layout.zoomed_about_center(2.0);
        assert_eq!(zoomed, DisplayRect::new(-50.0, -50.0, 200.0, 200.0));
        // screen center maps to image center regardless of zoom
        let p = to_canonical(Point::new(50.0, 50.0), &zoomed, Some((100, 100)));
        assert!(close(p, Point::new(50.0, 50.0)));
    }

    #[test]
    fn unmounted_or_degenerate_returns_origin() {
        let rect = DisplayRect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(to_canonical(Point::new(5.0, 5.0), &rect, None), Point::ORIGIN);
        let empty = DisplayRect::new(0.0, 0.0, 0.0, 50.0);
        assert_eq!(
            to_canonical(Point::new(5.0, 5.0), &empty, Some((10, 10))),
            Point::ORIGIN
        );
    }
}
