//! Free-hand paint layer in canonical pixel space.
//!
//! Pixels are premultiplied `[r, g, b, a]` floats in `0.0..=1.0`. Strokes are
//! chains of round-capped capsules; each stroke tracks the coverage it has
//! already deposited so overlapping segments and joins blend exactly once.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::Point;
use crate::state::Color;

pub type Premultiplied = [f32; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Source-over.
    #[default]
    Paint,
    /// Destination-out: removes coverage, revealing what is beneath the layer.
    Erase,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: Color,
    pub radius: f32,
    pub mode: BlendMode,
}

struct ActiveStroke {
    brush: Brush,
    last: Point,
    /// Per-pixel coverage already applied by this stroke.
    coverage: Vec<f32>,
}

pub struct PaintLayer {
    width: u32,
    height: u32,
    pixels: Vec<Premultiplied>,
    stroke: Option<ActiveStroke>,
}

impl PaintLayer {
    /// Fully transparent layer of `width x height`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width as usize * height as usize],
            stroke: None,
        }
    }

    /// Layer with no pixels; every drawing operation on it is a no-op.
    pub fn unallocated() -> Self {
        Self::new(0, 0)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_allocated(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn pixels(&self) -> &[Premultiplied] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Premultiplied> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    pub fn alpha(&self, x: u32, y: u32) -> f32 {
        self.pixel(x, y).map_or(0.0, |p| p[3])
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.iter().all(|p| p[3] <= 0.0)
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    /// Drops any in-flight stroke and resizes to a cleared `width x height` buffer.
    pub fn reallocate(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
    }

    /// Resets every pixel to fully transparent.
    pub fn clear(&mut self) {
        self.pixels.fill([0.0; 4]);
        if let Some(stroke) = self.stroke.as_mut() {
            stroke.coverage.fill(0.0);
        }
    }

    /// Starts a stroke and stamps a round dot at `point`.
    pub fn begin_stroke(&mut self, point: Point, brush: Brush) {
        if !self.is_allocated() {
            return;
        }
        let brush = Brush {
            radius: brush.radius.max(0.5),
            ..brush
        };
        debug!(x = point.x, y = point.y, radius = brush.radius, mode = ?brush.mode, "stroke begin");
        self.stroke = Some(ActiveStroke {
            brush,
            last: point,
            coverage: vec![0.0; self.pixels.len()],
        });
        self.rasterize_segment(point, point);
    }

    /// Adds a segment from the previous stroke point to `point`.
    pub fn extend_stroke(&mut self, point: Point) {
        let Some(last) = self.stroke.as_ref().map(|s| s.last) else {
            return;
        };
        self.rasterize_segment(last, point);
        if let Some(stroke) = self.stroke.as_mut() {
            stroke.last = point;
        }
    }

    pub fn end_stroke(&mut self) {
        if self.stroke.take().is_some() {
            debug!("stroke end");
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn rasterize_segment(&mut self, a: Point, b: Point) {
        let Some(stroke) = self.stroke.as_mut() else {
            return;
        };
        if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
            return;
        }
        let brush = stroke.brush;
        let reach = brush.radius + 1.0;
        let min_x = ((a.x.min(b.x) - reach).floor().max(0.0)) as u32;
        let min_y = ((a.y.min(b.y) - reach).floor().max(0.0)) as u32;
        let max_x = (a.x.max(b.x) + reach).ceil().min(self.width as f32);
        let max_y = (a.y.max(b.y) + reach).ceil().min(self.height as f32);
        if max_x <= 0.0 || max_y <= 0.0 {
            return;
        }
        let (max_x, max_y) = (max_x as u32, max_y as u32);

        let [r, g, bl, alpha] = brush.color.to_unit();
        let strength = match brush.mode {
            BlendMode::Paint => alpha,
            BlendMode::Erase => 1.0,
        };

        let width = self.width as usize;
        for y in min_y..max_y {
            for x in min_x..max_x {
                let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                let cov = (brush.radius + 0.5 - distance_to_segment(center, a, b)).clamp(0.0, 1.0);
                let idx = y as usize * width + x as usize;
                let prev = stroke.coverage[idx];
                if cov <= prev {
                    continue;
                }
                stroke.coverage[idx] = cov;

                let k = incremental_weight(strength * prev, strength * cov);
                let px = &mut self.pixels[idx];
                match brush.mode {
                    BlendMode::Paint => {
                        px[0] = r * k + px[0] * (1.0 - k);
                        px[1] = g * k + px[1] * (1.0 - k);
                        px[2] = bl * k + px[2] * (1.0 - k);
                        px[3] = k + px[3] * (1.0 - k);
                    }
                    BlendMode::Erase => {
                        for c in px.iter_mut() {
                            *c *= 1.0 - k;
                        }
                    }
                }
            }
        }
    }
}

/// Weight that takes a pixel already blended at `applied` to the result of a
/// single blend at `target`.
fn incremental_weight(applied: f32, target: f32) -> f32 {
    if applied >= 1.0 {
        return 0.0;
    }
    (1.0 - (1.0 - target) / (1.0 - applied)).clamp(0.0, 1.0)
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}
