//! Fixed-font text rasterization for annotations.

use std::sync::OnceLock;

use ab_glyph::{Font, FontRef, GlyphId, PxScale, ScaleFont, point};
use image::RgbaImage;

use crate::geometry::Point;
use crate::state::Color;

static FONT_BOLD: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

fn font() -> &'static FontRef<'static> {
    static FONT: OnceLock<FontRef<'static>> = OnceLock::new();
    FONT.get_or_init(|| FontRef::try_from_slice(FONT_BOLD).expect("embedded font should parse"))
}

/// `ab_glyph` scales by ascent-to-descent height; convert an em size (CSS
/// `font-size`) into that scale.
fn em_scale(font: &FontRef<'_>, font_size: f32) -> PxScale {
    let units_per_em = font.units_per_em().unwrap_or(font.height_unscaled());
    PxScale::from(font_size * font.height_unscaled() / units_per_em)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    /// Advance width from the pen origin.
    pub advance: f32,
    /// Distance from the pen origin to the leftmost ink.
    pub ink_left: f32,
    pub ascent: f32,
    /// Negative: below the baseline.
    pub descent: f32,
}

/// Pen-relative glyph positions for a single line plus its metrics.
fn layout(text: &str, font_size: f32) -> (Vec<(GlyphId, f32)>, LineMetrics) {
    let font = font();
    let scaled = font.as_scaled(em_scale(font, font_size));
    let mut glyphs = Vec::with_capacity(text.len());
    let mut cursor = 0.0f32;
    let mut ink_left: Option<f32> = None;
    let mut prev: Option<GlyphId> = None;

    for ch in text.chars() {
        if ch.is_control() {
            continue;
        }
        let id = font.glyph_id(ch);
        if let Some(prev) = prev {
            cursor += scaled.kern(prev, id);
        }
        if let Some(outline) = font.outline(id) {
            let left = cursor + outline.bounds.min.x * scaled.h_scale_factor();
            ink_left = Some(ink_left.map_or(left, |l| l.min(left)));
        }
        glyphs.push((id, cursor));
        cursor += scaled.h_advance(id);
        prev = Some(id);
    }

    let metrics = LineMetrics {
        advance: cursor,
        ink_left: ink_left.unwrap_or(0.0),
        ascent: scaled.ascent(),
        descent: scaled.descent(),
    };
    (glyphs, metrics)
}

pub fn measure(text: &str, font_size: f32) -> LineMetrics {
    layout(text, font_size).1
}

/// Draws `text` source-over onto `canvas` with its ink starting at
/// `anchor.x` and the line's vertical middle on `anchor.y`.
pub fn draw_text(canvas: &mut RgbaImage, text: &str, anchor: Point, font_size: f32, color: Color) {
    if text.is_empty() || canvas.width() == 0 || canvas.height() == 0 {
        return;
    }
    let font = font();
    let scale = em_scale(font, font_size);
    let (glyphs, metrics) = layout(text, font_size);
    let origin_x = anchor.x - metrics.ink_left;
    let baseline = anchor.y + (metrics.ascent + metrics.descent) * 0.5;

    let [cr, cg, cb, ca] = color.to_unit();
    let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);

    for (id, pen_x) in glyphs {
        let glyph = id.with_scale_and_position(scale, point(origin_x + pen_x, baseline));
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let x = bounds.min.x as i32 + gx as i32;
            let y = bounds.min.y as i32 + gy as i32;
            if x < 0 || y < 0 || x >= cw || y >= ch {
                return;
            }
            let src_a = (coverage * ca).clamp(0.0, 1.0);
            if src_a <= 0.0 {
                return;
            }
            let px = canvas.get_pixel_mut(x as u32, y as u32);
            let dst_a = px[3] as f32 / 255.0;
            let out_a = src_a + dst_a * (1.0 - src_a);
            let blend = |src: f32, dst: u8| {
                let dst = dst as f32 / 255.0;
                let v = (src * src_a + dst * dst_a * (1.0 - src_a)) / out_a;
                (v.clamp(0.0, 1.0) * 255.0).round() as u8
            };
            px[0] = blend(cr, px[0]);
            px[1] = blend(cg, px[1]);
            px[2] = blend(cb, px[2]);
            px[3] = (out_a * 255.0).round() as u8;
        });
    }
}
