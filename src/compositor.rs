//! Flattens the session's layers into one raster at native resolution.
//!
//! Order, back to front: filtered base image, paint layer (source-over),
//! text annotations in insertion order.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use rayon::prelude::*;
use tracing::warn;

use crate::glyphs;
use crate::paint::PaintLayer;
use crate::processing;
use crate::session::Session;
use crate::text::TextAnnotation;

/// Renders the session at the base image's native `W x H`.
///
/// Pure: repeated calls on an unchanged session give identical bytes.
/// Returns `None` when no image is loaded.
pub fn render(session: &Session) -> Option<RgbaImage> {
    let image = session.image()?;
    let mut out = processing::apply(image, session.filters()).to_rgba8();
    composite_paint(&mut out, session.paint_layer());
    draw_annotations(&mut out, session.text_layer().annotations());
    Some(out)
}

/// Renders canonically, then downscales so the long edge is at most `max_edge`.
pub fn render_preview(session: &Session, max_edge: u32) -> Option<RgbaImage> {
    let full = render(session)?;
    match preview_dimensions(full.width(), full.height(), max_edge) {
        Some((w, h)) => Some(imageops::resize(&full, w, h, FilterType::Triangle)),
        None => Some(full),
    }
}

fn preview_dimensions(width: u32, height: u32, max_edge: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 || max_edge == 0 {
        return None;
    }
    let long = width.max(height);
    if long <= max_edge {
        return None;
    }
    let scale = max_edge as f32 / long as f32;
    let w = ((width as f32 * scale).round() as u32).max(1);
    let h = ((height as f32 * scale).round() as u32).max(1);
    Some((w, h))
}

/// Source-over of the premultiplied paint layer onto a straight-alpha target.
fn composite_paint(target: &mut RgbaImage, layer: &PaintLayer) {
    if layer.dimensions() != target.dimensions() {
        if layer.is_allocated() {
            warn!(
                layer = ?layer.dimensions(),
                target = ?target.dimensions(),
                "paint layer size mismatch; skipping"
            );
        }
        return;
    }
    target
        .par_chunks_exact_mut(4)
        .zip(layer.pixels().par_iter())
        .for_each(|(dst, src)| {
            let src_a = src[3];
            if src_a <= 0.0 {
                return;
            }
            let dst_a = dst[3] as f32 / 255.0;
            let keep = dst_a * (1.0 - src_a);
            let out_a = src_a + keep;
            for c in 0..3 {
                let d = dst[c] as f32 / 255.0;
                let v = (src[c] + d * keep) / out_a;
                dst[c] = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
            dst[3] = (out_a.clamp(0.0, 1.0) * 255.0).round() as u8;
        });
}

fn draw_annotations(target: &mut RgbaImage, annotations: &[TextAnnotation]) {
    for annotation in annotations {
        glyphs::draw_text(
            target,
            &annotation.content,
            annotation.position,
            annotation.font_size,
            annotation.color,
        );
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, ImageBuffer, Rgba};

    use crate::geometry::Point;
    use crate::paint::{BlendMode, Brush, PaintLayer};
    use crate::session::Session;
    use crate::state::{Color, FilterChannel, Mode};

    use super::*;

    fn gray_session(w: u32, h: u32) -> Session {
        let mut session = Session::new();
        session.install_image(DynamicImage::ImageRgba8(ImageBuffer::from_pixel(
            w,
            h,
            Rgba([100, 100, 100, 255]),
        )));
        session
    }

    #[test]
    fn empty_session_renders_nothing() {
        assert!(render(&Session::new()).is_none());
    }

    #[test]
    fn output_matches_native_resolution_regardless_of_zoom() {
        let mut session = gray_session(64, 48);
        session.set_zoom(2.5);
        let out = render(&session).unwrap();
        assert_eq!(out.dimensions(), (64, 48));
    }

    #[test]
    fn render_is_idempotent() {
        let mut session = gray_session(50, 50);
        session.set_filter(FilterChannel::Blur, 2.0);
        session.set_filter(FilterChannel::HueRotate, 45.0);
        session.set_mode(Mode::Paint);
        session.paint_stroke(
            &[Point::new(5.0, 5.0), Point::new(45.0, 40.0)],
            Brush {
                color: Color::rgba(0, 200, 0, 180),
                radius: 4.0,
                mode: BlendMode::Paint,
            },
        );
        session.set_mode(Mode::Text);
        session.place_text(Point::new(10.0, 25.0), "hi", Color::WHITE, 16.0);
        let first = render(&session).unwrap();
        let second = render(&session).unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn erased_paint_reveals_filtered_base() {
        let mut session = gray_session(30, 30);
        session.set_filter(FilterChannel::Brightness, 150.0);
        let expected = render(&session).unwrap();

        let path = [Point::new(5.0, 15.0), Point::new(25.0, 15.0)];
        let mut brush = Brush {
            color: Color::rgb(255, 0, 0),
            radius: 3.0,
            mode: BlendMode::Paint,
        };
        session.set_mode(Mode::Paint);
        session.paint_stroke(&path, brush);
        brush.mode = BlendMode::Erase;
        session.paint_stroke(&path, brush);

        let out = render(&session).unwrap();
        assert_eq!(out.get_pixel(15, 15), expected.get_pixel(15, 15));
        assert_eq!(out.get_pixel(15, 15).0, [150, 150, 150, 255]);
    }

    #[test]
    fn half_transparent_paint_blends_with_base() {
        let mut target: RgbaImage = ImageBuffer::from_pixel(1, 1, Rgba([0, 0, 255, 255]));
        let mut layer = PaintLayer::new(1, 1);
        layer.begin_stroke(
            Point::new(0.5, 0.5),
            Brush {
                color: Color::rgba(255, 0, 0, 128),
                radius: 2.0,
                mode: BlendMode::Paint,
            },
        );
        layer.end_stroke();
        composite_paint(&mut target, &layer);
        let px = target.get_pixel(0, 0).0;
        assert_eq!(px[3], 255);
        assert!(px[0].abs_diff(128) <= 1 && px[2].abs_diff(127) <= 1, "{px:?}");
    }

    #[test]
    fn mismatched_paint_layer_is_skipped() {
        let mut target: RgbaImage = ImageBuffer::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        let before = target.clone();
        let mut layer = PaintLayer::new(2, 2);
        layer.begin_stroke(
            Point::new(1.0, 1.0),
            Brush {
                color: Color::WHITE,
                radius: 3.0,
                mode: BlendMode::Paint,
            },
        );
        composite_paint(&mut target, &layer);
        assert_eq!(target, before);
    }

    #[test]
    fn later_text_draws_over_earlier_text() {
        let mut session = gray_session(80, 40);
        session.set_mode(Mode::Text);
        let a = session
            .place_text(Point::new(200.0, 200.0), "I", Color::rgb(255, 0, 0), 30.0)
            .unwrap();
        session.place_text(Point::new(10.0, 20.0), "I", Color::rgb(0, 0, 255), 30.0);
        // drag the first (red) one underneath the second
        session.text_layer_mut().begin_drag(a);
        session.text_layer_mut().update_position(a, Point::new(10.0, 20.0));
        session.text_layer_mut().end_drag();

        let out = render(&session).unwrap();
        let px = out.get_pixel(11, 20).0;
        assert!(px[2] > 200 && px[0] < 50, "{px:?}");
    }

    #[test]
    fn preview_downscales_long_edge() {
        let session = gray_session(400, 100);
        let preview = render_preview(&session, 200).unwrap();
        assert_eq!(preview.dimensions(), (200, 50));
        let full = render_preview(&session, 1000).unwrap();
        assert_eq!(full.dimensions(), (400, 100));
    }
}
