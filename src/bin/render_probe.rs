use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageBuffer, Rgba};
use rayon::prelude::*;

use lumina::compositor;
use lumina::config::EditorConfig;
use lumina::export::{self, ExportFormat, ExportOptions};
use lumina::geometry::Point;
use lumina::session::{Command, PointerEvent, PointerKind, Session};
use lumina::state::{Color, FilterChannel, Mode};

fn median_ms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) * 0.5
    } else {
        sorted[mid]
    }
}

fn synthetic_image(width: u32, height: u32, seed: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
        let r = ((x + seed * 31) % 256) as u8;
        let g = ((y + seed * 17) % 256) as u8;
        let b = ((x ^ y) % 256) as u8;
        Rgba([r, g, b, 255])
    }))
}

fn pointer(kind: PointerKind, p: Point) -> Command {
    Command::Pointer(PointerEvent::new(kind, p.x, p.y))
}

/// A session with every layer populated: all filters off identity, a few
/// strokes across the frame and a handful of annotations.
fn build_session(width: u32, height: u32, seed: u32) -> Session {
    let mut session = Session::new();
    session.install_image(synthetic_image(width, height, seed));

    let (w, h) = (width as f32, height as f32);
    let mut commands = vec![
        Command::SetFilter {
            channel: FilterChannel::Brightness,
            value: 120.0,
        },
        Command::SetFilter {
            channel: FilterChannel::Contrast,
            value: 110.0,
        },
        Command::SetFilter {
            channel: FilterChannel::Saturate,
            value: 140.0,
        },
        Command::SetFilter {
            channel: FilterChannel::Blur,
            value: 2.0,
        },
        Command::SetFilter {
            channel: FilterChannel::Sepia,
            value: 20.0,
        },
        Command::SetFilter {
            channel: FilterChannel::HueRotate,
            value: 30.0,
        },
        Command::SetMode { mode: Mode::Paint },
        Command::SetBrushSize { size: 12.0 },
    ];
    for i in 0..4 {
        let t = (i + 1) as f32 / 5.0;
        commands.push(pointer(PointerKind::Down, Point::new(0.05 * w, t * h)));
        for step in 1..=32 {
            let s = step as f32 / 32.0;
            let x = (0.05 + 0.9 * s) * w;
            let y = t * h + (s * 12.0).sin() * 0.05 * h;
            commands.push(pointer(PointerKind::Move, Point::new(x, y)));
        }
        commands.push(pointer(PointerKind::Up, Point::new(0.95 * w, t * h)));
    }
    commands.push(Command::SetMode { mode: Mode::Text });
    commands.push(Command::SetTextColor {
        color: Color::WHITE,
    });
    commands.push(Command::SetTextSize { size: 48.0 });
    for i in 0..5 {
        commands.push(Command::SetTextContent {
            content: format!("annotation {i}"),
        });
        let p = Point::new(0.1 * w, (i as f32 + 0.5) / 5.0 * h);
        commands.push(pointer(PointerKind::Down, p));
        commands.push(pointer(PointerKind::Up, p));
    }
    for command in commands {
        session.dispatch(command);
    }
    session
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args();
    let _bin = args.next();
    let long_edge = args
        .next()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(3000);
    let count = args
        .next()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(8)
        .max(1);
    let preview_max = EditorConfig::load().preview_long_edge;
    let (width, height) = (long_edge, long_edge * 2 / 3);
    eprintln!("Rendering {count} synthetic {width}x{height} sessions");

    let sessions: Vec<Session> = (0..count as u32)
        .map(|seed| build_session(width, height, seed))
        .collect();

    let mut preview_samples = Vec::with_capacity(count);
    for session in &sessions {
        let t0 = Instant::now();
        let _preview = compositor::render_preview(session, preview_max).context("empty session")?;
        preview_samples.push(t0.elapsed().as_secs_f64() * 1000.0);
    }

    let mut render_samples = Vec::with_capacity(count);
    for session in &sessions {
        let t0 = Instant::now();
        let _full = compositor::render(session).context("empty session")?;
        render_samples.push(t0.elapsed().as_secs_f64() * 1000.0);
    }

    let out_dir: PathBuf = std::env::temp_dir().join(format!(
        "lumina-render-probe-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    ));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("create_dir_all {}", out_dir.display()))?;

    let options = ExportOptions {
        format: ExportFormat::Jpg,
        ..ExportOptions::default()
    };
    let export_start = Instant::now();
    sessions
        .par_iter()
        .enumerate()
        .try_for_each(|(i, session)| -> Result<()> {
            let rendered = compositor::render(session).context("empty session")?;
            let output = out_dir.join(format!("probe-{i}.{}", options.format.extension()));
            export::write(&rendered, &output, &options)
                .with_context(|| format!("export failed {}", output.display()))?;
            Ok(())
        })?;
    let export_wall_s = export_start.elapsed().as_secs_f64();
    let images_per_sec = count as f64 / export_wall_s.max(1e-9);

    println!("METRIC session_count={count}");
    println!("METRIC image_size={width}x{height}");
    println!("METRIC preview_ms_median={:.2}", median_ms(&preview_samples));
    println!("METRIC render_ms_median={:.2}", median_ms(&render_samples));
    println!("METRIC export_wall_s={:.2}", export_wall_s);
    println!("METRIC export_images_per_sec={:.3}", images_per_sec);
    println!("METRIC export_out_dir={}", out_dir.display());

    Ok(())
}
