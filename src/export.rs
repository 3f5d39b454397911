//! Encoding of the flattened raster.

use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{
    CompressionType as PngCompressionType, FilterType as PngFilterType, PngEncoder,
};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EditorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpg,
    Webp,
}

impl ExportFormat {
    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG",
            ExportFormat::Jpg => "JPG",
            ExportFormat::Webp => "WebP",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Webp => "webp",
        }
    }

    /// Guesses the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ExportFormat::Png),
            "jpg" | "jpeg" => Some(ExportFormat::Jpg),
            "webp" => Some(ExportFormat::Webp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// 1..=100
    pub jpg_quality: u8,
    /// 0..=9
    pub png_compression: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            jpg_quality: 90,
            png_compression: 6,
        }
    }
}

fn encode_into<W: Write>(image: &RgbaImage, writer: W, options: &ExportOptions) -> Result<()> {
    let (width, height) = image.dimensions();
    let result = match options.format {
        ExportFormat::Jpg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
            let encoder = JpegEncoder::new_with_quality(writer, options.jpg_quality.clamp(1, 100));
            encoder.write_image(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        }
        ExportFormat::Png => {
            let compression = PngCompressionType::Level(options.png_compression.min(9));
            let encoder =
                PngEncoder::new_with_quality(writer, compression, PngFilterType::Adaptive);
            encoder.write_image(image.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        }
        ExportFormat::Webp => {
            let encoder = WebPEncoder::new_lossless(writer);
            encoder.write_image(image.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        }
    };
    result.map_err(|source| EditorError::Encode {
        format: options.format.label(),
        source,
    })
}

/// Encodes `image` into an in-memory file of the chosen format.
pub fn encode(image: &RgbaImage, options: &ExportOptions) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    encode_into(image, Cursor::new(&mut bytes), options)?;
    Ok(bytes)
}

/// Encodes `image` and writes it to `path`.
pub fn write(image: &RgbaImage, path: &Path, options: &ExportOptions) -> Result<()> {
    let io_err = |source| EditorError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = std::fs::File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    encode_into(image, &mut writer, options)?;
    writer.flush().map_err(io_err)?;
    info!(path = %path.display(), format = options.format.label(), "image exported");
    Ok(())
}

/// `dir/stem.ext`, or the first free `dir/stem-N.ext` if that already exists.
pub fn build_output_path(output_dir: &Path, stem: &str, format: ExportFormat) -> PathBuf {
    let base = output_dir.join(format!("{}.{}", stem, format.extension()));
    if !base.exists() {
        return base;
    }
    for n in 2..10000 {
        let candidate = output_dir.join(format!("{}-{}.{}", stem, n, format.extension()));
        if !candidate.exists() {
            return candidate;
        }
    }
    output_dir.join(format!("{}-final.{}", stem, format.extension()))
}
