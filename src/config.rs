use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::export::{ExportFormat, ExportOptions};
use crate::state::{BrushSettings, Color, TextDraft};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Persisted tool defaults and export settings for Lumina.
pub struct EditorConfig {
    pub brush_color: Color,
    pub brush_size: f32,
    pub text_color: Color,
    pub text_size: f32,
    pub preview_long_edge: u32,
    pub export_format: ExportFormat,
    pub jpg_quality: u8,
    pub png_compression: u8,
    pub output_stem: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let brush = BrushSettings::default();
        let draft = TextDraft::default();
        let export = ExportOptions::default();
        Self {
            brush_color: brush.color(),
            brush_size: brush.size(),
            text_color: draft.color(),
            text_size: draft.font_size(),
            preview_long_edge: 1920,
            export_format: export.format,
            jpg_quality: export.jpg_quality,
            png_compression: export.png_compression,
            output_stem: "lumina-edited".to_string(),
        }
    }
}

impl EditorConfig {
    /// Returns the user config file path, if a config directory is available.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("lumina").join("config.toml"))
    }

    /// Loads config from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Self {
        toml::from_str(contents).unwrap_or_default()
    }

    /// Brush settings seeded from the config, clamped into range.
    pub fn brush(&self) -> BrushSettings {
        BrushSettings::new(self.brush_color, self.brush_size)
    }

    pub fn text_draft(&self) -> TextDraft {
        TextDraft::new(self.text_color, self.text_size)
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            format: self.export_format,
            jpg_quality: self.jpg_quality.clamp(1, 100),
            png_compression: self.png_compression.min(9),
        }
    }
}
