use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed numeric interval that out-of-range inputs are clamped into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamps `value` into the range. NaN maps to `min`.
    pub fn clamp(self, value: f32) -> f32 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    pub fn contains(self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

pub const BRUSH_SIZE: Range = Range::new(1.0, 50.0);
pub const FONT_SIZE: Range = Range::new(10.0, 200.0);
pub const ZOOM: Range = Range::new(0.5, 3.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
/// Straight (non-premultiplied) 8-bit RGBA color.
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Channels as `0.0..=1.0` floats, alpha last.
    pub fn to_unit(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid hex color: {value:?}"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One of the seven adjustable tone/color channels.
pub enum FilterChannel {
    Brightness,
    Contrast,
    Saturate,
    Blur,
    Grayscale,
    Sepia,
    HueRotate,
}

impl FilterChannel {
    /// Pipeline order.
    pub const ALL: [FilterChannel; 7] = [
        FilterChannel::Brightness,
        FilterChannel::Contrast,
        FilterChannel::Saturate,
        FilterChannel::Blur,
        FilterChannel::Grayscale,
        FilterChannel::Sepia,
        FilterChannel::HueRotate,
    ];

    pub fn range(self) -> Range {
        match self {
            FilterChannel::Brightness | FilterChannel::Contrast | FilterChannel::Saturate => {
                Range::new(0.0, 200.0)
            }
            FilterChannel::Blur => Range::new(0.0, 20.0),
            FilterChannel::Grayscale | FilterChannel::Sepia => Range::new(0.0, 100.0),
            FilterChannel::HueRotate => Range::new(0.0, 360.0),
        }
    }

    pub fn identity(self) -> f32 {
        match self {
            FilterChannel::Brightness | FilterChannel::Contrast | FilterChannel::Saturate => 100.0,
            _ => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterChannel::Brightness => "brightness",
            FilterChannel::Contrast => "contrast",
            FilterChannel::Saturate => "saturate",
            FilterChannel::Blur => "blur",
            FilterChannel::Grayscale => "grayscale",
            FilterChannel::Sepia => "sepia",
            FilterChannel::HueRotate => "hueRotate",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
/// The seven filter channel values, always within their declared ranges.
pub struct FilterParameters {
    values: [f32; 7],
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            values: FilterChannel::ALL.map(FilterChannel::identity),
        }
    }
}

impl FilterParameters {
    pub fn get(&self, channel: FilterChannel) -> f32 {
        self.values[channel.index()]
    }

    /// Stores `value` clamped into the channel's range and returns what was stored.
    pub fn set(&mut self, channel: FilterChannel, value: f32) -> f32 {
        let clamped = channel.range().clamp(value);
        self.values[channel.index()] = clamped;
        clamped
    }

    pub fn with(mut self, channel: FilterChannel, value: f32) -> Self {
        self.set(channel, value);
        self
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_identity(&self) -> bool {
        FilterChannel::ALL
            .iter()
            .all(|&c| (self.get(c) - c.identity()).abs() < 1e-6)
    }

    pub fn brightness(&self) -> f32 {
        self.get(FilterChannel::Brightness)
    }

    pub fn contrast(&self) -> f32 {
        self.get(FilterChannel::Contrast)
    }

    pub fn saturate(&self) -> f32 {
        self.get(FilterChannel::Saturate)
    }

    pub fn blur(&self) -> f32 {
        self.get(FilterChannel::Blur)
    }

    pub fn grayscale(&self) -> f32 {
        self.get(FilterChannel::Grayscale)
    }

    pub fn sepia(&self) -> f32 {
        self.get(FilterChannel::Sepia)
    }

    pub fn hue_rotate(&self) -> f32 {
        self.get(FilterChannel::HueRotate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Adjust,
    Paint,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
/// Brush tool settings. `size` is the full line width.
pub struct BrushSettings {
    color: Color,
    size: f32,
    eraser: bool,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: Color::rgb(0x9d, 0x00, 0xff),
            size: 5.0,
            eraser: false,
        }
    }
}

impl BrushSettings {
    pub fn new(color: Color, size: f32) -> Self {
        let mut settings = Self::default();
        settings.set_color(color);
        settings.set_size(size);
        settings
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn radius(&self) -> f32 {
        self.size * 0.5
    }

    pub fn eraser(&self) -> bool {
        self.eraser
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_size(&mut self, size: f32) -> f32 {
        self.size = BRUSH_SIZE.clamp(size);
        self.size
    }

    pub fn set_eraser(&mut self, eraser: bool) {
        self.eraser = eraser;
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Text tool input fields: the pending content and style for placement or update.
pub struct TextDraft {
    pub content: String,
    color: Color,
    font_size: f32,
}

impl Default for TextDraft {
    fn default() -> Self {
        Self {
            content: String::new(),
            color: Color::WHITE,
            font_size: 24.0,
        }
    }
}

impl TextDraft {
    pub fn new(color: Color, font_size: f32) -> Self {
        let mut draft = Self::default();
        draft.set_color(color);
        draft.set_font_size(font_size);
        draft
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_font_size(&mut self, size: f32) -> f32 {
        self.font_size = FONT_SIZE.clamp(size);
        self.font_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_identity() {
        let params = FilterParameters::default();
        assert!(params.is_identity());
        assert_eq!(params.brightness(), 100.0);
        assert_eq!(params.blur(), 0.0);
        assert_eq!(params.hue_rotate(), 0.0);
    }

    #[test]
    fn out_of_range_values_clamp_to_nearest_bound() {
        let mut params = FilterParameters::default();
        assert_eq!(params.set(FilterChannel::Brightness, 350.0), 200.0);
        assert_eq!(params.set(FilterChannel::Contrast, -20.0), 0.0);
        assert_eq!(params.set(FilterChannel::Blur, 25.0), 20.0);
        assert_eq!(params.set(FilterChannel::Grayscale, 150.0), 100.0);
        assert_eq!(params.set(FilterChannel::Sepia, -1.0), 0.0);
        assert_eq!(params.set(FilterChannel::HueRotate, 720.0), 360.0);
        assert_eq!(params.set(FilterChannel::Saturate, f32::NAN), 0.0);
        for channel in FilterChannel::ALL {
            assert!(channel.range().contains(params.get(channel)));
        }
    }

    #[test]
    fn reset_restores_identity() {
        let mut params = FilterParameters::default()
            .with(FilterChannel::Sepia, 40.0)
            .with(FilterChannel::Blur, 3.0);
        assert!(!params.is_identity());
        params.reset();
        assert!(params.is_identity());
    }

    #[test]
    fn tool_sizes_clamp() {
        let mut brush = BrushSettings::default();
        assert_eq!(brush.set_size(0.0), 1.0);
        assert_eq!(brush.set_size(80.0), 50.0);
        assert_eq!(brush.radius(), 25.0);

        let mut draft = TextDraft::default();
        assert_eq!(draft.set_font_size(4.0), 10.0);
        assert_eq!(draft.set_font_size(500.0), 200.0);
    }

    #[test]
    fn hex_colors_parse_and_print() {
        assert_eq!(Color::from_hex("#9d00ff"), Some(Color::rgb(0x9d, 0, 0xff)));
        assert_eq!(Color::from_hex("ff000080"), Some(Color::rgba(255, 0, 0, 0x80)));
        assert_eq!(Color::from_hex("#fff"), None);
        assert_eq!(Color::from_hex("#ggg000"), None);
        assert_eq!(Color::WHITE.to_hex(), "#ffffff");
    }

    #[test]
    fn color_serializes_as_hex_string() {
        let json = serde_json::to_string(&Color::rgb(255, 0, 0)).unwrap();
        assert_eq!(json, "\"#ff0000\"");
        let back: Color = serde_json::from_str("\"#00ff00\"").unwrap();
        assert_eq!(back, Color::rgb(0, 255, 0));
        assert!(serde_json::from_str::<Color>("\"nope\"").is_err());
    }
}
