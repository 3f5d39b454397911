//! Non-destructive tone/color pipeline applied to the base image.
//!
//! Parameters are turned into a fixed, ordered list of typed operations
//! (brightness, contrast, saturate, blur, grayscale, sepia, hue-rotate). The
//! list is a description only; pixels are produced when a [`RenderedBase`] is
//! rasterized, always from the untouched source image.

pub mod blur;
pub mod color;
pub mod tone;

use std::fmt;

use image::RgbaImage;

use crate::state::{FilterChannel, FilterParameters};

#[derive(Debug, Clone, Copy, PartialEq)]
/// One pipeline stage, carrying the raw channel value (percent, px or degrees).
pub enum FilterOp {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    Blur(f32),
    Grayscale(f32),
    Sepia(f32),
    HueRotate(f32),
}

impl FilterOp {
    fn from_channel(channel: FilterChannel, value: f32) -> Self {
        match channel {
            FilterChannel::Brightness => FilterOp::Brightness(value),
            FilterChannel::Contrast => FilterOp::Contrast(value),
            FilterChannel::Saturate => FilterOp::Saturate(value),
            FilterChannel::Blur => FilterOp::Blur(value),
            FilterChannel::Grayscale => FilterOp::Grayscale(value),
            FilterChannel::Sepia => FilterOp::Sepia(value),
            FilterChannel::HueRotate => FilterOp::HueRotate(value),
        }
    }

    pub fn channel(&self) -> FilterChannel {
        match self {
            FilterOp::Brightness(_) => FilterChannel::Brightness,
            FilterOp::Contrast(_) => FilterChannel::Contrast,
            FilterOp::Saturate(_) => FilterChannel::Saturate,
            FilterOp::Blur(_) => FilterChannel::Blur,
            FilterOp::Grayscale(_) => FilterChannel::Grayscale,
            FilterOp::Sepia(_) => FilterChannel::Sepia,
            FilterOp::HueRotate(_) => FilterChannel::HueRotate,
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            FilterOp::Brightness(v)
            | FilterOp::Contrast(v)
            | FilterOp::Saturate(v)
            | FilterOp::Blur(v)
            | FilterOp::Grayscale(v)
            | FilterOp::Sepia(v)
            | FilterOp::HueRotate(v) => v,
        }
    }

    pub fn is_identity(&self) -> bool {
        match *self {
            FilterOp::HueRotate(deg) => deg.rem_euclid(360.0).abs() < 0.001,
            op => (op.value() - op.channel().identity()).abs() < 0.001,
        }
    }

    fn apply(&self, mut img: RgbaImage) -> RgbaImage {
        if self.is_identity() {
            return img;
        }
        match *self {
            FilterOp::Brightness(v) => tone::brightness(&mut img, v / 100.0),
            FilterOp::Contrast(v) => tone::contrast(&mut img, v / 100.0),
            FilterOp::Saturate(v) => color::apply_matrix(&mut img, &color::saturate_matrix(v / 100.0)),
            FilterOp::Blur(px) => return blur::gaussian(img, px),
            FilterOp::Grayscale(v) => {
                color::apply_matrix(&mut img, &color::grayscale_matrix(v / 100.0))
            }
            FilterOp::Sepia(v) => color::apply_matrix(&mut img, &color::sepia_matrix(v / 100.0)),
            FilterOp::HueRotate(deg) => {
                color::apply_matrix(&mut img, &color::hue_rotate_matrix(deg))
            }
        }
        img
    }
}

impl fmt::Display for FilterOp {
    /// CSS filter-function syntax, e.g. `brightness(150%)` or `blur(5px)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FilterOp::Brightness(v) => write!(f, "brightness({v}%)"),
            FilterOp::Contrast(v) => write!(f, "contrast({v}%)"),
            FilterOp::Saturate(v) => write!(f, "saturate({v}%)"),
            FilterOp::Blur(v) => write!(f, "blur({v}px)"),
            FilterOp::Grayscale(v) => write!(f, "grayscale({v}%)"),
            FilterOp::Sepia(v) => write!(f, "sepia({v}%)"),
            FilterOp::HueRotate(v) => write!(f, "hue-rotate({v}deg)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// All seven stages, always in pipeline order.
pub struct FilterPipeline {
    ops: [FilterOp; 7],
}

impl FilterPipeline {
    pub fn new(params: &FilterParameters) -> Self {
        Self {
            ops: FilterChannel::ALL.map(|c| FilterOp::from_channel(c, params.get(c))),
        }
    }

    pub fn ops(&self) -> &[FilterOp] {
        &self.ops
    }

    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(FilterOp::is_identity)
    }

    /// Equivalent CSS `filter` property value, for front-ends that preview with CSS.
    pub fn css(&self) -> String {
        self.ops
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn run(&self, src: &RgbaImage) -> RgbaImage {
        self.ops.iter().fold(src.clone(), |img, op| op.apply(img))
    }
}

/// A base image paired with the pipeline to be applied to it.
pub struct RenderedBase<'a> {
    pub source: &'a RgbaImage,
    pub pipeline: FilterPipeline,
}

impl RenderedBase<'_> {
    /// Produces a new filtered buffer; the source is never modified.
    pub fn to_rgba8(&self) -> RgbaImage {
        self.pipeline.run(self.source)
    }
}

pub fn apply<'a>(image: &'a RgbaImage, params: &FilterParameters) -> RenderedBase<'a> {
    RenderedBase {
        source: image,
        pipeline: FilterPipeline::new(params),
    }
}
