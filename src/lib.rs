//! Layered raster editor core: non-destructive filters, a free-hand paint
//! layer and draggable text annotations, flattened into one image at the
//! source resolution.

pub mod compositor;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod glyphs;
pub mod paint;
pub mod processing;
pub mod session;
pub mod state;
pub mod text;

pub use error::{EditorError, Result};
pub use session::{Command, Session};
