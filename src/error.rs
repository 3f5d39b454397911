use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced to callers. Precondition misses and out-of-range
/// parameters are never errors; they are ignored or clamped.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("could not encode {format} image: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },

    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
