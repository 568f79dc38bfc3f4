//! Error taxonomy for map rendering.
//!
//! Every failure here is fatal for the run that raised it. Soft conditions
//! (malformed corpus lines, abandoned labels, suspicious river revisits) are
//! logged instead and never reach this type.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    /// A required input (image, corpus, asset directory, edit list) is missing or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// River tracing reached a corner with no qualifying river edge even though
    /// it was entered along one.
    #[error("river trace reached corner {corner} without any qualifying river edge")]
    GeometryContractViolation { corner: usize },

    #[error("more than one file contains \"{pattern}\" in {dir:?}")]
    AssetAmbiguity { pattern: String, dir: PathBuf },

    #[error(
        "ocean background is {}x{} but land background is {}x{}",
        ocean.0, ocean.1, land.0, land.1
    )]
    DimensionMismatch { land: (u32, u32), ocean: (u32, u32) },

    #[error("no {part} image found in border directory {dir:?}")]
    MissingBorderArt { dir: PathBuf, part: &'static str },

    /// No usable font face could be found or parsed.
    #[error("cannot use font {name}: {message}")]
    Font { name: String, message: String },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, MapError>;

impl MapError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MapError::Io {
            path: path.into(),
            source,
        }
    }
}
