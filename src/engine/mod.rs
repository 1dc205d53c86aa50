//! Image engine abstraction.
//!
//! A blob never manipulates pixels itself. It decodes its bytes through an
//! [`ImageEngine`] into an owned [`ImageHandle`] and forwards each mutation
//! as an [`Operation`].
//!
//! # Engines
//!
//! - [`magick`]: shells out to ImageMagick's `convert`
//! - [`raster`]: in-process implementation on top of the `image` crate

pub mod magick;
pub mod raster;

pub use magick::MagickEngine;
pub use raster::RasterEngine;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by an image engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("image format `{0}` is not supported by this engine")]
    UnsupportedFormat(String),

    #[error("image codec error")]
    Image(#[from] image::ImageError),

    #[error("{0}")]
    Command(String),

    #[error("image engine IO error")]
    Io(#[from] std::io::Error),
}

/// Decodes raw bytes into a mutable image handle.
pub trait ImageEngine: Send + Sync {
    /// Decode `data`, encoded as `format` (a file extension such as `jpg`).
    fn decode(&self, data: &[u8], format: &str) -> Result<Box<dyn ImageHandle>, EngineError>;
}

/// A decoded image exclusively owned by one blob.
pub trait ImageHandle: Send {
    /// Apply a single mutation in place.
    fn apply(&mut self, op: &Operation) -> Result<(), EngineError>;

    /// Encode the current image in its current format.
    fn encode(&self) -> Result<Vec<u8>, EngineError>;

    /// Current output format (file extension).
    fn format(&self) -> &str;

    /// Pixel dimensions, if the engine can report them.
    fn dimensions(&self) -> Option<(u32, u32)>;
}

// ============================================================================
// Operations
// ============================================================================

/// A single image mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Re-encode to another format (`jpg`, `png`, `gif`, `pdf`).
    Format(String),

    /// Resize to `width`x`height`.
    ///
    /// `shrink_only` never enlarges the source; `exact` ignores aspect ratio.
    Geometry {
        width: u32,
        height: u32,
        shrink_only: bool,
        exact: bool,
    },

    /// Cut a `width`x`height` region anchored at `gravity`.
    Crop {
        width: u32,
        height: u32,
        gravity: Gravity,
    },

    /// Scale until the target box is covered, then crop to it.
    CropResize {
        width: u32,
        height: u32,
        gravity: Gravity,
    },

    /// Make the four corners transparent with the given radius.
    RoundedCorners { radius: u32 },

    Grayscale,
    Negate,
}

/// Anchor point for crops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gravity {
    NorthWest,
    North,
    NorthEast,
    West,
    #[default]
    Center,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Gravity {
    /// ImageMagick spelling of this gravity.
    pub fn magick_name(self) -> &'static str {
        match self {
            Self::NorthWest => "NorthWest",
            Self::North => "North",
            Self::NorthEast => "NorthEast",
            Self::West => "West",
            Self::Center => "Center",
            Self::East => "East",
            Self::SouthWest => "SouthWest",
            Self::South => "South",
            Self::SouthEast => "SouthEast",
        }
    }

    /// Horizontal and vertical anchor in halves: 0 = start, 1 = middle, 2 = end.
    pub fn anchor(self) -> (u32, u32) {
        match self {
            Self::NorthWest => (0, 0),
            Self::North => (1, 0),
            Self::NorthEast => (2, 0),
            Self::West => (0, 1),
            Self::Center => (1, 1),
            Self::East => (2, 1),
            Self::SouthWest => (0, 2),
            Self::South => (1, 2),
            Self::SouthEast => (2, 2),
        }
    }

    /// Top-left offset of a `width`x`height` box inside a `src_w`x`src_h` image.
    pub fn offset(self, src_w: u32, src_h: u32, width: u32, height: u32) -> (u32, u32) {
        let (ax, ay) = self.anchor();
        let dx = src_w.saturating_sub(width);
        let dy = src_h.saturating_sub(height);
        (dx * ax / 2, dy * ay / 2)
    }
}

impl fmt::Display for Gravity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.magick_name())
    }
}
