//! Profile steps declared in config.
//!
//! ```toml
//! [profile.avatar]
//! restrict = ["web_safe_image"]
//! steps = [
//!     { op = "crop_resize", width = 64, height = 64, gravity = "north" },
//!     { op = "rounded_corners", radius = 8 },
//! ]
//! ```

use crate::{blob::Blob, engine::Gravity, error::Result};
use serde::{Deserialize, Serialize};

/// One blob mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Format {
        format: String,
    },
    Reduce {
        width: u32,
        height: u32,
    },
    ReduceExact {
        width: u32,
        height: u32,
    },
    Resize {
        width: u32,
        height: u32,
    },
    ResizeExact {
        width: u32,
        height: u32,
    },
    Crop {
        width: u32,
        height: u32,
        #[serde(default)]
        gravity: Gravity,
    },
    CropResize {
        width: u32,
        height: u32,
        #[serde(default)]
        gravity: Gravity,
    },
    RoundedCorners {
        radius: u32,
    },
    Grayscale,
    Negate,
}

impl Step {
    pub fn apply(&self, blob: &mut Blob) -> Result<()> {
        match self {
            Self::Format { format } => blob.set_format(format),
            Self::Reduce { width, height } => blob.reduce(*width, *height),
            Self::ReduceExact { width, height } => blob.reduce_exact(*width, *height),
            Self::Resize { width, height } => blob.resize(*width, *height),
            Self::ResizeExact { width, height } => blob.resize_exact(*width, *height),
            Self::Crop {
                width,
                height,
                gravity,
            } => blob.crop(*width, *height, *gravity),
            Self::CropResize {
                width,
                height,
                gravity,
            } => blob.crop_resize(*width, *height, *gravity),
            Self::RoundedCorners { radius } => blob.rounded_corners(*radius),
            Self::Grayscale => blob.grayscale(),
            Self::Negate => blob.negate(),
        }
    }

    /// Output format this step switches to, if any.
    pub fn target_format(&self) -> Option<&str> {
        match self {
            Self::Format { format } => Some(format.as_str()),
            Self::RoundedCorners { .. } => Some("png"),
            _ => None,
        }
    }
}
