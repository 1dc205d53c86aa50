//! ImageMagick engine.
//!
//! Each decoded image lives in a scratch file owned by its handle. Every
//! operation rewrites that file in place with one `convert` invocation:
//!
//! ```text
//! convert /tmp/assetwarp.jpg -geometry 100x100> jpg:/tmp/assetwarp.jpg
//! ```
//!
//! The scratch file is removed when the handle is dropped.

use super::{EngineError, ImageEngine, ImageHandle, Operation};
use crate::utils::exec::Cmd;
use std::{fs, path::Path};
use tempfile::NamedTempFile;

/// Default ImageMagick entry point (`magick` on ImageMagick 7 only installs).
pub const DEFAULT_PROGRAM: &str = "convert";

/// Engine backed by an external ImageMagick binary.
#[derive(Debug, Clone)]
pub struct MagickEngine {
    program: String,
}

impl Default for MagickEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl MagickEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ImageEngine for MagickEngine {
    fn decode(&self, data: &[u8], format: &str) -> Result<Box<dyn ImageHandle>, EngineError> {
        // Round-trip through convert so undecodable input fails here, not later.
        let file = scratch_file(format)?;
        Cmd::new(&self.program)
            .arg(format!("{format}:-"))
            .arg(output_spec(format, file.path()))
            .stdin(data)
            .run()
            .map_err(command_error)?;

        Ok(Box::new(MagickImage {
            program: self.program.clone(),
            file,
            format: format.to_owned(),
        }))
    }
}

struct MagickImage {
    program: String,
    file: NamedTempFile,
    format: String,
}

impl MagickImage {
    fn convert(&self, args: &[String], format: &str, output: &Path) -> Result<(), EngineError> {
        Cmd::new(&self.program)
            .arg(self.file.path())
            .args(args)
            .arg(output_spec(format, output))
            .run()
            .map(|_| ())
            .map_err(command_error)
    }
}

impl ImageHandle for MagickImage {
    fn apply(&mut self, op: &Operation) -> Result<(), EngineError> {
        match op {
            Operation::Format(format) => {
                let next = scratch_file(format)?;
                self.convert(&[], format, next.path())?;
                self.file = next;
                self.format = format.clone();
            }
            op => self.convert(&operation_args(op), &self.format, self.file.path())?,
        }
        Ok(())
    }

    fn encode(&self) -> Result<Vec<u8>, EngineError> {
        Ok(fs::read(self.file.path())?)
    }

    fn format(&self) -> &str {
        &self.format
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        let output = Cmd::new(&self.program)
            .arg(format!("{}[0]", self.file.path().display()))
            .args(["-format", "%w %h", "info:"])
            .run()
            .ok()?;
        parse_dimensions(&String::from_utf8_lossy(&output.stdout))
    }
}

// ============================================================================
// Argument rendering
// ============================================================================

/// ImageMagick arguments for one operation.
///
/// `Operation::Format` renders to nothing: format changes are expressed by the
/// `<fmt>:<path>` output specifier instead.
pub fn operation_args(op: &Operation) -> Vec<String> {
    match op {
        Operation::Format(_) => Vec::new(),
        Operation::Geometry {
            width,
            height,
            shrink_only,
            exact,
        } => {
            // A zero side is left out so ImageMagick derives it from the aspect ratio
            let side = |n: &u32| if *n == 0 { String::new() } else { n.to_string() };
            let mut geometry = match (width, height) {
                (0, 0) => "100%".to_owned(),
                (w, h) => format!("{}x{}", side(w), side(h)),
            };
            if *shrink_only {
                geometry.push('>');
            }
            if *exact {
                geometry.push('!');
            }
            vec!["-geometry".into(), geometry]
        }
        Operation::Crop {
            width,
            height,
            gravity,
        } => crop_args(*width, *height, gravity.magick_name()),
        Operation::CropResize {
            width,
            height,
            gravity,
        } => {
            let mut args = vec![
                "-geometry".into(),
                format!("x{height}"),
                "-geometry".into(),
                format!("{width}<"),
            ];
            args.extend(crop_args(*width, *height, gravity.magick_name()));
            args
        }
        Operation::RoundedCorners { radius } => rounded_corner_args(*radius),
        Operation::Grayscale => vec!["-colorspace".into(), "Gray".into()],
        Operation::Negate => vec!["-negate".into()],
    }
}

/// Gravity-anchored crop, dropping any virtual canvas offset first.
fn crop_args(width: u32, height: u32, gravity: &str) -> Vec<String> {
    vec![
        "-gravity".into(),
        gravity.into(),
        "+repage".into(),
        "-crop".into(),
        format!("{width}x{height}+0+0!"),
    ]
}

/// Build a quarter-circle mask in the top-left corner, mirror it onto the
/// other three corners, then copy it into the alpha channel.
#[rustfmt::skip]
fn rounded_corner_args(radius: u32) -> Vec<String> {
    let r = radius;
    let draw = format!("fill black polygon 0,0 0,{r} {r},0 fill white circle {r},{r} {r},0");
    [
        "(", "+clone", "-threshold", "-1", "-draw", draw.as_str(),
        "(", "+clone", "-flip", ")", "-compose", "Multiply", "-composite",
        "(", "+clone", "-flop", ")", "-compose", "Multiply", "-composite",
        ")", "-alpha", "off", "-compose", "CopyOpacity", "-composite",
    ]
    .iter()
    .map(|s| (*s).to_owned())
    .collect()
}

// ============================================================================
// Helpers
// ============================================================================

fn scratch_file(format: &str) -> Result<NamedTempFile, EngineError> {
    Ok(tempfile::Builder::new()
        .prefix("assetwarp-")
        .suffix(&format!(".{format}"))
        .tempfile()?)
}

fn output_spec(format: &str, path: &Path) -> String {
    format!("{format}:{}", path.display())
}

fn command_error(err: anyhow::Error) -> EngineError {
    EngineError::Command(format!("{err:#}"))
}

fn parse_dimensions(info: &str) -> Option<(u32, u32)> {
    let mut parts = info.split_whitespace();
    let width = parts.next()?.parse().ok()?;
    let height = parts.next()?.parse().ok()?;
    Some((width, height))
}
