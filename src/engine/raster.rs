//! In-process engine built on the `image` crate.
//!
//! Supports JPEG, PNG and GIF. Geometry follows ImageMagick conventions so
//! profiles behave the same under either engine.

use super::{EngineError, Gravity, ImageEngine, ImageHandle, Operation};
use image::{DynamicImage, ImageFormat, imageops::FilterType};
use std::io::Cursor;

const FILTER: FilterType = FilterType::Lanczos3;

/// Engine that decodes and mutates images in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterEngine;

impl ImageEngine for RasterEngine {
    fn decode(&self, data: &[u8], format: &str) -> Result<Box<dyn ImageHandle>, EngineError> {
        let (format, name) = image_format(format)?;
        let image = image::load_from_memory_with_format(data, format)?;
        Ok(Box::new(RasterImage {
            image,
            format,
            name,
        }))
    }
}

struct RasterImage {
    image: DynamicImage,
    format: ImageFormat,
    name: &'static str,
}

impl ImageHandle for RasterImage {
    fn apply(&mut self, op: &Operation) -> Result<(), EngineError> {
        match op {
            Operation::Format(format) => (self.format, self.name) = image_format(format)?,
            Operation::Geometry {
                width,
                height,
                shrink_only,
                exact,
            } => {
                if let Some(resized) = geometry(&self.image, *width, *height, *shrink_only, *exact) {
                    self.image = resized;
                }
            }
            Operation::Crop {
                width,
                height,
                gravity,
            } => self.image = crop(&self.image, *width, *height, *gravity),
            Operation::CropResize {
                width,
                height,
                gravity,
            } => {
                let filled = fill(&self.image, *width, *height);
                self.image = crop(&filled, *width, *height, *gravity);
            }
            Operation::RoundedCorners { radius } => {
                self.image = rounded_corners(&self.image, *radius);
            }
            Operation::Grayscale => self.image = self.image.grayscale(),
            Operation::Negate => self.image.invert(),
        }
        Ok(())
    }

    fn encode(&self) -> Result<Vec<u8>, EngineError> {
        let mut buf = Cursor::new(Vec::new());
        match self.format {
            // JPEG has no alpha channel, GIF wants RGBA frames
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(self.image.to_rgb8())
                .write_to(&mut buf, ImageFormat::Jpeg)?,
            ImageFormat::Gif => DynamicImage::ImageRgba8(self.image.to_rgba8())
                .write_to(&mut buf, ImageFormat::Gif)?,
            format => self.image.write_to(&mut buf, format)?,
        }
        Ok(buf.into_inner())
    }

    fn format(&self) -> &str {
        self.name
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        Some((self.image.width(), self.image.height()))
    }
}

fn image_format(name: &str) -> Result<(ImageFormat, &'static str), EngineError> {
    match name {
        "jpg" | "jpeg" => Ok((ImageFormat::Jpeg, "jpg")),
        "png" => Ok((ImageFormat::Png, "png")),
        "gif" => Ok((ImageFormat::Gif, "gif")),
        other => Err(EngineError::UnsupportedFormat(other.to_owned())),
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Resize per ImageMagick geometry flags; `None` when nothing changes.
fn geometry(
    image: &DynamicImage,
    width: u32,
    height: u32,
    shrink_only: bool,
    exact: bool,
) -> Option<DynamicImage> {
    let (src_w, src_h) = (image.width(), image.height());
    let (width, height) = derive_missing_side(src_w, src_h, width, height);
    if shrink_only && src_w <= width && src_h <= height {
        return None;
    }

    let resized = if exact {
        let (w, h) = if shrink_only {
            (width.min(src_w), height.min(src_h))
        } else {
            (width, height)
        };
        image.resize_exact(w.max(1), h.max(1), FILTER)
    } else {
        image.resize(width.max(1), height.max(1), FILTER)
    };
    Some(resized)
}

/// A zero side follows the source aspect ratio, as in ImageMagick's `x100`.
fn derive_missing_side(src_w: u32, src_h: u32, width: u32, height: u32) -> (u32, u32) {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scaled = |side: u32, num: u32, den: u32| {
        ((f64::from(side) * f64::from(num) / f64::from(den.max(1))).round() as u32).max(1)
    };
    match (width, height) {
        (0, 0) => (src_w, src_h),
        (0, h) => (scaled(src_w, h, src_h), h),
        (w, 0) => (w, scaled(src_h, w, src_w)),
        dims => dims,
    }
}

/// Crop to at most `width`x`height`, anchored at `gravity`.
fn crop(image: &DynamicImage, width: u32, height: u32, gravity: Gravity) -> DynamicImage {
    let (src_w, src_h) = (image.width(), image.height());
    let (w, h) = (width.min(src_w), height.min(src_h));
    let (x, y) = gravity.offset(src_w, src_h, w, h);
    image.crop_imm(x, y, w, h)
}

/// Scale preserving aspect ratio so the result covers `width`x`height`.
fn fill(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (src_w, src_h) = (image.width().max(1), image.height().max(1));
    let scale = f64::max(
        f64::from(width) / f64::from(src_w),
        f64::from(height) / f64::from(src_h),
    );

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (w, h) = (
        ((f64::from(src_w) * scale).round() as u32).max(width).max(1),
        ((f64::from(src_h) * scale).round() as u32).max(height).max(1),
    );
    image.resize_exact(w, h, FILTER)
}

/// Clear alpha outside a quarter circle of `radius` in each corner.
fn rounded_corners(image: &DynamicImage, radius: u32) -> DynamicImage {
    let mut rgba = image.to_rgba8();
    let (w, h) = rgba.dimensions();
    let r = radius.min(w / 2).min(h / 2);
    let rf = f64::from(r);

    for y in 0..r {
        for x in 0..r {
            let dx = rf - (f64::from(x) + 0.5);
            let dy = rf - (f64::from(y) + 0.5);
            if dx * dx + dy * dy <= rf * rf {
                continue;
            }
            for (px, py) in [(x, y), (w - 1 - x, y), (x, h - 1 - y), (w - 1 - x, h - 1 - y)] {
                rgba.get_pixel_mut(px, py)[3] = 0;
            }
        }
    }

    DynamicImage::ImageRgba8(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn sample(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgb([(x % 256) as u8, (y % 256) as u8, 200]);
        }
        DynamicImage::ImageRgb8(img)
    }

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        sample(width, height).write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn handle(width: u32, height: u32) -> Box<dyn ImageHandle> {
        RasterEngine
            .decode(&encoded(width, height, ImageFormat::Png), "png")
            .unwrap()
    }

    fn geometry_op(width: u32, height: u32, shrink_only: bool, exact: bool) -> Operation {
        Operation::Geometry {
            width,
            height,
            shrink_only,
            exact,
        }
    }

    #[test]
    fn test_zero_side_follows_aspect_ratio() {
        let mut img = handle(40, 20);
        img.apply(&geometry_op(0, 10, false, false)).unwrap();
        assert_eq!(img.dimensions(), Some((20, 10)));

        let mut img = handle(40, 20);
        img.apply(&geometry_op(80, 0, false, true)).unwrap();
        assert_eq!(img.dimensions(), Some((80, 40)));

        let mut img = handle(40, 20);
        img.apply(&geometry_op(0, 100, true, false)).unwrap();
        assert_eq!(img.dimensions(), Some((40, 20)));
    }

    #[test]
    fn test_reduce_never_enlarges() {
        let mut img = handle(40, 30);
        img.apply(&geometry_op(400, 300, true, false)).unwrap();
        assert_eq!(img.dimensions(), Some((40, 30)));

        img.apply(&geometry_op(20, 100, true, false)).unwrap();
        assert_eq!(img.dimensions(), Some((20, 15)));
    }

    #[test]
    fn test_reduce_exact_clamps_to_source() {
        let mut img = handle(40, 30);
        img.apply(&geometry_op(20, 100, true, true)).unwrap();
        assert_eq!(img.dimensions(), Some((20, 30)));
    }

    #[test]
    fn test_resize_can_enlarge() {
        let mut img = handle(40, 30);
        img.apply(&geometry_op(80, 80, false, false)).unwrap();
        assert_eq!(img.dimensions(), Some((80, 60)));

        img.apply(&geometry_op(10, 10, false, true)).unwrap();
        assert_eq!(img.dimensions(), Some((10, 10)));
    }

    #[test]
    fn test_crop_with_gravity() {
        let mut img = handle(100, 50);
        img.apply(&Operation::Crop {
            width: 20,
            height: 10,
            gravity: Gravity::SouthEast,
        })
        .unwrap();
        assert_eq!(img.dimensions(), Some((20, 10)));

        let cropped = crop(&sample(100, 50), 20, 10, Gravity::SouthEast).to_rgb8();
        // top-left of the crop is source pixel (80, 40)
        assert_eq!(cropped.get_pixel(0, 0), &Rgb([80, 40, 200]));
    }

    #[test]
    fn test_crop_resize_fills_box() {
        let mut img = handle(100, 50);
        img.apply(&Operation::CropResize {
            width: 30,
            height: 30,
            gravity: Gravity::Center,
        })
        .unwrap();
        assert_eq!(img.dimensions(), Some((30, 30)));

        let mut small = handle(10, 20);
        small
            .apply(&Operation::CropResize {
                width: 40,
                height: 40,
                gravity: Gravity::Center,
            })
            .unwrap();
        assert_eq!(small.dimensions(), Some((40, 40)));
    }

    #[test]
    fn test_rounded_corners_clears_corner_alpha() {
        let rounded = rounded_corners(&sample(40, 40), 10).to_rgba8();
        assert_eq!(rounded.get_pixel(0, 0)[3], 0);
        assert_eq!(rounded.get_pixel(39, 0)[3], 0);
        assert_eq!(rounded.get_pixel(0, 39)[3], 0);
        assert_eq!(rounded.get_pixel(39, 39)[3], 0);
        assert_eq!(rounded.get_pixel(20, 20)[3], 255);
        assert_eq!(rounded.get_pixel(20, 0)[3], 255);
    }

    #[test]
    fn test_negate_and_grayscale() {
        let mut img = handle(4, 4);
        img.apply(&Operation::Negate).unwrap();
        img.apply(&Operation::Format("png".into())).unwrap();
        let out = image::load_from_memory(&img.encode().unwrap()).unwrap().to_rgb8();
        assert_eq!(out.get_pixel(1, 2), &Rgb([254, 253, 55]));

        img.apply(&Operation::Grayscale).unwrap();
        let out = image::load_from_memory(&img.encode().unwrap()).unwrap().to_rgb8();
        let px = out.get_pixel(0, 0);
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn test_format_change_reencodes() {
        let mut img = handle(8, 8);
        img.apply(&Operation::Format("jpg".into())).unwrap();
        assert_eq!(img.format(), "jpg");
        let bytes = img.encode().unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);

        img.apply(&Operation::Format("gif".into())).unwrap();
        let bytes = img.encode().unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Gif);
    }

    #[test]
    fn test_unsupported_formats() {
        let err = RasterEngine.decode(b"%PDF-1.4", "pdf").err().unwrap();
        assert!(matches!(err, EngineError::UnsupportedFormat(f) if f == "pdf"));

        let mut img = handle(2, 2);
        assert!(img.apply(&Operation::Format("tiff".into())).is_err());
    }

    #[test]
    fn test_garbage_fails_decode() {
        let err = RasterEngine.decode(b"definitely not a png", "png").err().unwrap();
        assert!(matches!(err, EngineError::Image(_)));
    }
}
