//! In-memory asset content.
//!
//! A [`Blob`] holds the fetched bytes and content type of one asset. The
//! first mutation decodes the bytes through the image engine; from then on
//! [`Blob::data`] re-encodes the decoded image instead of returning the
//! original bytes.

use crate::{
    engine::{Gravity, ImageEngine, ImageHandle, Operation},
    error::{Error, Result},
    mime,
};
use std::{borrow::Cow, fmt, sync::Arc};

/// Decode state of a blob.
enum ImageState {
    Undecoded,
    Decoded(Box<dyn ImageHandle>),
}

/// Bytes + content type of one fetched asset.
pub struct Blob {
    raw: Vec<u8>,
    content_type: String,
    image: ImageState,
    engine: Arc<dyn ImageEngine>,
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("len", &self.raw.len())
            .field("content_type", &self.content_type)
            .field("decoded", &self.is_decoded())
            .finish()
    }
}

impl Blob {
    /// Wrap fetched bytes. Content type parameters (`; charset=...`) are dropped.
    pub fn new(data: Vec<u8>, content_type: &str, engine: Arc<dyn ImageEngine>) -> Self {
        Self {
            raw: data,
            content_type: mime::essence(content_type),
            image: ImageState::Undecoded,
            engine,
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// File extension matching the content type.
    pub fn extension(&self) -> Result<&'static str> {
        mime::extension_for(&self.content_type)
            .ok_or_else(|| Error::UnsupportedContentType(self.content_type.clone()))
    }

    pub fn is_web_safe_image(&self) -> bool {
        mime::is_web_safe_image(&self.content_type)
    }

    pub fn is_pdf(&self) -> bool {
        mime::is_pdf(&self.content_type)
    }

    /// Whether a mutation has decoded the image.
    pub fn is_decoded(&self) -> bool {
        matches!(self.image, ImageState::Decoded(_))
    }

    /// Current bytes: the original data until the first mutation.
    pub fn data(&self) -> Result<Cow<'_, [u8]>> {
        match &self.image {
            ImageState::Undecoded => Ok(Cow::Borrowed(&self.raw)),
            ImageState::Decoded(image) => Ok(Cow::Owned(image.encode()?)),
        }
    }

    /// Consume the blob, returning its current bytes.
    pub fn into_data(self) -> Result<Vec<u8>> {
        match self.image {
            ImageState::Undecoded => Ok(self.raw),
            ImageState::Decoded(image) => Ok(image.encode()?),
        }
    }

    /// Pixel dimensions of the (decoded) image.
    pub fn dimensions(&mut self) -> Result<Option<(u32, u32)>> {
        self.decode()?;
        match &self.image {
            ImageState::Decoded(image) => Ok(image.dimensions()),
            ImageState::Undecoded => Ok(None),
        }
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Change the output format (`jpg`, `gif`, `png`, `pdf`).
    pub fn set_format(&mut self, format: &str) -> Result<()> {
        let content_type = mime::content_type_for_format(format)
            .ok_or_else(|| Error::UnsupportedFormat(format.to_owned()))?;
        self.apply(&Operation::Format(format.to_owned()))?;
        self.content_type = content_type.to_owned();
        Ok(())
    }

    /// Shrink to fit within `width`x`height`, keeping aspect ratio.
    pub fn reduce(&mut self, width: u32, height: u32) -> Result<()> {
        self.geometry(width, height, true, false)
    }

    /// Shrink to `width`x`height`, ignoring aspect ratio.
    pub fn reduce_exact(&mut self, width: u32, height: u32) -> Result<()> {
        self.geometry(width, height, true, true)
    }

    /// Scale up or down to fit within `width`x`height`, keeping aspect ratio.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.geometry(width, height, false, false)
    }

    /// Scale to exactly `width`x`height`.
    pub fn resize_exact(&mut self, width: u32, height: u32) -> Result<()> {
        self.geometry(width, height, false, true)
    }

    pub fn crop(&mut self, width: u32, height: u32, gravity: Gravity) -> Result<()> {
        self.apply(&Operation::Crop {
            width,
            height,
            gravity,
        })
    }

    /// Fill `width`x`height`: scale to cover the box, then crop the overflow.
    pub fn crop_resize(&mut self, width: u32, height: u32, gravity: Gravity) -> Result<()> {
        self.apply(&Operation::CropResize {
            width,
            height,
            gravity,
        })
    }

    /// Transparent rounded corners. Switches the output to PNG.
    pub fn rounded_corners(&mut self, radius: u32) -> Result<()> {
        self.set_format("png")?;
        self.apply(&Operation::RoundedCorners { radius })
    }

    pub fn grayscale(&mut self) -> Result<()> {
        self.apply(&Operation::Grayscale)
    }

    pub fn negate(&mut self) -> Result<()> {
        self.apply(&Operation::Negate)
    }

    fn geometry(&mut self, width: u32, height: u32, shrink_only: bool, exact: bool) -> Result<()> {
        self.apply(&Operation::Geometry {
            width,
            height,
            shrink_only,
            exact,
        })
    }

    fn apply(&mut self, op: &Operation) -> Result<()> {
        self.decode()?;
        if let ImageState::Decoded(image) = &mut self.image {
            image.apply(op)?;
        }
        Ok(())
    }

    fn decode(&mut self) -> Result<()> {
        if let ImageState::Undecoded = self.image {
            let image = self.engine.decode(&self.raw, self.extension()?)?;
            self.image = ImageState::Decoded(image);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::{EngineError, RasterEngine};
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;
    use std::sync::Mutex;

    pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    pub(crate) fn raster() -> Arc<dyn ImageEngine> {
        Arc::new(RasterEngine)
    }

    /// Records every operation instead of touching pixels.
    #[derive(Default)]
    pub(crate) struct RecordingEngine {
        pub(crate) decoded: Mutex<Vec<String>>,
        pub(crate) ops: Arc<Mutex<Vec<Operation>>>,
    }

    struct RecordingImage {
        format: String,
        ops: Arc<Mutex<Vec<Operation>>>,
    }

    impl ImageEngine for RecordingEngine {
        fn decode(&self, _data: &[u8], format: &str) -> Result<Box<dyn ImageHandle>, EngineError> {
            self.decoded.lock().unwrap().push(format.to_owned());
            Ok(Box::new(RecordingImage {
                format: format.to_owned(),
                ops: Arc::clone(&self.ops),
            }))
        }
    }

    impl ImageHandle for RecordingImage {
        fn apply(&mut self, op: &Operation) -> Result<(), EngineError> {
            if let Operation::Format(format) = op {
                self.format = format.clone();
            }
            self.ops.lock().unwrap().push(op.clone());
            Ok(())
        }

        fn encode(&self) -> Result<Vec<u8>, EngineError> {
            Ok(format!("encoded:{}", self.format).into_bytes())
        }

        fn format(&self) -> &str {
            &self.format
        }

        fn dimensions(&self) -> Option<(u32, u32)> {
            None
        }
    }

    #[test]
    fn test_untouched_blob_returns_original_bytes() {
        let blob = Blob::new(b"raw bytes".to_vec(), "image/png", raster());
        assert!(!blob.is_decoded());
        assert_eq!(blob.data().unwrap().as_ref(), b"raw bytes");
        assert_eq!(blob.into_data().unwrap(), b"raw bytes");
    }

    #[test]
    fn test_content_type_parameters_dropped() {
        let blob = Blob::new(Vec::new(), "Image/JPEG; charset=binary", raster());
        assert_eq!(blob.content_type(), "image/jpeg");
        assert_eq!(blob.extension().unwrap(), "jpg");
    }

    #[test]
    fn test_pdf_predicates() {
        let blob = Blob::new(b"%PDF-1.4".to_vec(), "application/pdf", raster());
        assert!(!blob.is_web_safe_image());
        assert!(blob.is_pdf());
        assert_eq!(blob.extension().unwrap(), "pdf");
    }

    #[test]
    fn test_extension_unsupported() {
        let blob = Blob::new(Vec::new(), "text/html", raster());
        assert!(matches!(
            blob.extension(),
            Err(Error::UnsupportedContentType(ct)) if ct == "text/html"
        ));
    }

    #[test]
    fn test_mutation_on_unsupported_type_fails() {
        let mut blob = Blob::new(b"<html>".to_vec(), "text/html", raster());
        assert!(matches!(blob.grayscale(), Err(Error::UnsupportedContentType(_))));
        assert!(!blob.is_decoded());
    }

    #[test]
    fn test_set_format_png() {
        let mut blob = Blob::new(png(4, 4), "image/gif", Arc::new(RecordingEngine::default()));
        blob.set_format("png").unwrap();
        assert_eq!(blob.content_type(), "image/png");
        assert_eq!(blob.extension().unwrap(), "png");
    }

    #[test]
    fn test_set_format_unknown() {
        let mut blob = Blob::new(png(4, 4), "image/png", raster());
        assert!(matches!(blob.set_format("bmp"), Err(Error::UnsupportedFormat(_))));
        assert_eq!(blob.content_type(), "image/png");
    }

    #[test]
    fn test_decode_is_lazy_and_happens_once() {
        let engine = Arc::new(RecordingEngine::default());
        let mut blob = Blob::new(b"jpeg".to_vec(), "image/pjpeg", engine.clone());
        assert!(engine.decoded.lock().unwrap().is_empty());

        blob.reduce(10, 10).unwrap();
        blob.negate().unwrap();
        assert_eq!(*engine.decoded.lock().unwrap(), vec!["jpg".to_owned()]);
        assert_eq!(blob.data().unwrap().as_ref(), b"encoded:jpg");
    }

    #[test]
    fn test_rounded_corners_forces_png() {
        let engine = Arc::new(RecordingEngine::default());
        let mut blob = Blob::new(b"jpeg".to_vec(), "image/jpeg", engine.clone());
        blob.rounded_corners(6).unwrap();

        assert_eq!(blob.content_type(), "image/png");
        assert_eq!(
            *engine.ops.lock().unwrap(),
            vec![
                Operation::Format("png".into()),
                Operation::RoundedCorners { radius: 6 }
            ]
        );
    }

    #[test]
    fn test_operations_forwarded_in_order() {
        let engine = Arc::new(RecordingEngine::default());
        let mut blob = Blob::new(b"png".to_vec(), "image/png", engine.clone());
        blob.reduce_exact(1, 2).unwrap();
        blob.resize(3, 4).unwrap();
        blob.crop(5, 6, Gravity::North).unwrap();
        blob.crop_resize(7, 8, Gravity::Center).unwrap();
        blob.grayscale().unwrap();

        let ops = engine.ops.lock().unwrap();
        assert_eq!(ops.len(), 5);
        assert_eq!(
            ops[0],
            Operation::Geometry {
                width: 1,
                height: 2,
                shrink_only: true,
                exact: true
            }
        );
        assert_eq!(
            ops[2],
            Operation::Crop {
                width: 5,
                height: 6,
                gravity: Gravity::North
            }
        );
        assert_eq!(ops[4], Operation::Grayscale);
    }

    #[test]
    fn test_reduce_with_raster_engine() {
        let mut blob = Blob::new(png(60, 40), "image/png", raster());
        blob.reduce(600, 400).unwrap();
        assert_eq!(blob.dimensions().unwrap(), Some((60, 40)));

        blob.reduce(30, 30).unwrap();
        assert_eq!(blob.dimensions().unwrap(), Some((30, 20)));

        blob.resize(90, 90).unwrap();
        assert_eq!(blob.dimensions().unwrap(), Some((90, 60)));

        let bytes = blob.into_data().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (90, 60));
    }
}
