//! MIME type classification.
//!
//! Maps between content types, output format identifiers (`jpg`, `png`, ...)
//! and named content classes used by profile restrictions.

use std::fmt;
use std::path::Path;

/// Common MIME type constants.
pub mod types {
    // Text
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain";
    pub const CSS: &str = "text/css; charset=utf-8";
    pub const JAVASCRIPT: &str = "text/javascript; charset=utf-8";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";

    // Documents
    pub const PDF: &str = "application/pdf";

    // Binary
    pub const OCTET_STREAM: &str = "application/octet-stream";

    // Images
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const PJPEG: &str = "image/pjpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";
    pub const BMP: &str = "image/bmp";
    pub const TIFF: &str = "image/tiff";
}

/// Web-safe image content types and the file extension each encodes to.
const WEB_SAFE_IMAGES: &[(&str, &str)] = &[
    (types::JPEG, "jpg"),
    (types::PJPEG, "jpg"),
    (types::GIF, "gif"),
    (types::PNG, "png"),
];

/// Output formats a blob can be converted to.
const FORMATS: &[(&str, &str)] = &[
    ("jpg", types::JPEG),
    ("gif", types::GIF),
    ("png", types::PNG),
    ("pdf", types::PDF),
];

// ============================================================================
// Content classes
// ============================================================================

/// A named group of content types, usable as a profile restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentClass {
    /// JPEG, progressive JPEG, GIF and PNG.
    WebSafeImage,
    Pdf,
}

impl ContentClass {
    /// Parse a class name as written in config (`web_safe_image`, `pdf`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "web_safe_image" => Some(Self::WebSafeImage),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::WebSafeImage => "web_safe_image",
            Self::Pdf => "pdf",
        }
    }

    /// Content types belonging to this class.
    pub fn content_types(self) -> Vec<&'static str> {
        match self {
            Self::WebSafeImage => WEB_SAFE_IMAGES.iter().map(|(ct, _)| *ct).collect(),
            Self::Pdf => vec![types::PDF],
        }
    }
}

impl fmt::Display for ContentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Content type produced by encoding to `format`.
pub fn content_type_for_format(format: &str) -> Option<&'static str> {
    FORMATS
        .iter()
        .find(|(name, _)| *name == format)
        .map(|(_, ct)| *ct)
}

/// File extension for a web-safe image or PDF content type.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    if is_pdf(content_type) {
        return Some("pdf");
    }
    WEB_SAFE_IMAGES
        .iter()
        .find(|(ct, _)| *ct == content_type)
        .map(|(_, ext)| *ext)
}

pub fn is_web_safe_image(content_type: &str) -> bool {
    WEB_SAFE_IMAGES.iter().any(|(ct, _)| *ct == content_type)
}

pub fn is_pdf(content_type: &str) -> bool {
    content_type == types::PDF
}

/// Strip parameters and normalize case: `Image/PNG; q=1` -> `image/png`.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

// ============================================================================
// File extension lookup
// ============================================================================

/// Guess MIME type from file extension, `application/octet-stream` if unknown.
pub fn from_path(path: &Path) -> &'static str {
    lookup(path).unwrap_or(types::OCTET_STREAM)
}

/// Guess MIME type from file extension.
pub fn lookup(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    from_extension(&ext)
}

/// Guess MIME type from a lowercase extension string.
pub fn from_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        "html" | "htm" => types::HTML,
        "css" => types::CSS,
        "js" | "mjs" => types::JAVASCRIPT,
        "json" => types::JSON,
        "xml" => types::XML,
        "txt" => types::PLAIN,

        "png" => types::PNG,
        "jpg" | "jpeg" | "jpe" => types::JPEG,
        "gif" => types::GIF,
        "webp" => types::WEBP,
        "svg" => types::SVG,
        "ico" => types::ICO,
        "bmp" => types::BMP,
        "tif" | "tiff" => types::TIFF,

        "pdf" => types::PDF,
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path() {
        assert_eq!(from_path(&PathBuf::from("logo.png")), types::PNG);
        assert_eq!(from_path(&PathBuf::from("photo.JPEG")), types::JPEG);
        assert_eq!(from_path(&PathBuf::from("doc.pdf")), types::PDF);
        assert_eq!(from_path(&PathBuf::from("unknown.xyz")), types::OCTET_STREAM);
        assert_eq!(from_path(&PathBuf::from("no_extension")), types::OCTET_STREAM);
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/pjpeg"), Some("jpg"));
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("application/pdf"), Some("pdf"));
        assert_eq!(extension_for("image/webp"), None);
        assert_eq!(extension_for("text/html"), None);
    }

    #[test]
    fn test_content_type_for_format() {
        assert_eq!(content_type_for_format("png"), Some("image/png"));
        assert_eq!(content_type_for_format("jpg"), Some("image/jpeg"));
        assert_eq!(content_type_for_format("pdf"), Some("application/pdf"));
        assert_eq!(content_type_for_format("tiff"), None);
    }

    #[test]
    fn test_content_classes() {
        let web = ContentClass::WebSafeImage.content_types();
        assert_eq!(web.len(), 4);
        assert!(web.contains(&"image/pjpeg"));
        assert_eq!(ContentClass::Pdf.content_types(), vec!["application/pdf"]);

        assert_eq!(
            ContentClass::from_name("web_safe_image"),
            Some(ContentClass::WebSafeImage)
        );
        assert_eq!(ContentClass::from_name("video"), None);
    }

    #[test]
    fn test_predicates() {
        assert!(is_web_safe_image("image/gif"));
        assert!(!is_web_safe_image("application/pdf"));
        assert!(is_pdf("application/pdf"));
        assert!(!is_pdf("image/png"));
    }

    #[test]
    fn test_essence() {
        assert_eq!(essence("Image/PNG"), "image/png");
        assert_eq!(essence("image/jpeg; charset=binary"), "image/jpeg");
        assert_eq!(essence(""), "");
    }
}
