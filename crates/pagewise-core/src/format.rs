//! Container formats known to the engine.

use serde::{Deserialize, Serialize};

/// The closed set of formats a canvas can be decoded from or encoded to.
///
/// HEIF, AVIF and JPEG 2000 are recognised by name but have no encoder in
/// this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Tiff,
    Gif,
    Bmp,
    Heif,
    Avif,
    Jp2k,
}

impl ImageFormat {
    /// Canonical file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Heif => "heif",
            ImageFormat::Avif => "avif",
            ImageFormat::Jp2k => "jp2",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Tiff => "image/tiff",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Heif => "image/heif",
            ImageFormat::Avif => "image/avif",
            ImageFormat::Jp2k => "image/jp2",
        }
    }

    /// Look up a format by file extension (case-insensitive, dot optional).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "jpeg" | "jpg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::Webp),
            "tiff" | "tif" => Some(ImageFormat::Tiff),
            "gif" => Some(ImageFormat::Gif),
            "bmp" => Some(ImageFormat::Bmp),
            "heif" | "heic" => Some(ImageFormat::Heif),
            "avif" => Some(ImageFormat::Avif),
            "jp2" | "j2k" | "jpx" => Some(ImageFormat::Jp2k),
            _ => None,
        }
    }

    /// Whether the format can hold more than one frame.
    pub fn supports_animation(self) -> bool {
        matches!(self, ImageFormat::Gif | ImageFormat::Webp | ImageFormat::Png)
    }

    /// Map from the `image` crate's format detection.
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
            image::ImageFormat::Png => Some(ImageFormat::Png),
            image::ImageFormat::WebP => Some(ImageFormat::Webp),
            image::ImageFormat::Tiff => Some(ImageFormat::Tiff),
            image::ImageFormat::Gif => Some(ImageFormat::Gif),
            image::ImageFormat::Bmp => Some(ImageFormat::Bmp),
            image::ImageFormat::Avif => Some(ImageFormat::Avif),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(ImageFormat::from_extension("jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension(".PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("heic"), Some(ImageFormat::Heif));
        assert_eq!(ImageFormat::from_extension("jp2"), Some(ImageFormat::Jp2k));
        assert_eq!(ImageFormat::from_extension("psd"), None);
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(ImageFormat::Webp.mime_type(), "image/webp");
        assert_eq!(ImageFormat::Jp2k.mime_type(), "image/jp2");
    }

    #[test]
    fn test_image_format_mapping() {
        assert_eq!(
            ImageFormat::from_image_format(image::ImageFormat::Gif),
            Some(ImageFormat::Gif)
        );
        assert_eq!(ImageFormat::from_image_format(image::ImageFormat::Ico), None);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ImageFormat::Webp).unwrap();
        assert_eq!(json, "\"webp\"");
        let parsed: ImageFormat = serde_json::from_str("\"gif\"").unwrap();
        assert_eq!(parsed, ImageFormat::Gif);
    }
}
