//! Format sniffing and the supported-type registry.

use crate::types::ImageType;
use std::sync::LazyLock;

/// Formats whose decoders are compiled into `image`, probed once.
static SUPPORTED_TYPES: LazyLock<Vec<ImageType>> = LazyLock::new(|| {
    ImageType::KNOWN
        .into_iter()
        .filter(|t| t.image_format().is_some_and(|f| f.reading_enabled()))
        .collect()
});

/// Image types with a working loader.
pub fn supported_types() -> &'static [ImageType] {
    &SUPPORTED_TYPES
}

pub fn is_type_supported(image_type: ImageType) -> bool {
    SUPPORTED_TYPES.contains(&image_type)
}

/// Identify an encoded buffer by its magic bytes.
///
/// Buffers shorter than 12 bytes are always `Unknown`. TIFF and WebP are only
/// reported when their loaders are available.
///
/// # Examples
/// ```
/// # use pixbridge::imaging::determine_image_type;
/// # use pixbridge::types::ImageType;
/// let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
/// assert_eq!(determine_image_type(png), ImageType::Png);
/// assert_eq!(determine_image_type(b"short"), ImageType::Unknown);
/// ```
pub fn determine_image_type(buf: &[u8]) -> ImageType {
    if buf.len() < 12 {
        return ImageType::Unknown;
    }
    if buf.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return ImageType::Jpeg;
    }
    if buf.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return ImageType::Png;
    }
    if is_type_supported(ImageType::Tiff)
        && (buf.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || buf.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]))
    {
        return ImageType::Tiff;
    }
    if is_type_supported(ImageType::Webp) && &buf[8..12] == b"WEBP" {
        return ImageType::Webp;
    }
    ImageType::Unknown
}
