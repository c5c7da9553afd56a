//! Shared test utilities: synthetic images, encoded in memory.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let png = encode_test_image(ImageType::Png, 40, 30);
//! let image = init_image(&RustBackend::new(), &png).unwrap();
//! assert_eq!(image.dimensions(), (40, 30));
//! ```

use crate::types::ImageType;
use image::{DynamicImage, RgbImage, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

// =========================================================================
// Synthetic pixels
// =========================================================================

/// RGB gradient: red follows x, green follows y, blue is constant.
pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 128])
    }))
}

/// RGBA gradient with alpha rising along x.
pub fn gradient_rgba(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([
            (x * 7 % 256) as u8,
            (y * 11 % 256) as u8,
            128,
            (x * 255 / width.max(1)) as u8,
        ])
    }))
}

// =========================================================================
// Encoded fixtures
// =========================================================================

/// Encode an RGB gradient in the given format.
pub fn encode_test_image(format: ImageType, width: u32, height: u32) -> Vec<u8> {
    let format = format
        .image_format()
        .unwrap_or_else(|| panic!("cannot encode test image as {format}"));
    let mut buf = Vec::new();
    gradient_rgb(width, height)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

/// Write an encoded gradient to `dir/name` and return the path.
pub fn write_test_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let path = dir.join(name);
    std::fs::write(
        &path,
        encode_test_image(ImageType::from_extension(ext), width, height),
    )
    .unwrap();
    path
}
