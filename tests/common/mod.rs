//! Helpers shared by the integration tests.

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;

/// RGB image with red following x and green following y.
pub fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 9 % 256) as u8, (y * 13 % 256) as u8, 64])
    }))
}

/// RGBA image that is half transparent.
pub fn translucent(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([10, 20, 30, 128]),
    ))
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

pub fn decode(buf: &[u8]) -> DynamicImage {
    image::load_from_memory(buf).unwrap()
}
