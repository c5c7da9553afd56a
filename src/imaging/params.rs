//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which applies defaults and validation) and the [`backend`](super::backend)
//! (which does the pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1-100, default 90). Clamped on construction.
//! - [`Compression`]: PNG deflate level (0-9, default 6).
//! - [`ExportParams`]: host-facing save options; zero means "use the default".
//! - [`LoadParams`] / [`SaveParams`] / [`ResizeParams`] / [`Area`] / [`GravityParams`]:
//!   fully resolved backend inputs.

use crate::types::{CompassDirection, Extend, ImageType, Kernel};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// PNG compression level (0-9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compression(pub u32);

impl Compression {
    pub fn new(value: u32) -> Self {
        Self(value.min(9))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Compression {
    fn default() -> Self {
        Self(6)
    }
}

/// Options for saving an image to a buffer, as a host passes them.
///
/// `quality == 0` and `compression == 0` select the configured defaults;
/// `format == Unknown` saves as JPEG.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportParams {
    pub format: ImageType,
    pub quality: u32,
    pub compression: u32,
    pub interlaced: bool,
    pub lossless: bool,
    pub strip_metadata: bool,
}

/// Decode input.
#[derive(Debug, Clone, Copy)]
pub struct LoadParams<'a> {
    pub buf: &'a [u8],
    pub format: ImageType,
    /// JPEG shrink-on-load factor (1, 2, 4 or 8).
    pub shrink: Option<u32>,
}

/// Encode input with defaults already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveParams {
    pub format: ImageType,
    pub quality: Quality,
    pub compression: Compression,
    pub interlace: bool,
    pub lossless: bool,
    pub strip: bool,
}

/// Resize with separate horizontal and vertical factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub kernel: Kernel,
}

/// A rectangle inside the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Background colour in 0-255 units, regardless of sample depth.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Background {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Background {
    pub fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }

    /// Rec.601 luma, used when filling single-band images.
    pub fn luma(&self) -> f64 {
        0.299 * self.red + 0.587 * self.green + 0.114 * self.blue
    }
}

/// Place the image on a `width x height` canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityParams {
    pub direction: CompassDirection,
    pub width: u32,
    pub height: u32,
    pub extend: Extend,
    pub background: Background,
}
