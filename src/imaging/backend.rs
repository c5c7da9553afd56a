//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the five primitives every backend must
//! support: load, save, resize, extract_area, and gravity. Defaults,
//! clamping, and format sniffing live one level up in
//! [`operations`](super::operations), so backends only see fully resolved
//! parameters.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate's codecs and resampling filters.

use super::image_ref::ImageRef;
use super::params::{Area, GravityParams, LoadParams, ResizeParams, SaveParams};
use image::Limits;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported image format")]
    UnsupportedImageFormat,
    #[error("cannot save to {0:?}")]
    UnsupportedSaveFormat(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Decode failed: {0}")]
    DecodeFailed(String),
    #[error("Encode failed: {0}")]
    EncodeFailed(String),
}

/// Trait for image processing backends.
///
/// Every backend must implement all five operations so the rest of the
/// codebase is backend-agnostic.
pub trait ImageBackend: Sync {
    /// Size and allocation caps for decoded and generated images.
    fn limits(&self) -> &Limits;

    /// Decode an encoded buffer of a known format.
    fn load(&self, params: &LoadParams<'_>) -> Result<ImageRef, BackendError>;

    /// Encode an image to an owned buffer.
    fn save(&self, image: &ImageRef, params: &SaveParams) -> Result<Vec<u8>, BackendError>;

    /// Resample to exact output dimensions.
    fn resize(&self, image: &ImageRef, params: &ResizeParams) -> Result<ImageRef, BackendError>;

    /// Crop to an area already known to lie inside the image.
    fn extract_area(&self, image: &ImageRef, area: &Area) -> Result<ImageRef, BackendError>;

    /// Place the image on a new canvas, generating pixels per the extend mode.
    fn gravity(&self, image: &ImageRef, params: &GravityParams) -> Result<ImageRef, BackendError>;
}
