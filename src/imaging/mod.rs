//! Image processing on top of the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Sniff** | magic bytes ([`determine_image_type`]) |
//! | **Decode** | `image::ImageReader` per format, JPEG shrink-on-load |
//! | **Encode** | JPEG / PNG / WebP / TIFF encoders from `image::codecs` |
//! | **Resize** | `resize_exact` with the kernel's filter |
//! | **Extract area** | `crop_imm` |
//! | **Gravity** | canvas embed with black/white/background/copy/repeat/mirror extension |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Host-facing functions applying defaults and validation

pub mod backend;
pub mod calculations;
pub mod format;
mod image_ref;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use format::{determine_image_type, is_type_supported, supported_types};
pub use image_ref::ImageRef;
pub use operations::{
    extract_image_area, gravity_image, has_alpha_channel, init_image, init_image_as,
    load_jpeg_buffer, resize_image, save_buffer,
};
pub use params::{
    Area, Background, Compression, ExportParams, GravityParams, LoadParams, Quality,
    ResizeParams, SaveParams,
};
pub use rust_backend::RustBackend;
