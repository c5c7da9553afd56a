//! High-level image operations.
//!
//! These functions validate and default host-supplied arguments, compute the
//! backend parameters, and call the backend. They never touch pixels
//! themselves.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{
    JPEG_SHRINK_FACTORS, area_fits, clamp_scale, resize_dimensions,
};
use super::format::{determine_image_type, is_type_supported};
use super::image_ref::ImageRef;
use super::params::{
    Area, Background, Compression, ExportParams, GravityParams, LoadParams, Quality,
    ResizeParams, SaveParams,
};
use crate::config::ExportConfig;
use crate::types::{CompassDirection, Extend, ImageType, Kernel};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Decode a buffer, sniffing its format from the magic bytes.
pub fn init_image(backend: &impl ImageBackend, buf: &[u8]) -> Result<ImageRef> {
    let image_type = determine_image_type(buf);
    if image_type == ImageType::Unknown {
        if buf.len() > 2 {
            log::warn!(
                "Failed to understand image format size={} {:x} {:x} {:x}",
                buf.len(),
                buf[0],
                buf[1],
                buf[2]
            );
        } else {
            log::warn!("Failed to understand image format size={}", buf.len());
        }
        return Err(BackendError::UnsupportedImageFormat);
    }
    init_image_as(backend, buf, image_type)
}

/// Decode a buffer with the loader for an explicit format tag.
pub fn init_image_as(
    backend: &impl ImageBackend,
    buf: &[u8],
    image_type: ImageType,
) -> Result<ImageRef> {
    if image_type == ImageType::Unknown {
        return Err(BackendError::UnsupportedImageFormat);
    }
    backend.load(&LoadParams {
        buf,
        format: image_type,
        shrink: None,
    })
}

/// Decode a JPEG, optionally shrinking by 2, 4 or 8 during load.
///
/// `shrink <= 0` decodes at full size.
pub fn load_jpeg_buffer(backend: &impl ImageBackend, buf: &[u8], shrink: i32) -> Result<ImageRef> {
    let shrink = if shrink > 0 {
        let shrink = shrink as u32;
        if !JPEG_SHRINK_FACTORS.contains(&shrink) {
            return Err(BackendError::InvalidArgument(format!(
                "shrink must be 1, 2, 4 or 8, got {shrink}"
            )));
        }
        Some(shrink)
    } else {
        None
    };
    backend.load(&LoadParams {
        buf,
        format: ImageType::Jpeg,
        shrink,
    })
}

/// Resolve host save options into backend parameters.
///
/// Zero quality and compression take the configured defaults, and an
/// `Unknown` format saves as JPEG.
pub fn plan_save(params: &ExportParams, defaults: &ExportConfig) -> Result<SaveParams> {
    if params.format != ImageType::Unknown && !is_type_supported(params.format) {
        return Err(BackendError::UnsupportedSaveFormat(
            params.format.nick().to_string(),
        ));
    }
    let format = match params.format {
        ImageType::Unknown => ImageType::Jpeg,
        other => other,
    };
    let quality = match params.quality {
        0 => defaults.quality,
        q => q,
    };
    let compression = match params.compression {
        0 => defaults.compression,
        c => c,
    };
    Ok(SaveParams {
        format,
        quality: Quality::new(quality),
        compression: Compression::new(compression),
        interlace: params.interlaced,
        lossless: params.lossless,
        strip: params.strip_metadata,
    })
}

/// Encode an image to a buffer.
pub fn save_buffer(
    backend: &impl ImageBackend,
    image: &ImageRef,
    params: &ExportParams,
    defaults: &ExportConfig,
) -> Result<Vec<u8>> {
    let save = plan_save(params, defaults)?;
    backend.save(image, &save)
}

/// Compute resize parameters for an image of `source` dimensions.
///
/// Both factors are capped at 10. A positive `vscale` sets the vertical
/// factor independently; otherwise `scale` applies to both axes.
pub fn plan_resize(
    source: (u32, u32),
    scale: f64,
    vscale: f64,
    kernel: Kernel,
) -> Result<ResizeParams> {
    // NaN fails this comparison too
    if !(scale > 0.0) {
        return Err(BackendError::InvalidArgument(format!(
            "scale must be positive, got {scale}"
        )));
    }
    let scale = clamp_scale(scale);
    let vertical = if vscale > 0.0 {
        clamp_scale(vscale)
    } else {
        scale
    };
    let (width, height) = resize_dimensions(source, scale, vertical);
    Ok(ResizeParams {
        width,
        height,
        kernel,
    })
}

/// Refuse to generate an image the backend's limits would not let a
/// decoder produce. `bytes` is the largest buffer the operation allocates.
fn check_output(
    backend: &impl ImageBackend,
    (width, height): (u32, u32),
    bytes: u64,
) -> Result<()> {
    let limits = backend.limits();
    let too_wide = limits.max_image_width.is_some_and(|max| width > max);
    let too_tall = limits.max_image_height.is_some_and(|max| height > max);
    let too_big = limits.max_alloc.is_some_and(|max| bytes > max);
    if too_wide || too_tall || too_big {
        return Err(BackendError::InvalidArgument(format!(
            "output {width}x{height} ({bytes} bytes) exceeds the configured limits"
        )));
    }
    Ok(())
}

fn buffer_bytes((width, height): (u32, u32), bytes_per_pixel: u64) -> u64 {
    width as u64 * height as u64 * bytes_per_pixel
}

/// Resize by a scale factor with the given kernel.
pub fn resize_image(
    backend: &impl ImageBackend,
    image: &ImageRef,
    scale: f64,
    vscale: f64,
    kernel: Kernel,
) -> Result<ImageRef> {
    let params = plan_resize(image.dimensions(), scale, vscale, kernel)?;
    let output = (params.width, params.height);
    let pixel = image.image().color().bytes_per_pixel() as u64;
    // the vertical pass goes through an f32 RGBA buffer of the source width
    let intermediate = buffer_bytes((image.width(), params.height), 16);
    check_output(backend, output, buffer_bytes(output, pixel).max(intermediate))?;
    backend.resize(image, &params)
}

/// Crop to the given area, which must lie inside the image.
pub fn extract_image_area(
    backend: &impl ImageBackend,
    image: &ImageRef,
    left: i64,
    top: i64,
    width: i64,
    height: i64,
) -> Result<ImageRef> {
    if !area_fits(image.dimensions(), left, top, width, height) {
        let (w, h) = image.dimensions();
        return Err(BackendError::InvalidArgument(format!(
            "bad extract area left={left} top={top} width={width} height={height} for {w}x{h} image"
        )));
    }
    let area = Area {
        left: left as u32,
        top: top as u32,
        width: width as u32,
        height: height as u32,
    };
    backend.extract_area(image, &area)
}

/// Place the image on a `width x height` canvas.
///
/// The background colour is only used with [`Extend::Background`].
#[allow(clippy::too_many_arguments)]
pub fn gravity_image(
    backend: &impl ImageBackend,
    image: &ImageRef,
    direction: CompassDirection,
    width: i64,
    height: i64,
    extend: Extend,
    red: f64,
    green: f64,
    blue: f64,
) -> Result<ImageRef> {
    if width <= 0 || height <= 0 || width > u32::MAX as i64 || height > u32::MAX as i64 {
        return Err(BackendError::InvalidArgument(format!(
            "canvas must be positive, got {width}x{height}"
        )));
    }
    let canvas = (width as u32, height as u32);
    let pixel = image.image().color().bytes_per_pixel() as u64;
    check_output(backend, canvas, buffer_bytes(canvas, pixel))?;
    let background = match extend {
        Extend::Background => Background::new(red, green, blue),
        _ => Background::default(),
    };
    backend.gravity(
        image,
        &GravityParams {
            direction,
            width: canvas.0,
            height: canvas.1,
            extend,
            background,
        },
    )
}

/// Whether the image carries an alpha band.
pub fn has_alpha_channel(image: &ImageRef) -> bool {
    image.has_alpha()
}
