//! Pure Rust image processing backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with explicit format + `Limits` |
//! | JPEG shrink-on-load | decode, then `resize_exact` with `Triangle` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (baseline) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (filter: none) |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless only) |
//! | Encode → TIFF | `image::codecs::tiff::TiffEncoder` |
//! | Resize | `DynamicImage::resize_exact` with the kernel's filter |
//! | Extract area | `DynamicImage::crop_imm` |
//! | Gravity | canvas embed below (no `image` equivalent) |

use super::backend::{BackendError, ImageBackend};
use super::calculations::{gravity_offset, shrink_dimensions, source_coordinate};
use super::image_ref::ImageRef;
use super::params::{Area, Compression, GravityParams, LoadParams, ResizeParams, SaveParams};
use crate::types::{Extend, ImageType, Kernel};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{
    ColorType, DynamicImage, ImageBuffer, ImageDecoder, ImageEncoder, ImageReader, Limits, Luma,
    LumaA, Pixel, Rgb, Rgba,
};
use std::borrow::Cow;
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    limits: Limits,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
        }
    }

    /// Backend whose decoders refuse images beyond `limits`.
    pub fn with_limits(limits: Limits) -> Self {
        Self { limits }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a resampling kernel onto the closest `image` filter.
///
/// `image` has no two-lobe Lanczos; Catmull-Rom has the same support.
pub fn filter_for(kernel: Kernel) -> FilterType {
    match kernel {
        Kernel::Nearest => FilterType::Nearest,
        Kernel::Linear => FilterType::Triangle,
        Kernel::Cubic | Kernel::Lanczos2 => FilterType::CatmullRom,
        Kernel::Lanczos3 => FilterType::Lanczos3,
    }
}

/// Map a 0-9 deflate level onto the PNG encoder's presets.
fn png_compression(compression: Compression) -> CompressionType {
    match compression.value() {
        0..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

fn decode_error(e: image::ImageError) -> BackendError {
    BackendError::DecodeFailed(e.to_string())
}

fn encode_error(format: ImageType) -> impl Fn(image::ImageError) -> BackendError {
    move |e| BackendError::EncodeFailed(format!("{format} encode failed: {e}"))
}

/// Convert to a colour type the target encoder accepts.
fn encodable(img: &DynamicImage, format: ImageType) -> Cow<'_, DynamicImage> {
    let color = img.color();
    let greyish = matches!(
        color,
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16
    );
    let accepted = match format {
        ImageType::Jpeg | ImageType::Unknown => {
            matches!(color, ColorType::L8 | ColorType::Rgb8)
        }
        ImageType::Webp => matches!(
            color,
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8
        ),
        ImageType::Png => matches!(
            color,
            ColorType::L8
                | ColorType::La8
                | ColorType::Rgb8
                | ColorType::Rgba8
                | ColorType::L16
                | ColorType::La16
                | ColorType::Rgb16
                | ColorType::Rgba16
        ),
        ImageType::Tiff => matches!(
            color,
            ColorType::L8
                | ColorType::Rgb8
                | ColorType::Rgba8
                | ColorType::L16
                | ColorType::Rgb16
                | ColorType::Rgba16
        ),
    };
    if accepted {
        return Cow::Borrowed(img);
    }

    let converted = match format {
        // JPEG has no alpha and no 16-bit samples
        ImageType::Jpeg | ImageType::Unknown if greyish => {
            DynamicImage::ImageLuma8(img.to_luma8())
        }
        ImageType::Jpeg | ImageType::Unknown => DynamicImage::ImageRgb8(img.to_rgb8()),
        ImageType::Webp if color.has_alpha() => DynamicImage::ImageRgba8(img.to_rgba8()),
        ImageType::Webp => DynamicImage::ImageRgb8(img.to_rgb8()),
        ImageType::Tiff if color == ColorType::La8 => DynamicImage::ImageRgba8(img.to_rgba8()),
        ImageType::Png | ImageType::Tiff if color.has_alpha() => {
            DynamicImage::ImageRgba16(img.to_rgba16())
        }
        ImageType::Png | ImageType::Tiff => DynamicImage::ImageRgb16(img.to_rgb16()),
    };
    Cow::Owned(converted)
}

/// Re-embed the decoded ICC profile unless metadata is being stripped.
fn attach_icc_profile(encoder: &mut impl ImageEncoder, image: &ImageRef, strip: bool) {
    if strip {
        return;
    }
    if let Some(icc) = image.icc_profile() {
        if let Err(e) = encoder.set_icc_profile(icc.to_vec()) {
            log::debug!("ICC profile not embedded: {e}");
        }
    }
}

fn save_jpeg(image: &ImageRef, params: &SaveParams, out: &mut Vec<u8>) -> Result<(), BackendError> {
    if params.interlace {
        log::debug!("progressive JPEG unavailable; writing baseline");
    }
    let mut encoder = JpegEncoder::new_with_quality(out, params.quality.value() as u8);
    attach_icc_profile(&mut encoder, image, params.strip);
    encodable(image.image(), ImageType::Jpeg)
        .write_with_encoder(encoder)
        .map_err(encode_error(ImageType::Jpeg))
}

fn save_png(image: &ImageRef, params: &SaveParams, out: &mut Vec<u8>) -> Result<(), BackendError> {
    if params.interlace {
        log::debug!("interlaced PNG unavailable; writing non-interlaced");
    }
    let mut encoder =
        PngEncoder::new_with_quality(out, png_compression(params.compression), PngFilter::NoFilter);
    attach_icc_profile(&mut encoder, image, params.strip);
    encodable(image.image(), ImageType::Png)
        .write_with_encoder(encoder)
        .map_err(encode_error(ImageType::Png))
}

fn save_webp(image: &ImageRef, params: &SaveParams, out: &mut Vec<u8>) -> Result<(), BackendError> {
    if !params.lossless {
        log::debug!(
            "lossy WebP (Q={}) unavailable; encoding losslessly",
            params.quality.value()
        );
    }
    let mut encoder = WebPEncoder::new_lossless(out);
    attach_icc_profile(&mut encoder, image, params.strip);
    encodable(image.image(), ImageType::Webp)
        .write_with_encoder(encoder)
        .map_err(encode_error(ImageType::Webp))
}

fn save_tiff(image: &ImageRef, out: &mut Vec<u8>) -> Result<(), BackendError> {
    let encoder = TiffEncoder::new(Cursor::new(out));
    encodable(image.image(), ImageType::Tiff)
        .write_with_encoder(encoder)
        .map_err(encode_error(ImageType::Tiff))
}

/// Copy `src` onto a `width x height` canvas at the gravity offset.
///
/// Pixels outside the source come from the extend mode: mapped back into the
/// source for copy/repeat/mirror, `fill` otherwise.
fn embed<P: Pixel>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    params: &GravityParams,
    fill: P,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let (ox, oy) = gravity_offset(
        params.direction,
        (params.width, params.height),
        src.dimensions(),
    );
    ImageBuffer::from_fn(params.width, params.height, |x, y| {
        let sx = source_coordinate(x as i64 - ox, src.width(), params.extend);
        let sy = source_coordinate(y as i64 - oy, src.height(), params.extend);
        match (sx, sy) {
            (Some(sx), Some(sy)) => *src.get_pixel(sx, sy),
            _ => fill,
        }
    })
}

/// Fill colour as normalised `[r, g, b, a]` levels in `0.0..=1.0`.
fn fill_levels(params: &GravityParams) -> [f64; 4] {
    match params.extend {
        Extend::White => [1.0, 1.0, 1.0, 1.0],
        Extend::Background => {
            let bg = params.background;
            let level = |v: f64| (v / 255.0).clamp(0.0, 1.0);
            [level(bg.red), level(bg.green), level(bg.blue), 1.0]
        }
        Extend::Black | Extend::Copy | Extend::Repeat | Extend::Mirror => [0.0; 4],
    }
}

fn gravity_image(img: &DynamicImage, params: &GravityParams) -> DynamicImage {
    let [r, g, b, a] = fill_levels(params);
    let l = 0.299 * r + 0.587 * g + 0.114 * b;
    let q8 = |v: f64| (v * 255.0).round() as u8;
    let q16 = |v: f64| (v * 65535.0).round() as u16;
    let qf = |v: f64| v as f32;

    match img {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(embed(buf, params, Luma([q8(l)]))),
        DynamicImage::ImageLumaA8(buf) => {
            DynamicImage::ImageLumaA8(embed(buf, params, LumaA([q8(l), q8(a)])))
        }
        DynamicImage::ImageRgb8(buf) => {
            DynamicImage::ImageRgb8(embed(buf, params, Rgb([q8(r), q8(g), q8(b)])))
        }
        DynamicImage::ImageRgba8(buf) => {
            DynamicImage::ImageRgba8(embed(buf, params, Rgba([q8(r), q8(g), q8(b), q8(a)])))
        }
        DynamicImage::ImageLuma16(buf) => {
            DynamicImage::ImageLuma16(embed(buf, params, Luma([q16(l)])))
        }
        DynamicImage::ImageLumaA16(buf) => {
            DynamicImage::ImageLumaA16(embed(buf, params, LumaA([q16(l), q16(a)])))
        }
        DynamicImage::ImageRgb16(buf) => {
            DynamicImage::ImageRgb16(embed(buf, params, Rgb([q16(r), q16(g), q16(b)])))
        }
        DynamicImage::ImageRgba16(buf) => DynamicImage::ImageRgba16(embed(
            buf,
            params,
            Rgba([q16(r), q16(g), q16(b), q16(a)]),
        )),
        DynamicImage::ImageRgb32F(buf) => {
            DynamicImage::ImageRgb32F(embed(buf, params, Rgb([qf(r), qf(g), qf(b)])))
        }
        DynamicImage::ImageRgba32F(buf) => DynamicImage::ImageRgba32F(embed(
            buf,
            params,
            Rgba([qf(r), qf(g), qf(b), qf(a)]),
        )),
        other => DynamicImage::ImageRgba8(embed(
            &other.to_rgba8(),
            params,
            Rgba([q8(r), q8(g), q8(b), q8(a)]),
        )),
    }
}

impl ImageBackend for RustBackend {
    fn limits(&self) -> &Limits {
        &self.limits
    }

    fn load(&self, params: &LoadParams<'_>) -> Result<ImageRef, BackendError> {
        let format = params
            .format
            .image_format()
            .ok_or(BackendError::UnsupportedImageFormat)?;

        let mut reader = ImageReader::with_format(Cursor::new(params.buf), format);
        reader.limits(self.limits.clone());
        let mut decoder = reader.into_decoder().map_err(decode_error)?;
        let icc_profile = decoder.icc_profile().unwrap_or_else(|e| {
            log::debug!("ignoring unreadable ICC profile: {e}");
            None
        });
        let mut image = DynamicImage::from_decoder(decoder).map_err(decode_error)?;

        if let Some(shrink) = params.shrink.filter(|&s| s > 1) {
            let (width, height) = shrink_dimensions((image.width(), image.height()), shrink);
            image = image.resize_exact(width, height, FilterType::Triangle);
        }

        Ok(ImageRef::new(image, params.format).with_icc_profile(icc_profile))
    }

    fn save(&self, image: &ImageRef, params: &SaveParams) -> Result<Vec<u8>, BackendError> {
        let mut out = Vec::new();
        match params.format {
            ImageType::Jpeg => save_jpeg(image, params, &mut out)?,
            ImageType::Png => save_png(image, params, &mut out)?,
            ImageType::Webp => save_webp(image, params, &mut out)?,
            ImageType::Tiff => save_tiff(image, &mut out)?,
            ImageType::Unknown => {
                return Err(BackendError::UnsupportedSaveFormat(
                    ImageType::Unknown.nick().to_string(),
                ));
            }
        }
        Ok(out)
    }

    fn resize(&self, image: &ImageRef, params: &ResizeParams) -> Result<ImageRef, BackendError> {
        let resized =
            image
                .image()
                .resize_exact(params.width, params.height, filter_for(params.kernel));
        Ok(image.derive(resized))
    }

    fn extract_area(&self, image: &ImageRef, area: &Area) -> Result<ImageRef, BackendError> {
        let cropped = image
            .image()
            .crop_imm(area.left, area.top, area.width, area.height);
        Ok(image.derive(cropped))
    }

    fn gravity(&self, image: &ImageRef, params: &GravityParams) -> Result<ImageRef, BackendError> {
        Ok(image.derive(gravity_image(image.image(), params)))
    }
}
