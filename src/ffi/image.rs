//! Image handles and the decode / encode / process entry points.
//!
//! Handles are boxed [`ImageRef`]s. Every processing call writes a *new*
//! handle to `out` and leaves the input alive; the host releases each
//! handle with [`image_unref`]. Encoded buffers are released with
//! [`pixbridge_free_buffer`].

use super::error::{FfiError, guard};
use crate::imaging::{self, ExportParams, ImageRef};
use crate::runtime;
use crate::types::{CompassDirection, Extend, ImageType, Kernel};
use std::ffi::{c_int, c_void};
use std::slice;

/// Opaque image handle.
pub struct PixImage {
    inner: ImageRef,
}

pub(crate) fn into_handle(image: ImageRef) -> *mut PixImage {
    runtime::live_handles().acquire();
    Box::into_raw(Box::new(PixImage { inner: image }))
}

/// Borrow the image behind a handle.
///
/// # Safety
/// `image` must be null or a live handle from this library.
pub(crate) unsafe fn image_ref<'a>(image: *const PixImage) -> Result<&'a ImageRef, FfiError> {
    unsafe { image.as_ref() }
        .map(|handle| &handle.inner)
        .ok_or_else(|| FfiError::null("image"))
}

/// Borrow `len` bytes at `buf`.
///
/// # Safety
/// `buf` must be null or valid for reads of `len` bytes.
unsafe fn input<'a>(buf: *const c_void, len: usize) -> Result<&'a [u8], FfiError> {
    if buf.is_null() {
        return Err(FfiError::null("buffer"));
    }
    Ok(unsafe { slice::from_raw_parts(buf as *const u8, len) })
}

/// Write a new handle to `out`.
///
/// # Safety
/// `out` must be null or valid for writes.
unsafe fn store_image(out: *mut *mut PixImage, image: ImageRef) -> Result<(), FfiError> {
    if out.is_null() {
        return Err(FfiError::null("out"));
    }
    unsafe { *out = into_handle(image) };
    Ok(())
}

/// Hand an owned buffer to the host as `(ptr, len)`.
///
/// # Safety
/// `buf` and `len` must be null or valid for writes.
pub(crate) unsafe fn store_buffer(
    buf: *mut *mut u8,
    len: *mut usize,
    bytes: Vec<u8>,
) -> Result<(), FfiError> {
    if buf.is_null() || len.is_null() {
        return Err(FfiError::null("output buffer"));
    }
    let boxed = bytes.into_boxed_slice();
    let size = boxed.len();
    unsafe {
        *len = size;
        *buf = Box::into_raw(boxed) as *mut u8;
    }
    Ok(())
}

fn enum_arg<T: TryFrom<i32, Error = crate::types::UnknownVariant>>(
    value: c_int,
) -> Result<T, FfiError> {
    T::try_from(value).map_err(|e| FfiError::InvalidArgument(e.to_string()))
}

unsafe fn save(
    image: *const PixImage,
    buf: *mut *mut u8,
    len: *mut usize,
    params: ExportParams,
) -> Result<(), FfiError> {
    let image = unsafe { image_ref(image) }?;
    let config = runtime::config();
    let bytes = imaging::save_buffer(&runtime::backend(), image, &params, &config.export)?;
    unsafe { store_buffer(buf, len, bytes) }
}

/// Returns the format detected from the buffer's magic bytes.
///
/// # Safety
/// `buf` must be null or valid for reads of `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn determine_image_type(buf: *const c_void, len: usize) -> c_int {
    match unsafe { input(buf, len) } {
        Ok(bytes) => imaging::determine_image_type(bytes) as c_int,
        Err(_) => ImageType::Unknown as c_int,
    }
}

/// Decodes `buf` with the loader for `image_type`.
///
/// # Safety
/// `buf` must be valid for reads of `len` bytes and `out` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn init_image(
    buf: *const c_void,
    len: usize,
    image_type: c_int,
    out: *mut *mut PixImage,
) -> c_int {
    guard(|| {
        let bytes = unsafe { input(buf, len) }?;
        let image_type: ImageType = enum_arg(image_type)?;
        let image = imaging::init_image_as(&runtime::backend(), bytes, image_type)?;
        unsafe { store_image(out, image) }
    })
}

/// Decodes a JPEG, shrinking by `shrink` (2, 4 or 8) during load when positive.
///
/// # Safety
/// `buf` must be valid for reads of `len` bytes and `out` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn load_jpeg_buffer(
    buf: *const c_void,
    len: usize,
    out: *mut *mut PixImage,
    shrink: c_int,
) -> c_int {
    guard(|| {
        let bytes = unsafe { input(buf, len) }?;
        let image = imaging::load_jpeg_buffer(&runtime::backend(), bytes, shrink)?;
        unsafe { store_image(out, image) }
    })
}

/// Encodes as JPEG.
///
/// # Safety
/// `image` must be a live handle; `buf` and `len` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn save_jpeg_buffer(
    image: *const PixImage,
    buf: *mut *mut u8,
    len: *mut usize,
    strip: c_int,
    quality: c_int,
    interlace: c_int,
) -> c_int {
    guard(|| unsafe {
        save(
            image,
            buf,
            len,
            ExportParams {
                format: ImageType::Jpeg,
                quality: quality.max(0) as u32,
                interlaced: interlace != 0,
                strip_metadata: strip != 0,
                ..Default::default()
            },
        )
    })
}

/// Encodes as PNG. `quality` is accepted for signature compatibility and ignored.
///
/// # Safety
/// `image` must be a live handle; `buf` and `len` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn save_png_buffer(
    image: *const PixImage,
    buf: *mut *mut u8,
    len: *mut usize,
    strip: c_int,
    compression: c_int,
    quality: c_int,
    interlace: c_int,
) -> c_int {
    guard(|| unsafe {
        save(
            image,
            buf,
            len,
            ExportParams {
                format: ImageType::Png,
                quality: quality.max(0) as u32,
                compression: compression.max(0) as u32,
                interlaced: interlace != 0,
                strip_metadata: strip != 0,
                ..Default::default()
            },
        )
    })
}

/// Encodes as WebP.
///
/// # Safety
/// `image` must be a live handle; `buf` and `len` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn save_webp_buffer(
    image: *const PixImage,
    buf: *mut *mut u8,
    len: *mut usize,
    strip: c_int,
    quality: c_int,
    lossless: c_int,
) -> c_int {
    guard(|| unsafe {
        save(
            image,
            buf,
            len,
            ExportParams {
                format: ImageType::Webp,
                quality: quality.max(0) as u32,
                lossless: lossless != 0,
                strip_metadata: strip != 0,
                ..Default::default()
            },
        )
    })
}

/// Encodes as TIFF.
///
/// # Safety
/// `image` must be a live handle; `buf` and `len` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn save_tiff_buffer(
    image: *const PixImage,
    buf: *mut *mut u8,
    len: *mut usize,
) -> c_int {
    guard(|| unsafe {
        save(
            image,
            buf,
            len,
            ExportParams {
                format: ImageType::Tiff,
                ..Default::default()
            },
        )
    })
}

/// Resizes by `scale` (and `vscale` vertically when positive).
///
/// # Safety
/// `input` must be a live handle and `out` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn resize_image(
    input: *const PixImage,
    out: *mut *mut PixImage,
    scale: f64,
    vscale: f64,
    kernel: c_int,
) -> c_int {
    guard(|| {
        let image = unsafe { image_ref(input) }?;
        let kernel: Kernel = enum_arg(kernel)?;
        let resized = imaging::resize_image(&runtime::backend(), image, scale, vscale, kernel)?;
        unsafe { store_image(out, resized) }
    })
}

/// Crops to the given area.
///
/// # Safety
/// `input` must be a live handle and `out` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extract_image_area(
    input: *const PixImage,
    out: *mut *mut PixImage,
    left: c_int,
    top: c_int,
    width: c_int,
    height: c_int,
) -> c_int {
    guard(|| {
        let image = unsafe { image_ref(input) }?;
        let cropped = imaging::extract_image_area(
            &runtime::backend(),
            image,
            left.into(),
            top.into(),
            width.into(),
            height.into(),
        )?;
        unsafe { store_image(out, cropped) }
    })
}

/// Places the image on a `width x height` canvas.
///
/// # Safety
/// `input` must be a live handle and `out` valid for writes.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn gravity_image(
    input: *const PixImage,
    out: *mut *mut PixImage,
    direction: c_int,
    width: c_int,
    height: c_int,
    extend: c_int,
    r: f64,
    g: f64,
    b: f64,
) -> c_int {
    guard(|| {
        let image = unsafe { image_ref(input) }?;
        let direction: CompassDirection = enum_arg(direction)?;
        let extend: Extend = enum_arg(extend)?;
        let padded = imaging::gravity_image(
            &runtime::backend(),
            image,
            direction,
            width.into(),
            height.into(),
            extend,
            r,
            g,
            b,
        )?;
        unsafe { store_image(out, padded) }
    })
}

/// Returns 1 when the image has an alpha band, 0 otherwise (or for null).
///
/// # Safety
/// `image` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn has_alpha_channel(image: *const PixImage) -> c_int {
    match unsafe { image_ref(image) } {
        Ok(image) => imaging::has_alpha_channel(image) as c_int,
        Err(_) => 0,
    }
}

fn edge(pixels: u32) -> c_int {
    c_int::try_from(pixels).unwrap_or(c_int::MAX)
}

/// Width in pixels, 0 for null. Saturates at `INT_MAX`.
///
/// # Safety
/// `image` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_width(image: *const PixImage) -> c_int {
    unsafe { image_ref(image) }.map_or(0, |i| edge(i.width()))
}

/// Height in pixels, 0 for null. Saturates at `INT_MAX`.
///
/// # Safety
/// `image` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_height(image: *const PixImage) -> c_int {
    unsafe { image_ref(image) }.map_or(0, |i| edge(i.height()))
}

/// Format the image was decoded from.
///
/// # Safety
/// `image` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_format(image: *const PixImage) -> c_int {
    unsafe { image_ref(image) }.map_or(ImageType::Unknown as c_int, |i| i.format() as c_int)
}

/// Releases an image handle.
///
/// # Safety
/// `image` must be null or a live handle; it is invalid afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn image_unref(image: *mut PixImage) {
    if !image.is_null() {
        unsafe {
            drop(Box::from_raw(image));
        }
        runtime::live_handles().release();
    }
}

/// Releases a buffer returned by one of the save functions.
///
/// # Safety
/// `buf` and `len` must be exactly what a save function wrote.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pixbridge_free_buffer(buf: *mut u8, len: usize) {
    if !buf.is_null() {
        unsafe {
            drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(buf, len)));
        }
    }
}
