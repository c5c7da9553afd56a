//! Drives the library through its exported C functions, the way a host would.

mod common;

use common::{decode, encode, gradient, translucent};
use image::{GenericImageView, ImageFormat};
use pixbridge::ffi::PixStatus;
use pixbridge::ffi::error::{pixbridge_error_buffer, pixbridge_error_clear};
use pixbridge::ffi::image::*;
use pixbridge::ffi::operation::*;
use std::ffi::{CStr, c_char, c_int};
use std::ptr;

fn last_error() -> String {
    let len = unsafe { pixbridge_error_buffer(ptr::null_mut(), 0) };
    let mut buf = vec![0 as c_char; len + 1];
    unsafe { pixbridge_error_buffer(buf.as_mut_ptr(), buf.len()) };
    unsafe { CStr::from_ptr(buf.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

fn load(buf: &[u8]) -> *mut PixImage {
    let image_type = unsafe { determine_image_type(buf.as_ptr().cast(), buf.len()) };
    let mut out = ptr::null_mut();
    let code = unsafe { init_image(buf.as_ptr().cast(), buf.len(), image_type, &mut out) };
    assert_eq!(code, 0, "init_image: {}", last_error());
    out
}

fn take_buffer(buf: *mut u8, len: usize) -> Vec<u8> {
    let bytes = unsafe { std::slice::from_raw_parts(buf, len) }.to_vec();
    unsafe { pixbridge_free_buffer(buf, len) };
    bytes
}

fn save_png(image: *const PixImage) -> Vec<u8> {
    let mut buf = ptr::null_mut();
    let mut len = 0;
    let code = unsafe { save_png_buffer(image, &mut buf, &mut len, 0, 6, 0, 0) };
    assert_eq!(code, 0, "save_png_buffer: {}", last_error());
    take_buffer(buf, len)
}

#[test]
fn decode_resize_pad_encode() {
    let jpeg = encode(&gradient(120, 80), ImageFormat::Jpeg);
    let image = load(&jpeg);

    unsafe {
        assert_eq!(image_format(image), 1);
        assert_eq!((image_width(image), image_height(image)), (120, 80));

        let mut small = ptr::null_mut();
        assert_eq!(resize_image(image, &mut small, 0.25, 0.0, 4), 0);
        assert_eq!((image_width(small), image_height(small)), (30, 20));

        let mut padded = ptr::null_mut();
        // centre, background extend, pure red
        assert_eq!(
            gravity_image(small, &mut padded, 0, 40, 40, 5, 255.0, 0.0, 0.0),
            0
        );

        let png = save_png(padded);
        let decoded = decode(&png).to_rgb8();
        assert_eq!(decoded.dimensions(), (40, 40));
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(decoded.get_pixel(39, 39).0, [255, 0, 0]);

        for handle in [image, small, padded] {
            image_unref(handle);
        }
    }
}

#[test]
fn extract_area_keeps_pixels() {
    let source = gradient(50, 50);
    let image = load(&encode(&source, ImageFormat::Png));

    unsafe {
        let mut crop = ptr::null_mut();
        assert_eq!(extract_image_area(image, &mut crop, 10, 20, 5, 5), 0);
        let decoded = decode(&save_png(crop));
        assert_eq!(decoded.dimensions(), (5, 5));
        assert_eq!(decoded.get_pixel(0, 0), source.get_pixel(10, 20));
        assert_eq!(decoded.get_pixel(4, 4), source.get_pixel(14, 24));
        image_unref(crop);
        image_unref(image);
    }
}

#[test]
fn alpha_is_reported_and_preserved() {
    let image = load(&encode(&translucent(8, 8), ImageFormat::Png));
    unsafe {
        assert_eq!(has_alpha_channel(image), 1);
        let decoded = decode(&save_png(image));
        assert_eq!(decoded.get_pixel(3, 3).0, [10, 20, 30, 128]);
        image_unref(image);
    }
}

#[test]
fn every_save_function_produces_its_format() {
    let image = load(&encode(&gradient(16, 16), ImageFormat::Png));
    let mut buf = ptr::null_mut();
    let mut len = 0;
    unsafe {
        assert_eq!(save_jpeg_buffer(image, &mut buf, &mut len, 1, 75, 1), 0);
        let jpeg = take_buffer(buf, len);
        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);

        assert_eq!(save_webp_buffer(image, &mut buf, &mut len, 1, 0, 1), 0);
        let webp = take_buffer(buf, len);
        assert_eq!(image::guess_format(&webp).unwrap(), ImageFormat::WebP);
        // lossless round trip
        assert_eq!(decode(&webp).to_rgb8(), gradient(16, 16).to_rgb8());

        assert_eq!(save_tiff_buffer(image, &mut buf, &mut len), 0);
        let tiff = take_buffer(buf, len);
        assert_eq!(decode(&tiff).dimensions(), (16, 16));

        image_unref(image);
    }
}

#[test]
fn failures_set_status_and_message() {
    let mut jpeg = encode(&gradient(64, 64), ImageFormat::Jpeg);
    jpeg.truncate(40);

    let mut out = ptr::null_mut();
    let code = unsafe { init_image(jpeg.as_ptr().cast(), jpeg.len(), 1, &mut out) };
    assert_eq!(code, PixStatus::DecodeFailed as c_int);
    assert!(out.is_null());
    assert!(!last_error().is_empty());

    pixbridge_error_clear();
    assert_eq!(last_error(), "");

    let garbage = [0u8; 32];
    let image_type = unsafe { determine_image_type(garbage.as_ptr().cast(), garbage.len()) };
    assert_eq!(image_type, 0);
    let code = unsafe { init_image(garbage.as_ptr().cast(), garbage.len(), 0, &mut out) };
    assert_eq!(code, PixStatus::UnsupportedFormat as c_int);
}

#[test]
fn oversized_canvas_is_refused() {
    let image = load(&encode(&gradient(4, 4), ImageFormat::Png));
    unsafe {
        let mut out = ptr::null_mut();
        let code = gravity_image(image, &mut out, 0, 40000, 40000, 0, 0.0, 0.0, 0.0);
        assert_eq!(code, PixStatus::InvalidArgument as c_int);
        assert!(out.is_null());
        assert!(last_error().contains("exceeds the configured limits"));
        image_unref(image);
    }
}

#[test]
fn successful_call_clears_previous_error() {
    let image = load(&encode(&gradient(10, 10), ImageFormat::Png));
    unsafe {
        let mut out = ptr::null_mut();
        assert_ne!(extract_image_area(image, &mut out, 8, 8, 5, 5), 0);
        assert!(last_error().contains("bad extract area"));

        assert_eq!(extract_image_area(image, &mut out, 0, 0, 5, 5), 0);
        assert_eq!(last_error(), "");
        image_unref(out);
        image_unref(image);
    }
}

#[test]
fn operations_from_strings() {
    let image = load(&encode(&gradient(20, 20), ImageFormat::Png));
    let string = |s: &'static CStr| PixValue {
        kind: PixValueKind::String as c_int,
        int_value: 0,
        double_value: 0.0,
        string_value: s.as_ptr(),
    };
    let int = |i: i64| PixValue {
        kind: PixValueKind::Int as c_int,
        int_value: i,
        double_value: 0.0,
        string_value: ptr::null(),
    };

    unsafe {
        let gravity = operation_new(c"gravity".as_ptr());
        assert!(!gravity.is_null());
        gobject_set_property(gravity, c"direction".as_ptr(), &string(c"north-west"));
        gobject_set_property(gravity, c"extend".as_ptr(), &string(c"white"));
        gobject_set_property(gravity, c"width".as_ptr(), &int(30));
        gobject_set_property(gravity, c"height".as_ptr(), &int(25));
        // ignored with a warning
        gobject_set_property(gravity, c"extend".as_ptr(), &string(c"plaid"));
        gobject_set_property(gravity, c"opacity".as_ptr(), &int(1));

        let mut padded = ptr::null_mut();
        assert_eq!(operation_apply_image(gravity, image, &mut padded), 0);
        assert_eq!((image_width(padded), image_height(padded)), (30, 25));

        let save = operation_new(c"save".as_ptr());
        gobject_set_property(save, c"format".as_ptr(), &string(c"png"));
        let mut buf = ptr::null_mut();
        let mut len = 0;
        assert_eq!(operation_apply_buffer(save, padded, &mut buf, &mut len), 0);
        let decoded = decode(&take_buffer(buf, len)).to_rgb8();
        // north-west places the image at the origin; the rest is white
        assert_eq!(decoded.get_pixel(29, 24).0, [255, 255, 255]);
        assert_eq!(decoded.get_pixel(0, 0).0, gradient(1, 1).to_rgb8().get_pixel(0, 0).0);

        assert!(operation_new(c"rotate".as_ptr()).is_null());

        operation_free(gravity);
        operation_free(save);
        image_unref(padded);
        image_unref(image);
    }
}
