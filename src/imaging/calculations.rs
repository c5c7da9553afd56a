//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::types::{CompassDirection, Extend};

/// Upper bound for resize factors. Larger requests are clamped.
pub const MAX_SCALE_FACTOR: f64 = 10.0;

/// Shrink-on-load factors the JPEG loader accepts.
pub const JPEG_SHRINK_FACTORS: [u32; 4] = [1, 2, 4, 8];

/// Clamp a scale factor to [`MAX_SCALE_FACTOR`].
pub fn clamp_scale(scale: f64) -> f64 {
    scale.min(MAX_SCALE_FACTOR)
}

/// Output dimensions for a resize.
///
/// Each edge is rounded to the nearest pixel and never drops below 1.
///
/// # Examples
/// ```
/// # use pixbridge::imaging::calculations::resize_dimensions;
/// assert_eq!(resize_dimensions((400, 300), 0.5, 0.5), (200, 150));
/// assert_eq!(resize_dimensions((3, 3), 0.1, 0.1), (1, 1));
/// ```
pub fn resize_dimensions(source: (u32, u32), hscale: f64, vscale: f64) -> (u32, u32) {
    let (w, h) = source;
    let scaled = |edge: u32, factor: f64| ((edge as f64 * factor).round() as u32).max(1);
    (scaled(w, hscale), scaled(h, vscale))
}

/// Dimensions after JPEG shrink-on-load: `ceil(edge / shrink)`.
pub fn shrink_dimensions(source: (u32, u32), shrink: u32) -> (u32, u32) {
    let (w, h) = source;
    (w.div_ceil(shrink), h.div_ceil(shrink))
}

/// Whether `(left, top, width, height)` lies fully inside an image of `size`.
pub fn area_fits(size: (u32, u32), left: i64, top: i64, width: i64, height: i64) -> bool {
    let (w, h) = (size.0 as i64, size.1 as i64);
    left >= 0 && top >= 0 && width > 0 && height > 0 && left + width <= w && top + height <= h
}

/// Position of the image's top-left corner on the canvas.
///
/// Offsets may be negative when the canvas is smaller than the image; the
/// overhang is cropped. Centred placement halves the difference with
/// truncating division, so odd differences round toward zero.
///
/// # Examples
/// ```
/// # use pixbridge::imaging::calculations::gravity_offset;
/// # use pixbridge::types::CompassDirection;
/// assert_eq!(gravity_offset(CompassDirection::Centre, (300, 200), (100, 100)), (100, 50));
/// assert_eq!(gravity_offset(CompassDirection::SouthEast, (300, 200), (100, 100)), (200, 100));
/// ```
pub fn gravity_offset(
    direction: CompassDirection,
    canvas: (u32, u32),
    image: (u32, u32),
) -> (i64, i64) {
    let dx = canvas.0 as i64 - image.0 as i64;
    let dy = canvas.1 as i64 - image.1 as i64;
    let centre_x = dx / 2;
    let centre_y = dy / 2;

    match direction {
        CompassDirection::Centre => (centre_x, centre_y),
        CompassDirection::North => (centre_x, 0),
        CompassDirection::South => (centre_x, dy),
        CompassDirection::East => (dx, centre_y),
        CompassDirection::West => (0, centre_y),
        CompassDirection::NorthEast => (dx, 0),
        CompassDirection::SouthEast => (dx, dy),
        CompassDirection::SouthWest => (0, dy),
        CompassDirection::NorthWest => (0, 0),
    }
}

/// Map a coordinate relative to the source image back into `0..len`.
///
/// Returns `None` when the pixel must be filled with a constant
/// (`Black`, `White`, `Background` outside the image).
pub fn source_coordinate(pos: i64, len: u32, extend: Extend) -> Option<u32> {
    let len = len as i64;
    if (0..len).contains(&pos) {
        return Some(pos as u32);
    }
    match extend {
        Extend::Black | Extend::White | Extend::Background => None,
        Extend::Copy => Some(pos.clamp(0, len - 1) as u32),
        Extend::Repeat => Some(pos.rem_euclid(len) as u32),
        Extend::Mirror => {
            let m = pos.rem_euclid(2 * len);
            Some(if m < len { m } else { 2 * len - 1 - m } as u32)
        }
    }
}
