//! Non-maximum suppression of a gradient-magnitude field.
//!
//! Each interior pixel's orientation is snapped to the nearest of the nine labelled
//! directions 0°, 45°, …, 360° and the pixel survives only if its magnitude strictly
//! exceeds both neighbours on the matching axis. Degrees are used only for this
//! snapping; orientations are radians everywhere else.

use crate::error::{Error, Result};
use crate::gradient::{magnitude_to_byte, neighbourhood, GradientField};
use crate::grey::EdgeMap;

const DIRECTIONS: [u16; 9] = [0, 45, 90, 135, 180, 225, 270, 315, 360];

/// Neighbour pair a pixel is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    /// East (n5) and west (n3).
    Horizontal,
    /// North-east (n2) and south-west (n6).
    Rising,
    /// North (n1) and south (n7).
    Vertical,
    /// North-west (n0) and south-east (n8).
    Falling,
}

impl Axis {
    fn from_direction(degrees: u16) -> Self {
        match degrees % 180 {
            0 => Axis::Horizontal,
            45 => Axis::Rising,
            90 => Axis::Vertical,
            _ => Axis::Falling,
        }
    }

    /// Indices into a row-major 3x3 neighbourhood.
    fn neighbours(self) -> (usize, usize) {
        match self {
            Axis::Horizontal => (5, 3),
            Axis::Rising => (2, 6),
            Axis::Vertical => (1, 7),
            Axis::Falling => (0, 8),
        }
    }
}

/// Nearest labelled direction, in degrees, for an orientation in radians.
pub fn quantize_direction(orientation: f32) -> u16 {
    quantize_degrees(orientation.to_degrees())
}

/// Nearest labelled direction. On a tie the earlier label wins, so 22.5° snaps to 0°
/// and 67.5° to 45°.
fn quantize_degrees(degrees: f32) -> u16 {
    let mut best = DIRECTIONS[0];
    let mut best_diff = degrees.abs();
    for &direction in &DIRECTIONS[1..] {
        let diff = (degrees - f32::from(direction)).abs();
        if diff < best_diff {
            best = direction;
            best_diff = diff;
        }
    }
    best
}

/// Thins `magnitude` to its ridges along the quantized `orientation`.
///
/// # Arguments
///
/// * `magnitude` - Row-major gradient magnitudes, `width * height` values
/// * `orientation` - Row-major orientations in radians, `width * height` values
/// * `width`, `height` - Field dimensions
///
/// # Returns
///
/// An [`EdgeMap`] in which every interior pixel that strictly exceeds both
/// neighbours on its axis holds its magnitude scaled to a byte (see
/// [`MAX_MAGNITUDE`](crate::MAX_MAGNITUDE)). Everything else, including the border,
/// is 0. Survivors weaker than about 2.8 also round to 0.
///
/// # Examples
///
/// ```
/// use raster_canny::suppress;
/// use std::f32::consts::PI;
///
/// // A vertical ridge at x = 2; orientation π points along x.
/// let magnitude: Vec<f32> = (0..25).map(|i| if i % 5 == 2 { 800.0 } else { 200.0 }).collect();
/// let orientation = vec![PI; 25];
/// let ridge = suppress(&magnitude, &orientation, 5, 5).unwrap();
/// assert_eq!(ridge.get(2, 2), 141);
/// assert_eq!(ridge.get(1, 2), 0);
/// ```
///
/// # Errors
///
/// [`Error::OutOfBounds`] unless both arrays hold `width * height` values.
pub fn suppress(magnitude: &[f32], orientation: &[f32], width: u32, height: u32) -> Result<EdgeMap> {
    let required = width as usize * height as usize;
    if magnitude.len() != required {
        return Err(Error::out_of_bounds("magnitude array", required, magnitude.len()));
    }
    if orientation.len() != required {
        return Err(Error::out_of_bounds("orientation array", required, orientation.len()));
    }
    Ok(suppress_unchecked(magnitude, orientation, width, height))
}

/// [`suppress`] over a field produced by [`gradient`](crate::gradient::gradient).
pub fn suppress_field(field: &GradientField) -> EdgeMap {
    suppress_unchecked(field.magnitude(), field.orientation(), field.width(), field.height())
}

fn suppress_unchecked(magnitude: &[f32], orientation: &[f32], width: u32, height: u32) -> EdgeMap {
    let mut out = EdgeMap::zeroed(width, height);
    let (w, h) = (width as usize, height as usize);
    if w < 3 || h < 3 {
        return out;
    }

    let pixels = out.as_bytes_mut();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let index = y * w + x;
            let n = neighbourhood(magnitude, w, x, y);
            let (a, b) = Axis::from_direction(quantize_direction(orientation[index])).neighbours();
            if n[4] > n[a] && n[4] > n[b] {
                pixels[index] = magnitude_to_byte(n[4]);
            }
        }
    }
    debug!(
        "non-maximum suppression kept {} of {} interior pixels",
        pixels.iter().filter(|&&v| v != 0).count(),
        (w - 2) * (h - 2)
    );
    out
}
