//! Sobel gradient magnitude and orientation over greyscale images.
//!
//! Only interior pixels are evaluated, so the 3x3 neighbourhood never leaves the
//! image. The outermost row and column on every side keep zero magnitude and an
//! unset (NaN) orientation.
//!
//! Magnitudes are kept as `f32`. Whenever they become bytes (the suppressed edge map
//! and [`GradientField::to_grey`]) they are scaled so that [`MAX_MAGNITUDE`] maps to
//! 255, which keeps strong responses apart instead of saturating them.

use std::f32::consts::{PI, SQRT_2, TAU};

use crate::error::{Error, Result};
use crate::grey::GreyscaleImage;

/// Upper bound on the Sobel magnitude of an 8-bit image, from `|dx|, |dy| <= 4 · 255`.
pub const MAX_MAGNITUDE: f32 = 4.0 * 255.0 * SQRT_2;

/// Per-pixel gradient magnitude and orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientField {
    width: u32,
    height: u32,
    magnitude: Vec<f32>,
    orientation: Vec<f32>,
}

impl GradientField {
    /// Wraps precomputed arrays.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] unless both arrays hold `width * height` values.
    pub fn from_parts(
        width: u32,
        height: u32,
        magnitude: Vec<f32>,
        orientation: Vec<f32>,
    ) -> Result<Self> {
        let required = width as usize * height as usize;
        if magnitude.len() != required {
            return Err(Error::out_of_bounds("magnitude array", required, magnitude.len()));
        }
        if orientation.len() != required {
            return Err(Error::out_of_bounds("orientation array", required, orientation.len()));
        }
        Ok(GradientField {
            width,
            height,
            magnitude,
            orientation,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Magnitudes, row-major.
    pub fn magnitude(&self) -> &[f32] {
        &self.magnitude
    }

    /// Orientations in radians within `[0, 2π)`, NaN on the border.
    pub fn orientation(&self) -> &[f32] {
        &self.orientation
    }

    pub fn magnitude_at(&self, x: u32, y: u32) -> f32 {
        self.magnitude[self.index(x, y)]
    }

    /// Orientation at `(x, y)`, `None` on the border.
    pub fn orientation_at(&self, x: u32, y: u32) -> Option<f32> {
        let theta = self.orientation[self.index(x, y)];
        (!theta.is_nan()).then_some(theta)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "({x}, {y}) outside {}x{}", self.width, self.height);
        y as usize * self.width as usize + x as usize
    }

    /// Magnitudes scaled into a byte image (a plain Sobel edge image), with
    /// [`MAX_MAGNITUDE`] at 255.
    pub fn to_grey(&self) -> GreyscaleImage {
        GreyscaleImage::from_fn(self.width, self.height, |x, y| {
            magnitude_to_byte(self.magnitude_at(x, y))
        })
    }
}

/// Scales a magnitude to `0..=255`, rounding half away from zero.
#[inline]
pub(crate) fn magnitude_to_byte(magnitude: f32) -> u8 {
    (magnitude * (255.0 / MAX_MAGNITUDE)).round().clamp(0.0, 255.0) as u8
}

/// The 3x3 neighbourhood around `(x, y)` in row-major order, `n[4]` at the centre.
///
/// Callers guarantee `1 <= x < width - 1` and `1 <= y < height - 1`.
#[inline]
pub(crate) fn neighbourhood<T: Copy>(values: &[T], width: usize, x: usize, y: usize) -> [T; 9] {
    let above = &values[(y - 1) * width + x - 1..(y - 1) * width + x + 2];
    let row = &values[y * width + x - 1..y * width + x + 2];
    let below = &values[(y + 1) * width + x - 1..(y + 1) * width + x + 2];
    [
        above[0], above[1], above[2], row[0], row[1], row[2], below[0], below[1], below[2],
    ]
}

/// Sobel response `(dx, dy)` for a neighbourhood.
#[inline]
fn sobel(n: &[u8; 9]) -> (i32, i32) {
    let n = n.map(i32::from);
    let dx = n[2] + 2 * n[5] + n[8] - n[0] - 2 * n[3] - n[6];
    let dy = n[6] + 2 * n[7] + n[8] - n[0] - 2 * n[1] - n[2];
    (dx, dy)
}

/// Computes gradient magnitude `sqrt(dx² + dy²)` and orientation `atan2(dy, dx) + π`
/// (folded into `[0, 2π)`) for every interior pixel.
///
/// ```text
/// dx = n2 + 2·n5 + n8 − n0 − 2·n3 − n6
/// dy = n6 + 2·n7 + n8 − n0 − 2·n1 − n2
/// ```
///
/// Images narrower or shorter than three pixels have no interior and yield an
/// all-zero field.
///
/// # Arguments
///
/// * `image` - Greyscale input, usually blurred first
///
/// # Returns
///
/// A [`GradientField`] of the same size. Border pixels have magnitude 0 and no
/// orientation.
///
/// # Examples
///
/// ```
/// use raster_canny::{gradient, GreyscaleImage};
///
/// let step = GreyscaleImage::from_fn(5, 5, |x, _| if x < 2 { 0 } else { 255 });
/// let field = gradient(&step);
/// assert_eq!(field.magnitude_at(2, 2), 1020.0);
/// assert_eq!(field.magnitude_at(3, 2), 0.0);
/// assert_eq!(field.orientation_at(0, 0), None);
/// ```
pub fn gradient(image: &GreyscaleImage) -> GradientField {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let mut magnitude = vec![0.0f32; width * height];
    let mut orientation = vec![f32::NAN; width * height];

    if width >= 3 && height >= 3 {
        let pixels = image.as_bytes();
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let (dx, dy) = sobel(&neighbourhood(pixels, width, x, y));
                let (dx, dy) = (dx as f32, dy as f32);
                let index = y * width + x;
                magnitude[index] = dx.hypot(dy);
                orientation[index] = (dy.atan2(dx) + PI).rem_euclid(TAU);
            }
        }
    }

    debug!("gradient {}x{} done", width, height);
    GradientField {
        width: image.width(),
        height: image.height(),
        magnitude,
        orientation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_image_has_zero_magnitude() {
        let image = GreyscaleImage::from_fn(6, 5, |_, _| 137);
        let field = gradient(&image);
        assert!(field.magnitude().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn border_is_zero_and_unset() {
        let image = GreyscaleImage::from_fn(4, 4, |x, y| ((x * 60) ^ (y * 35)) as u8);
        let field = gradient(&image);
        for y in 0..4 {
            for x in 0..4 {
                let border = x == 0 || y == 0 || x == 3 || y == 3;
                if border {
                    assert_eq!(field.magnitude_at(x, y), 0.0);
                    assert_eq!(field.orientation_at(x, y), None);
                } else {
                    assert!(field.orientation_at(x, y).is_some());
                }
            }
        }
    }

    #[test]
    fn orientation_follows_atan2_plus_pi() {
        // Bright on the right: dx > 0, dy = 0 -> atan2 = 0 -> π.
        let right = GreyscaleImage::from_fn(3, 3, |x, _| if x == 2 { 100 } else { 0 });
        let theta = gradient(&right).orientation_at(1, 1).unwrap();
        assert!((theta - PI).abs() < 1e-6);

        // Bright below: dy > 0, dx = 0 -> π/2 + π.
        let below = GreyscaleImage::from_fn(3, 3, |_, y| if y == 2 { 100 } else { 0 });
        let theta = gradient(&below).orientation_at(1, 1).unwrap();
        assert!((theta - 1.5 * PI).abs() < 1e-6);

        // Bright on the left: atan2(0, -400) = π, folds from 2π to 0.
        let left = GreyscaleImage::from_fn(3, 3, |x, _| if x == 0 { 100 } else { 0 });
        let field = gradient(&left);
        assert_eq!(field.magnitude_at(1, 1), 400.0);
        assert_eq!(field.orientation_at(1, 1), Some(0.0));
    }

    #[test]
    fn magnitude_image_is_scaled_not_saturated() {
        // dx = 1020, dy = 0 -> 1020 / (1020·√2) · 255 = 180.3
        let image = GreyscaleImage::from_fn(3, 3, |x, _| if x == 2 { 255 } else { 0 });
        let sobel = gradient(&image).to_grey();
        assert_eq!(sobel.get(1, 1), 180);
        assert_eq!(sobel.get(0, 0), 0);

        // Bright right column and bottom row, dark south-west corner:
        // dx = 1020, dy = 765, magnitude 1275 -> 225.4
        let corner = GreyscaleImage::from_fn(3, 3, |x, y| {
            if (x == 2 || y == 2) && (x, y) != (0, 2) {
                255
            } else {
                0
            }
        });
        let field = gradient(&corner);
        assert!((field.magnitude_at(1, 1) - 1275.0).abs() < 1e-3);
        assert_eq!(field.to_grey().get(1, 1), 225);
        assert_eq!(magnitude_to_byte(MAX_MAGNITUDE), 255);

        // Two steps that both used to clip at 255 stay distinguishable.
        assert!(magnitude_to_byte(400.0) < magnitude_to_byte(800.0));
        assert_eq!(magnitude_to_byte(0.0), 0);
    }

    #[test]
    fn tiny_images_have_no_interior() {
        for (w, h) in [(0, 0), (2, 5), (5, 2), (1, 1)] {
            let image = GreyscaleImage::from_fn(w, h, |x, y| ((x + y) * 40) as u8);
            let field = gradient(&image);
            assert_eq!(field.magnitude().len(), (w * h) as usize);
            assert!(field.magnitude().iter().all(|&m| m == 0.0));
        }
    }

    #[test]
    fn from_parts_checks_lengths() {
        assert!(GradientField::from_parts(2, 2, vec![0.0; 4], vec![0.0; 4]).is_ok());
        assert_eq!(
            GradientField::from_parts(2, 2, vec![0.0; 4], vec![0.0; 3]),
            Err(Error::out_of_bounds("orientation array", 4, 3))
        );
    }
}
