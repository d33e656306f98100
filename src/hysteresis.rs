//! Dual-threshold classification of a suppressed edge map.
//!
//! Pixels above `high` are strong edges, pixels below `low` are discarded, and the
//! weak pixels in between are kept when they touch a strong one.
//!
//! [`threshold`] looks exactly one hop away: a weak pixel is promoted only if one of
//! its eight immediate neighbours is itself above `high`. A chain of weak pixels
//! leading back to a strong pixel is not followed, so long faint edges break up
//! wherever they are more than one pixel from a strong response. This is the default
//! behaviour of the pipeline. [`threshold_connected`] does the full trace and is
//! available as [`HysteresisMode::Connected`].

use image::Luma;
use imageproc::definitions::{HasBlack, HasWhite};

use crate::gradient::neighbourhood;
use crate::grey::EdgeMap;

/// Median multiplier for the automatic low threshold.
pub const AUTO_LOW_RATIO: f32 = 0.67;
/// Median multiplier for the automatic high threshold.
pub const AUTO_HIGH_RATIO: f32 = 1.33;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub low: f32,
    pub high: f32,
}

impl Thresholds {
    pub const fn new(low: f32, high: f32) -> Self {
        Thresholds { low, high }
    }

    /// `low = ratio_low · median`, `high = ratio_high · median`, both clamped to 0..=255.
    pub fn from_median(median: f32, low_ratio: f32, high_ratio: f32) -> Self {
        Thresholds {
            low: (low_ratio * median).clamp(0.0, 255.0),
            high: (high_ratio * median).clamp(0.0, 255.0),
        }
    }

    /// Thresholds at 0.67 and 1.33 times the median non-zero strength of `edge_map`.
    pub fn auto(edge_map: &EdgeMap) -> Self {
        Thresholds::from_median(median_nonzero(edge_map), AUTO_LOW_RATIO, AUTO_HIGH_RATIO)
    }
}

/// Median of the non-zero values of `edge_map`; the mean of the two middle values
/// for an even count, 0 when every pixel is zero.
pub fn median_nonzero(edge_map: &EdgeMap) -> f32 {
    let mut histogram = [0usize; 256];
    for &value in edge_map.as_bytes() {
        histogram[usize::from(value)] += 1;
    }
    histogram[0] = 0;
    let count: usize = histogram.iter().sum();
    if count == 0 {
        return 0.0;
    }

    let nth = |n: usize| -> f32 {
        let mut seen = 0;
        for (value, &hits) in histogram.iter().enumerate() {
            seen += hits;
            if seen > n {
                return value as f32;
            }
        }
        255.0
    };

    if count % 2 == 1 {
        nth(count / 2)
    } else {
        (nth(count / 2 - 1) + nth(count / 2)) / 2.0
    }
}

/// How weak pixels are connected to strong ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HysteresisMode {
    /// Promote weak pixels with a strong immediate neighbour. See [`threshold`].
    #[default]
    SingleHop,
    /// Promote every weak pixel connected to a strong one through weak pixels.
    Connected,
}

impl HysteresisMode {
    /// Classifies `edge_map` with [`threshold`] or [`threshold_connected`].
    pub fn apply(self, edge_map: &EdgeMap, thresholds: Thresholds) -> EdgeMap {
        match self {
            HysteresisMode::SingleHop => threshold(edge_map, thresholds.low, thresholds.high),
            HysteresisMode::Connected => {
                threshold_connected(edge_map, thresholds.low, thresholds.high)
            }
        }
    }
}

/// Single-hop hysteresis over the interior of `edge_map`, producing 0 / 255.
///
/// - `m < low`: discarded
/// - `m > high`: edge
/// - otherwise: edge only if one of the 8 neighbours is `> high`
///
/// # Arguments
///
/// * `edge_map` - Suppressed gradient strengths, one byte per pixel
/// * `low` - Strengths below this are never edges
/// * `high` - Strengths above this are always edges
///
/// # Returns
///
/// An edge map of the same size holding 255 for edges and 0 elsewhere. The outermost
/// rows and columns are always 0.
///
/// # Examples
///
/// ```
/// use raster_canny::{threshold, GreyscaleImage};
///
/// // A strong pixel with a weak neighbour, and a weak pixel on its own.
/// let edge_map = GreyscaleImage::from_fn(7, 5, |x, y| match (x, y) {
///     (2, 2) => 200,
///     (3, 2) | (5, 2) => 100,
///     _ => 0,
/// });
/// let edges = threshold(&edge_map, 50.0, 150.0);
/// assert_eq!(edges.get(2, 2), 255);
/// assert_eq!(edges.get(3, 2), 255);
/// assert_eq!(edges.get(5, 2), 0);
/// ```
pub fn threshold(edge_map: &EdgeMap, low: f32, high: f32) -> EdgeMap {
    let edge = Luma::<u8>::white()[0];
    let (width, height) = (edge_map.width() as usize, edge_map.height() as usize);
    let mut out = EdgeMap::zeroed(edge_map.width(), edge_map.height());
    if width < 3 || height < 3 {
        return out;
    }

    let input = edge_map.as_bytes();
    let pixels = out.as_bytes_mut();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let n = neighbourhood(input, width, x, y);
            let magnitude = f32::from(n[4]);
            if magnitude < low {
                continue;
            }
            let strong_neighbour = n
                .iter()
                .enumerate()
                .any(|(i, &v)| i != 4 && f32::from(v) > high);
            if magnitude > high || strong_neighbour {
                pixels[y * width + x] = edge;
            }
        }
    }
    debug!(
        "hysteresis low {} high {} kept {} pixels",
        low,
        high,
        pixels.iter().filter(|&&v| v == edge).count()
    );
    out
}

/// Full hysteresis: every interior pixel `>= low` reachable from a pixel `> high`
/// through 8-connected pixels `>= low` becomes 255.
///
/// Tracing uses an explicit stack, so long edges cannot overflow the call stack.
pub fn threshold_connected(edge_map: &EdgeMap, low: f32, high: f32) -> EdgeMap {
    let edge = Luma::<u8>::white()[0];
    let background = Luma::<u8>::black()[0];
    let (width, height) = (edge_map.width() as usize, edge_map.height() as usize);
    let mut out = EdgeMap::zeroed(edge_map.width(), edge_map.height());
    if width < 3 || height < 3 {
        return out;
    }

    let input = edge_map.as_bytes();
    let pixels = out.as_bytes_mut();
    let mut stack = Vec::with_capacity(width * height / 8);
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let index = y * width + x;
            if f32::from(input[index]) <= high || pixels[index] != background {
                continue;
            }
            pixels[index] = edge;
            stack.push((x, y));

            while let Some((cx, cy)) = stack.pop() {
                for ny in cy - 1..=cy + 1 {
                    for nx in cx - 1..=cx + 1 {
                        if nx == 0 || ny == 0 || nx >= width - 1 || ny >= height - 1 {
                            continue;
                        }
                        let neighbour = ny * width + nx;
                        if pixels[neighbour] == background && f32::from(input[neighbour]) >= low {
                            pixels[neighbour] = edge;
                            stack.push((nx, ny));
                        }
                    }
                }
            }
        }
    }
    out
}
