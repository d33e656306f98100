//! The Canny edge detector assembled from the individual stages.
//!
//! Stages run strictly in order, each one finishing before the next starts:
//!
//! 1. Greyscale reduction
//! 2. Optional blur (Gaussian by default); when enabled, the gradient is taken on the
//!    blurred image
//! 3. Sobel gradient
//! 4. Non-maximum suppression
//! 5. Threshold derivation from the median suppressed strength, unless fixed
//!    thresholds are configured
//! 6. Hysteresis
//!
//! An unsupported pixel format stops the pipeline before the first stage.

use crate::convolve::convolve_grey;
use crate::error::Result;
use crate::gradient::gradient;
use crate::grey::{grey_from_store, to_grey, EdgeMap, GreyscaleImage};
use crate::hysteresis::{median_nonzero, HysteresisMode, Thresholds, AUTO_HIGH_RATIO, AUTO_LOW_RATIO};
use crate::kernel::Kernel;
use crate::nms::suppress_field;
use crate::pixel::{PixelBuffer, PixelStore};

/// Configuration for [`canny`].
#[derive(Debug, Clone, PartialEq)]
pub struct CannyOptions {
    /// Kernel applied to the greyscale image before the gradient; `None` skips the blur.
    pub blur: Option<Kernel>,
    /// Median multiplier for the low threshold.
    pub low_ratio: f32,
    /// Median multiplier for the high threshold.
    pub high_ratio: f32,
    /// Fixed thresholds, bypassing the median derivation.
    pub thresholds: Option<Thresholds>,
    pub hysteresis: HysteresisMode,
}

impl Default for CannyOptions {
    fn default() -> Self {
        CannyOptions {
            blur: Some(Kernel::gaussian_blur()),
            low_ratio: AUTO_LOW_RATIO,
            high_ratio: AUTO_HIGH_RATIO,
            thresholds: None,
            hysteresis: HysteresisMode::SingleHop,
        }
    }
}

impl CannyOptions {
    /// Blurs with `kernel`, anchored on its centre, before the gradient.
    pub fn with_blur(mut self, kernel: Kernel) -> Self {
        self.blur = Some(kernel);
        self
    }

    /// Takes the gradient of the greyscale image directly.
    pub fn without_blur(mut self) -> Self {
        self.blur = None;
        self
    }

    /// Median multipliers for the derived thresholds. Ignored once fixed thresholds
    /// are set.
    pub fn with_ratios(mut self, low_ratio: f32, high_ratio: f32) -> Self {
        self.low_ratio = low_ratio;
        self.high_ratio = high_ratio;
        self
    }

    /// Uses `low` and `high` as given instead of deriving them from the median.
    pub fn with_thresholds(mut self, low: f32, high: f32) -> Self {
        self.thresholds = Some(Thresholds::new(low, high));
        self
    }

    /// Picks single-hop or fully connected hysteresis.
    pub fn with_hysteresis(mut self, mode: HysteresisMode) -> Self {
        self.hysteresis = mode;
        self
    }
}

/// Edge map together with what the pipeline derived on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct CannyReport {
    pub edges: EdgeMap,
    /// Median of the non-zero suppressed strengths.
    pub median: f32,
    pub thresholds: Thresholds,
    /// Pixels left non-zero by non-maximum suppression.
    pub ridge_pixels: usize,
    /// Pixels classified as edges.
    pub edge_pixels: usize,
}

/// Detects edges in a BGR / BGRA buffer. Edge pixels are 255, all others 0.
///
/// # Errors
///
/// [`Error::UnsupportedPixelFormat`](crate::Error::UnsupportedPixelFormat) for any
/// other layout; nothing is computed in that case.
///
/// ```
/// use raster_canny::{canny, CannyOptions, PixelBuffer, PixelFormat};
///
/// // A faint step around x = 4 and a strong one around x = 11.
/// let buffer = PixelBuffer::from_fn(16, 16, PixelFormat::Bgr24, |x, _| {
///     let v = match x {
///         0..=3 => 0,
///         4 => 5,
///         5..=10 => 10,
///         11 => 35,
///         _ => 60,
///     };
///     [v, v, v, 255]
/// })
/// .unwrap();
/// let edges = canny(&buffer, &CannyOptions::default().without_blur()).unwrap();
/// assert_eq!(edges.get(11, 8), 255);
/// assert_eq!(edges.get(4, 8), 0);
/// ```
pub fn canny(buffer: &PixelBuffer, options: &CannyOptions) -> Result<EdgeMap> {
    canny_with_report(buffer, options).map(|report| report.edges)
}

/// [`canny`] returning the derived thresholds and pixel counts as well.
pub fn canny_with_report(buffer: &PixelBuffer, options: &CannyOptions) -> Result<CannyReport> {
    let grey = to_grey(buffer)?;
    Ok(canny_grey(&grey, options))
}

/// Runs the pipeline over the whole of `store`. The store is locked read-only only
/// while the greyscale image is extracted.
pub fn canny_store<S: PixelStore + ?Sized>(store: &mut S, options: &CannyOptions) -> Result<EdgeMap> {
    let grey = grey_from_store(store)?;
    Ok(canny_grey(&grey, options).edges)
}

/// Runs every stage after greyscale reduction.
pub fn canny_grey(grey: &GreyscaleImage, options: &CannyOptions) -> CannyReport {
    debug!("canny on {}x{} greyscale image", grey.width(), grey.height());

    let blurred;
    let source = match &options.blur {
        Some(kernel) => {
            blurred = convolve_grey(grey, kernel, kernel.radius());
            debug!("blurred with {}x{} kernel", kernel.size(), kernel.size());
            &blurred
        }
        None => grey,
    };

    let field = gradient(source);
    let suppressed = suppress_field(&field);
    let ridge_pixels = suppressed.count_nonzero();

    let median = median_nonzero(&suppressed);
    let thresholds = options
        .thresholds
        .unwrap_or_else(|| Thresholds::from_median(median, options.low_ratio, options.high_ratio));
    debug!(
        "median {} -> thresholds low {} high {}",
        median, thresholds.low, thresholds.high
    );

    let edges = options.hysteresis.apply(&suppressed, thresholds);
    let edge_pixels = edges.count_nonzero();
    debug!("{} ridge pixels, {} edge pixels", ridge_pixels, edge_pixels);

    CannyReport {
        edges,
        median,
        thresholds,
        ridge_pixels,
        edge_pixels,
    }
}
