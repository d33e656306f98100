//! # Raster Filtering and Canny Edge Detection
//!
//! This crate filters raw 8-bit BGR / BGRA pixel buffers: square-kernel convolution,
//! greyscale reduction, Sobel gradients, non-maximum suppression and hysteresis, chained
//! together into a Canny edge detector with automatically derived thresholds.
//!
//! ## Features
//!
//! - Convolution with arbitrary odd-sized kernels and per-pixel normalization at the
//!   image border
//! - Built-in kernel catalog (Gaussian, mean and lens blur, Sobel X / Y)
//! - Greyscale reduction with the 0.11 / 0.59 / 0.30 luminance weights
//! - Sobel gradient magnitude and orientation
//! - Non-maximum suppression for edge thinning
//! - Hysteresis thresholding, single-hop or fully connected
//! - Scoped pixel locks over any [`PixelStore`]
//! - Edge visualization utilities
//! - Optional debug logging (enable with `logger` feature)
//! - Optional row-parallel convolution (enable with `rayon` feature)
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use image::open;
//! use raster_canny::{canny, visualize_edges, CannyOptions, PixelBuffer, to_grey};
//!
//! let rgb = open("example.png").unwrap().to_rgb8();
//! let buffer = PixelBuffer::from_rgb_image(&rgb);
//!
//! let edges = canny(&buffer, &CannyOptions::default()).unwrap();
//! println!("Found {} edge pixels", edges.count_nonzero());
//!
//! let grey = to_grey(&buffer).unwrap();
//! visualize_edges(&grey, &edges).unwrap().save("edges_output.png").unwrap();
//! ```
//!
//! ## Working on an Image Store
//!
//! Any type implementing [`PixelStore`] can be locked region by region. The lock is
//! released, and written pixels are copied back, when the guard is dropped or
//! [`PixelLock::release`]d.
//!
//! ```rust,no_run
//! use image::open;
//! use raster_canny::{apply_kernel, paint_grey, grey_from_store, Kernel, RasterImage};
//!
//! let mut raster = RasterImage::from_dynamic(&open("example.png").unwrap());
//! apply_kernel(&mut raster, &Kernel::gaussian_blur()).unwrap();
//!
//! let grey = grey_from_store(&mut raster).unwrap();
//! paint_grey(&mut raster, &grey).unwrap();
//! ```
//!
//! ## Optional Features
//!
//! ### Logger Feature
//!
//! Enable debug logging to monitor the pipeline:
//!
//! ```toml
//! [dependencies]
//! raster-canny = { version = "0.1.0", features = ["logger"] }
//! log = "0.4"
//! env_logger = "0.11"
//! ```
//!
//! ```rust,no_run
//! use image::open;
//! use raster_canny::{canny, CannyOptions, PixelBuffer};
//!
//! env_logger::init();
//!
//! let buffer = PixelBuffer::from_rgb_image(&open("example.png").unwrap().to_rgb8());
//! let edges = canny(&buffer, &CannyOptions::default()).unwrap();
//! // With logger feature, you'll see debug messages like:
//! // DEBUG raster_canny::canny: median 118 -> thresholds low 79.06 high 156.94
//! // DEBUG raster_canny::canny: 2310 ridge pixels, 1184 edge pixels
//! ```
//!
//! ### Rayon Feature
//!
//! Convolution rows are computed in parallel. Results are identical to the
//! single-threaded build.

// Conditional logging macros
#[cfg(feature = "logger")]
macro_rules! debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*);
    };
}

#[cfg(not(feature = "logger"))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

mod canny;
mod convolve;
mod error;
mod gradient;
mod grey;
mod hysteresis;
mod kernel;
mod nms;
mod pixel;
mod raster;
mod visualize;

pub use canny::{canny, canny_grey, canny_store, canny_with_report, CannyOptions, CannyReport};
pub use convolve::{apply_kernel, convolve, convolve_centered, convolve_grey};
pub use error::{Error, KernelError, Result};
pub use gradient::{gradient, GradientField, MAX_MAGNITUDE};
pub use grey::{grey_from_store, paint_grey, to_grey, EdgeMap, GreyscaleImage};
pub use hysteresis::{
    median_nonzero, threshold, threshold_connected, HysteresisMode, Thresholds, AUTO_HIGH_RATIO,
    AUTO_LOW_RATIO,
};
pub use kernel::Kernel;
pub use nms::{quantize_direction, suppress, suppress_field};
pub use pixel::{
    acquire, acquire_all, LockMode, PixelBuffer, PixelFormat, PixelLayout, PixelLock, PixelStore,
    Region,
};
pub use raster::{aligned_stride, RasterImage};
pub use visualize::visualize_edges;
