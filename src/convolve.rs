//! Square-kernel convolution with partial-kernel normalization at the borders.
//!
//! Every output channel is `floor(Σ w·p / Σ w + 0.5)` where both sums run over the
//! taps that land inside the image. Taps falling off the edge are skipped and do not
//! contribute to the normalizer either, so border pixels are averaged against only
//! the part of the kernel that overlaps the image.
//!
//! The result is saturated into a byte. Kernels whose in-bounds weights sum to zero
//! (e.g. the Sobel pair) divide by zero and produce 0 or 255; the catalog blurs never
//! do.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::error::Result;
use crate::grey::GreyscaleImage;
use crate::kernel::Kernel;
use crate::pixel::{acquire_all, LockMode, PixelBuffer, PixelLayout, PixelStore};

/// Read-only geometry of the plane being convolved.
struct Source<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
    bytes_per_pixel: usize,
    channels: usize,
}

#[inline]
fn tap(center: usize, offset: usize, radius: usize, limit: usize) -> Option<usize> {
    (center + offset).checked_sub(radius).filter(|&c| c < limit)
}

#[inline]
fn to_byte(value: f64) -> u8 {
    // `as` saturates, and maps NaN to 0.
    (value + 0.5).floor() as u8
}

fn convolve_row(
    src: &Source<'_>,
    kernel: &Kernel,
    radius: usize,
    y: usize,
    out: &mut [u8],
    has_alpha: bool,
) {
    let size = kernel.size();
    let row_bytes = src.width * src.bytes_per_pixel;
    for x in 0..src.width {
        let mut acc = [0.0f64; PixelLayout::COLOR_CHANNELS];
        let mut norm = 0.0;
        for v in 0..size {
            let Some(sy) = tap(y, v, radius, src.height) else {
                continue;
            };
            let row = &src.data[sy * src.stride..sy * src.stride + row_bytes];
            for u in 0..size {
                let Some(sx) = tap(x, u, radius, src.width) else {
                    continue;
                };
                let weight = kernel.weight(u, v);
                let start = sx * src.bytes_per_pixel;
                for (a, &p) in acc.iter_mut().zip(&row[start..start + src.channels]) {
                    *a += f64::from(p) * weight;
                }
                norm += weight;
            }
        }

        let dst = &mut out[x * src.bytes_per_pixel..(x + 1) * src.bytes_per_pixel];
        for (d, a) in dst.iter_mut().zip(&acc[..src.channels]) {
            *d = to_byte(a / norm);
        }
        if has_alpha {
            dst[PixelLayout::COLOR_CHANNELS] = u8::MAX;
        }
    }
}

/// Runs `f(y, row)` over the `stride`-sized rows of `data`, in parallel when the
/// `rayon` feature is enabled.
fn for_each_row<F>(data: &mut [u8], stride: usize, f: F)
where
    F: Fn(usize, &mut [u8]) + Send + Sync,
{
    if stride == 0 {
        return;
    }
    #[cfg(feature = "rayon")]
    data.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
    #[cfg(not(feature = "rayon"))]
    data.chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

/// Convolves the B, G and R channels of `buffer` with `kernel`, anchoring tap
/// `(radius, radius)` on each output pixel.
///
/// Taps that fall outside the image are skipped and the sum is divided by the
/// weights that remained, so border pixels are not darkened.
///
/// # Arguments
///
/// * `buffer` - 24-bit BGR or 32-bit BGR / BGRA pixels
/// * `kernel` - Square weight matrix with an odd side
/// * `radius` - Tap index placed on the output pixel, along both axes
///
/// # Returns
///
/// A new buffer with the input's dimensions, stride and format. For 4-byte formats
/// the fourth byte is written as 255; stride padding is zero.
///
/// # Errors
///
/// [`Error::UnsupportedPixelFormat`](crate::Error::UnsupportedPixelFormat) for layouts
/// other than BGR / BGRA. Kernel shape is validated when the [`Kernel`] is built.
///
/// # Examples
///
/// ```
/// use raster_canny::{convolve, Kernel, PixelBuffer, PixelFormat};
///
/// let buffer = PixelBuffer::from_fn(4, 3, PixelFormat::Bgra32, |_, _| [10, 20, 30, 0]).unwrap();
/// let kernel = Kernel::gaussian_blur();
/// let blurred = convolve(&buffer, &kernel, kernel.radius()).unwrap();
/// assert_eq!(blurred.pixel(0, 0), Some(&[10u8, 20, 30, 255][..]));
/// ```
pub fn convolve(buffer: &PixelBuffer, kernel: &Kernel, radius: usize) -> Result<PixelBuffer> {
    let layout = buffer.layout()?;
    let mut out = PixelBuffer::zeroed(
        buffer.width(),
        buffer.height(),
        buffer.stride(),
        buffer.format(),
    );
    let src = Source {
        data: buffer.as_bytes(),
        width: buffer.width() as usize,
        height: buffer.height() as usize,
        stride: buffer.stride(),
        bytes_per_pixel: layout.bytes_per_pixel,
        channels: PixelLayout::COLOR_CHANNELS,
    };
    for_each_row(out.as_bytes_mut(), buffer.stride(), |y, row| {
        convolve_row(&src, kernel, radius, y, row, layout.has_alpha)
    });
    debug!(
        "convolved {}x{} {:?} with {}x{} kernel, radius {}",
        buffer.width(),
        buffer.height(),
        buffer.format(),
        kernel.size(),
        kernel.size(),
        radius
    );
    Ok(out)
}

/// [`convolve`] anchored on the kernel's centre tap.
pub fn convolve_centered(buffer: &PixelBuffer, kernel: &Kernel) -> Result<PixelBuffer> {
    convolve(buffer, kernel, kernel.radius())
}

/// Single-channel form of [`convolve`].
pub fn convolve_grey(image: &GreyscaleImage, kernel: &Kernel, radius: usize) -> GreyscaleImage {
    let width = image.width() as usize;
    let mut out = GreyscaleImage::zeroed(image.width(), image.height());
    let src = Source {
        data: image.as_bytes(),
        width,
        height: image.height() as usize,
        stride: width,
        bytes_per_pixel: 1,
        channels: 1,
    };
    for_each_row(out.as_bytes_mut(), width, |y, row| {
        convolve_row(&src, kernel, radius, y, row, false)
    });
    out
}

/// Convolves the whole of `store` in place through a read-write lock.
pub fn apply_kernel<S: PixelStore + ?Sized>(store: &mut S, kernel: &Kernel) -> Result<()> {
    PixelLayout::of(store.pixel_format())?;
    let mut lock = acquire_all(store, LockMode::ReadWrite)?;
    let convolved = convolve_centered(&lock, kernel)?;
    *lock = convolved;
    lock.release()
}
