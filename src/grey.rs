//! Single-channel byte images and luma reduction of colour buffers.

use image::{GrayImage, Luma};

use crate::error::{Error, Result};
use crate::pixel::{acquire_all, LockMode, PixelBuffer, PixelLayout, PixelStore};

const BLUE_WEIGHT: f64 = 0.11;
const GREEN_WEIGHT: f64 = 0.59;
const RED_WEIGHT: f64 = 0.30;

/// One byte per pixel, row-major, no row padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreyscaleImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Per-pixel edge strength after suppression, or 0/255 after thresholding.
pub type EdgeMap = GreyscaleImage;

impl GreyscaleImage {
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] unless `data.len() == width * height`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let required = width as usize * height as usize;
        if data.len() != required {
            return Err(Error::out_of_bounds("greyscale data", required, data.len()));
        }
        Ok(GreyscaleImage {
            width,
            height,
            data,
        })
    }

    /// Builds an image by evaluating `f(x, y)` for every pixel, row by row.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> u8,
    {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        GreyscaleImage {
            width,
            height,
            data,
        }
    }

    pub(crate) fn zeroed(width: u32, height: u32) -> Self {
        GreyscaleImage {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Copies the pixels of an `image` luma buffer. Any bytes the buffer holds past
    /// its last pixel are left behind.
    pub fn from_gray_image(image: &GrayImage) -> Self {
        let len = image.width() as usize * image.height() as usize;
        GreyscaleImage {
            width: image.width(),
            height: image.height(),
            data: image.as_raw()[..len].to_vec(),
        }
    }

    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| Luma([self.get(x, y)]))
    }

    /// Width in pixels, which is also the row length in bytes.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// # Panics
    ///
    /// If `(x, y)` is outside the image.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub(crate) fn index(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "({x}, {y}) outside {}x{}", self.width, self.height);
        y as usize * self.width as usize + x as usize
    }

    /// Row-major pixel bytes, `width * height` of them.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Number of non-zero pixels.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

#[inline]
fn luma(bgr: &[u8]) -> u8 {
    let value = f64::from(bgr[0]) * BLUE_WEIGHT
        + f64::from(bgr[1]) * GREEN_WEIGHT
        + f64::from(bgr[2]) * RED_WEIGHT;
    value.round() as u8
}

/// Reduces a colour buffer to one luma byte per pixel:
/// `round(0.11 B + 0.59 G + 0.30 R)`. Alpha is ignored.
///
/// Row padding in `buffer` is skipped; the result is always tightly packed.
///
/// # Arguments
///
/// * `buffer` - 24-bit BGR or 32-bit BGR / BGRA pixels
///
/// # Returns
///
/// A greyscale image with the same width and height as `buffer`.
///
/// # Errors
///
/// [`Error::UnsupportedPixelFormat`] for layouts other than BGR / BGRA.
///
/// # Examples
///
/// ```
/// use raster_canny::{to_grey, PixelBuffer, PixelFormat};
///
/// // Pure blue, green and red in B, G, R byte order.
/// let buffer = PixelBuffer::from_fn(3, 1, PixelFormat::Bgr24, |x, _| match x {
///     0 => [255, 0, 0, 0],
///     1 => [0, 255, 0, 0],
///     _ => [0, 0, 255, 0],
/// })
/// .unwrap();
/// assert_eq!(to_grey(&buffer).unwrap().as_bytes(), &[28, 150, 77]);
/// ```
pub fn to_grey(buffer: &PixelBuffer) -> Result<GreyscaleImage> {
    let layout = buffer.layout()?;
    let mut grey = GreyscaleImage::zeroed(buffer.width(), buffer.height());
    let width = buffer.width() as usize;
    if width == 0 {
        return Ok(grey);
    }
    for (y, out) in grey.data.chunks_exact_mut(width).enumerate() {
        let row = buffer.row(y as u32);
        for (dst, px) in out.iter_mut().zip(row.chunks_exact(layout.bytes_per_pixel)) {
            *dst = luma(px);
        }
    }
    debug!("greyscale {}x{} done", buffer.width(), buffer.height());
    Ok(grey)
}

/// Locks `store` read-only for exactly as long as the luma reduction takes.
pub fn grey_from_store<S: PixelStore + ?Sized>(store: &mut S) -> Result<GreyscaleImage> {
    PixelLayout::of(store.pixel_format())?;
    let lock = acquire_all(store, LockMode::ReadOnly)?;
    let grey = to_grey(&lock)?;
    lock.release()?;
    Ok(grey)
}

/// Writes `grey` into the B, G and R bytes of every pixel of `store`, leaving any
/// fourth byte untouched.
///
/// # Errors
///
/// [`Error::OutOfBounds`] if the sizes differ, [`Error::UnsupportedPixelFormat`] if the
/// store's format cannot be filtered.
pub fn paint_grey<S: PixelStore + ?Sized>(store: &mut S, grey: &GreyscaleImage) -> Result<()> {
    let layout = PixelLayout::of(store.pixel_format())?;
    if store.width() != grey.width() || store.height() != grey.height() {
        let required = store.width() as usize * store.height() as usize;
        return Err(Error::out_of_bounds("greyscale image", required, grey.data.len()));
    }
    let mut lock = acquire_all(store, LockMode::ReadWrite)?;
    let width = grey.width() as usize;
    if width > 0 {
        for (y, src) in grey.data.chunks_exact(width).enumerate() {
            let row = lock.row_mut(y as u32);
            for (px, &value) in row.chunks_exact_mut(layout.bytes_per_pixel).zip(src) {
                px[..PixelLayout::COLOR_CHANNELS].fill(value);
            }
        }
    }
    lock.release()
}
