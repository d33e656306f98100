//! Raw pixel buffers and scoped access to an image container's pixel memory.
//!
//! A [`PixelBuffer`] is a validated, stride-aligned view of B,G,R[,A] bytes. Its
//! geometry is checked once at construction, so row access inside the filter loops
//! can never run past the end of the data.
//!
//! Image containers expose their memory through [`PixelStore`]. Callers never pair
//! `lock_pixels`/`unlock_pixels` by hand: [`acquire`] returns a [`PixelLock`] guard
//! that hands the buffer back to the store when it goes out of scope, including on
//! early returns through `?`.

use std::ops::{Deref, DerefMut};

use image::{RgbImage, RgbaImage};

use crate::error::{Error, Result};

/// Pixel layouts an image container can report.
///
/// Only [`Bgr24`](PixelFormat::Bgr24), [`Bgr32`](PixelFormat::Bgr32) and
/// [`Bgra32`](PixelFormat::Bgra32) can be filtered; the others exist so that a
/// container can describe what it holds and be rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One luminance byte per pixel.
    Gray8,
    /// One palette index byte per pixel.
    Indexed8,
    /// 5-6-5 packed BGR in two bytes.
    Bgr565,
    /// B, G, R bytes.
    Bgr24,
    /// B, G, R bytes followed by an unused byte.
    Bgr32,
    /// B, G, R, A bytes.
    Bgra32,
    /// B, G, R as 16-bit channels.
    Bgr48,
    /// B, G, R, A as 16-bit channels.
    Bgra64,
}

impl PixelFormat {
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Gray8 | PixelFormat::Indexed8 => 8,
            PixelFormat::Bgr565 => 16,
            PixelFormat::Bgr24 => 24,
            PixelFormat::Bgr32 | PixelFormat::Bgra32 => 32,
            PixelFormat::Bgr48 => 48,
            PixelFormat::Bgra64 => 64,
        }
    }

    pub const fn bytes_per_pixel(self) -> usize {
        (self.bits_per_pixel() / 8) as usize
    }

    /// Whether the engine can filter this format.
    pub fn is_supported(self) -> bool {
        PixelLayout::of(self).is_ok()
    }
}

/// The per-format facts every stage needs, in place of one code path per format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    pub bytes_per_pixel: usize,
    /// A fourth byte follows B, G, R. It is ignored on read and written as 255.
    pub has_alpha: bool,
}

impl PixelLayout {
    /// Colour channels read by the filters (B, G, R).
    pub const COLOR_CHANNELS: usize = 3;

    /// Resolves the layout of a supported format.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedPixelFormat`] for anything other than 24-bit BGR or 32-bit
    /// BGR/BGRA.
    pub fn of(format: PixelFormat) -> Result<Self> {
        match format {
            PixelFormat::Bgr24 => Ok(PixelLayout {
                bytes_per_pixel: 3,
                has_alpha: false,
            }),
            PixelFormat::Bgr32 | PixelFormat::Bgra32 => Ok(PixelLayout {
                bytes_per_pixel: 4,
                has_alpha: true,
            }),
            other => Err(Error::UnsupportedPixelFormat(other)),
        }
    }
}

/// A rectangular pixel region in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Region {
            x,
            y,
            width,
            height,
        }
    }

    /// The region covering a whole `width` x `height` image.
    pub const fn full(width: u32, height: u32) -> Self {
        Region::new(0, 0, width, height)
    }

    /// Whether the region lies entirely inside a `width` x `height` image.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        let right = u64::from(self.x) + u64::from(self.width);
        let bottom = u64::from(self.y) + u64::from(self.height);
        right <= u64::from(width) && bottom <= u64::from(height)
    }
}

/// Access requested when locking pixel memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Writes made through the lock are discarded on release.
    ReadOnly,
    /// Writes made through the lock are synced back to the image on release.
    ReadWrite,
}

/// Stride-aligned B,G,R[,A] pixel bytes with validated geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps `data` as a `width` x `height` buffer whose rows start `stride` bytes apart.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if `stride` is shorter than one row of pixels or `data`
    /// does not hold exactly `stride * height` bytes.
    pub fn new(
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self> {
        let row_bytes = row_bytes(width, format)?;
        if stride < row_bytes {
            return Err(Error::out_of_bounds("row stride", row_bytes, stride));
        }
        let required = stride
            .checked_mul(height as usize)
            .ok_or_else(|| Error::out_of_bounds("pixel data", usize::MAX, data.len()))?;
        if data.len() != required {
            return Err(Error::out_of_bounds("pixel data", required, data.len()));
        }
        Ok(PixelBuffer {
            width,
            height,
            stride,
            format,
            data,
        })
    }

    /// Wraps tightly packed rows (`stride == width * bytes_per_pixel`).
    pub fn from_packed(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let stride = row_bytes(width, format)?;
        PixelBuffer::new(width, height, stride, format, data)
    }

    /// Builds a packed buffer by evaluating `f(x, y)` for every pixel.
    ///
    /// `f` returns B, G, R, A; the alpha byte is dropped for 3-byte formats.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedPixelFormat`] unless `format` is a filterable layout.
    pub fn from_fn<F>(width: u32, height: u32, format: PixelFormat, mut f: F) -> Result<Self>
    where
        F: FnMut(u32, u32) -> [u8; 4],
    {
        let layout = PixelLayout::of(format)?;
        let mut data = Vec::with_capacity(width as usize * height as usize * layout.bytes_per_pixel);
        for y in 0..height {
            for x in 0..width {
                let bgra = f(x, y);
                data.extend_from_slice(&bgra[..layout.bytes_per_pixel]);
            }
        }
        PixelBuffer::from_packed(width, height, format, data)
    }

    /// Converts an `image` RGB buffer into packed BGR bytes.
    pub fn from_rgb_image(image: &RgbImage) -> Self {
        let data = image
            .pixels()
            .flat_map(|p| [p[2], p[1], p[0]])
            .collect();
        PixelBuffer {
            width: image.width(),
            height: image.height(),
            stride: image.width() as usize * 3,
            format: PixelFormat::Bgr24,
            data,
        }
    }

    /// Converts an `image` RGBA buffer into packed BGRA bytes.
    pub fn from_rgba_image(image: &RgbaImage) -> Self {
        let data = image
            .pixels()
            .flat_map(|p| [p[2], p[1], p[0], p[3]])
            .collect();
        PixelBuffer {
            width: image.width(),
            height: image.height(),
            stride: image.width() as usize * 4,
            format: PixelFormat::Bgra32,
            data,
        }
    }

    /// An all-zero buffer with the given geometry.
    pub(crate) fn zeroed(width: u32, height: u32, stride: usize, format: PixelFormat) -> Self {
        PixelBuffer {
            width,
            height,
            stride,
            format,
            data: vec![0; stride * height as usize],
        }
    }

    pub(crate) fn empty(format: PixelFormat) -> Self {
        PixelBuffer::zeroed(0, 0, 0, format)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Filter layout of this buffer's format.
    pub fn layout(&self) -> Result<PixelLayout> {
        PixelLayout::of(self.format)
    }

    /// Bytes in one row of pixels, excluding stride padding.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// The pixel bytes of row `y`, without padding.
    ///
    /// # Panics
    ///
    /// If `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.row_bytes()]
    }

    /// Mutable pixel bytes of row `y`, without padding.
    ///
    /// # Panics
    ///
    /// If `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        let len = self.row_bytes();
        &mut self.data[start..start + len]
    }

    /// The bytes of pixel `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let start = y as usize * self.stride + x as usize * bpp;
        self.data.get(start..start + bpp)
    }

    /// All bytes, including stride padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

fn row_bytes(width: u32, format: PixelFormat) -> Result<usize> {
    (width as usize)
        .checked_mul(format.bytes_per_pixel())
        .ok_or_else(|| Error::out_of_bounds("row width", usize::MAX, width as usize))
}

/// An image container that can lend out its pixel memory.
///
/// Implementors hand out a [`PixelBuffer`] for a region in `lock_pixels` and take it
/// back in `unlock_pixels`. Use [`acquire`] rather than calling these directly so the
/// release happens on every exit path.
pub trait PixelStore {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Bytes between the starts of consecutive rows in the container's own storage.
    fn stride(&self) -> usize;

    fn pixel_format(&self) -> PixelFormat;

    fn bits_per_pixel(&self) -> u32 {
        self.pixel_format().bits_per_pixel()
    }

    /// Lends out `region` as a buffer in `format`.
    fn lock_pixels(&mut self, region: Region, mode: LockMode, format: PixelFormat)
        -> Result<PixelBuffer>;

    /// Takes back a buffer lent out by `lock_pixels`, syncing it into the image when
    /// `mode` is [`LockMode::ReadWrite`].
    fn unlock_pixels(&mut self, buffer: PixelBuffer, region: Region, mode: LockMode) -> Result<()>;
}

/// Locks `region` of `store` and returns a guard that releases it when dropped.
///
/// # Errors
///
/// [`Error::OutOfBounds`] if `region` does not fit inside the image, or whatever the
/// store reports for the requested format.
pub fn acquire<S>(
    store: &mut S,
    region: Region,
    mode: LockMode,
    format: PixelFormat,
) -> Result<PixelLock<'_, S>>
where
    S: PixelStore + ?Sized,
{
    if !region.fits(store.width(), store.height()) {
        let required = (u64::from(region.x) + u64::from(region.width))
            .max(u64::from(region.y) + u64::from(region.height));
        let available = store.width().max(store.height());
        return Err(Error::out_of_bounds(
            "lock region",
            required as usize,
            available as usize,
        ));
    }
    let buffer = store.lock_pixels(region, mode, format)?;
    debug!(
        "locked {}x{} at ({}, {}) as {:?}, {:?}",
        region.width, region.height, region.x, region.y, format, mode
    );
    Ok(PixelLock {
        store,
        region,
        mode,
        buffer,
        released: false,
    })
}

/// Locks the whole image in its native format.
pub fn acquire_all<S>(store: &mut S, mode: LockMode) -> Result<PixelLock<'_, S>>
where
    S: PixelStore + ?Sized,
{
    let region = Region::full(store.width(), store.height());
    let format = store.pixel_format();
    acquire(store, region, mode, format)
}

/// Scoped access to a locked region. Dereferences to the [`PixelBuffer`].
pub struct PixelLock<'a, S: PixelStore + ?Sized> {
    store: &'a mut S,
    region: Region,
    mode: LockMode,
    buffer: PixelBuffer,
    released: bool,
}

impl<S: PixelStore + ?Sized> PixelLock<'_, S> {
    pub fn region(&self) -> Region {
        self.region
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Releases the lock now and reports whether the write-back succeeded.
    ///
    /// Dropping the guard does the same but can only log a failure.
    pub fn release(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let format = self.buffer.format;
        let buffer = std::mem::replace(&mut self.buffer, PixelBuffer::empty(format));
        debug!("releasing {:?} lock on {:?}", self.mode, self.region);
        self.store.unlock_pixels(buffer, self.region, self.mode)
    }
}

impl<S: PixelStore + ?Sized> Deref for PixelLock<'_, S> {
    type Target = PixelBuffer;

    fn deref(&self) -> &PixelBuffer {
        &self.buffer
    }
}

impl<S: PixelStore + ?Sized> DerefMut for PixelLock<'_, S> {
    fn deref_mut(&mut self) -> &mut PixelBuffer {
        &mut self.buffer
    }
}

impl<S: PixelStore + ?Sized> Drop for PixelLock<'_, S> {
    fn drop(&mut self) {
        if let Err(_err) = self.finish() {
            debug!("pixel lock release failed: {}", _err);
        }
    }
}
