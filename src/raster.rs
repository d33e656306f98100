//! An owned, in-memory image container implementing [`PixelStore`].
//!
//! Rows are padded to a multiple of four bytes, the way bitmap containers lay them
//! out, so buffers lent from a `RasterImage` usually have `stride > width * bpp`.
//! Locks may ask for any of the filterable layouts; pixels are converted on the way
//! out and back.

use image::DynamicImage;

use crate::error::{Error, Result};
use crate::pixel::{LockMode, PixelBuffer, PixelFormat, PixelLayout, PixelStore, Region};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

/// Row length rounded up to a four-byte boundary.
pub fn aligned_stride(width: u32, format: PixelFormat) -> usize {
    (width as usize * format.bytes_per_pixel() + 3) & !3
}

impl RasterImage {
    /// An all-black image.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = aligned_stride(width, format);
        RasterImage {
            width,
            height,
            stride,
            format,
            data: vec![0; stride * height as usize],
        }
    }

    /// Copies a buffer into a new image with aligned rows.
    pub fn from_buffer(buffer: &PixelBuffer) -> Self {
        let mut image = RasterImage::new(buffer.width(), buffer.height(), buffer.format());
        let row_bytes = buffer.row_bytes();
        for y in 0..buffer.height() {
            let start = y as usize * image.stride;
            image.data[start..start + row_bytes].copy_from_slice(buffer.row(y));
        }
        image
    }

    /// Copies a decoded image. RGB becomes BGR, RGBA becomes BGRA, 8-bit luma stays
    /// greyscale (and cannot be filtered), anything else goes through RGBA.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageRgb8(rgb) => {
                RasterImage::from_buffer(&PixelBuffer::from_rgb_image(rgb))
            }
            DynamicImage::ImageLuma8(luma) => {
                let mut raster = RasterImage::new(luma.width(), luma.height(), PixelFormat::Gray8);
                for (y, row) in luma.rows().enumerate() {
                    let start = y * raster.stride;
                    for (dst, p) in raster.data[start..].iter_mut().zip(row) {
                        *dst = p[0];
                    }
                }
                raster
            }
            other => RasterImage::from_buffer(&PixelBuffer::from_rgba_image(&other.to_rgba8())),
        }
    }

    /// The backing store, padded rows included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The bytes of pixel `(x, y)` in the native format.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let start = y as usize * self.stride + x as usize * bpp;
        self.data.get(start..start + bpp)
    }

    fn region_row(&self, region: Region, row: u32) -> std::ops::Range<usize> {
        let bpp = self.format.bytes_per_pixel();
        let start = (region.y + row) as usize * self.stride + region.x as usize * bpp;
        start..start + region.width as usize * bpp
    }
}

/// Copies B, G, R between two filterable layouts. A fourth destination byte keeps the
/// source alpha when both sides carry real alpha, and is 255 otherwise.
fn convert_row(src: &[u8], src_format: PixelFormat, dst: &mut [u8], dst_format: PixelFormat) {
    let src_bpp = src_format.bytes_per_pixel();
    let dst_bpp = dst_format.bytes_per_pixel();
    let keep_alpha = src_format == PixelFormat::Bgra32 && dst_format == PixelFormat::Bgra32;
    for (s, d) in src.chunks_exact(src_bpp).zip(dst.chunks_exact_mut(dst_bpp)) {
        d[..3].copy_from_slice(&s[..3]);
        if dst_bpp == 4 {
            d[3] = if keep_alpha { s[3] } else { 255 };
        }
    }
}

impl PixelStore for RasterImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn stride(&self) -> usize {
        self.stride
    }

    fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    fn lock_pixels(&mut self, region: Region, _mode: LockMode, format: PixelFormat) -> Result<PixelBuffer> {
        if !region.fits(self.width, self.height) {
            let required = region.width as usize * region.height as usize;
            let available = self.width as usize * self.height as usize;
            return Err(Error::out_of_bounds("lock region", required, available));
        }
        if format != self.format {
            PixelLayout::of(self.format)?;
            PixelLayout::of(format)?;
        }
        let stride = aligned_stride(region.width, format);
        let mut buffer = PixelBuffer::zeroed(region.width, region.height, stride, format);
        for row in 0..region.height {
            let src = &self.data[self.region_row(region, row)];
            let dst = buffer.row_mut(row);
            if format == self.format {
                dst.copy_from_slice(src);
            } else {
                convert_row(src, self.format, dst, format);
            }
        }
        Ok(buffer)
    }

    fn unlock_pixels(&mut self, buffer: PixelBuffer, region: Region, mode: LockMode) -> Result<()> {
        if mode == LockMode::ReadOnly {
            return Ok(());
        }
        if buffer.width() != region.width || buffer.height() != region.height {
            let required = region.width as usize * region.height as usize;
            let available = buffer.width() as usize * buffer.height() as usize;
            return Err(Error::out_of_bounds("write-back buffer", required, available));
        }
        if !region.fits(self.width, self.height) {
            let required = region.width as usize * region.height as usize;
            let available = self.width as usize * self.height as usize;
            return Err(Error::out_of_bounds("write-back region", required, available));
        }
        if buffer.format() != self.format {
            PixelLayout::of(buffer.format())?;
            PixelLayout::of(self.format)?;
        }
        for row in 0..region.height {
            let range = self.region_row(region, row);
            let src = buffer.row(row);
            if buffer.format() == self.format {
                self.data[range].copy_from_slice(src);
            } else {
                convert_row(src, buffer.format(), &mut self.data[range], self.format);
            }
        }
        Ok(())
    }
}
