mod common;

use common::synthetic_image::{bright_then_dim_ramps, columns, faint_and_strong_step, noise};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use raster_canny::{
    acquire, acquire_all, apply_kernel, canny, canny_store, canny_with_report, convolve_centered,
    gradient, grey_from_store, paint_grey, suppress_field, threshold, to_grey, visualize_edges,
    CannyOptions, Error, GreyscaleImage, HysteresisMode, Kernel, LockMode, PixelBuffer,
    PixelFormat, PixelStore, RasterImage, Region, Result,
};
use std::f32::consts::PI;

const FILTERABLE: [PixelFormat; 3] = [PixelFormat::Bgr24, PixelFormat::Bgr32, PixelFormat::Bgra32];

/// Delegates to a [`RasterImage`] and counts lock traffic.
struct CountingStore {
    inner: RasterImage,
    locks: usize,
    unlocks: usize,
}

impl CountingStore {
    fn new(inner: RasterImage) -> Self {
        CountingStore {
            inner,
            locks: 0,
            unlocks: 0,
        }
    }
}

impl PixelStore for CountingStore {
    fn width(&self) -> u32 {
        self.inner.width()
    }

    fn height(&self) -> u32 {
        self.inner.height()
    }

    fn stride(&self) -> usize {
        self.inner.stride()
    }

    fn pixel_format(&self) -> PixelFormat {
        self.inner.pixel_format()
    }

    fn lock_pixels(&mut self, region: Region, mode: LockMode, format: PixelFormat) -> Result<PixelBuffer> {
        let buffer = self.inner.lock_pixels(region, mode, format)?;
        self.locks += 1;
        Ok(buffer)
    }

    fn unlock_pixels(&mut self, buffer: PixelBuffer, region: Region, mode: LockMode) -> Result<()> {
        self.unlocks += 1;
        self.inner.unlock_pixels(buffer, region, mode)
    }
}

#[test]
fn identity_kernel_preserves_colour_in_every_format() {
    for format in FILTERABLE {
        // odd width so the raster pads its rows
        let raster = RasterImage::from_buffer(&noise(7, 5, format, 42));
        let mut store = CountingStore::new(raster);
        let lock = acquire_all(&mut store, LockMode::ReadOnly).unwrap();
        assert!(lock.stride() >= lock.row_bytes());

        for size in [1, 3, 5] {
            let out = convolve_centered(&lock, &Kernel::identity(size).unwrap()).unwrap();
            assert_eq!(out.stride(), lock.stride());
            for y in 0..5 {
                for x in 0..7 {
                    assert_eq!(
                        out.pixel(x, y).unwrap()[..3],
                        lock.pixel(x, y).unwrap()[..3],
                        "{format:?} {size}x{size} at ({x}, {y})"
                    );
                }
            }
        }
        lock.release().unwrap();
        assert_eq!((store.locks, store.unlocks), (1, 1));
    }
}

#[test]
fn blur_keeps_uniform_images_uniform() {
    let buffer = PixelBuffer::from_fn(9, 6, PixelFormat::Bgr24, |_, _| [17, 130, 244, 0]).unwrap();
    for kernel in [Kernel::gaussian_blur(), Kernel::mean_blur(), Kernel::lens_blur()] {
        let out = convolve_centered(&buffer, &kernel).unwrap();
        assert_eq!(out, buffer, "{}x{} kernel", kernel.size(), kernel.size());
    }
}

#[test]
fn greyscale_extremes() {
    for format in FILTERABLE {
        let white = PixelBuffer::from_fn(3, 4, format, |_, _| [255; 4]).unwrap();
        let black = PixelBuffer::from_fn(3, 4, format, |_, _| [0, 0, 0, 255]).unwrap();
        let white = to_grey(&white).unwrap();
        assert_eq!(white.as_bytes().len(), 12);
        assert!(white.as_bytes().iter().all(|&v| v == 255));
        assert_eq!(to_grey(&black).unwrap().count_nonzero(), 0);
    }
}

#[test]
fn vertical_step_has_a_horizontal_gradient() {
    let step = GreyscaleImage::from_fn(5, 5, |x, _| if x < 2 { 0 } else { 255 });
    let field = gradient(&step);
    assert!(field.magnitude_at(2, 2) > field.magnitude_at(3, 2));
    let theta = field.orientation_at(2, 2).unwrap();
    assert!((theta - PI).abs() < 1e-6, "dx dominates, dy is zero: {theta}");
}

#[test]
fn sobel_magnitude_matches_imageproc() {
    let grey = to_grey(&noise(24, 17, PixelFormat::Bgr24, 7)).unwrap();
    let reference = grey.to_gray_image();
    let gx = horizontal_sobel(&reference);
    let gy = vertical_sobel(&reference);
    let field = gradient(&grey);
    for y in 1..16 {
        for x in 1..23 {
            let expected = f32::from(gx.get_pixel(x, y)[0]).hypot(f32::from(gy.get_pixel(x, y)[0]));
            assert!(
                (field.magnitude_at(x, y) - expected).abs() < 1e-3,
                "({x}, {y}): {} vs {expected}",
                field.magnitude_at(x, y)
            );
        }
    }
}

#[test]
fn suppression_thins_a_ramp_to_one_column() {
    let grey = GreyscaleImage::from_fn(12, 6, |x, _| match x {
        0..=4 => 0,
        5 => 20,
        _ => 40,
    });
    let suppressed = suppress_field(&gradient(&grey));
    for y in 1..5 {
        let ridge: Vec<u32> = (0..12).filter(|&x| suppressed.get(x, y) != 0).collect();
        assert_eq!(ridge, vec![5]);
    }
}

#[test]
fn hysteresis_never_marks_zero_magnitude() {
    let empty = GreyscaleImage::from_fn(6, 6, |_, _| 0);
    assert_eq!(threshold(&empty, 10.0, 20.0).count_nonzero(), 0);

    let lone = GreyscaleImage::from_fn(6, 6, |x, y| if (x, y) == (3, 2) { 200 } else { 0 });
    let out = threshold(&lone, 10.0, 20.0);
    assert_eq!(out.get(3, 2), 255);
    assert_eq!(out.count_nonzero(), 1);
}

#[test]
fn canny_keeps_the_strong_step_only() {
    for format in FILTERABLE {
        let buffer = columns(16, 10, format, faint_and_strong_step);
        let report = canny_with_report(&buffer, &CannyOptions::default().without_blur()).unwrap();
        assert_eq!(report.median, 21.0);
        for y in 1..9 {
            assert_eq!(report.edges.get(11, y), 255, "{format:?}");
            assert_eq!(report.edges.get(4, y), 0, "{format:?}");
        }
        assert_eq!(report.edge_pixels, 8);
    }
}

#[test]
fn high_contrast_edge_survives_default_options() {
    for format in FILTERABLE {
        let buffer = columns(26, 12, format, bright_then_dim_ramps);
        let report = canny_with_report(&buffer, &CannyOptions::default()).unwrap();
        assert_eq!(report.median, 74.0, "{format:?}");
        assert!(report.thresholds.high < 255.0);
        for y in 1..11 {
            assert_eq!(report.edges.get(8, y), 255, "{format:?} row {y}");
            assert_eq!(report.edges.get(18, y), 0, "{format:?} row {y}");
        }
        assert_eq!(report.edge_pixels, 10);
    }
}

#[test]
fn connected_hysteresis_keeps_at_least_as_much() {
    let buffer = noise(32, 24, PixelFormat::Bgr24, 1234);
    let single = canny(&buffer, &CannyOptions::default()).unwrap();
    let connected = canny(
        &buffer,
        &CannyOptions::default().with_hysteresis(HysteresisMode::Connected),
    )
    .unwrap();
    for (s, c) in single.as_bytes().iter().zip(connected.as_bytes()) {
        assert!(*s == 0 || *c == 255);
    }
}

#[test]
fn canny_store_locks_once_and_releases() {
    let buffer = columns(16, 10, PixelFormat::Bgr24, faint_and_strong_step);
    let mut store = CountingStore::new(RasterImage::from_buffer(&buffer));
    let options = CannyOptions::default().without_blur();
    let edges = canny_store(&mut store, &options).unwrap();
    assert_eq!((store.locks, store.unlocks), (1, 1));
    assert_eq!(edges, canny(&buffer, &options).unwrap());
}

#[test]
fn unsupported_store_is_rejected_before_locking() {
    let mut store = CountingStore::new(RasterImage::new(4, 4, PixelFormat::Gray8));
    assert_eq!(
        canny_store(&mut store, &CannyOptions::default()),
        Err(Error::UnsupportedPixelFormat(PixelFormat::Gray8))
    );
    assert_eq!(store.locks, 0);

    let buffer = PixelBuffer::from_packed(2, 2, PixelFormat::Bgr565, vec![0; 8]).unwrap();
    assert_eq!(
        canny(&buffer, &CannyOptions::default()),
        Err(Error::UnsupportedPixelFormat(PixelFormat::Bgr565))
    );
}

#[test]
fn dropped_lock_is_released() {
    let mut store = CountingStore::new(RasterImage::new(4, 4, PixelFormat::Bgr24));
    {
        let region = Region::new(1, 1, 2, 2);
        let mut lock = acquire(&mut store, region, LockMode::ReadWrite, PixelFormat::Bgr24).unwrap();
        lock.row_mut(0).fill(9);
    }
    assert_eq!((store.locks, store.unlocks), (1, 1));
    assert_eq!(store.inner.pixel(1, 1), Some(&[9u8, 9, 9][..]));
    assert_eq!(store.inner.pixel(0, 1), Some(&[0u8, 0, 0][..]));

    let region = Region::new(3, 3, 2, 2);
    let outside = acquire(&mut store, region, LockMode::ReadOnly, PixelFormat::Bgr24);
    assert!(matches!(outside, Err(Error::OutOfBounds { .. })));
    drop(outside);
    assert_eq!(store.locks, 1);
}

#[test]
fn store_round_trip_through_image_crate() {
    let rgb = RgbImage::from_fn(20, 12, |x, _| {
        if x < 10 {
            Rgb([30, 30, 30])
        } else {
            Rgb([90, 90, 90])
        }
    });
    let mut raster = RasterImage::from_dynamic(&DynamicImage::ImageRgb8(rgb));

    apply_kernel(&mut raster, &Kernel::gaussian_blur()).unwrap();
    let grey = grey_from_store(&mut raster).unwrap();
    paint_grey(&mut raster, &grey).unwrap();
    assert_eq!(grey_from_store(&mut raster).unwrap(), grey);

    let edges = canny_store(&mut raster, &CannyOptions::default()).unwrap();
    let overlay = visualize_edges(&grey, &edges).unwrap();
    assert_eq!(overlay.dimensions(), (20, 12));
    assert_eq!(overlay.get_pixel(0, 0).0, [30, 30, 30]);
}
