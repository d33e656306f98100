#![allow(dead_code)]

use raster_canny::{PixelBuffer, PixelFormat};

/// Deterministic pseudo-random BGR(A) noise, xorshift seeded by `seed`.
pub fn noise(width: u32, height: u32, format: PixelFormat, seed: u32) -> PixelBuffer {
    let mut state = seed.max(1);
    PixelBuffer::from_fn(width, height, format, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        };
        [next(), next(), next(), next()]
    })
    .expect("supported format")
}

/// Grey pixels whose value depends only on the column.
pub fn columns<F>(width: u32, height: u32, format: PixelFormat, profile: F) -> PixelBuffer
where
    F: Fn(u32) -> u8,
{
    PixelBuffer::from_fn(width, height, format, |x, _| {
        let v = profile(x);
        [v, v, v, 255]
    })
    .expect("supported format")
}

/// A faint vertical step (Sobel response 40) around `x = 4` and a strong one
/// (Sobel response 200) around `x = 11`.
pub fn faint_and_strong_step(x: u32) -> u8 {
    match x {
        0..=3 => 0,
        4 => 5,
        5..=10 => 10,
        11 => 35,
        _ => 60,
    }
}

/// A full-contrast 0 -> 255 ramp (Sobel response 780) centred on `x = 8`, followed by
/// a gentler 255 -> 180 ramp (Sobel response 240) centred on `x = 18`.
pub fn bright_then_dim_ramps(x: u32) -> u8 {
    match x {
        0..=6 => 0,
        7 => 60,
        8 => 180,
        9..=16 => 255,
        17 => 240,
        18 => 210,
        _ => 180,
    }
}
