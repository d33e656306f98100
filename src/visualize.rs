//! Edge overlays for inspecting detector output.

use image::{buffer::ConvertBuffer, Rgb, RgbImage};

use crate::error::{Error, Result};
use crate::grey::{EdgeMap, GreyscaleImage};

/// Draws every non-zero pixel of `edges` in red over the greyscale `image`.
///
/// # Errors
///
/// [`Error::OutOfBounds`] if the two images differ in size.
///
/// ```
/// use raster_canny::{visualize_edges, GreyscaleImage};
///
/// let image = GreyscaleImage::from_fn(4, 4, |_, _| 80);
/// let edges = GreyscaleImage::from_fn(4, 4, |x, _| if x == 2 { 255 } else { 0 });
/// let overlay = visualize_edges(&image, &edges).unwrap();
/// assert_eq!(overlay.get_pixel(2, 1).0, [255, 0, 0]);
/// assert_eq!(overlay.get_pixel(0, 1).0, [80, 80, 80]);
/// ```
pub fn visualize_edges(image: &GreyscaleImage, edges: &EdgeMap) -> Result<RgbImage> {
    let required = image.width() as usize * image.height() as usize;
    if (edges.width(), edges.height()) != (image.width(), image.height()) {
        return Err(Error::out_of_bounds(
            "edge map",
            required,
            edges.width() as usize * edges.height() as usize,
        ));
    }

    let mut canvas: RgbImage = image.to_gray_image().convert();
    let red = Rgb([255u8, 0, 0]);
    let width = image.width() as usize;
    for (index, _) in edges.as_bytes().iter().enumerate().filter(|(_, &v)| v != 0) {
        canvas.put_pixel((index % width) as u32, (index / width) as u32, red);
    }
    debug!("overlaid {} edge pixels", edges.count_nonzero());
    Ok(canvas)
}
