use image::{GrayImage, ImageBuffer, Luma, Pixel, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::drawing::draw_polygon_mut;
use imageproc::morphology;
use imageproc::point::Point;

use crate::geometry::Rect;

/// Foreground value of every binary image produced here.
pub const FOREGROUND: u8 = 255;

/// Converts an RGB frame to single channel luminance.
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    image::imageops::grayscale(img)
}

/// Converts a grayscale image to binary by keeping only bright pixels.
///
/// Pixels strictly brighter than `level` become foreground (255), everything else 0.
/// Lit display segments are the brightest thing on the panel, so a fixed high
/// level isolates them from the housing.
pub fn threshold(img: &GrayImage, level: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if pixel[0] > level { FOREGROUND } else { 0u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Dilates a binary image with a square kernel of side `kernel` pixels.
///
/// Even kernel sizes round up to the next odd size (imageproc kernels are
/// centered, so a size of 10 gives an 11x11 kernel). Kernels of size 0 or 1
/// return the input unchanged.
pub fn dilate(img: &GrayImage, kernel: u32) -> GrayImage {
    let radius = kernel_radius(kernel);
    if radius == 0 {
        return img.clone();
    }
    morphology::dilate(img, Norm::LInf, radius)
}

/// Morphological close (dilate then erode) with a square kernel.
pub fn close(img: &GrayImage, kernel: u32) -> GrayImage {
    let radius = kernel_radius(kernel);
    if radius == 0 {
        return img.clone();
    }
    morphology::close(img, Norm::LInf, radius)
}

fn kernel_radius(kernel: u32) -> u8 {
    (kernel / 2).min(u8::MAX as u32) as u8
}

/// Binarizes a whole frame for display detection.
///
/// Grayscale, threshold, then dilate so the segments of one glyph fuse into a
/// single blob. Thresholding before the dilation gives the same result as the
/// grayscale max-filter-then-threshold order, because the threshold is monotone.
pub fn binarize_frame(img: &RgbImage, level: u8, dilate_kernel: u32) -> GrayImage {
    let gray = to_grayscale(img);
    let binary = threshold(&gray, level);
    dilate(&binary, dilate_kernel)
}

/// Binarizes one digit cell so broken segment strokes become solid blobs.
pub fn binarize_digit(img: &RgbImage, level: u8, dilate_kernel: u32, close_kernel: u32) -> GrayImage {
    let gray = to_grayscale(img);
    let binary = threshold(&gray, level);
    let dilated = dilate(&binary, dilate_kernel);
    close(&dilated, close_kernel)
}

/// Crops a region from an image, clamping it to the image bounds.
///
/// Returns `None` when the rectangle lies entirely outside the image, so
/// a digit cell pushed off-frame by size normalization decodes as nothing
/// instead of panicking.
pub fn crop_region<P>(
    img: &ImageBuffer<P, Vec<P::Subpixel>>,
    rect: &Rect,
) -> Option<ImageBuffer<P, Vec<P::Subpixel>>>
where
    P: Pixel + 'static,
{
    let (w, h) = img.dimensions();
    let clipped = rect.clip_to(w, h)?;

    Some(
        image::imageops::crop_imm(
            img,
            clipped.x as u32,
            clipped.y as u32,
            clipped.w as u32,
            clipped.h as u32,
        )
        .to_image(),
    )
}

/// Keeps only the pixels of `img` inside the polygon, zeroing the rest.
///
/// Points are pixel coordinates in `img`. Degenerate polygons (fewer than
/// three distinct points) yield an empty image.
pub fn mask_polygon(img: &GrayImage, points: &[(i32, i32)]) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut mask = GrayImage::new(width, height);

    let mut polygon: Vec<Point<i32>> = Vec::with_capacity(points.len());
    for &(x, y) in points {
        let p = Point::new(x, y);
        if polygon.last() != Some(&p) {
            polygon.push(p);
        }
    }
    // the drawing routine rejects an explicitly closed ring
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    if polygon.len() < 3 {
        return mask;
    }

    draw_polygon_mut(&mut mask, &polygon, Luma([FOREGROUND]));

    for (x, y, pixel) in mask.enumerate_pixels_mut() {
        if pixel[0] != 0 {
            pixel[0] = img.get_pixel(x, y)[0];
        }
    }

    mask
}
