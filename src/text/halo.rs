//! Background halo behind labels.
//!
//! Before a label is drawn, the undecorated background is blended back over
//! its footprint through a soft mask so icons and texture do not show through
//! the glyphs.

use image::{GrayImage, Luma, RgbaImage};

use crate::geometry::Point;
use crate::raster::{blend_through_mask, convolve_grayscale, maximize_contrast, Fill, Kernel, Rotation};

/// Kernel size of the halo blur at a size multiplier of 1.
pub const HALO_BASE_KERNEL: f64 = 10.0;

pub fn halo_kernel_size(size_multiplier: f64) -> usize {
    (HALO_BASE_KERNEL * size_multiplier).max(0.0) as usize
}

/// Soft mask for a `width` x `height` box: a white rectangle inset by half
/// the kernel on each side, blurred and stretched to full contrast.
/// Returns the mask and the padding around the box.
pub fn halo_mask(width: u32, height: u32, kernel_size: usize) -> (GrayImage, u32) {
    let padding = (kernel_size / 2) as u32;
    let mut mask = GrayImage::new(width + padding * 2, height + padding * 2);
    for y in padding..padding + height {
        for x in padding..padding + width {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    let mut haze = convolve_grayscale(&mask, &Kernel::gaussian(kernel_size), false);
    maximize_contrast(&mut haze);
    (haze, padding)
}

/// Blend `background` into `map` around the box whose upper-left corner is
/// `upper_left`, rotated by `rotation`.
pub fn blend_halo(
    map: &mut RgbaImage,
    background: &RgbaImage,
    upper_left: Point,
    width: u32,
    height: u32,
    rotation: Rotation,
    kernel_size: usize,
) {
    let (haze, padding) = halo_mask(width, height, kernel_size);
    let origin = Point::new(
        upper_left.x.trunc() - padding as f64,
        upper_left.y.trunc() - padding as f64,
    );
    blend_through_mask(map, Fill::Image(background), &haze, origin, rotation);
}
