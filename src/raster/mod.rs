//! Raster primitives: blur kernels, convolution, masked blending, region
//! compositing, flips/scaling and shape scan conversion.
//!
//! All operators are pure functions of their inputs or mutate only the image
//! passed to them, so pipeline stages stay reproducible.

pub mod convolve;
pub mod draw;
pub mod kernel;
pub mod mask;
pub mod transform;

pub use convolve::{convolve_grayscale, maximize_contrast};
pub use draw::{draw_thick_line, fill_polygon, scan_polygon, scan_thick_line};
pub use kernel::Kernel;
pub use mask::{
    blend_through_mask, mask_gray, mask_with_color, mask_with_image, mask_with_multiple_colors,
    set_alpha_from_mask, Fill, Rotation,
};
pub use transform::{extract_region, orient, scale_by_height, scale_by_width, Orient};

use image::Rgba;

use crate::settings::Color;

/// Opaque RGBA pixel for an RGB colour.
pub fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color[0], color[1], color[2], 255])
}
