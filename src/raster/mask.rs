//! Masked blending. A mask value of 255 selects the first image, 0 the other
//! source; values in between blend linearly.

use image::{GrayImage, Luma, Rgba, RgbaImage};

use crate::geometry::Point;
use crate::settings::Color;
use crate::tilemap::Tilemap;

fn weight(mask: &GrayImage, x: u32, y: u32, invert: bool) -> f32 {
    let m = mask.get_pixel(x, y)[0] as f32 / 255.0;
    if invert {
        1.0 - m
    } else {
        m
    }
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 * t + b as f32 * (1.0 - t)).round().clamp(0.0, 255.0) as u8
}

fn blend_rgb(keep: Rgba<u8>, other: [u8; 3], t: f32) -> Rgba<u8> {
    Rgba([
        lerp(keep[0], other[0], t),
        lerp(keep[1], other[1], t),
        lerp(keep[2], other[2], t),
        keep[3],
    ])
}

/// Keep `image` where the mask is white and replace it with `color` where it
/// is black. `invert` swaps the roles of white and black.
pub fn mask_with_color(image: &RgbaImage, color: Color, mask: &GrayImage, invert: bool) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        blend_rgb(*image.get_pixel(x, y), color, weight(mask, x, y, invert))
    })
}

/// Grayscale counterpart of [`mask_with_color`] with black as the colour.
pub fn mask_gray(image: &GrayImage, mask: &GrayImage, invert: bool) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([lerp(image.get_pixel(x, y)[0], 0, weight(mask, x, y, invert))])
    })
}

/// Keep `image` where the mask is white and take `other` where it is black.
pub fn mask_with_image(image: &RgbaImage, other: &RgbaImage, mask: &GrayImage) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let o = other.get_pixel(x, y);
        blend_rgb(*image.get_pixel(x, y), [o[0], o[1], o[2]], weight(mask, x, y, false))
    })
}

/// Like [`mask_with_color`], but the colour comes from `colors[index]` where
/// `index` is the pixel's entry in `indexes`. Pixels without an index keep
/// the image.
pub fn mask_with_multiple_colors(
    image: &RgbaImage,
    colors: &[Color],
    indexes: &Tilemap<Option<usize>>,
    mask: &GrayImage,
    invert: bool,
) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let keep = *image.get_pixel(x, y);
        match indexes
            .try_get(x as i64, y as i64)
            .copied()
            .flatten()
            .and_then(|i| colors.get(i))
        {
            Some(color) => blend_rgb(keep, *color, weight(mask, x, y, invert)),
            None => keep,
        }
    })
}

/// Replace the alpha channel with the mask (or its inverse).
pub fn set_alpha_from_mask(image: &mut RgbaImage, mask: &GrayImage, invert: bool) {
    for (x, y, p) in image.enumerate_pixels_mut() {
        let m = mask.get_pixel(x, y)[0];
        p[3] = if invert { 255 - m } else { m };
    }
}

/// What gets painted through a mask.
#[derive(Clone, Copy, Debug)]
pub enum Fill<'a> {
    /// Solid colour.
    Color(Color),
    /// Pixels from an image aligned with the destination.
    Image(&'a RgbaImage),
}

/// A rotation by `angle` radians about `pivot`, in destination coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    pub pivot: Point,
    pub angle: f64,
}

impl Rotation {
    pub fn none() -> Self {
        Self {
            pivot: Point::default(),
            angle: 0.0,
        }
    }
}

/// Paint `fill` into `dst` through `mask`, with the mask's top-left corner at
/// `origin` and the whole mask rotated by `rotation`.
///
/// Destination pixels are inverse-mapped into mask space, so a rotated mask
/// leaves no holes.
pub fn blend_through_mask(
    dst: &mut RgbaImage,
    fill: Fill<'_>,
    mask: &GrayImage,
    origin: Point,
    rotation: Rotation,
) {
    let (mw, mh) = (mask.width() as f64, mask.height() as f64);
    if mw == 0.0 || mh == 0.0 {
        return;
    }

    let corners = [
        origin,
        Point::new(origin.x + mw, origin.y),
        Point::new(origin.x + mw, origin.y + mh),
        Point::new(origin.x, origin.y + mh),
    ]
    .map(|c| c.rotate_about(rotation.pivot, rotation.angle));
    let min_x = corners.iter().map(|c| c.x).fold(f64::INFINITY, f64::min).floor().max(0.0);
    let min_y = corners.iter().map(|c| c.y).fold(f64::INFINITY, f64::min).floor().max(0.0);
    let max_x = corners.iter().map(|c| c.x).fold(f64::NEG_INFINITY, f64::max).ceil();
    let max_y = corners.iter().map(|c| c.y).fold(f64::NEG_INFINITY, f64::max).ceil();
    let max_x = max_x.min(dst.width() as f64);
    let max_y = max_y.min(dst.height() as f64);

    let mut y = min_y;
    while y < max_y {
        let mut x = min_x;
        while x < max_x {
            let centre = Point::new(x + 0.5, y + 0.5).rotate_about(rotation.pivot, -rotation.angle);
            let lx = (centre.x - origin.x).floor();
            let ly = (centre.y - origin.y).floor();
            if lx >= 0.0 && ly >= 0.0 && lx < mw && ly < mh {
                let m = mask.get_pixel(lx as u32, ly as u32)[0];
                if m > 0 {
                    let (px, py) = (x as u32, y as u32);
                    let src = match fill {
                        Fill::Color(c) => c,
                        Fill::Image(img) => {
                            let s = img.get_pixel(px, py);
                            [s[0], s[1], s[2]]
                        }
                    };
                    let t = m as f32 / 255.0;
                    let keep = *dst.get_pixel(px, py);
                    dst.put_pixel(px, py, blend_rgb(keep, src, 1.0 - t));
                }
            }
            x += 1.0;
        }
        y += 1.0;
    }
}
