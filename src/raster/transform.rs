//! Scaling, cropping and the flips/rotations used to derive missing border art.

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// How one border image is turned into another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orient {
    /// Mirror left to right.
    FlipHorizontal,
    /// Mirror top to bottom.
    FlipVertical,
    /// Both mirrors; a half turn.
    FlipBoth,
    Clockwise,
    CounterClockwise,
}

pub fn orient(img: &RgbaImage, how: Orient) -> RgbaImage {
    match how {
        Orient::FlipHorizontal => imageops::flip_horizontal(img),
        Orient::FlipVertical => imageops::flip_vertical(img),
        Orient::FlipBoth => imageops::rotate180(img),
        Orient::Clockwise => imageops::rotate90(img),
        Orient::CounterClockwise => imageops::rotate270(img),
    }
}

/// Resize keeping the aspect ratio so the result is `width` wide.
pub fn scale_by_width(img: &RgbaImage, width: u32) -> RgbaImage {
    let width = width.max(1);
    let height = ((img.height() as f64 * width as f64 / img.width().max(1) as f64).round() as u32).max(1);
    imageops::resize(img, width, height, FilterType::Triangle)
}

/// Resize keeping the aspect ratio so the result is `height` tall.
pub fn scale_by_height(img: &RgbaImage, height: u32) -> RgbaImage {
    let height = height.max(1);
    let width = ((img.width() as f64 * height as f64 / img.height().max(1) as f64).round() as u32).max(1);
    imageops::resize(img, width, height, FilterType::Triangle)
}

/// Copy of a sub-rectangle, clipped to the image.
pub fn extract_region(img: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
    let x = x.min(img.width());
    let y = y.min(img.height());
    let width = width.min(img.width() - x);
    let height = height.min(img.height() - y);
    imageops::crop_imm(img, x, y, width, height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn marked() -> RgbaImage {
        let mut img = RgbaImage::new(4, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img
    }

    #[test]
    fn test_orientations_move_the_marked_corner() {
        let img = marked();
        assert_eq!(orient(&img, Orient::FlipHorizontal).get_pixel(3, 0)[0], 255);
        assert_eq!(orient(&img, Orient::FlipVertical).get_pixel(0, 1)[0], 255);
        assert_eq!(orient(&img, Orient::FlipBoth).get_pixel(3, 1)[0], 255);

        let cw = orient(&img, Orient::Clockwise);
        assert_eq!(cw.dimensions(), (2, 4));
        assert_eq!(cw.get_pixel(1, 0)[0], 255);

        let ccw = orient(&img, Orient::CounterClockwise);
        assert_eq!(ccw.get_pixel(0, 3)[0], 255);
    }

    #[test]
    fn test_scaling_keeps_aspect() {
        let img = RgbaImage::new(40, 10);
        assert_eq!(scale_by_width(&img, 20).dimensions(), (20, 5));
        assert_eq!(scale_by_height(&img, 20).dimensions(), (80, 20));
    }

    #[test]
    fn test_extract_region_clips() {
        let img = RgbaImage::new(10, 10);
        assert_eq!(extract_region(&img, 8, 0, 5, 3).dimensions(), (2, 3));
    }
}
