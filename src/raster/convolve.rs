//! Grayscale convolution. Pixels outside the image count as black.
//!
//! `imageproc` filters extend the image by repeating its edge, so inputs are
//! framed with a one pixel black border first; repeating that border is the
//! same as black padding.

use image::{imageops, GrayImage, ImageBuffer, Luma};
use imageproc::filter::{filter, gaussian_blur_f32};

use super::kernel::Kernel;

type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

fn pad_black(img: &GrayImage) -> GrayImage {
    let mut padded = GrayImage::new(img.width() + 2, img.height() + 2);
    imageops::replace(&mut padded, img, 1, 1);
    padded
}

/// Convolve `img` with `kernel`. With `maximize` the result is stretched to
/// the full 0..=255 range, otherwise it is clamped.
pub fn convolve_grayscale(img: &GrayImage, kernel: &Kernel, maximize: bool) -> GrayImage {
    let (w, h) = img.dimensions();
    let padded = pad_black(img);
    match kernel {
        Kernel::Gaussian { sigma } => {
            let blurred = gaussian_blur_f32(&padded, *sigma);
            let mut out = imageops::crop_imm(&blurred, 1, 1, w, h).to_image();
            if maximize {
                maximize_contrast(&mut out);
            }
            out
        }
        Kernel::Dense { side, weights } => {
            let weights = imageproc::kernel::Kernel::new(weights, *side as u32, *side as u32);
            let sums: FloatImage = filter(&padded, weights, |v: f32| v);
            let sums = imageops::crop_imm(&sums, 1, 1, w, h).to_image();
            if maximize {
                stretch(&sums)
            } else {
                clamp(&sums)
            }
        }
    }
}

/// Stretch a grayscale image in place so its darkest pixel becomes 0 and its
/// brightest 255. A flat image is left unchanged.
pub fn maximize_contrast(img: &mut GrayImage) {
    let (lo, hi) = img
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if hi <= lo {
        return;
    }
    let range = (hi - lo) as f32;
    for p in img.pixels_mut() {
        p[0] = (((p[0] - lo) as f32 / range) * 255.0).round() as u8;
    }
}

fn stretch(sums: &FloatImage) -> GrayImage {
    let (lo, hi) = sums
        .pixels()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    let range = hi - lo;
    GrayImage::from_fn(sums.width(), sums.height(), |x, y| {
        let v = sums.get_pixel(x, y)[0];
        if range <= f32::EPSILON {
            Luma([v.round().clamp(0.0, 255.0) as u8])
        } else {
            Luma([(((v - lo) / range) * 255.0).round() as u8])
        }
    })
}

fn clamp(sums: &FloatImage) -> GrayImage {
    GrayImage::from_fn(sums.width(), sums.height(), |x, y| {
        Luma([sums.get_pixel(x, y)[0].round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot_image() -> GrayImage {
        let mut img = GrayImage::new(21, 21);
        img.put_pixel(10, 10, Luma([255]));
        img
    }

    #[test]
    fn test_gaussian_spreads_a_dot() {
        let out = convolve_grayscale(&dot_image(), &Kernel::gaussian(7), false);
        let centre = out.get_pixel(10, 10)[0];
        let near = out.get_pixel(11, 10)[0];
        let far = out.get_pixel(17, 10)[0];
        assert!(centre > near && near >= far);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.dimensions(), (21, 21));
    }

    #[test]
    fn test_maximize_stretches_to_full_range() {
        let out = convolve_grayscale(&dot_image(), &Kernel::gaussian(7), true);
        assert_eq!(out.get_pixel(10, 10)[0], 255);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_outside_counts_as_black() {
        let white = GrayImage::from_pixel(15, 15, Luma([255]));
        for kernel in [Kernel::gaussian(9), Kernel::positive_sinc(9, 1.0)] {
            let out = convolve_grayscale(&white, &kernel, false);
            assert!(out.get_pixel(0, 0)[0] < out.get_pixel(7, 7)[0]);
            assert!(out.get_pixel(7, 7)[0] >= 250);
        }
    }

    #[test]
    fn test_sinc_spreads_a_dot() {
        let out = convolve_grayscale(&dot_image(), &Kernel::positive_sinc(9, 1.0), true);
        assert_eq!(out.get_pixel(10, 10)[0], 255);
        assert!(out.get_pixel(12, 10)[0] > 0);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_maximize_contrast_in_place() {
        let mut img = GrayImage::from_fn(4, 1, |x, _| Luma([50 + x as u8 * 10]));
        maximize_contrast(&mut img);
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(3, 0)[0], 255);
    }
}
