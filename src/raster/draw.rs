//! Shape scan conversion. Pixels are sampled at their centres.

use image::GenericImage;

use crate::geometry::Point;

/// Call `plot` for every pixel whose centre lies inside the polygon
/// (even-odd rule), clipped to `width` x `height`.
pub fn scan_polygon(points: &[Point], width: u32, height: u32, mut plot: impl FnMut(u32, u32)) {
    if points.len() < 3 || width == 0 || height == 0 {
        return;
    }
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    let y_start = (min_y - 0.5).ceil().max(0.0) as u32;
    let y_end = ((max_y - 0.5).floor().min(height as f64 - 1.0)).max(-1.0);
    if y_end < 0.0 {
        return;
    }

    let mut crossings: Vec<f64> = Vec::with_capacity(8);
    for y in y_start..=y_end as u32 {
        let sy = y as f64 + 0.5;
        crossings.clear();
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            if (a.y <= sy && b.y > sy) || (b.y <= sy && a.y > sy) {
                let t = (sy - a.y) / (b.y - a.y);
                crossings.push(a.x + t * (b.x - a.x));
            }
        }
        crossings.sort_by(f64::total_cmp);

        for pair in crossings.chunks_exact(2) {
            let x0 = (pair[0] - 0.5).ceil().max(0.0);
            let x1 = (pair[1] - 0.5).floor().min(width as f64 - 1.0);
            if x1 < x0 {
                continue;
            }
            for x in x0 as u32..=x1 as u32 {
                plot(x, y);
            }
        }
    }
}

/// Call `plot` for every pixel whose centre lies within `thickness / 2` of
/// the segment `a`-`b` (a capsule), clipped to `width` x `height`.
pub fn scan_thick_line(
    a: Point,
    b: Point,
    thickness: f64,
    width: u32,
    height: u32,
    mut plot: impl FnMut(u32, u32),
) {
    if width == 0 || height == 0 {
        return;
    }
    let radius = (thickness / 2.0).max(0.5);
    let x0 = (a.x.min(b.x) - radius).floor().max(0.0) as i64;
    let y0 = (a.y.min(b.y) - radius).floor().max(0.0) as i64;
    let x1 = ((a.x.max(b.x) + radius).ceil() as i64).min(width as i64 - 1);
    let y1 = ((a.y.max(b.y) + radius).ceil() as i64).min(height as i64 - 1);

    let ab = b - a;
    let len2 = ab.l2();
    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let t = if len2 > 0.0 {
                (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let closest = Point::new(a.x + ab.x * t, a.y + ab.y * t);
            if p.distance(&closest) <= radius {
                plot(x as u32, y as u32);
            }
        }
    }
}

/// Fill a polygon with a solid pixel value.
pub fn fill_polygon<I: GenericImage>(img: &mut I, points: &[Point], pixel: I::Pixel) {
    let (w, h) = img.dimensions();
    scan_polygon(points, w, h, |x, y| img.put_pixel(x, y, pixel));
}

/// Stroke a segment with round caps.
pub fn draw_thick_line<I: GenericImage>(img: &mut I, a: Point, b: Point, thickness: f64, pixel: I::Pixel) {
    let (w, h) = img.dimensions();
    scan_thick_line(a, b, thickness, w, h, |x, y| img.put_pixel(x, y, pixel));
}
