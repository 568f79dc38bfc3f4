//! 2D geometry used by label placement and graph rasterisation.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A point in map pixel space. Positive y is down.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (*self - *other).length()
    }

    pub fn length(&self) -> f64 {
        self.l2().sqrt()
    }

    /// Squared length.
    pub fn l2(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// `c * a + (1 - c) * b`, so `c = 1` yields `a`.
    pub fn interpolate(a: Point, b: Point, c: f64) -> Point {
        Point::new(c * a.x + (1.0 - c) * b.x, c * a.y + (1.0 - c) * b.y)
    }

    /// Rotate this point by `angle` radians about `pivot`.
    pub fn rotate_about(&self, pivot: Point, angle: f64) -> Point {
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;
        Point::new(pivot.x + dx * cos - dy * sin, pivot.y + dx * sin + dy * cos)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

// Points are ordered by x then y so location sets iterate deterministically.
impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Point {}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

/// Mean of the given points. `None` for an empty collection.
pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Point> {
    let mut sum = Point::default();
    let mut count = 0usize;
    for p in points {
        sum = sum + *p;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(Point::new(sum.x / count as f64, sum.y / count as f64))
}

/// Least-squares line `y = intercept + slope * x`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Regress y on x. Returns `None` when x has no variance (fewer than two
    /// distinct x values), where the slope is undefined.
    pub fn regress<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<LinearFit> {
        let points: Vec<&Point> = points.into_iter().collect();
        let mean = centroid(points.iter().copied())?;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for p in &points {
            let dx = p.x - mean.x;
            sxx += dx * dx;
            sxy += dx * (p.y - mean.y);
        }
        if sxx.abs() < f64::EPSILON {
            return None;
        }

        let slope = sxy / sxx;
        Some(LinearFit {
            slope,
            intercept: mean.y - slope * mean.x,
        })
    }

    /// Angle of the fitted line against the x axis, in `(-pi/2, pi/2)`.
    pub fn angle(&self) -> f64 {
        self.slope.atan()
    }
}

/// Integer pixel rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Whether the floating-point box `[min, max]` lies inside this rectangle.
    pub fn contains_box(&self, min: Point, max: Point) -> bool {
        const EPS: f64 = 1e-9;
        min.x >= self.x as f64 - EPS
            && min.y >= self.y as f64 - EPS
            && max.x <= self.right() as f64 + EPS
            && max.y <= self.bottom() as f64 + EPS
    }
}

/// A convex quadrilateral; the (possibly rotated) footprint of a label box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    pub corners: [Point; 4],
}

impl Quad {
    pub fn from_rect(rect: Rect) -> Self {
        let x0 = rect.x as f64;
        let y0 = rect.y as f64;
        let x1 = rect.right() as f64;
        let y1 = rect.bottom() as f64;
        Self {
            corners: [
                Point::new(x0, y0),
                Point::new(x1, y0),
                Point::new(x1, y1),
                Point::new(x0, y1),
            ],
        }
    }

    /// The rectangle rotated by `angle` radians about `pivot`.
    pub fn rotated(rect: Rect, pivot: Point, angle: f64) -> Self {
        let mut quad = Self::from_rect(rect);
        if angle != 0.0 {
            for c in quad.corners.iter_mut() {
                *c = c.rotate_about(pivot, angle);
            }
        }
        quad
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> (Point, Point) {
        let mut min = self.corners[0];
        let mut max = self.corners[0];
        for c in &self.corners[1..] {
            min.x = min.x.min(c.x);
            min.y = min.y.min(c.y);
            max.x = max.x.max(c.x);
            max.y = max.y.max(c.y);
        }
        (min, max)
    }

    /// Separating-axis test. Quads that only share an edge or a corner do not
    /// intersect; the overlap must have positive area.
    pub fn intersects(&self, other: &Quad) -> bool {
        const EPS: f64 = 1e-9;
        for quad in [self, other] {
            for i in 0..4 {
                let a = quad.corners[i];
                let b = quad.corners[(i + 1) % 4];
                let axis = Point::new(-(b.y - a.y), b.x - a.x);
                if axis.l2() < EPS {
                    continue;
                }
                let (min_a, max_a) = self.project(axis);
                let (min_b, max_b) = other.project(axis);
                if max_a <= min_b + EPS || max_b <= min_a + EPS {
                    return false;
                }
            }
        }
        true
    }

    fn project(&self, axis: Point) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for c in &self.corners {
            let d = c.x * axis.x + c.y * axis.y;
            min = min.min(d);
            max = max.max(d);
        }
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_interpolate_weights_first_point() {
        let p = Point::interpolate(Point::new(10.0, 0.0), Point::new(0.0, 10.0), 0.75);
        assert!((p.x - 7.5).abs() < 1e-12);
        assert!((p.y - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_points_order_by_x_then_y() {
        let set: BTreeSet<Point> = [
            Point::new(2.0, 0.0),
            Point::new(1.0, 5.0),
            Point::new(1.0, -1.0),
            Point::new(1.0, 5.0),
        ]
        .into_iter()
        .collect();
        let ordered: Vec<Point> = set.into_iter().collect();
        assert_eq!(
            ordered,
            vec![Point::new(1.0, -1.0), Point::new(1.0, 5.0), Point::new(2.0, 0.0)]
        );
    }

    #[test]
    fn test_regression_of_collinear_points() {
        let pts = [Point::new(0.0, 0.0), Point::new(1.0, 2.0), Point::new(2.0, 4.0)];
        let fit = LinearFit::regress(pts.iter()).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!(fit.intercept.abs() < 1e-12);
        assert!((fit.angle() - 2f64.atan()).abs() < 1e-12);
    }

    #[test]
    fn test_regression_without_x_variance_is_none() {
        let pts = [Point::new(3.0, 0.0), Point::new(3.0, 1.0), Point::new(3.0, 9.0)];
        assert!(LinearFit::regress(pts.iter()).is_none());
        assert!(LinearFit::regress(std::iter::empty()).is_none());
    }

    #[test]
    fn test_adjacent_rects_do_not_intersect() {
        let a = Quad::from_rect(Rect::new(0, 0, 10, 10));
        let b = Quad::from_rect(Rect::new(10, 0, 10, 10));
        let c = Quad::from_rect(Rect::new(9, 9, 10, 10));
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
    }

    #[test]
    fn test_rotated_quads_use_true_geometry() {
        // Bounding boxes overlap, but the diamond clears the corner of the square.
        let square = Quad::from_rect(Rect::new(0, 0, 10, 10));
        let diamond = Quad::rotated(Rect::new(11, 11, 8, 8), Point::new(15.0, 15.0), FRAC_PI_4);
        let (min, _) = diamond.bounds();
        assert!(min.x < 10.0 && min.y < 10.0);
        assert!(!square.intersects(&diamond));
    }

    #[test]
    fn test_contains_box() {
        let map = Rect::new(0, 0, 100, 50);
        assert!(map.contains_box(Point::new(0.0, 0.0), Point::new(100.0, 50.0)));
        assert!(!map.contains_box(Point::new(-0.5, 0.0), Point::new(10.0, 10.0)));
        assert!(!map.contains_box(Point::new(0.0, 0.0), Point::new(10.0, 50.5)));
    }
}
