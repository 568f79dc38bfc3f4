//! Nearest-site lookup over a bucket grid.

use crate::geometry::Point;
use crate::tilemap::Tilemap;

/// Maps a pixel position to the site of the polygon containing it.
pub trait SiteLookup {
    /// The site nearest to `p`, or `None` when `p` is off the map.
    fn site_at(&self, p: Point) -> Option<Point>;
}

/// Buckets sites into square cells so a nearest-site query only scans the
/// cells around the query point.
#[derive(Clone, Debug)]
pub struct CenterLocator {
    width: f64,
    height: f64,
    cell: f64,
    sites: Vec<Point>,
    buckets: Tilemap<Vec<usize>>,
}

impl CenterLocator {
    pub fn new(width: u32, height: u32, sites: impl IntoIterator<Item = Point>) -> Self {
        let sites: Vec<Point> = sites.into_iter().collect();
        let (w, h) = (width.max(1) as f64, height.max(1) as f64);
        // Aim for about two sites per bucket.
        let cell = ((w * h * 2.0) / sites.len().max(1) as f64).sqrt().max(1.0);
        let cols = (w / cell).ceil() as usize;
        let rows = (h / cell).ceil() as usize;

        let mut buckets: Tilemap<Vec<usize>> = Tilemap::new(cols.max(1), rows.max(1));
        for (i, p) in sites.iter().enumerate() {
            let (bx, by) = bucket_of(*p, cell, buckets.width, buckets.height);
            buckets.get_mut(bx, by).push(i);
        }

        Self {
            width: width as f64,
            height: height as f64,
            cell,
            sites,
            buckets,
        }
    }

    /// Index of the site nearest to `p`. Equal distances resolve to the lower
    /// index. `None` off the map or when there are no sites.
    pub fn nearest(&self, p: Point) -> Option<usize> {
        if p.x < 0.0 || p.y < 0.0 || p.x >= self.width || p.y >= self.height || self.sites.is_empty() {
            return None;
        }
        let (cx, cy) = bucket_of(p, self.cell, self.buckets.width, self.buckets.height);
        let (cx, cy) = (cx as i64, cy as i64);
        let max_ring = self.buckets.width.max(self.buckets.height) as i64;

        let mut best: Option<(f64, usize)> = None;
        for ring in 0..=max_ring {
            for by in (cy - ring)..=(cy + ring) {
                for bx in (cx - ring)..=(cx + ring) {
                    if (bx - cx).abs() != ring && (by - cy).abs() != ring {
                        continue;
                    }
                    let Some(bucket) = self.buckets.try_get(bx, by) else {
                        continue;
                    };
                    for &i in bucket {
                        let d = self.sites[i].distance(&p);
                        let better = match best {
                            None => true,
                            Some((bd, bi)) => d < bd || (d == bd && i < bi),
                        };
                        if better {
                            best = Some((d, i));
                        }
                    }
                }
            }
            // Anything in the next ring is at least `ring * cell` away.
            if let Some((bd, _)) = best {
                if bd < ring as f64 * self.cell {
                    break;
                }
            }
        }
        best.map(|(_, i)| i)
    }
}

fn bucket_of(p: Point, cell: f64, cols: usize, rows: usize) -> (usize, usize) {
    let bx = ((p.x / cell).floor().max(0.0) as usize).min(cols - 1);
    let by = ((p.y / cell).floor().max(0.0) as usize).min(rows - 1);
    (bx, by)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn brute_force(sites: &[Point], p: Point) -> usize {
        let mut best = 0;
        for (i, s) in sites.iter().enumerate() {
            if s.distance(&p) < sites[best].distance(&p) {
                best = i;
            }
        }
        best
    }

    #[test]
    fn test_off_map_is_none() {
        let locator = CenterLocator::new(10, 10, [Point::new(5.0, 5.0)]);
        assert_eq!(locator.nearest(Point::new(-0.1, 5.0)), None);
        assert_eq!(locator.nearest(Point::new(5.0, 10.0)), None);
        assert_eq!(locator.nearest(Point::new(9.9, 9.9)), Some(0));
    }

    #[test]
    fn test_tie_prefers_lower_index() {
        let locator = CenterLocator::new(10, 10, [Point::new(2.0, 5.0), Point::new(8.0, 5.0)]);
        assert_eq!(locator.nearest(Point::new(5.0, 5.0)), Some(0));
    }

    proptest! {
        #[test]
        fn prop_matches_brute_force(
            sites in prop::collection::vec((0.0f64..200.0, 0.0f64..100.0), 1..60),
            qx in 0.0f64..200.0,
            qy in 0.0f64..100.0,
        ) {
            let sites: Vec<Point> = sites.into_iter().map(|(x, y)| Point::new(x, y)).collect();
            let locator = CenterLocator::new(200, 100, sites.iter().copied());
            let q = Point::new(qx, qy);
            let found = locator.nearest(q).unwrap();
            let expected = brute_force(&sites, q);
            prop_assert!((sites[found].distance(&q) - sites[expected].distance(&q)).abs() < 1e-9);
        }
    }
}
