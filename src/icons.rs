//! Map icons.
//!
//! Icon placement is a collaborator of the renderer: it decides where icons
//! go (and which mountains form nameable groups) once, so the decision can be
//! cached and redrawn on later runs.

use std::collections::{BTreeSet, VecDeque};

use image::RgbaImage;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::geometry::Point;
use crate::graph::{CenterId, TerrainGraph};
use crate::raster::{fill_polygon, rgba};
use crate::settings::Color;

/// One icon to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct Icon {
    pub center: CenterId,
    /// Bottom middle of the icon.
    pub base: Point,
    pub width: f64,
    pub height: f64,
}

/// Result of icon placement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IconLayout {
    pub icons: Vec<Icon>,
    /// Connected groups of mountain centers, used for naming.
    pub mountain_groups: Vec<BTreeSet<CenterId>>,
}

pub trait IconPlacer {
    /// Decide where icons go. All randomness comes from `seed`.
    fn place(&self, graph: &TerrainGraph, seed: u64) -> IconLayout;

    /// Draw a placed layout.
    fn draw(&self, layout: &IconLayout, map: &mut RgbaImage, color: Color);
}

/// Marks high land as mountains and draws each as a filled peak.
#[derive(Clone, Debug, PartialEq)]
pub struct MountainPlacer {
    /// Land centers at or above this elevation are mountains.
    pub min_elevation: f64,
    /// Peak width at a size multiplier of 1.
    pub base_width: f64,
}

impl Default for MountainPlacer {
    fn default() -> Self {
        Self {
            min_elevation: 0.8,
            base_width: 24.0,
        }
    }
}

impl MountainPlacer {
    fn is_mountain(&self, graph: &TerrainGraph, id: CenterId) -> bool {
        let c = graph.center(id);
        !c.water && c.elevation >= self.min_elevation
    }

    /// Connected components of mountain centers, in order of their lowest
    /// center index.
    pub fn mountain_groups(&self, graph: &TerrainGraph) -> Vec<BTreeSet<CenterId>> {
        let mut seen = vec![false; graph.centers.len()];
        let mut groups = Vec::new();
        for start in graph.center_ids() {
            if seen[start.0] || !self.is_mountain(graph, start) {
                continue;
            }
            let mut group = BTreeSet::new();
            let mut queue = VecDeque::from([start]);
            seen[start.0] = true;
            while let Some(id) = queue.pop_front() {
                group.insert(id);
                for &n in &graph.center(id).neighbors {
                    if !seen[n.0] && self.is_mountain(graph, n) {
                        seen[n.0] = true;
                        queue.push_back(n);
                    }
                }
            }
            groups.push(group);
        }
        groups
    }
}

impl IconPlacer for MountainPlacer {
    fn place(&self, graph: &TerrainGraph, seed: u64) -> IconLayout {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let s = graph.size_multiplier();
        let mountain_groups = self.mountain_groups(graph);

        let mut icons = Vec::new();
        for group in &mountain_groups {
            for &id in group {
                let c = graph.center(id);
                let width = self.base_width * s * rng.gen_range(0.8..1.2);
                let jitter = Point::new(rng.gen_range(-0.15..0.15) * width, rng.gen_range(-0.15..0.15) * width);
                icons.push(Icon {
                    center: id,
                    base: Point::new(c.loc.x + jitter.x, c.loc.y + width * 0.35 + jitter.y),
                    width,
                    height: width * 0.8,
                });
            }
        }

        debug!(icons = icons.len(), groups = mountain_groups.len(), "placed mountains");
        IconLayout { icons, mountain_groups }
    }

    fn draw(&self, layout: &IconLayout, map: &mut RgbaImage, color: Color) {
        let pixel = rgba(color);
        // Draw from the top of the map down so nearer peaks overlap farther ones.
        let mut order: Vec<&Icon> = layout.icons.iter().collect();
        order.sort_by(|a, b| a.base.y.total_cmp(&b.base.y));
        for icon in order {
            let half = icon.width / 2.0;
            let peak = [
                Point::new(icon.base.x - half, icon.base.y),
                Point::new(icon.base.x, icon.base.y - icon.height),
                Point::new(icon.base.x + half, icon.base.y),
            ];
            fill_polygon(map, &peak, pixel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::grid;
    use image::Rgba;

    fn raised(cells: &[usize]) -> TerrainGraph {
        let mut graph = grid(6, 4, 256.0, |_, _| false);
        for &i in cells {
            graph.centers[i].elevation = 0.9;
        }
        graph
    }

    #[test]
    fn test_groups_are_connected_components() {
        // Cells 0,1 touch; cell 3 is alone; cell 9 sits below 3.
        let graph = raised(&[0, 1, 3, 9]);
        let groups = MountainPlacer::default().mountain_groups(&graph);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].iter().map(|c| c.0).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(groups[1].iter().map(|c| c.0).collect::<Vec<_>>(), vec![3, 9]);
    }

    #[test]
    fn test_water_is_never_a_mountain() {
        let mut graph = raised(&[0]);
        graph.centers[0].water = true;
        assert!(MountainPlacer::default().mountain_groups(&graph).is_empty());
    }

    #[test]
    fn test_placement_is_seeded() {
        let graph = raised(&[0, 1, 3]);
        let placer = MountainPlacer::default();
        assert_eq!(placer.place(&graph, 5), placer.place(&graph, 5));
        assert_ne!(placer.place(&graph, 5).icons, placer.place(&graph, 6).icons);
    }

    #[test]
    fn test_draw_paints_peaks() {
        let graph = raised(&[7]);
        let placer = MountainPlacer::default();
        let layout = placer.place(&graph, 1);
        let mut map = RgbaImage::from_pixel(graph.width, graph.height, Rgba([255, 255, 255, 255]));
        placer.draw(&layout, &mut map, [10, 20, 30]);
        assert!(map.pixels().any(|p| *p == Rgba([10, 20, 30, 255])));
    }
}
