//! Rasterising the graph: land mask, coastline, region borders, rivers and
//! the per-pixel region index.

use image::{GenericImage, GrayImage, Luma, RgbaImage};

use super::{CenterId, TerrainGraph};
use crate::raster::{draw_thick_line, fill_polygon, rgba, scan_polygon};
use crate::settings::Color;
use crate::tilemap::Tilemap;

const WHITE: Luma<u8> = Luma([255]);
const BLACK: Luma<u8> = Luma([0]);

impl TerrainGraph {
    /// White where there is land, black where there is water.
    pub fn land_mask(&self) -> GrayImage {
        let mut mask = GrayImage::new(self.width, self.height);
        self.draw_land_mask(&mut mask, self.center_ids());
        mask
    }

    /// Redraw the given centers into an existing land mask.
    pub fn draw_land_mask(&self, mask: &mut GrayImage, centers: impl IntoIterator<Item = CenterId>) {
        for id in centers {
            let pixel = if self.center(id).water { BLACK } else { WHITE };
            fill_polygon(mask, &self.polygon(id), pixel);
        }
    }

    /// Coastline strokes in white on black.
    pub fn coastline_mask(&self, size_multiplier: f64) -> GrayImage {
        let mut mask = GrayImage::new(self.width, self.height);
        self.draw_coastline(&mut mask, WHITE, size_multiplier);
        mask
    }

    pub fn draw_coastline<I: GenericImage>(&self, img: &mut I, pixel: I::Pixel, size_multiplier: f64) {
        let width = size_multiplier.max(1.0);
        for edge in self.edges.iter().filter(|e| self.is_coast_edge(e)) {
            if let (Some(a), Some(b)) = (edge.v0, edge.v1) {
                draw_thick_line(img, self.corner(a).loc, self.corner(b).loc, width, pixel);
            }
        }
    }

    pub fn draw_region_borders<I: GenericImage>(&self, img: &mut I, pixel: I::Pixel, size_multiplier: f64) {
        let width = size_multiplier.max(1.0);
        for edge in self.edges.iter().filter(|e| self.is_region_border(e)) {
            if let (Some(a), Some(b)) = (edge.v0, edge.v1) {
                draw_thick_line(img, self.corner(a).loc, self.corner(b).loc, width, pixel);
            }
        }
    }

    /// Stroke every river edge, `river * size_multiplier` wide but never
    /// thinner than a pixel.
    pub fn draw_rivers(&self, img: &mut RgbaImage, color: Color, size_multiplier: f64) {
        let pixel = rgba(color);
        for edge in self.edges.iter().filter(|e| e.river > 0) {
            if let (Some(a), Some(b)) = (edge.v0, edge.v1) {
                let width = (edge.river as f64 * size_multiplier).max(1.0);
                draw_thick_line(img, self.corner(a).loc, self.corner(b).loc, width, pixel);
            }
        }
    }

    /// For each pixel on land, the position of its center's region in
    /// `regions`. Water and unknown regions map to `None`.
    pub fn region_indexes(&self, regions: &[u32]) -> Tilemap<Option<usize>> {
        let mut indexes = Tilemap::new_with(self.width as usize, self.height as usize, None);
        for id in self.center_ids() {
            let center = self.center(id);
            if center.water {
                continue;
            }
            let index = center
                .region
                .and_then(|r| regions.iter().position(|&known| known == r));
            if index.is_none() {
                continue;
            }
            scan_polygon(&self.polygon(id), self.width, self.height, |x, y| {
                indexes.set(x as usize, y as usize, index);
            });
        }
        indexes
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::fixtures::grid;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_land_mask_follows_water_flags() {
        let graph = grid(2, 1, 10.0, |x, _| x == 1);
        let mask = graph.land_mask();
        assert_eq!(mask.get_pixel(5, 5)[0], 255);
        assert_eq!(mask.get_pixel(15, 5)[0], 0);
    }

    #[test]
    fn test_redraw_only_listed_centers() {
        let mut graph = grid(2, 1, 10.0, |_, _| false);
        let mut mask = graph.land_mask();
        graph.centers[0].water = true;
        graph.centers[1].water = true;
        graph.draw_land_mask(&mut mask, [crate::graph::CenterId(0)]);
        assert_eq!(mask.get_pixel(5, 5)[0], 0);
        assert_eq!(mask.get_pixel(15, 5)[0], 255);
    }

    #[test]
    fn test_coastline_runs_between_land_and_water() {
        let graph = grid(2, 1, 10.0, |x, _| x == 1);
        let mask = graph.coastline_mask(1.0);
        assert_eq!(mask.get_pixel(9, 5)[0], 255);
        assert_eq!(mask.get_pixel(3, 5)[0], 0);
    }

    #[test]
    fn test_rivers_are_drawn() {
        let mut graph = grid(2, 1, 10.0, |_, _| false);
        let shared = graph
            .edges
            .iter()
            .position(|e| e.d0.is_some() && e.d1.is_some())
            .unwrap();
        graph.edges[shared].river = 4;
        let mut img = RgbaImage::from_pixel(20, 10, Rgba([0, 0, 0, 255]));
        graph.draw_rivers(&mut img, [0, 0, 255], 0.5);
        assert_eq!(img.get_pixel(10, 5)[2], 255);
        assert_eq!(img.get_pixel(2, 5)[2], 0);
    }

    #[test]
    fn test_region_indexes_skip_water() {
        let mut graph = grid(3, 1, 10.0, |x, _| x == 2);
        graph.centers[1].region = Some(4);
        let idx = graph.region_indexes(&[4, 0]);
        assert_eq!(*idx.get(5, 5), Some(1));
        assert_eq!(*idx.get(15, 5), Some(0));
        assert_eq!(*idx.get(25, 5), None);
    }
}
