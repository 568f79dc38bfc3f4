//! Decorative frame around the finished map, the frayed edge cutout and the
//! grunge overlay.
//!
//! Border art lives in one directory per border type. Each piece is found by
//! a file name substring (`upper_left_corner.`, `top_edge.`, ...). Missing
//! pieces are made by flipping or rotating a sibling.

use std::path::{Path, PathBuf};

use image::{imageops, GrayImage, Luma, RgbaImage};
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use tracing::debug;

use crate::background::cloud_noise;
use crate::error::{MapError, Result};
use crate::raster::{
    convolve_grayscale, extract_region, mask_with_color, orient, scale_by_height, scale_by_width,
    set_alpha_from_mask, Kernel, Orient,
};
use crate::settings::Color;

/// Offset added to the background seed for the grunge clouds.
pub const GRUNGE_SEED_OFFSET: u64 = 104_567;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameCorner {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

impl FrameCorner {
    pub const ALL: [FrameCorner; 4] = [
        FrameCorner::UpperLeft,
        FrameCorner::UpperRight,
        FrameCorner::LowerLeft,
        FrameCorner::LowerRight,
    ];

    pub fn pattern(self) -> &'static str {
        match self {
            FrameCorner::UpperLeft => "upper_left_corner.",
            FrameCorner::UpperRight => "upper_right_corner.",
            FrameCorner::LowerLeft => "lower_left_corner.",
            FrameCorner::LowerRight => "lower_right_corner.",
        }
    }

    /// Turns the upper left corner into this one. Every entry is its own
    /// inverse, so it also turns this corner into the upper left.
    fn from_upper_left(self) -> Option<Orient> {
        match self {
            FrameCorner::UpperLeft => None,
            FrameCorner::UpperRight => Some(Orient::FlipHorizontal),
            FrameCorner::LowerLeft => Some(Orient::FlipVertical),
            FrameCorner::LowerRight => Some(Orient::FlipBoth),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameEdge {
    Top,
    Bottom,
    Left,
    Right,
}

impl FrameEdge {
    pub const ALL: [FrameEdge; 4] = [FrameEdge::Top, FrameEdge::Bottom, FrameEdge::Left, FrameEdge::Right];

    pub fn pattern(self) -> &'static str {
        match self {
            FrameEdge::Top => "top_edge.",
            FrameEdge::Bottom => "bottom_edge.",
            FrameEdge::Left => "left_edge.",
            FrameEdge::Right => "right_edge.",
        }
    }

    fn from_top(self) -> Option<Orient> {
        match self {
            FrameEdge::Top => None,
            FrameEdge::Bottom => Some(Orient::FlipVertical),
            FrameEdge::Left => Some(Orient::CounterClockwise),
            FrameEdge::Right => Some(Orient::Clockwise),
        }
    }

    fn to_top(self) -> Option<Orient> {
        match self {
            FrameEdge::Top => None,
            FrameEdge::Bottom => Some(Orient::FlipVertical),
            FrameEdge::Left => Some(Orient::Clockwise),
            FrameEdge::Right => Some(Orient::CounterClockwise),
        }
    }

    fn is_horizontal(self) -> bool {
        matches!(self, FrameEdge::Top | FrameEdge::Bottom)
    }
}

fn reorient(img: &RgbaImage, how: Option<Orient>) -> RgbaImage {
    match how {
        Some(how) => orient(img, how),
        None => img.clone(),
    }
}

/// The single file in `dir` whose name contains `pattern`.
pub fn find_art(dir: &Path, pattern: &str) -> Result<Option<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| MapError::io(dir, e))?;
    let mut found = None;
    for entry in entries {
        let entry = entry.map_err(|e| MapError::io(dir, e))?;
        if !entry.file_name().to_string_lossy().contains(pattern) {
            continue;
        }
        if found.is_some() {
            return Err(MapError::AssetAmbiguity {
                pattern: pattern.to_string(),
                dir: dir.to_path_buf(),
            });
        }
        found = Some(entry.path());
    }
    Ok(found)
}

fn load_art(dir: &Path, pattern: &str) -> Result<Option<RgbaImage>> {
    match find_art(dir, pattern)? {
        Some(path) => Ok(Some(image::open(path)?.to_rgba8())),
        None => Ok(None),
    }
}

/// Corner and edge images scaled to the border width.
#[derive(Clone, Debug)]
pub struct BorderArt {
    pub width: u32,
    corners: Vec<RgbaImage>,
    edges: Vec<RgbaImage>,
}

impl BorderArt {
    pub fn load(dir: &Path, width: u32) -> Result<Self> {
        let mut corners = FrameCorner::ALL
            .iter()
            .map(|c| load_art(dir, c.pattern()))
            .collect::<Result<Vec<_>>>()?;
        let upper_left = corners[0].take();
        let upper_left = match upper_left {
            Some(img) => img,
            None => corners
                .iter()
                .zip(FrameCorner::ALL)
                .find_map(|(img, c)| img.as_ref().map(|img| reorient(img, c.from_upper_left())))
                .ok_or_else(|| MapError::MissingBorderArt {
                    dir: dir.to_path_buf(),
                    part: "corner",
                })?,
        };
        let corners = FrameCorner::ALL
            .iter()
            .zip(corners)
            .map(|(&c, img)| {
                let img = img.unwrap_or_else(|| reorient(&upper_left, c.from_upper_left()));
                scale_by_width(&img, width)
            })
            .collect();

        let mut edges = FrameEdge::ALL
            .iter()
            .map(|e| load_art(dir, e.pattern()))
            .collect::<Result<Vec<_>>>()?;
        let top = edges[0].take();
        let top = match top {
            Some(img) => img,
            None => [FrameEdge::Right, FrameEdge::Left, FrameEdge::Bottom]
                .into_iter()
                .find_map(|e| edges[e as usize].as_ref().map(|img| reorient(img, e.to_top())))
                .ok_or_else(|| MapError::MissingBorderArt {
                    dir: dir.to_path_buf(),
                    part: "edge",
                })?,
        };
        let edges = FrameEdge::ALL
            .iter()
            .zip(edges)
            .map(|(&e, img)| {
                let img = img.unwrap_or_else(|| reorient(&top, e.from_top()));
                if e.is_horizontal() {
                    scale_by_height(&img, width)
                } else {
                    scale_by_width(&img, width)
                }
            })
            .collect();

        debug!(dir = %dir.display(), width, "loaded border art");
        Ok(Self { width, corners, edges })
    }

    pub fn corner(&self, corner: FrameCorner) -> &RgbaImage {
        &self.corners[corner as usize]
    }

    pub fn edge(&self, edge: FrameEdge) -> &RgbaImage {
        &self.edges[edge as usize]
    }

    /// Put `map` inside a frame. `background` is the canvas, already the
    /// framed size (map size plus the border width on every side).
    pub fn frame(&self, map: &RgbaImage, mut background: RgbaImage) -> RgbaImage {
        let bw = self.width;
        let (fw, fh) = background.dimensions();
        imageops::replace(&mut background, map, bw as i64, bw as i64);

        let far_x = fw.saturating_sub(bw);
        let far_y = fh.saturating_sub(bw);
        tile_along(&mut background, self.edge(FrameEdge::Top), true, bw, far_x, 0);
        tile_along(&mut background, self.edge(FrameEdge::Bottom), true, bw, far_x, far_y as i64);
        tile_along(&mut background, self.edge(FrameEdge::Left), false, bw, far_y, 0);
        tile_along(&mut background, self.edge(FrameEdge::Right), false, bw, far_y, far_x as i64);

        for (corner, x, y) in [
            (FrameCorner::UpperLeft, 0, 0),
            (FrameCorner::UpperRight, far_x, 0),
            (FrameCorner::LowerLeft, 0, far_y),
            (FrameCorner::LowerRight, far_x, far_y),
        ] {
            imageops::overlay(&mut background, self.corner(corner), x as i64, y as i64);
        }
        background
    }
}

/// Repeat `tile` from `start` up to `end` along one axis, cropping the last
/// copy. `fixed` is the position on the other axis.
fn tile_along(dst: &mut RgbaImage, tile: &RgbaImage, horizontal: bool, start: u32, end: u32, fixed: i64) {
    let step = if horizontal { tile.width() } else { tile.height() };
    if step == 0 {
        return;
    }
    let mut pos = start;
    while pos < end {
        let len = step.min(end - pos);
        let (piece, x, y) = if horizontal {
            (extract_region(tile, 0, 0, len, tile.height()), pos as i64, fixed)
        } else {
            (extract_region(tile, 0, 0, tile.width(), len), fixed, pos as i64)
        };
        imageops::overlay(dst, &piece, x, y);
        pos += len;
    }
}

/// Distance in pixels from `(x, y)` to the nearest image edge.
fn edge_distance(x: u32, y: u32, width: u32, height: u32) -> u32 {
    x.min(y).min(width - 1 - x).min(height - 1 - y)
}

/// White along an irregular band at the image edges, black inside.
///
/// The band is about `depth` pixels deep; fractal noise pushes it in and out
/// by up to half that.
pub fn frayed_mask(width: u32, height: u32, depth: f64, seed: u64) -> GrayImage {
    let fbm: Fbm<Perlin> = Fbm::new(seed as u32).set_octaves(4);
    let frequency = 1.0 / depth.max(1.0);
    GrayImage::from_fn(width, height, |x, y| {
        let d = edge_distance(x, y, width, height) as f64;
        if d >= depth * 1.5 {
            return Luma([0]);
        }
        let n = fbm.get([x as f64 * frequency, y as f64 * frequency]).clamp(-1.0, 1.0);
        if d < depth * (1.0 + 0.5 * n) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Cut a frayed edge out of `map`: the band is tinted with `color` through
/// a blurred copy of the mask, then made transparent.
pub fn apply_frayed_edge(map: &RgbaImage, depth: f64, blur: usize, color: Color, seed: u64) -> RgbaImage {
    let mask = frayed_mask(map.width(), map.height(), depth, seed);
    let mut out = if blur > 0 {
        let blurred = convolve_grayscale(&mask, &Kernel::gaussian(blur), true);
        mask_with_color(map, color, &blurred, true)
    } else {
        mask_with_color(map, color, &mask, true)
    };
    set_alpha_from_mask(&mut out, &mask, true);
    out
}

/// White at the image edges fading to black `width` pixels in.
pub fn edge_falloff(width: u32, height: u32, falloff: u32) -> GrayImage {
    let band = falloff / 2;
    let frame = GrayImage::from_fn(width, height, |x, y| {
        if edge_distance(x, y, width, height) < band {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    convolve_grayscale(&frame, &Kernel::gaussian(falloff as usize), true)
}

/// Darken the map edges with `color` in a cloudy pattern.
pub fn apply_grunge(map: &RgbaImage, falloff: u32, color: Color, background_seed: u64) -> Result<RgbaImage> {
    let (w, h) = map.dimensions();
    let clouds = cloud_noise(w, h, background_seed.wrapping_add(GRUNGE_SEED_OFFSET))?;
    let frame = edge_falloff(w, h, falloff);
    let mask = GrayImage::from_fn(w, h, |x, y| {
        let c = clouds.get_pixel(x, y)[0] as u32;
        let f = frame.get_pixel(x, y)[0] as u32;
        Luma([(c * f / 255) as u8])
    });
    Ok(mask_with_color(map, color, &mask, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    /// Upper left corner with a red top-left pixel; top edge blue on its
    /// upper half.
    fn write_minimal_art(dir: &Path) {
        let mut corner = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        corner.put_pixel(0, 0, RED);
        corner.save(dir.join("fancy_upper_left_corner.png")).unwrap();

        let top = RgbaImage::from_fn(6, 4, |_, y| if y < 2 { BLUE } else { Rgba([0, 0, 0, 255]) });
        top.save(dir.join("fancy_top_edge.png")).unwrap();
    }

    #[test]
    fn test_missing_pieces_are_derived() {
        let dir = tempfile::tempdir().unwrap();
        write_minimal_art(dir.path());
        let art = BorderArt::load(dir.path(), 4).unwrap();

        assert_eq!(art.corner(FrameCorner::UpperRight).get_pixel(3, 0), &RED);
        assert_eq!(art.corner(FrameCorner::LowerLeft).get_pixel(0, 3), &RED);
        assert_eq!(art.corner(FrameCorner::LowerRight).get_pixel(3, 3), &RED);

        // The outer side of each derived edge faces away from the map.
        assert_eq!(art.edge(FrameEdge::Bottom).get_pixel(0, 3), &BLUE);
        assert_eq!(art.edge(FrameEdge::Left).get_pixel(0, 0), &BLUE);
        assert_eq!(art.edge(FrameEdge::Right).get_pixel(3, 0), &BLUE);
        assert_eq!(art.edge(FrameEdge::Left).width(), 4);
    }

    #[test]
    fn test_top_edge_is_derived_from_right() {
        let dir = tempfile::tempdir().unwrap();
        let right = RgbaImage::from_fn(4, 6, |x, _| if x >= 2 { BLUE } else { Rgba([0, 0, 0, 255]) });
        right.save(dir.path().join("right_edge.png")).unwrap();
        RgbaImage::new(4, 4).save(dir.path().join("lower_right_corner.png")).unwrap();

        let art = BorderArt::load(dir.path(), 4).unwrap();
        assert_eq!(art.edge(FrameEdge::Top).get_pixel(0, 0), &BLUE);
        assert_eq!(art.edge(FrameEdge::Top).height(), 4);
    }

    #[test]
    fn test_two_matching_files_are_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        write_minimal_art(dir.path());
        RgbaImage::new(2, 2).save(dir.path().join("old_top_edge.png")).unwrap();
        assert!(matches!(
            BorderArt::load(dir.path(), 4),
            Err(MapError::AssetAmbiguity { pattern, .. }) if pattern == "top_edge."
        ));
    }

    #[test]
    fn test_no_corner_art_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::new(2, 2).save(dir.path().join("top_edge.png")).unwrap();
        assert!(matches!(
            BorderArt::load(dir.path(), 4),
            Err(MapError::MissingBorderArt { part: "corner", .. })
        ));
    }

    #[test]
    fn test_frame_keeps_map_inside_border() {
        let dir = tempfile::tempdir().unwrap();
        write_minimal_art(dir.path());
        let art = BorderArt::load(dir.path(), 4).unwrap();

        let map = RgbaImage::from_pixel(10, 7, Rgba([9, 9, 9, 255]));
        let framed = art.frame(&map, RgbaImage::new(18, 15));
        assert_eq!(framed.dimensions(), (18, 15));
        assert_eq!(framed.get_pixel(4, 4), &Rgba([9, 9, 9, 255]));
        assert_eq!(framed.get_pixel(13, 10), &Rgba([9, 9, 9, 255]));
        assert_eq!(framed.get_pixel(0, 0), &RED);
        assert_eq!(framed.get_pixel(17, 14), &RED);
        // Edge tiles run right up to the far corner.
        assert_eq!(framed.get_pixel(13, 0), &BLUE);
    }

    #[test]
    fn test_frayed_edge_is_transparent_at_the_rim() {
        let map = RgbaImage::from_pixel(60, 40, Rgba([200, 200, 200, 255]));
        let out = apply_frayed_edge(&map, 5.0, 3, [10, 10, 10], 7);
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(30, 20), &Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn test_grunge_touches_only_edges() {
        let map = RgbaImage::from_pixel(80, 60, Rgba([200, 200, 200, 255]));
        let out = apply_grunge(&map, 10, [0, 0, 0], 3).unwrap();
        assert_eq!(out.get_pixel(40, 30), &Rgba([200, 200, 200, 255]));
        assert!((0..80).any(|x| out.get_pixel(x, 0)[0] < 200));
    }
}
