//! Land, ocean and border backgrounds, region colours and cloud noise.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::error::{MapError, Result};
use crate::graph::TerrainGraph;
use crate::parallel::{process_in_parallel, worker_count};
use crate::raster::rgba;
use crate::settings::{Color, MapSettings};
use crate::tilemap::Tilemap;

/// Land and ocean rasters at map size.
#[derive(Clone, Debug, PartialEq)]
pub struct Background {
    pub land: RgbaImage,
    pub ocean: RgbaImage,
}

/// Region ids in drawing order and their colours.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionPalette {
    pub ids: Vec<u32>,
    pub colors: Vec<Color>,
}

impl RegionPalette {
    /// One colour per region: the edited colour if any, else the region's
    /// own, else a jitter of the land colour drawn from the regions seed.
    /// Jitter is drawn for every region, edited or not.
    pub fn generate(graph: &TerrainGraph, settings: &MapSettings) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(settings.regions_random_seed);
        let ids: Vec<u32> = graph.region_ids().into_iter().collect();
        let colors = ids
            .iter()
            .map(|&id| {
                let jittered = jitter_color(
                    &mut rng,
                    settings.land_color,
                    settings.hue_range,
                    settings.saturation_range,
                    settings.brightness_range,
                );
                settings
                    .edits
                    .region_color(id)
                    .or_else(|| graph.region(id).and_then(|r| r.color))
                    .unwrap_or(jittered)
            })
            .collect();
        Self { ids, colors }
    }

    /// Colours scaled towards black, for the blur along region borders.
    pub fn darkened(&self, factor: f64) -> Vec<Color> {
        self.colors
            .iter()
            .map(|c| c.map(|v| (v as f64 * factor) as u8))
            .collect()
    }
}

impl Background {
    /// Load the configured background images, or flat colours where none is
    /// given, resized to `width` x `height`.
    pub fn load(settings: &MapSettings, width: u32, height: u32) -> Result<Self> {
        let land_source = load_optional(settings.land_background_image.as_deref())?;
        let ocean_source = load_optional(settings.ocean_background_image.as_deref())?;
        if let (Some(land), Some(ocean)) = (&land_source, &ocean_source) {
            if land.dimensions() != ocean.dimensions() {
                return Err(MapError::DimensionMismatch {
                    land: land.dimensions(),
                    ocean: ocean.dimensions(),
                });
            }
        }

        let fit = |source: Option<RgbaImage>, color: Color| match source {
            Some(img) if img.dimensions() == (width, height) => img,
            Some(img) => imageops::resize(&img, width, height, FilterType::Triangle),
            None => RgbaImage::from_pixel(width, height, rgba(color)),
        };
        let land = fit(land_source, settings.land_color);
        let ocean = fit(ocean_source, settings.ocean_color);
        debug!(width, height, "background ready");
        Ok(Self { land, ocean })
    }

    /// Tint each land pixel by its region's colour, keeping the texture's
    /// variation relative to the plain land colour. Pixels outside any
    /// listed region keep the texture.
    pub fn region_colored(&self, graph: &TerrainGraph, palette: &RegionPalette, land_color: Color) -> RgbaImage {
        let indexes: Tilemap<Option<usize>> = graph.region_indexes(&palette.ids);
        RgbaImage::from_fn(self.land.width(), self.land.height(), |x, y| {
            let t = self.land.get_pixel(x, y);
            match indexes.try_get(x as i64, y as i64).copied().flatten() {
                Some(i) => {
                    let region = palette.colors[i];
                    let channel = |c: usize| {
                        let ratio = t[c] as f64 / land_color[c].max(1) as f64;
                        (region[c] as f64 * ratio).round().clamp(0.0, 255.0) as u8
                    };
                    Rgba([channel(0), channel(1), channel(2), t[3]])
                }
                None => *t,
            }
        })
    }

    /// Canvas for the border frame: the land texture stretched to the
    /// framed size.
    pub fn border_background(&self, width: u32, height: u32) -> RgbaImage {
        imageops::resize(&self.land, width, height, FilterType::Triangle)
    }
}

fn load_optional(path: Option<&Path>) -> Result<Option<RgbaImage>> {
    match path {
        Some(path) => Ok(Some(image::open(path)?.to_rgba8())),
        None => Ok(None),
    }
}

/// Random colour near `base`: hue moves by up to half of `hue_range`
/// degrees, saturation and brightness by up to half their range on a
/// 0..=255 scale.
pub fn jitter_color(
    rng: &mut ChaCha8Rng,
    base: Color,
    hue_range: f64,
    saturation_range: f64,
    brightness_range: f64,
) -> Color {
    let (h, s, v) = rgb_to_hsv(base);
    let hue = (h + (rng.gen::<f64>() - 0.5) * hue_range).rem_euclid(360.0);
    let sat = (s * 255.0 + (rng.gen::<f64>() - 0.5) * saturation_range).clamp(0.0, 255.0) / 255.0;
    let val = (v * 255.0 + (rng.gen::<f64>() - 0.5) * brightness_range).clamp(0.0, 255.0) / 255.0;
    hsv_to_rgb(hue, sat, val)
}

/// Hue in degrees, saturation and value in `0.0..=1.0`.
pub fn rgb_to_hsv(color: Color) -> (f64, f64, f64) {
    let [r, g, b] = color.map(|c| c as f64 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let sat = if max == 0.0 { 0.0 } else { delta / max };
    (hue, sat, max)
}

pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Color {
    let h = h.rem_euclid(360.0);
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r, g, b].map(|ch| ((ch + m) * 255.0).round() as u8)
}

/// Fractal cloud noise in `0..=255`, stretched to the full range.
///
/// Rows are generated in bands on the worker pool.
pub fn cloud_noise(width: u32, height: u32, seed: u64) -> Result<GrayImage> {
    let fbm: Fbm<Perlin> = Fbm::new(seed as u32).set_octaves(6).set_persistence(0.55);
    // Features about a quarter of the shorter side across.
    let frequency = 4.0 / width.min(height).max(1) as f64;

    let bands = worker_count().max(1) as u32;
    let band_height = height.div_ceil(bands).max(1);
    let jobs: Vec<_> = (0..height)
        .step_by(band_height as usize)
        .map(|y0| {
            let fbm = fbm.clone();
            move || -> Result<Vec<f64>> {
                let y1 = (y0 + band_height).min(height);
                let mut values = Vec::with_capacity(((y1 - y0) * width) as usize);
                for y in y0..y1 {
                    for x in 0..width {
                        values.push(fbm.get([x as f64 * frequency, y as f64 * frequency]));
                    }
                }
                Ok(values)
            }
        })
        .collect();
    let values: Vec<f64> = process_in_parallel(jobs)?.into_iter().flatten().collect();

    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = (hi - lo).max(f64::EPSILON);
    Ok(GrayImage::from_fn(width, height, |x, y| {
        let v = values[(y * width + x) as usize];
        Luma([(((v - lo) / range) * 255.0).round() as u8])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::grid;
    use crate::settings::RegionEdit;

    #[test]
    fn test_hsv_round_trip_of_known_colours() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [255, 0, 0]);
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), [0, 255, 0]);
        let (h, s, v) = rgb_to_hsv([0, 0, 255]);
        assert_eq!((h, s, v), (240.0, 1.0, 1.0));
        let (h, s, v) = rgb_to_hsv([214, 196, 150]);
        assert_eq!(hsv_to_rgb(h, s, v), [214, 196, 150]);
    }

    #[test]
    fn test_jitter_stays_near_base() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let base = [120, 140, 90];
        for _ in 0..20 {
            let c = jitter_color(&mut rng, base, 16.0, 25.0, 25.0);
            for i in 0..3 {
                assert!((c[i] as i32 - base[i] as i32).abs() < 40);
            }
        }
    }

    #[test]
    fn test_flat_backgrounds_and_region_tint() {
        let mut graph = grid(2, 1, 10.0, |_, _| false);
        graph.centers[1].region = Some(5);
        let settings = MapSettings {
            draw_region_colors: true,
            edits: crate::settings::MapEdits {
                center_edits: Vec::new(),
                region_edits: vec![RegionEdit { region_id: 5, color: [10, 200, 10] }],
            },
            ..MapSettings::default()
        };
        let bg = Background::load(&settings, graph.width, graph.height).unwrap();
        assert_eq!(bg.ocean.dimensions(), (20, 10));
        assert_eq!(bg.land.get_pixel(15, 5), &rgba(settings.land_color));

        let palette = RegionPalette::generate(&graph, &settings);
        assert_eq!(palette.ids, vec![0, 5]);
        let land = bg.region_colored(&graph, &palette, settings.land_color);
        assert_eq!(land.get_pixel(15, 5), &Rgba([10, 200, 10, 255]));
    }

    #[test]
    fn test_palette_ignores_later_edits() {
        let mut graph = grid(3, 1, 10.0, |_, _| false);
        graph.centers[1].region = Some(1);
        graph.centers[2].region = Some(2);
        let plain = RegionPalette::generate(&graph, &MapSettings::default());

        let mut settings = MapSettings::default();
        settings.edits.region_edits.push(RegionEdit { region_id: 1, color: [1, 2, 3] });
        let edited = RegionPalette::generate(&graph, &settings);
        assert_eq!(edited.colors[1], [1, 2, 3]);
        assert_eq!(edited.colors[0], plain.colors[0]);
        assert_eq!(edited.colors[2], plain.colors[2]);
    }

    #[test]
    fn test_mismatched_images_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let land = dir.path().join("land.png");
        let ocean = dir.path().join("ocean.png");
        RgbaImage::new(8, 8).save(&land).unwrap();
        RgbaImage::new(8, 6).save(&ocean).unwrap();
        let settings = MapSettings {
            land_background_image: Some(land),
            ocean_background_image: Some(ocean),
            ..MapSettings::default()
        };
        assert!(matches!(
            Background::load(&settings, 8, 8),
            Err(MapError::DimensionMismatch { land: (8, 8), ocean: (8, 6) })
        ));
    }

    #[test]
    fn test_cloud_noise_is_seeded_and_full_range() {
        let a = cloud_noise(64, 37, 11).unwrap();
        let b = cloud_noise(64, 37, 11).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.pixels().map(|p| p[0]).max(), Some(255));
        assert_eq!(a.pixels().map(|p| p[0]).min(), Some(0));
    }
}
