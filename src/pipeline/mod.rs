//! The map compositing pipeline.
//!
//! One run threads two rasters through a fixed sequence of stages: the map
//! itself and the land background (the map without icons, used for halos
//! behind text). Each stage finishes before the next starts.

mod cache;

pub use cache::MapParts;

use std::collections::BTreeSet;
use std::time::Instant;

use image::{GrayImage, Luma, RgbaImage};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::background::{Background, RegionPalette};
use crate::border::{apply_frayed_edge, apply_grunge, BorderArt};
use crate::error::{MapError, Result};
use crate::graph::TerrainGraph;
use crate::icons::{IconLayout, IconPlacer, MountainPlacer};
use crate::raster::{
    convolve_grayscale, mask_gray, mask_with_color, mask_with_image, mask_with_multiple_colors, rgba, Kernel,
};
use crate::settings::MapSettings;
use crate::text::{self, CommittedLabel, Corpus, CorpusNames};

/// Region colours are darkened by this much along coasts and region borders.
pub const REGION_BLUR_DARKENING: f64 = 0.7;

/// Output of one run.
#[derive(Clone, Debug)]
pub struct RenderedMap {
    pub map: RgbaImage,
    /// The map before icons and text, at map size (no border).
    pub land_background: RgbaImage,
    pub labels: Vec<CommittedLabel>,
}

/// Logs how long each stage took.
struct StageTimer {
    start: Instant,
    last: Instant,
}

impl StageTimer {
    fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now }
    }

    fn done(&mut self, stage: &str) {
        let now = Instant::now();
        debug!(stage, elapsed = (now - self.last).as_secs_f64(), "stage finished");
        self.last = now;
    }
}

/// Kernel size for a blur setting, truncated to whole pixels.
fn blur_size(amount: f64, size_multiplier: f64) -> usize {
    (amount * size_multiplier).max(0.0) as usize
}

/// Draws maps from a terrain graph and settings.
pub struct MapCreator<P: IconPlacer = MountainPlacer> {
    settings: MapSettings,
    icon_placer: P,
}

impl MapCreator<MountainPlacer> {
    pub fn new(settings: MapSettings) -> Self {
        Self {
            settings,
            icon_placer: MountainPlacer::default(),
        }
    }
}

impl<P: IconPlacer> MapCreator<P> {
    pub fn with_icon_placer(settings: MapSettings, icon_placer: P) -> Self {
        Self { settings, icon_placer }
    }

    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    /// Draw a map.
    ///
    /// `graph` is used when given, otherwise the cached graph in `parts`.
    /// With `parts`, cached stages are reused and the cache is refreshed
    /// with this run's results. A failed run leaves `parts` as it was.
    pub fn create(&self, graph: Option<TerrainGraph>, parts: Option<&mut MapParts>) -> Result<RenderedMap> {
        let settings = &self.settings;
        let mut timer = StageTimer::new();
        settings.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(settings.random_seed);
        let mut cache = parts.as_deref().cloned().unwrap_or_default();

        let mut graph = match (graph, cache.graph.take()) {
            (Some(graph), _) | (None, Some(graph)) => graph,
            (None, None) => {
                return Err(MapError::Configuration(
                    "no terrain graph was supplied and none is cached".into(),
                ))
            }
        };
        graph.validate()?;
        let (width, height) = (graph.width, graph.height);
        let s = graph.size_multiplier();

        info!("Loading background images.");
        let background = match cache.background.take() {
            Some(background) => background,
            None => Background::load(settings, width, height)?,
        };
        timer.done("background");

        let changed = graph.apply_edits(&settings.edits)?;
        timer.done("edits");

        let icon_seed = rng.next_u64();
        let icons = match cache.icons.take() {
            Some(icons) => icons,
            None => self.icon_placer.place(&graph, icon_seed),
        };

        info!("Drawing land.");
        let land_mask = match cache.land_mask.take() {
            Some(mut mask) => {
                let mut redraw: BTreeSet<_> = cache.centers_to_update.take().unwrap_or_default();
                redraw.extend(changed);
                debug!(centers = redraw.len(), "redrawing cached land mask");
                graph.draw_land_mask(&mut mask, redraw);
                mask
            }
            None => graph.land_mask(),
        };

        let palette = if settings.draw_region_colors {
            RegionPalette::generate(&graph, settings)
        } else {
            RegionPalette::default()
        };
        let land = if settings.draw_region_colors {
            background.region_colored(&graph, &palette, settings.land_color)
        } else {
            background.land.clone()
        };
        let mut map = mask_with_color(&land, [0, 0, 0], &land_mask, false);
        timer.done("land mask");

        let coastline = (settings.land_blur > 0.0 || settings.ocean_effects > 0.0).then(|| graph.coastline_mask(s));

        if let (Some(coastline), true) = (&coastline, settings.land_blur > 0.0) {
            info!("Darkening land near shores.");
            map = self.blur_land(&graph, map, coastline, &land_mask, &palette, s);
            timer.done("land blur");
        }

        let mut land_background = map.clone();

        if settings.draw_region_colors {
            graph.draw_region_borders(&mut map, rgba(settings.coastline_color), s);
        }

        info!("Adding rivers.");
        graph.draw_rivers(&mut map, settings.river_color, s / 2.0);

        info!("Adding mountains and hills.");
        self.icon_placer.draw(&icons, &mut map, settings.icon_color);
        timer.done("rivers and icons");

        info!("Drawing ocean.");
        if background.ocean.dimensions() != map.dimensions() {
            return Err(MapError::DimensionMismatch {
                land: map.dimensions(),
                ocean: background.ocean.dimensions(),
            });
        }
        map = mask_with_image(&map, &background.ocean, &land_mask);
        land_background = mask_with_image(&land_background, &background.ocean, &land_mask);

        if let (Some(coastline), true) = (&coastline, settings.ocean_effects > 0.0) {
            let size = blur_size(settings.ocean_effects, s);
            let kernel = if settings.add_waves_to_ocean {
                Kernel::positive_sinc(size, 1.0 / s)
            } else {
                Kernel::gaussian(size)
            };
            let blurred = convolve_grayscale(coastline, &kernel, true);
            let ocean_blur = mask_gray(&blurred, &land_mask, true);
            map = mask_with_color(&map, settings.ocean_effects_color, &ocean_blur, true);
            land_background = mask_with_color(&land_background, settings.ocean_effects_color, &ocean_blur, true);
        }
        timer.done("ocean");

        info!("Drawing coastlines.");
        let coast = rgba(settings.coastline_color);
        graph.draw_coastline(&mut map, coast, s);
        graph.draw_coastline(&mut land_background, coast, s);
        graph.draw_rivers(&mut land_background, settings.river_color, s / 2.0);
        timer.done("coastlines");

        let labels = if settings.draw_text {
            if settings.draw_region_colors {
                graph.draw_region_borders(&mut land_background, coast, s);
            }
            let corpus = Corpus::load(settings)?;
            let mut names = CorpusNames::new(ChaCha8Rng::seed_from_u64(settings.text_random_seed), corpus);
            let labels = text::draw_text(
                &graph,
                &mut map,
                &land_background,
                &icons.mountain_groups,
                settings,
                &mut names,
            )?;
            timer.done("text");
            labels
        } else {
            Vec::new()
        };

        let border_width = (settings.border_width * settings.resolution) as u32;
        if settings.draw_border && border_width > 0 {
            info!("Adding border.");
            let art = BorderArt::load(&settings.border_dir(), border_width)?;
            let canvas = background.border_background(width + 2 * border_width, height + 2 * border_width);
            map = art.frame(&map, canvas);
            timer.done("border");
        }

        let frayed_seed = rng.next_u64();
        if settings.frayed_border {
            info!("Adding frayed edges.");
            map = apply_frayed_edge(
                &map,
                settings.frayed_border_size * s,
                blur_size(settings.frayed_border_blur_level, s),
                settings.frayed_border_color,
                frayed_seed,
            );
            timer.done("frayed border");
        }

        let grunge_width = (settings.grunge_width * settings.resolution).round() as u32;
        if grunge_width > 0 {
            info!("Adding grunge.");
            map = apply_grunge(&map, grunge_width, settings.frayed_border_color, settings.background_random_seed)?;
            timer.done("grunge");
        }

        if let Some(parts) = parts {
            *parts = MapParts {
                graph: Some(graph),
                background: Some(background),
                icons: Some(icons),
                land_mask: Some(land_mask),
                land_background: Some(land_background.clone()),
                centers_to_update: None,
            };
        }

        info!(
            width = map.width(),
            height = map.height(),
            labels = labels.len(),
            elapsed = timer.start.elapsed().as_secs_f64(),
            "Map finished."
        );
        Ok(RenderedMap {
            map,
            land_background,
            labels,
        })
    }

    /// Darken land along the coast, and along region borders when regions
    /// are coloured.
    fn blur_land(
        &self,
        graph: &TerrainGraph,
        map: RgbaImage,
        coastline: &GrayImage,
        land_mask: &GrayImage,
        palette: &RegionPalette,
        s: f64,
    ) -> RgbaImage {
        let settings = &self.settings;
        let kernel = Kernel::gaussian(blur_size(settings.land_blur, s));
        if settings.draw_region_colors {
            let mut lines = coastline.clone();
            graph.draw_region_borders(&mut lines, Luma([255]), s);
            let blurred = convolve_grayscale(&lines, &kernel, true);
            let land_blur = mask_gray(&blurred, land_mask, false);
            let indexes = graph.region_indexes(&palette.ids);
            mask_with_multiple_colors(&map, &palette.darkened(REGION_BLUR_DARKENING), &indexes, &land_blur, true)
        } else {
            let blurred = convolve_grayscale(coastline, &kernel, true);
            let land_blur = mask_gray(&blurred, land_mask, false);
            mask_with_color(&map, settings.land_blur_color, &land_blur, true)
        }
    }
}

/// Draw a map with the default icon placer and no cache.
pub fn create_map(settings: &MapSettings, graph: TerrainGraph) -> Result<RenderedMap> {
    MapCreator::new(settings.clone()).create(Some(graph), None)
}

/// Icon layout a fresh run would produce: the first draw of the main
/// generator seeds icon placement.
pub fn icon_layout(settings: &MapSettings, graph: &TerrainGraph, placer: &impl IconPlacer) -> IconLayout {
    let mut rng = ChaCha8Rng::seed_from_u64(settings.random_seed);
    placer.place(graph, rng.next_u64())
}
