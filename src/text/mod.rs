//! Map labels: what to name, in which order, and where the names go.

pub mod corpus;
pub mod font;
pub mod halo;
pub mod kinds;
pub mod names;
pub mod placement;

use std::collections::BTreeSet;
use std::time::Instant;

use image::RgbaImage;
use tracing::{debug, info};

use crate::error::Result;
use crate::geometry::Point;
use crate::graph::{CenterId, PlateType, TerrainGraph};
use crate::rivers::{RiverPath, RiverTracer};
use crate::settings::MapSettings;

pub use corpus::{load_place_names, read_string_pairs, Corpus};
pub use font::{FontFaces, LabelFont};
pub use kinds::{LabelKind, LabelPolicy, Orientation};
pub use names::{CorpusNames, NameSource};
pub use placement::{CommittedLabel, LabelPlacer, TextColors};

/// Mountain groups at least this large are named as ranges.
pub const MOUNTAIN_RANGE_MIN_SIZE: usize = 50;
/// Fewest land centers a continental plate needs to get a region name.
pub const MIN_REGION_CENTERS: usize = 3;
/// The title goes on land when oceanic plates are this rare relative to
/// continental ones.
pub const TITLE_ON_LAND_THRESHOLD: f64 = 0.3;
/// Rivers must be at least this wide to be named.
pub const RIVER_MIN_WIDTH: u32 = 3;
/// Rivers with fewer corners are not named.
pub const RIVER_MIN_LENGTH: usize = 3;

/// One label waiting to be placed.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelRequest {
    pub kind: LabelKind,
    pub text: String,
    /// Tried when `text` does not fit.
    pub fallback: Option<String>,
    pub orientation: Orientation,
    pub locations: BTreeSet<Point>,
}

fn center_locations<'a>(graph: &TerrainGraph, centers: impl IntoIterator<Item = &'a CenterId>) -> BTreeSet<Point> {
    centers.into_iter().map(|&id| graph.center(id).loc).collect()
}

/// Horizontal distance between the leftmost and rightmost centers.
fn x_extent(graph: &TerrainGraph, centers: &BTreeSet<CenterId>) -> f64 {
    let xs = centers.iter().map(|&id| graph.center(id).loc.x);
    let (lo, hi) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)));
    hi - lo
}

/// The plate that carries the map title: the widest continental plate when
/// oceanic plates are rare, otherwise the widest oceanic plate.
pub fn title_plate(graph: &TerrainGraph) -> Option<u32> {
    let widest = |kind: PlateType| -> Option<(usize, u32)> {
        let mut best: Option<(f64, u32)> = None;
        let mut count = 0;
        for plate in graph.plates.iter().filter(|p| p.kind == kind) {
            let centers = graph.plate_centers(plate.id, false);
            if centers.is_empty() {
                continue;
            }
            count += 1;
            let width = x_extent(graph, &centers);
            if best.map_or(true, |(w, _)| width > w) {
                best = Some((width, plate.id));
            }
        }
        best.map(|(_, id)| (count, id))
    };

    let land = widest(PlateType::Continental);
    let ocean = widest(PlateType::Oceanic);
    match (land, ocean) {
        (Some((land_count, land_id)), Some((ocean_count, ocean_id))) => {
            if (ocean_count as f64) / (land_count as f64) < TITLE_ON_LAND_THRESHOLD {
                Some(land_id)
            } else {
                Some(ocean_id)
            }
        }
        (Some((_, id)), None) | (None, Some((_, id))) => Some(id),
        (None, None) => None,
    }
}

/// Build every label request in priority order, drawing names from `names`
/// in that same order.
pub fn build_requests(
    graph: &TerrainGraph,
    mountain_groups: &[BTreeSet<CenterId>],
    rivers: &[RiverPath],
    names: &mut dyn NameSource,
) -> Vec<LabelRequest> {
    let mut requests = Vec::new();

    if let Some(plate) = title_plate(graph) {
        let text = format!("The Land of {}", names.place_name());
        let fallback = names.place_name();
        requests.push(LabelRequest {
            kind: LabelKind::Title,
            text,
            fallback: Some(fallback),
            orientation: Orientation::Horizontal,
            locations: center_locations(graph, &graph.plate_centers(plate, false)),
        });
    }

    for plate in graph.plates.iter().filter(|p| p.kind == PlateType::Continental) {
        let land = graph.plate_centers(plate.id, true);
        if land.len() >= MIN_REGION_CENTERS {
            requests.push(LabelRequest {
                kind: LabelKind::RegionName,
                text: names.place_name(),
                fallback: None,
                orientation: Orientation::Horizontal,
                locations: center_locations(graph, &land),
            });
        }
    }

    for group in mountain_groups.iter().filter(|g| g.len() >= MOUNTAIN_RANGE_MIN_SIZE) {
        requests.push(LabelRequest {
            kind: LabelKind::MountainRangeName,
            text: format!("{} Range", names.compiled_name()),
            fallback: None,
            orientation: Orientation::Rotated,
            locations: center_locations(graph, group),
        });
    }

    for group in mountain_groups
        .iter()
        .filter(|g| !g.is_empty() && g.len() < MOUNTAIN_RANGE_MIN_SIZE)
    {
        let (suffix, orientation) = match group.len() {
            1 => ("Peak", Orientation::Horizontal),
            2 => ("Twin Peaks", Orientation::Horizontal),
            _ => ("Mountains", Orientation::Rotated),
        };
        requests.push(LabelRequest {
            kind: LabelKind::MountainGroupName,
            text: format!("{} {suffix}", names.compiled_name()),
            fallback: None,
            orientation,
            locations: center_locations(graph, group),
        });
    }

    for river in rivers.iter().filter(|r| r.len() >= RIVER_MIN_LENGTH) {
        requests.push(LabelRequest {
            kind: LabelKind::RiverName,
            text: format!("{} River", names.compiled_name()),
            fallback: None,
            orientation: Orientation::Rotated,
            locations: river.locations(graph),
        });
    }

    requests
}

/// Place requests in priority order. A title that does not fit is retried
/// with its fallback text.
pub fn place_requests(
    map: &mut RgbaImage,
    placer: &mut LabelPlacer<'_>,
    mut requests: Vec<LabelRequest>,
    faces: &FontFaces,
    settings: &MapSettings,
    size_multiplier: f64,
) {
    requests.sort_by_key(|r| r.kind.priority());
    for request in requests {
        let policy = request.kind.policy(&settings.fonts, size_multiplier);
        let font = faces.at_size(policy.font_size);
        match request.orientation {
            Orientation::Horizontal => {
                let placed = placer.place_horizontal(
                    map,
                    &request.text,
                    &request.locations,
                    &font,
                    policy.bold_background,
                    policy.offset,
                );
                if let (false, Some(fallback)) = (placed, &request.fallback) {
                    placer.place_horizontal(
                        map,
                        fallback,
                        &request.locations,
                        &font,
                        policy.bold_background,
                        policy.offset,
                    );
                }
            }
            Orientation::Rotated => {
                placer.place_rotated(map, &request.text, &request.locations, &font, policy.offset);
            }
        }
    }
}

/// Name everything on the map: title, regions, mountains and rivers.
///
/// `background` is the map without icons and is used for halos behind the
/// text. Returns the committed labels in placement order.
pub fn draw_text(
    graph: &TerrainGraph,
    map: &mut RgbaImage,
    background: &RgbaImage,
    mountain_groups: &[BTreeSet<CenterId>],
    settings: &MapSettings,
    names: &mut dyn NameSource,
) -> Result<Vec<CommittedLabel>> {
    let start = Instant::now();
    info!("Adding text.");

    let faces = FontFaces::load(&settings.fonts)?;
    let rivers = RiverTracer::new(RIVER_MIN_WIDTH, RIVER_MIN_LENGTH).trace(graph)?;
    let requests = build_requests(graph, mountain_groups, &rivers, names);
    let s = graph.size_multiplier();

    let colors = TextColors {
        text: settings.text_color,
        bold_background: settings.bold_background_color,
    };
    let mut placer = LabelPlacer::new(graph.bounds(), graph, background, halo::halo_kernel_size(s), colors);
    let requested = requests.len();
    place_requests(map, &mut placer, requests, &faces, settings, s);
    let placed = placer.into_placed();

    debug!(
        requested,
        placed = placed.len(),
        elapsed = start.elapsed().as_secs_f64(),
        "placed labels"
    );
    Ok(placed)
}
