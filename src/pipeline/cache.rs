use std::collections::BTreeSet;

use image::{GrayImage, RgbaImage};

use crate::background::Background;
use crate::graph::{CenterId, TerrainGraph};
use crate::icons::IconLayout;

/// Expensive intermediate results kept between runs, e.g. while a map is
/// being edited by hand.
///
/// The caller decides what is still valid: anything present is reused as is.
/// After a successful run every field except `centers_to_update` holds that
/// run's result; a failed run leaves the cache untouched.
#[derive(Clone, Debug, Default)]
pub struct MapParts {
    /// The graph with edits already applied.
    pub graph: Option<TerrainGraph>,
    pub background: Option<Background>,
    pub icons: Option<IconLayout>,
    pub land_mask: Option<GrayImage>,
    /// The map without icons, from the last run.
    pub land_background: Option<RgbaImage>,
    /// Centers to redraw into a cached land mask. Centers changed by edits
    /// during the run are redrawn as well. Cleared after each successful run.
    pub centers_to_update: Option<BTreeSet<CenterId>>,
}

impl MapParts {
    pub fn new() -> Self {
        Self::default()
    }
}
