use tracing::debug;

use super::{CenterId, Region, TerrainGraph};
use crate::error::{MapError, Result};
use crate::settings::MapEdits;

impl TerrainGraph {
    /// Apply per-center water and region edits.
    ///
    /// Returns the centers whose water flag or region changed so cached land
    /// masks can redraw just those polygons. A region id the graph does not
    /// know yet creates a region carrying the edit's colour.
    pub fn apply_edits(&mut self, edits: &MapEdits) -> Result<Vec<CenterId>> {
        if edits.center_edits.is_empty() {
            return Ok(Vec::new());
        }
        if edits.center_edits.len() != self.centers.len() {
            return Err(MapError::Configuration(format!(
                "the map edits have {} polygons, but the graph has {} centers",
                edits.center_edits.len(),
                self.centers.len()
            )));
        }

        let mut changed = Vec::new();
        for (i, edit) in edits.center_edits.iter().enumerate() {
            if self.region(edit.region_id).is_none() {
                self.regions.push(Region {
                    id: edit.region_id,
                    color: edits.region_color(edit.region_id),
                });
            }
            let center = &mut self.centers[i];
            if center.water != edit.is_water || center.region != Some(edit.region_id) {
                center.water = edit.is_water;
                center.region = Some(edit.region_id);
                changed.push(CenterId(i));
            }
        }

        debug!(changed = changed.len(), "applied center edits");
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::fixtures::grid;
    use crate::graph::CenterId;
    use crate::error::MapError;
    use crate::settings::{CenterEdit, MapEdits, RegionEdit};

    #[test]
    fn test_edit_count_must_match() {
        let mut graph = grid(2, 2, 10.0, |_, _| false);
        let edits = MapEdits {
            center_edits: vec![CenterEdit { is_water: true, region_id: 0 }],
            region_edits: Vec::new(),
        };
        assert!(matches!(graph.apply_edits(&edits), Err(MapError::Configuration(_))));
    }

    #[test]
    fn test_edits_report_changed_centers_and_add_regions() {
        let mut graph = grid(2, 1, 10.0, |_, _| false);
        let edits = MapEdits {
            center_edits: vec![
                CenterEdit { is_water: false, region_id: 0 },
                CenterEdit { is_water: false, region_id: 7 },
            ],
            region_edits: vec![RegionEdit { region_id: 7, color: [1, 2, 3] }],
        };
        let changed = graph.apply_edits(&edits).unwrap();
        assert_eq!(changed, vec![CenterId(1)]);
        assert_eq!(graph.region(7).and_then(|r| r.color), Some([1, 2, 3]));
        assert_eq!(graph.centers[1].region, Some(7));
    }

    #[test]
    fn test_empty_edits_are_a_no_op() {
        let mut graph = grid(2, 1, 10.0, |_, _| false);
        assert!(graph.apply_edits(&MapEdits::default()).unwrap().is_empty());
    }
}
