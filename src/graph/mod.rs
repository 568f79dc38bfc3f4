//! Terrain graph: the finished polygon mesh the renderer draws.
//!
//! Graphs are built elsewhere and handed over as JSON. Centers are polygon
//! sites, corners are mesh vertices and edges join two corners while
//! bordering up to two centers.

pub mod draw;
pub mod edits;
pub mod locate;

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::geometry::{Point, Rect};
use crate::settings::Color;

pub use locate::{CenterLocator, SiteLookup};

/// Width in pixels at which effect and text sizes are defined.
pub const BASE_RESOLUTION: f64 = 1536.0;

macro_rules! index_type {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

index_type!(CenterId);
index_type!(CornerId);
index_type!(EdgeId);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub loc: Point,
    pub water: bool,
    /// Height in `0.0..=1.0`; drives mountain placement.
    #[serde(default)]
    pub elevation: f64,
    #[serde(default)]
    pub region: Option<u32>,
    #[serde(default)]
    pub plate: Option<u32>,
    #[serde(default)]
    pub neighbors: Vec<CenterId>,
    #[serde(default)]
    pub borders: Vec<EdgeId>,
    #[serde(default)]
    pub corners: Vec<CornerId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Corner {
    pub loc: Point,
    /// Edges meeting at this corner.
    #[serde(default)]
    pub edges: Vec<EdgeId>,
    #[serde(default)]
    pub touches: Vec<CenterId>,
}

/// A mesh edge. Either side may be missing on the map boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub d0: Option<CenterId>,
    pub d1: Option<CenterId>,
    pub v0: Option<CornerId>,
    pub v1: Option<CornerId>,
    /// River width; 0 means no river.
    #[serde(default)]
    pub river: u32,
}

impl Edge {
    /// The corner at the other end from `corner`, if this edge has one.
    pub fn opposite(&self, corner: CornerId) -> Option<CornerId> {
        if self.v0 == Some(corner) {
            self.v1
        } else if self.v1 == Some(corner) {
            self.v0
        } else {
            None
        }
    }
}

/// A political grouping of centers. Membership lives on `Center::region`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: u32,
    /// Fixed colour; regions without one get a generated colour.
    #[serde(default)]
    pub color: Option<Color>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlateType {
    Continental,
    Oceanic,
}

/// A tectonic grouping of centers. Membership lives on `Center::plate`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plate {
    pub id: u32,
    pub kind: PlateType,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TerrainGraph {
    pub width: u32,
    pub height: u32,
    pub centers: Vec<Center>,
    pub corners: Vec<Corner>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub plates: Vec<Plate>,
    #[serde(skip)]
    locator: OnceLock<CenterLocator>,
}

impl TerrainGraph {
    pub fn new(
        width: u32,
        height: u32,
        centers: Vec<Center>,
        corners: Vec<Corner>,
        edges: Vec<Edge>,
    ) -> Self {
        Self {
            width,
            height,
            centers,
            corners,
            edges,
            regions: Vec::new(),
            plates: Vec::new(),
            locator: OnceLock::new(),
        }
    }

    /// Load a graph from JSON and check that every index it holds is in range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
        let graph: TerrainGraph = serde_json::from_str(&text).map_err(|source| MapError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        graph.validate()?;
        Ok(graph)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MapError::Configuration(format!(
                "graph has an empty extent {}x{}",
                self.width, self.height
            )));
        }
        let bad = |what: &str, owner: String, index: usize| {
            MapError::Configuration(format!("{owner} refers to missing {what} {index}"))
        };
        let (nc, nv, ne) = (self.centers.len(), self.corners.len(), self.edges.len());
        for (i, c) in self.centers.iter().enumerate() {
            if let Some(n) = c.neighbors.iter().find(|n| n.0 >= nc) {
                return Err(bad("center", format!("center {i}"), n.0));
            }
            if let Some(e) = c.borders.iter().find(|e| e.0 >= ne) {
                return Err(bad("edge", format!("center {i}"), e.0));
            }
            if let Some(v) = c.corners.iter().find(|v| v.0 >= nv) {
                return Err(bad("corner", format!("center {i}"), v.0));
            }
        }
        for (i, v) in self.corners.iter().enumerate() {
            if let Some(e) = v.edges.iter().find(|e| e.0 >= ne) {
                return Err(bad("edge", format!("corner {i}"), e.0));
            }
            if let Some(c) = v.touches.iter().find(|c| c.0 >= nc) {
                return Err(bad("center", format!("corner {i}"), c.0));
            }
        }
        for (i, e) in self.edges.iter().enumerate() {
            for c in [e.d0, e.d1].into_iter().flatten() {
                if c.0 >= nc {
                    return Err(bad("center", format!("edge {i}"), c.0));
                }
            }
            for v in [e.v0, e.v1].into_iter().flatten() {
                if v.0 >= nv {
                    return Err(bad("corner", format!("edge {i}"), v.0));
                }
            }
        }
        Ok(())
    }

    pub fn center(&self, id: CenterId) -> &Center {
        &self.centers[id.0]
    }

    pub fn corner(&self, id: CornerId) -> &Corner {
        &self.corners[id.0]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    pub fn center_ids(&self) -> impl Iterator<Item = CenterId> {
        (0..self.centers.len()).map(CenterId)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Scale of effects and text relative to [`BASE_RESOLUTION`].
    pub fn size_multiplier(&self) -> f64 {
        self.width as f64 / BASE_RESOLUTION
    }

    /// Polygon outline of a center, corners ordered by angle around its site.
    pub fn polygon(&self, id: CenterId) -> Vec<Point> {
        let center = self.center(id);
        let mut points: Vec<Point> = center.corners.iter().map(|&v| self.corner(v).loc).collect();
        points.sort_by(|a, b| {
            let ta = (a.y - center.loc.y).atan2(a.x - center.loc.x);
            let tb = (b.y - center.loc.y).atan2(b.x - center.loc.x);
            ta.total_cmp(&tb)
        });
        points
    }

    /// Whether the edge separates land from water.
    pub fn is_coast_edge(&self, edge: &Edge) -> bool {
        match (edge.d0, edge.d1) {
            (Some(a), Some(b)) => self.center(a).water != self.center(b).water,
            _ => false,
        }
    }

    /// Whether the edge separates two land centers of different regions.
    pub fn is_region_border(&self, edge: &Edge) -> bool {
        match (edge.d0, edge.d1) {
            (Some(a), Some(b)) => {
                let (a, b) = (self.center(a), self.center(b));
                !a.water && !b.water && a.region != b.region
            }
            _ => false,
        }
    }

    /// Centers on the given plate, optionally land only.
    pub fn plate_centers(&self, plate: u32, land_only: bool) -> BTreeSet<CenterId> {
        self.center_ids()
            .filter(|&id| {
                let c = self.center(id);
                c.plate == Some(plate) && (!land_only || !c.water)
            })
            .collect()
    }

    /// Region ids in use, whether declared or only referenced by centers.
    pub fn region_ids(&self) -> BTreeSet<u32> {
        self.regions
            .iter()
            .map(|r| r.id)
            .chain(self.centers.iter().filter_map(|c| c.region))
            .collect()
    }

    pub fn region(&self, id: u32) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn locator(&self) -> &CenterLocator {
        self.locator
            .get_or_init(|| CenterLocator::new(self.width, self.height, self.centers.iter().map(|c| c.loc)))
    }

    /// The center whose site is nearest to `p`; `None` off the map.
    pub fn center_at(&self, p: Point) -> Option<CenterId> {
        self.locator().nearest(p).map(CenterId)
    }
}

impl SiteLookup for TerrainGraph {
    fn site_at(&self, p: Point) -> Option<Point> {
        self.center_at(p).map(|id| self.center(id).loc)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A `cols` x `rows` grid of square cells `cell` pixels wide. Cells for
    /// which `water(col, row)` holds are water. Every cell sits on plate 0
    /// and region 0.
    pub fn grid(cols: usize, rows: usize, cell: f64, water: impl Fn(usize, usize) -> bool) -> TerrainGraph {
        let corner_id = |x: usize, y: usize| CornerId(y * (cols + 1) + x);
        let center_id = |x: usize, y: usize| CenterId(y * cols + x);

        let mut corners: Vec<Corner> = (0..=rows)
            .flat_map(|y| {
                (0..=cols).map(move |x| Corner {
                    loc: Point::new(x as f64 * cell, y as f64 * cell),
                    edges: Vec::new(),
                    touches: Vec::new(),
                })
            })
            .collect();

        let mut centers: Vec<Center> = (0..rows)
            .flat_map(|y| (0..cols).map(move |x| (x, y)))
            .map(|(x, y)| Center {
                loc: Point::new((x as f64 + 0.5) * cell, (y as f64 + 0.5) * cell),
                water: water(x, y),
                elevation: 0.0,
                region: Some(0),
                plate: Some(0),
                neighbors: Vec::new(),
                borders: Vec::new(),
                corners: vec![
                    corner_id(x, y),
                    corner_id(x + 1, y),
                    corner_id(x + 1, y + 1),
                    corner_id(x, y + 1),
                ],
            })
            .collect();

        let mut edges = Vec::new();
        // Horizontal edges between (x, y) and (x + 1, y) corners.
        for y in 0..=rows {
            for x in 0..cols {
                let above = (y > 0).then(|| center_id(x, y - 1));
                let below = (y < rows).then(|| center_id(x, y));
                edges.push(Edge {
                    d0: above,
                    d1: below,
                    v0: Some(corner_id(x, y)),
                    v1: Some(corner_id(x + 1, y)),
                    river: 0,
                });
            }
        }
        // Vertical edges between (x, y) and (x, y + 1) corners.
        for y in 0..rows {
            for x in 0..=cols {
                let left = (x > 0).then(|| center_id(x - 1, y));
                let right = (x < cols).then(|| center_id(x, y));
                edges.push(Edge {
                    d0: left,
                    d1: right,
                    v0: Some(corner_id(x, y)),
                    v1: Some(corner_id(x, y + 1)),
                    river: 0,
                });
            }
        }

        for (i, e) in edges.iter().enumerate() {
            let id = EdgeId(i);
            for v in [e.v0, e.v1].into_iter().flatten() {
                corners[v.0].edges.push(id);
            }
            for c in [e.d0, e.d1].into_iter().flatten() {
                centers[c.0].borders.push(id);
                for v in [e.v0, e.v1].into_iter().flatten() {
                    if !corners[v.0].touches.contains(&c) {
                        corners[v.0].touches.push(c);
                    }
                }
            }
            if let (Some(a), Some(b)) = (e.d0, e.d1) {
                centers[a.0].neighbors.push(b);
                centers[b.0].neighbors.push(a);
            }
        }

        let mut graph = TerrainGraph::new(
            (cols as f64 * cell) as u32,
            (rows as f64 * cell) as u32,
            centers,
            corners,
            edges,
        );
        graph.plates.push(Plate {
            id: 0,
            kind: PlateType::Continental,
        });
        graph.regions.push(Region { id: 0, color: None });
        graph
    }

    /// Edge between two corners of the graph, if there is one.
    pub fn edge_between(graph: &TerrainGraph, a: CornerId, b: CornerId) -> Option<EdgeId> {
        graph.corner(a).edges.iter().copied().find(|&e| graph.edge(e).opposite(a) == Some(b))
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::grid;
    use super::*;

    #[test]
    fn test_grid_fixture_is_consistent() {
        let graph = grid(4, 3, 10.0, |_, _| false);
        graph.validate().unwrap();
        assert_eq!(graph.centers.len(), 12);
        assert_eq!(graph.corners.len(), 20);
        assert_eq!(graph.edges.len(), 4 * 4 + 5 * 3);
        // Interior center has four neighbours.
        assert_eq!(graph.center(CenterId(5)).neighbors.len(), 4);
    }

    #[test]
    fn test_polygon_orders_corners_around_site() {
        let graph = grid(2, 2, 10.0, |_, _| false);
        let poly = graph.polygon(CenterId(0));
        assert_eq!(poly.len(), 4);
        // atan2 ordering starts from the upper left in image coordinates.
        assert_eq!(poly[0], Point::new(0.0, 0.0));
        assert_eq!(poly[2], Point::new(10.0, 10.0));
    }

    #[test]
    fn test_coast_and_region_borders() {
        let mut graph = grid(2, 1, 10.0, |x, _| x == 1);
        let shared = graph
            .edges
            .iter()
            .position(|e| e.d0 == Some(CenterId(0)) && e.d1 == Some(CenterId(1)))
            .unwrap();
        assert!(graph.is_coast_edge(&graph.edges[shared]));
        assert!(!graph.is_region_border(&graph.edges[shared]));

        graph.centers[1].water = false;
        graph.centers[1].region = Some(3);
        assert!(graph.is_region_border(&graph.edges[shared]));
        assert_eq!(graph.region_ids().into_iter().collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn test_load_rejects_dangling_index() {
        let mut graph = grid(1, 1, 10.0, |_, _| false);
        graph.edges[0].v1 = Some(CornerId(99));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, serde_json::to_string(&graph).unwrap()).unwrap();
        assert!(matches!(TerrainGraph::load(&path), Err(MapError::Configuration(_))));
    }

    #[test]
    fn test_load_round_trips_json() {
        let graph = grid(3, 2, 8.0, |x, _| x == 0);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, serde_json::to_string_pretty(&graph).unwrap()).unwrap();
        let loaded = TerrainGraph::load(&path).unwrap();
        assert_eq!(loaded.centers, graph.centers);
        assert_eq!(loaded.center_at(Point::new(1.0, 1.0)), Some(CenterId(0)));
    }
}
