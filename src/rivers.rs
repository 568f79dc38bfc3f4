//! River tracing.
//!
//! Walks corner to corner along river-carrying edges and groups the corners
//! into separate, nameable rivers. At a confluence the walk keeps to the
//! dominant channel; a tributary that meets a larger river ends there so it
//! can carry its own name.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, warn};

use crate::error::{MapError, Result};
use crate::geometry::Point;
use crate::graph::{CornerId, EdgeId, TerrainGraph};

/// Completed paths sharing this many corners with earlier paths are logged.
pub const SUSPICIOUS_REVISITS: usize = 3;

/// One traced river: its corners in the order they were walked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RiverPath {
    pub corners: Vec<CornerId>,
}

impl RiverPath {
    pub fn len(&self) -> usize {
        self.corners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    pub fn locations(&self, graph: &TerrainGraph) -> BTreeSet<Point> {
        self.corners.iter().map(|&c| graph.corner(c).loc).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RiverTracer {
    /// Edges narrower than this are not rivers for tracing purposes.
    pub min_weight: u32,
    /// Paths with fewer corners are dropped.
    pub min_length: usize,
}

impl Default for RiverTracer {
    fn default() -> Self {
        Self {
            min_weight: 3,
            min_length: 3,
        }
    }
}

/// Outcome of looking for the next corner from the head of a path.
enum Step {
    Continue(CornerId),
    Stop,
}

impl RiverTracer {
    pub fn new(min_weight: u32, min_length: usize) -> Self {
        Self {
            min_weight,
            min_length,
        }
    }

    /// Trace every river in the graph. No corner appears in two returned
    /// paths' seeds, and each path is at least `min_length` corners long.
    pub fn trace(&self, graph: &TerrainGraph) -> Result<Vec<RiverPath>> {
        let mut explored: HashSet<CornerId> = HashSet::new();
        let mut rivers = Vec::new();

        for (i, edge) in graph.edges.iter().enumerate() {
            if edge.river < self.min_weight {
                continue;
            }
            let (Some(v0), Some(v1)) = (edge.v0, edge.v1) else {
                continue;
            };
            if v0 == v1 || explored.contains(&v0) || explored.contains(&v1) {
                continue;
            }

            let path = self.follow(graph, v0, v1)?;
            let revisits = path.corners.iter().filter(|c| explored.contains(c)).count();
            if revisits >= SUSPICIOUS_REVISITS {
                warn!(
                    seed_edge = i,
                    revisits,
                    length = path.len(),
                    "river path runs through corners already claimed by another river"
                );
            }
            explored.extend(path.corners.iter().copied());

            if path.len() >= self.min_length {
                rivers.push(path);
            }
        }

        debug!(count = rivers.len(), "traced rivers");
        Ok(rivers)
    }

    /// Grow a path from `head`, walking away from `last`.
    fn follow(&self, graph: &TerrainGraph, mut last: CornerId, mut head: CornerId) -> Result<RiverPath> {
        let mut corners = vec![last, head];
        let mut seen: HashSet<CornerId> = corners.iter().copied().collect();

        loop {
            match self.step(graph, last, head)? {
                Step::Stop => break,
                Step::Continue(next) => {
                    // A loop back into the path ends it.
                    if !seen.insert(next) {
                        break;
                    }
                    corners.push(next);
                    last = head;
                    head = next;
                }
            }
        }

        Ok(RiverPath { corners })
    }

    fn step(&self, graph: &TerrainGraph, last: CornerId, head: CornerId) -> Result<Step> {
        let mut river_edges: Vec<EdgeId> = graph
            .corner(head)
            .edges
            .iter()
            .copied()
            .filter(|&e| graph.edge(e).river >= self.min_weight)
            .collect();
        river_edges.sort();
        river_edges.dedup();

        let traversed = river_edges
            .iter()
            .position(|&e| graph.edge(e).opposite(head) == Some(last));

        match river_edges.len() {
            0 => Err(MapError::GeometryContractViolation { corner: head.0 }),
            1 => Ok(Step::Stop),
            2 => {
                let other = river_edges
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| Some(i) != traversed)
                    .find_map(|(_, &e)| graph.edge(e).opposite(head))
                    .filter(|&c| c != last);
                Ok(other.map_or(Step::Stop, Step::Continue))
            }
            _ => {
                let Some(traversed) = traversed.map(|i| river_edges[i]) else {
                    return Err(MapError::GeometryContractViolation { corner: head.0 });
                };
                // Stable, so equal widths keep edge order.
                river_edges.sort_by(|a, b| graph.edge(*b).river.cmp(&graph.edge(*a).river));
                let index_of_last = river_edges.iter().position(|&e| e == traversed).unwrap_or(0);

                let next_edge = if graph.edge(river_edges[1]).river > graph.edge(river_edges[2]).river {
                    match index_of_last {
                        0 => river_edges[1],
                        1 => river_edges[0],
                        // A tributary joining a larger river.
                        _ => return Ok(Step::Stop),
                    }
                } else {
                    river_edges.remove(index_of_last);
                    river_edges[0]
                };
                Ok(graph
                    .edge(next_edge)
                    .opposite(head)
                    .map_or(Step::Stop, Step::Continue))
            }
        }
    }
}
