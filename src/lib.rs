//! Map rendering library
//!
//! Turns a terrain graph into a finished map image: land and ocean
//! backgrounds, coastlines, rivers, icons, labels and a decorative border.

pub mod background;
pub mod border;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod icons;
pub mod parallel;
pub mod pipeline;
pub mod raster;
pub mod rivers;
pub mod settings;
pub mod text;
pub mod tilemap;

pub use error::{MapError, Result};
pub use graph::TerrainGraph;
pub use pipeline::{create_map, MapCreator, MapParts, RenderedMap};
pub use settings::MapSettings;
