//! Map rendering settings.
//!
//! Everything here is read-only for the pipeline. Settings are usually loaded
//! from JSON; any field left out takes its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

/// RGB colour.
pub type Color = [u8; 3];

/// Label typeface and the pixel size of each label kind before the size
/// multiplier is applied.
///
/// The face is looked up among the installed fonts by `family` unless `path`
/// names a font file. Bold backgrounds use the bold weight of the family, or
/// `bold_path` when a file is given.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    pub family: String,
    pub path: Option<PathBuf>,
    pub bold_path: Option<PathBuf>,
    pub title: f64,
    pub region: f64,
    pub mountain_range: f64,
    pub other_mountains: f64,
    pub river: f64,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            family: "DejaVu Serif".into(),
            path: None,
            bold_path: None,
            title: 40.0,
            region: 28.0,
            mountain_range: 20.0,
            other_mountains: 16.0,
            river: 14.0,
        }
    }
}

/// A user edit of one center: its water flag and political region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CenterEdit {
    pub is_water: bool,
    pub region_id: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionEdit {
    pub region_id: u32,
    pub color: Color,
}

/// Hand edits applied to the terrain graph before drawing.
///
/// When `center_edits` is non-empty it must hold exactly one entry per center.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapEdits {
    pub center_edits: Vec<CenterEdit>,
    pub region_edits: Vec<RegionEdit>,
}

impl MapEdits {
    pub fn is_empty(&self) -> bool {
        self.center_edits.is_empty()
    }

    pub fn region_color(&self, region_id: u32) -> Option<Color> {
        self.region_edits
            .iter()
            .find(|e| e.region_id == region_id)
            .map(|e| e.color)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    // Seeds
    pub random_seed: u64,
    pub regions_random_seed: u64,
    pub background_random_seed: u64,
    pub text_random_seed: u64,

    /// Output scale; multiplies border and grunge widths.
    pub resolution: f64,

    // Backgrounds. A missing image path falls back to a flat colour.
    pub land_background_image: Option<PathBuf>,
    pub ocean_background_image: Option<PathBuf>,
    pub land_color: Color,
    pub ocean_color: Color,

    // Region colouring
    pub draw_region_colors: bool,
    pub hue_range: f64,
    pub saturation_range: f64,
    pub brightness_range: f64,

    // Coastline and ocean effects
    pub land_blur: f64,
    pub land_blur_color: Color,
    pub ocean_effects: f64,
    pub ocean_effects_color: Color,
    pub add_waves_to_ocean: bool,
    pub coastline_color: Color,
    pub river_color: Color,
    pub icon_color: Color,

    // Text
    pub draw_text: bool,
    pub text_color: Color,
    pub bold_background_color: Color,
    pub fonts: FontSettings,
    /// Corpus names; each expects `<corpus_dir>/<book>_place_names.txt` and
    /// the two pair files beside it.
    pub books: Vec<String>,
    pub corpus_dir: PathBuf,

    // Border
    pub draw_border: bool,
    pub border_type: String,
    pub border_width: f64,
    pub borders_dir: PathBuf,
    pub frayed_border: bool,
    pub frayed_border_size: f64,
    pub frayed_border_color: Color,
    pub frayed_border_blur_level: f64,
    pub grunge_width: f64,

    pub edits: MapEdits,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            random_seed: 1,
            regions_random_seed: 1,
            background_random_seed: 1,
            text_random_seed: 1,
            resolution: 1.0,
            land_background_image: None,
            ocean_background_image: None,
            land_color: [214, 196, 150],
            ocean_color: [150, 172, 180],
            draw_region_colors: false,
            hue_range: 16.0,
            saturation_range: 25.0,
            brightness_range: 25.0,
            land_blur: 30.0,
            land_blur_color: [110, 90, 60],
            ocean_effects: 20.0,
            ocean_effects_color: [40, 60, 80],
            add_waves_to_ocean: false,
            coastline_color: [50, 40, 30],
            river_color: [70, 90, 120],
            icon_color: [60, 50, 40],
            draw_text: true,
            text_color: [30, 20, 10],
            bold_background_color: [230, 220, 190],
            fonts: FontSettings::default(),
            books: Vec::new(),
            corpus_dir: PathBuf::from("assets/books"),
            draw_border: false,
            border_type: String::new(),
            border_width: 0.0,
            borders_dir: PathBuf::from("assets/borders"),
            frayed_border: false,
            frayed_border_size: 10.0,
            frayed_border_color: [50, 40, 30],
            frayed_border_blur_level: 20.0,
            grunge_width: 0.0,
            edits: MapEdits::default(),
        }
    }
}

impl MapSettings {
    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| MapError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Use one seed for terrain, regions, background and text.
    pub fn with_master_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self.regions_random_seed = seed;
        self.background_random_seed = seed;
        self.text_random_seed = seed;
        self
    }

    /// Directory holding the art for the selected border type.
    pub fn border_dir(&self) -> PathBuf {
        self.borders_dir.join(&self.border_type)
    }

    /// Fail before any raster work if a required file or directory is missing.
    pub fn validate(&self) -> Result<()> {
        for (label, path) in [
            ("land background image", &self.land_background_image),
            ("ocean background image", &self.ocean_background_image),
        ] {
            if let Some(path) = path {
                if !path.exists() {
                    return Err(MapError::Configuration(format!(
                        "{label} does not exist: {}",
                        path.display()
                    )));
                }
            }
        }

        if self.draw_border && self.border_width * self.resolution >= 1.0 {
            let dir = self.border_dir();
            if !dir.is_dir() {
                return Err(MapError::Configuration(format!(
                    "border type '{}' has no image folder in {}",
                    self.border_type,
                    self.borders_dir.display()
                )));
            }
        }

        if self.draw_text {
            for path in [&self.fonts.path, &self.fonts.bold_path].into_iter().flatten() {
                if !path.is_file() {
                    return Err(MapError::Configuration(format!(
                        "font file does not exist: {}",
                        path.display()
                    )));
                }
            }
            for book in &self.books {
                let path = self.corpus_dir.join(format!("{book}_place_names.txt"));
                if !path.exists() {
                    return Err(MapError::Configuration(format!(
                        "unable to read place name file {}. Is \"{book}\" a valid book?",
                        path.display()
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_takes_defaults() {
        let settings: MapSettings =
            serde_json::from_str(r#"{ "random_seed": 99, "fonts": { "title": 8.0 } }"#).unwrap();
        assert_eq!(settings.random_seed, 99);
        assert_eq!(settings.fonts.title, 8.0);
        assert_eq!(settings.fonts.region, FontSettings::default().region);
        assert!(settings.draw_text);
    }

    #[test]
    fn test_master_seed_sets_all_seeds() {
        let s = MapSettings::default().with_master_seed(42);
        assert_eq!(
            [s.random_seed, s.regions_random_seed, s.background_random_seed, s.text_random_seed],
            [42; 4]
        );
    }

    #[test]
    fn test_missing_background_image_is_configuration_error() {
        let settings = MapSettings {
            land_background_image: Some(PathBuf::from("/definitely/not/here.png")),
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(MapError::Configuration(_))));
    }

    #[test]
    fn test_load_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let saved = MapSettings {
            grunge_width: 12.0,
            books: vec!["tolkien".into()],
            ..Default::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&saved).unwrap()).unwrap();
        assert_eq!(MapSettings::load(&path).unwrap(), saved);
    }

    #[test]
    fn test_missing_font_file_is_configuration_error() {
        let settings = MapSettings {
            fonts: FontSettings {
                path: Some(PathBuf::from("/definitely/not/here.ttf")),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(MapError::Configuration(_))));

        let no_text = MapSettings {
            draw_text: false,
            ..settings
        };
        assert!(no_text.validate().is_ok());
    }
}
