//! Label typefaces.
//!
//! Faces come from a font file or from the installed fonts (located with
//! `fontdb`) and are rasterised with `fontdue`. Glyphs are laid out one after
//! another at the regular face's advances, without kerning; the bold face is
//! drawn at those same positions.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use fontdb::{Database, Family, Query, Weight};
use fontdue::Font;
use image::{GrayImage, Luma};
use tracing::{debug, warn};

use crate::error::{MapError, Result};
use crate::settings::FontSettings;

fn parse(name: &str, data: &[u8], index: u32) -> Result<Font> {
    let settings = fontdue::FontSettings {
        collection_index: index,
        ..fontdue::FontSettings::default()
    };
    Font::from_bytes(data, settings).map_err(|message| MapError::Font {
        name: name.to_string(),
        message: message.to_string(),
    })
}

fn read_font_file(path: &Path) -> Result<Font> {
    let data = std::fs::read(path).map_err(|e| MapError::io(path, e))?;
    parse(&path.display().to_string(), &data, 0)
}

/// Closest installed face of `family` at `weight`. Falls back to any face
/// when the family is not installed.
fn installed_face(db: &Database, family: &str, weight: Weight) -> Result<Font> {
    let query = Query {
        families: &[Family::Name(family), Family::Serif, Family::SansSerif],
        weight,
        ..Query::default()
    };
    let id = match db.query(&query) {
        Some(id) => id,
        None => {
            let face = db.faces().next().ok_or_else(|| MapError::Font {
                name: family.to_string(),
                message: "no fonts are installed".into(),
            })?;
            warn!(family, fallback = ?face.families.first().map(|(name, _)| name), "font family not installed");
            face.id
        }
    };
    db.with_face_data(id, |data, index| parse(family, data, index))
        .unwrap_or_else(|| {
            Err(MapError::Font {
                name: family.to_string(),
                message: "face data is unavailable".into(),
            })
        })
}

/// Regular and bold faces of the label typeface.
#[derive(Clone)]
pub struct FontFaces {
    regular: Arc<Font>,
    bold: Arc<Font>,
}

impl fmt::Debug for FontFaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFaces").finish_non_exhaustive()
    }
}

impl FontFaces {
    pub fn load(settings: &FontSettings) -> Result<Self> {
        let (regular, bold) = match &settings.path {
            Some(path) => {
                let regular = Arc::new(read_font_file(path)?);
                let bold = match &settings.bold_path {
                    Some(bold) => Arc::new(read_font_file(bold)?),
                    None => regular.clone(),
                };
                (regular, bold)
            }
            None => {
                let mut db = Database::new();
                db.load_system_fonts();
                debug!(faces = db.len(), "loaded installed fonts");
                (
                    Arc::new(installed_face(&db, &settings.family, Weight::NORMAL)?),
                    Arc::new(installed_face(&db, &settings.family, Weight::BOLD)?),
                )
            }
        };
        Ok(Self { regular, bold })
    }

    /// The faces at `px` pixels per em.
    pub fn at_size(&self, px: f32) -> LabelFont {
        LabelFont {
            faces: self.clone(),
            px: px.max(1.0),
        }
    }
}

/// The label typeface at one pixel size.
#[derive(Clone, Debug)]
pub struct LabelFont {
    faces: FontFaces,
    px: f32,
}

impl LabelFont {
    pub fn px(&self) -> f32 {
        self.px
    }

    /// Ascent and (negative) descent of a line.
    fn line(&self) -> (f32, f32) {
        match self.faces.regular.horizontal_line_metrics(self.px) {
            Some(m) => (m.ascent, m.descent),
            None => (self.px * 0.8, -self.px * 0.2),
        }
    }

    /// Distance from the top of a line to the baseline.
    pub fn ascent(&self) -> u32 {
        self.line().0.ceil() as u32
    }

    /// Line height: ascent plus descent.
    pub fn height(&self) -> u32 {
        let (ascent, descent) = self.line();
        (ascent - descent).ceil() as u32
    }

    fn advance(&self, ch: char) -> f32 {
        self.faces.regular.metrics(ch, self.px).advance_width
    }

    pub fn string_width(&self, text: &str) -> u32 {
        text.chars().map(|ch| self.advance(ch)).sum::<f32>().ceil() as u32
    }

    /// Coverage mask of `text`, `string_width` x `height`, glyphs sitting on
    /// the baseline. With `bold` the bold face is drawn instead.
    pub fn render_mask(&self, text: &str, bold: bool) -> GrayImage {
        let face = if bold { &self.faces.bold } else { &self.faces.regular };
        let mut mask = GrayImage::new(self.string_width(text).max(1), self.height().max(1));
        let baseline = self.ascent() as i64;
        let (w, h) = (mask.width() as i64, mask.height() as i64);

        let mut caret = 0.0;
        for ch in text.chars() {
            let (metrics, coverage) = face.rasterize(ch, self.px);
            let left = (caret + metrics.xmin as f32).round() as i64;
            let top = baseline - (metrics.ymin as i64 + metrics.height as i64);
            for (i, &c) in coverage.iter().enumerate() {
                if c == 0 {
                    continue;
                }
                let x = left + (i % metrics.width) as i64;
                let y = top + (i / metrics.width) as i64;
                if (0..w).contains(&x) && (0..h).contains(&y) {
                    let p = mask.get_pixel_mut(x as u32, y as u32);
                    *p = Luma([p[0].max(c)]);
                }
            }
            caret += self.advance(ch);
        }
        mask
    }
}

/// Installed label faces, loaded once per test binary.
#[cfg(test)]
pub(crate) fn test_faces() -> FontFaces {
    static FACES: std::sync::OnceLock<FontFaces> = std::sync::OnceLock::new();
    FACES
        .get_or_init(|| FontFaces::load(&FontSettings::default()).unwrap())
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p[0] > 0).count()
    }

    #[test]
    fn test_metrics_grow_with_size() {
        let faces = test_faces();
        let small = faces.at_size(10.0);
        let large = faces.at_size(20.0);
        assert!(large.string_width("Peak") > small.string_width("Peak"));
        assert!(large.height() > small.height());
        assert!(small.ascent() < small.height());
        assert_eq!(small.string_width(""), 0);
    }

    #[test]
    fn test_accented_letters_are_drawn() {
        let font = test_faces().at_size(24.0);
        assert!(lit(&font.render_mask("É", false)) > 0);
        assert!(lit(&font.render_mask("Ø", false)) > 0);
        assert!(lit(&font.render_mask("Éowyn Ødegård", false)) > lit(&font.render_mask("owyn degrd", false)));
    }

    #[test]
    fn test_glyph_sits_on_baseline() {
        let font = test_faces().at_size(20.0);
        let mask = font.render_mask("L", false);
        let baseline = font.ascent();
        assert!((0..mask.width()).any(|x| mask.get_pixel(x, baseline - 1)[0] > 0));
        for y in baseline + 1..mask.height() {
            assert!((0..mask.width()).all(|x| mask.get_pixel(x, y)[0] == 0));
        }
    }

    #[test]
    fn test_bold_covers_more() {
        let font = test_faces().at_size(20.0);
        let regular: u32 = font.render_mask("Ill", false).pixels().map(|p| p[0] as u32).sum();
        let bold: u32 = font.render_mask("Ill", true).pixels().map(|p| p[0] as u32).sum();
        assert!(bold > regular);
    }

    #[test]
    fn test_font_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = FontSettings {
            path: Some(dir.path().join("none.ttf")),
            ..FontSettings::default()
        };
        assert!(matches!(FontFaces::load(&missing), Err(MapError::Io { .. })));

        let junk = dir.path().join("junk.ttf");
        std::fs::write(&junk, b"not a font").unwrap();
        let unreadable = FontSettings {
            path: Some(junk),
            ..FontSettings::default()
        };
        assert!(matches!(FontFaces::load(&unreadable), Err(MapError::Font { .. })));
    }
}
