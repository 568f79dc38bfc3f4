//! Label placement.
//!
//! Labels are placed one at a time. Each candidate footprint is checked
//! against every label already committed in this pass and against the map
//! rectangle; a label that fails is skipped and leaves the canvas untouched.

use std::collections::BTreeSet;

use image::RgbaImage;
use tracing::debug;

use super::font::LabelFont;
use super::halo::blend_halo;
use crate::geometry::{centroid, LinearFit, Point, Quad, Rect};
use crate::graph::SiteLookup;
use crate::raster::{blend_through_mask, Fill, Rotation};
use crate::settings::Color;

/// A label that made it onto the map.
#[derive(Clone, Debug, PartialEq)]
pub struct CommittedLabel {
    pub text: String,
    pub pivot: Point,
    pub angle: f64,
    /// One footprint per drawn line.
    pub areas: Vec<Quad>,
}

/// Where a rotated label is being tried.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Attempt {
    /// Offset as requested.
    Primary,
    /// Offset negated, putting the label on the other side of its feature.
    Flipped,
    Abandoned,
}

impl Attempt {
    /// Multiplier applied to the rise offset, or `None` once abandoned.
    fn offset_sign(self) -> Option<f64> {
        match self {
            Attempt::Primary => Some(1.0),
            Attempt::Flipped => Some(-1.0),
            Attempt::Abandoned => None,
        }
    }

    fn next(self) -> Attempt {
        match self {
            Attempt::Primary => Attempt::Flipped,
            Attempt::Flipped | Attempt::Abandoned => Attempt::Abandoned,
        }
    }
}

/// Colours for glyphs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextColors {
    pub text: Color,
    pub bold_background: Color,
}

/// Places labels onto a map and remembers their footprints.
pub struct LabelPlacer<'a> {
    bounds: Rect,
    sites: &'a dyn SiteLookup,
    background: &'a RgbaImage,
    halo_kernel: usize,
    colors: TextColors,
    placed: Vec<CommittedLabel>,
}

impl<'a> LabelPlacer<'a> {
    /// `background` is the map without icons, used for halos; it must be the
    /// size of `bounds`.
    pub fn new(
        bounds: Rect,
        sites: &'a dyn SiteLookup,
        background: &'a RgbaImage,
        halo_kernel: usize,
        colors: TextColors,
    ) -> Self {
        Self {
            bounds,
            sites,
            background,
            halo_kernel,
            colors,
            placed: Vec::new(),
        }
    }

    pub fn placed(&self) -> &[CommittedLabel] {
        &self.placed
    }

    pub fn into_placed(self) -> Vec<CommittedLabel> {
        self.placed
    }

    /// Whether `area` hits a committed label or leaves the map.
    pub fn overlaps_or_off_map(&self, area: &Quad) -> bool {
        if self
            .placed
            .iter()
            .flat_map(|label| label.areas.iter())
            .any(|placed| placed.intersects(area))
        {
            return true;
        }
        let (min, max) = area.bounds();
        !self.bounds.contains_box(min, max)
    }

    /// Place an unrotated label centred on `locations`, shifted down by
    /// `y_offset`. A multi-word label whose box spills outside the polygons
    /// of `locations` is broken onto two lines, and is only drawn if both
    /// lines fit. Surrounding spaces are dropped first. Returns whether
    /// anything was drawn.
    pub fn place_horizontal(
        &mut self,
        map: &mut RgbaImage,
        text: &str,
        locations: &BTreeSet<Point>,
        font: &LabelFont,
        bold_background: bool,
        y_offset: f64,
    ) -> bool {
        let text = text.trim();
        let Some(mut centre) = centroid(locations) else {
            return false;
        };
        centre.y += y_offset;

        let width = font.string_width(text) as i32;
        let height = font.height() as i32;
        let (cx, cy) = (centre.x as i32, centre.y as i32);

        if text.contains(' ') && !self.fits_region(cx, cy, width, height, locations) {
            let Some((line1, line2)) = split_near_middle(text) else {
                return false;
            };
            let w1 = font.string_width(&line1) as i32;
            let w2 = font.string_width(&line2) as i32;
            let rect1 = Rect::new(
                (centre.x - (w1 / 2) as f64) as i32,
                (centre.y - (height / 2) as f64) as i32,
                w1,
                height,
            );
            let rect2 = Rect::new(
                (centre.x - (w2 / 2) as f64) as i32,
                (centre.y + (height / 2) as f64) as i32,
                w2,
                height,
            );
            let (area1, area2) = (Quad::from_rect(rect1), Quad::from_rect(rect2));
            if self.overlaps_or_off_map(&area1) || self.overlaps_or_off_map(&area2) {
                return false;
            }

            self.placed.push(CommittedLabel {
                text: text.to_string(),
                pivot: centre,
                angle: 0.0,
                areas: vec![area1, area2],
            });
            self.draw_line(map, &line1, rect1, font, bold_background, Rotation::none());
            self.draw_line(map, &line2, rect2, font, bold_background, Rotation::none());
        } else {
            let rect = Rect::new(cx - width / 2, cy - height / 2, width, height);
            let area = Quad::from_rect(rect);
            if self.overlaps_or_off_map(&area) {
                return false;
            }

            self.placed.push(CommittedLabel {
                text: text.to_string(),
                pivot: centre,
                angle: 0.0,
                areas: vec![area],
            });
            self.draw_line(map, text, rect, font, bold_background, Rotation::none());
        }
        true
    }

    /// Place a label along the least-squares line through `locations`,
    /// pushed off the line by `rise`. If that spot is taken the label is
    /// tried on the other side; if both are taken it is dropped.
    pub fn place_rotated(
        &mut self,
        map: &mut RgbaImage,
        text: &str,
        locations: &BTreeSet<Point>,
        font: &LabelFont,
        rise: f64,
    ) -> bool {
        let Some(centre) = centroid(locations) else {
            return false;
        };
        let angle = rotation_angle(locations);
        let width = font.string_width(text) as i32;
        let height = font.height() as i32;

        let mut attempt = Attempt::Primary;
        while let Some(sign) = attempt.offset_sign() {
            let rise = rise * sign;
            let offset = Point::new(rise * angle.sin(), -rise * angle.cos());
            let pivot = centre - offset;
            let rect = Rect::new(
                (pivot.x - (width / 2) as f64) as i32,
                (pivot.y - (height / 2) as f64) as i32,
                width,
                height,
            );
            let area = Quad::rotated(rect, pivot, angle);

            if !self.overlaps_or_off_map(&area) {
                self.placed.push(CommittedLabel {
                    text: text.to_string(),
                    pivot,
                    angle,
                    areas: vec![area],
                });
                self.draw_line(map, text, rect, font, false, Rotation { pivot, angle });
                return true;
            }
            attempt = attempt.next();
        }

        debug!(label = text, "no room for label");
        false
    }

    /// Whether all four corners of the box centred on (`cx`, `cy`) land in
    /// polygons whose sites are in `locations`.
    fn fits_region(&self, cx: i32, cy: i32, width: i32, height: i32, locations: &BTreeSet<Point>) -> bool {
        let (hw, hh) = (width / 2, height / 2);
        [(cx - hw, cy - hh), (cx - hw, cy + hh), (cx + hw, cy - hh), (cx + hw, cy + hh)]
            .into_iter()
            .all(|(x, y)| {
                self.sites
                    .site_at(Point::new(x as f64, y as f64))
                    .is_some_and(|site| locations.contains(&site))
            })
    }

    fn draw_line(
        &self,
        map: &mut RgbaImage,
        text: &str,
        rect: Rect,
        font: &LabelFont,
        bold_background: bool,
        rotation: Rotation,
    ) {
        blend_halo(
            map,
            self.background,
            rect.top_left(),
            rect.width as u32,
            rect.height as u32,
            rotation,
            self.halo_kernel,
        );
        if bold_background {
            let bold = font.render_mask(text, true);
            blend_through_mask(map, Fill::Color(self.colors.bold_background), &bold, rect.top_left(), rotation);
        }
        let glyphs = font.render_mask(text, false);
        blend_through_mask(map, Fill::Color(self.colors.text), &glyphs, rect.top_left(), rotation);
    }
}

/// `atan` of the least-squares slope. Locations without spread in x have no
/// slope; their label is drawn level.
pub fn rotation_angle(locations: &BTreeSet<Point>) -> f64 {
    LinearFit::regress(locations).map_or(0.0, |fit| fit.angle())
}

/// Split at the space nearest the middle character, preferring the left
/// space on a tie.
pub fn split_near_middle(text: &str) -> Option<(String, String)> {
    let chars: Vec<char> = text.chars().collect();
    let middle = chars.len() / 2;
    let mut best: Option<usize> = None;
    for (i, _) in chars.iter().enumerate().filter(|(_, c)| **c == ' ') {
        let closer = best.map_or(true, |b| i.abs_diff(middle) < b.abs_diff(middle));
        if closer {
            best = Some(i);
        }
    }
    let pivot = best?;
    Some((
        chars[..pivot].iter().collect(),
        chars[pivot + 1..].iter().collect(),
    ))
}
