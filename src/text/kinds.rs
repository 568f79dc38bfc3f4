//! Label kinds and their drawing policies.

use crate::settings::FontSettings;

/// Vertical nudge for mountain groups smaller than a range.
pub const MOUNTAIN_GROUP_OFFSET: f64 = 25.0;
/// How far a river's name sits from the river.
pub const RIVER_NAME_RISE: f64 = -12.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LabelKind {
    Title,
    RegionName,
    MountainRangeName,
    MountainGroupName,
    RiverName,
}

/// How a label is laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    /// Along the regression line of its locations.
    Rotated,
}

/// Everything about drawing a label that follows from its kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelPolicy {
    /// Font size in pixels, truncated to a whole pixel.
    pub font_size: f32,
    pub bold_background: bool,
    /// Downward shift for horizontal labels, rise for rotated ones.
    pub offset: f64,
}

impl LabelKind {
    /// Labels are placed in ascending priority; earlier labels win space.
    pub fn priority(self) -> u8 {
        match self {
            LabelKind::Title => 0,
            LabelKind::RegionName => 1,
            LabelKind::MountainRangeName => 2,
            LabelKind::MountainGroupName => 3,
            LabelKind::RiverName => 4,
        }
    }

    pub fn policy(self, fonts: &FontSettings, size_multiplier: f64) -> LabelPolicy {
        let s = size_multiplier;
        let (base, bold_background, offset) = match self {
            LabelKind::Title => (fonts.title, true, 0.0),
            LabelKind::RegionName => (fonts.region, true, 0.0),
            LabelKind::MountainRangeName => (fonts.mountain_range, false, 0.0),
            LabelKind::MountainGroupName => (fonts.other_mountains, false, MOUNTAIN_GROUP_OFFSET * s),
            LabelKind::RiverName => (fonts.river, false, RIVER_NAME_RISE * s),
        };
        LabelPolicy {
            font_size: ((base * s) as u32).max(1) as f32,
            bold_background,
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_follows_declaration_order() {
        let kinds = [
            LabelKind::Title,
            LabelKind::RegionName,
            LabelKind::MountainRangeName,
            LabelKind::MountainGroupName,
            LabelKind::RiverName,
        ];
        assert!(kinds.windows(2).all(|w| w[0].priority() < w[1].priority()));
    }

    #[test]
    fn test_offsets_scale_with_map() {
        let fonts = FontSettings::default();
        assert_eq!(LabelKind::RiverName.policy(&fonts, 2.0).offset, -24.0);
        assert_eq!(LabelKind::MountainGroupName.policy(&fonts, 1.0).offset, 25.0);
        assert!(LabelKind::RegionName.policy(&fonts, 1.0).bold_background);
        assert_eq!(LabelKind::Title.policy(&fonts, 0.99).font_size, 39.0);
        assert_eq!(LabelKind::RiverName.policy(&fonts, 0.01).font_size, 1.0);
    }
}
