//! Zone geometry lookup for recovered fragments.
//!
//! # Invariants
//! - Coordinates are normalized to the full image (`0.0..=1.0`).
//! - Containment is inclusive on all four edges.
//! - Zones are scanned in declaration order; the first containing zone wins.
//! - A center outside every zone resolves to the layout fallback, never an error.

use crate::model::note::Section;
use serde::{Deserialize, Serialize};

/// Rectangle in normalized image space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

/// Area of the board occupied by one zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneBounds {
    pub section: Section,
    pub bounds: NormalizedRect,
}

/// Fixed visual layout of the board.
pub const DEFAULT_ZONE_BOUNDS: [ZoneBounds; 6] = [
    ZoneBounds {
        section: Section::Keep,
        bounds: NormalizedRect::new(0.25, 0.0, 0.5, 0.3),
    },
    ZoneBounds {
        section: Section::Stop,
        bounds: NormalizedRect::new(0.0, 0.3, 0.3, 0.4),
    },
    ZoneBounds {
        section: Section::Start,
        bounds: NormalizedRect::new(0.7, 0.3, 0.3, 0.4),
    },
    ZoneBounds {
        section: Section::Less,
        bounds: NormalizedRect::new(0.0, 0.7, 0.35, 0.3),
    },
    ZoneBounds {
        section: Section::More,
        bounds: NormalizedRect::new(0.65, 0.7, 0.35, 0.3),
    },
    ZoneBounds {
        section: Section::Puzzling,
        bounds: NormalizedRect::new(0.4, 0.4, 0.2, 0.2),
    },
];

/// Zone used when a position matches no rectangle.
pub const DEFAULT_FALLBACK_ZONE: Section = Section::Puzzling;

fn default_fallback() -> Section {
    DEFAULT_FALLBACK_ZONE
}

/// Ordered zone table plus fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneLayout {
    zones: Vec<ZoneBounds>,
    #[serde(default = "default_fallback")]
    fallback: Section,
}

impl ZoneLayout {
    pub fn new(zones: Vec<ZoneBounds>, fallback: Section) -> Self {
        Self { zones, fallback }
    }

    pub fn zones(&self) -> &[ZoneBounds] {
        &self.zones
    }

    pub fn fallback(&self) -> Section {
        self.fallback
    }

    /// Resolves the zone containing the center of `rect`.
    pub fn locate(&self, rect: &NormalizedRect) -> Section {
        let (cx, cy) = rect.center();
        self.locate_point(cx, cy)
    }

    /// Resolves the zone containing a normalized point.
    pub fn locate_point(&self, x: f64, y: f64) -> Section {
        self.zones
            .iter()
            .find(|zone| zone.bounds.contains(x, y))
            .map_or(self.fallback, |zone| zone.section)
    }
}

impl Default for ZoneLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ZONE_BOUNDS.to_vec(), DEFAULT_FALLBACK_ZONE)
    }
}

#[cfg(test)]
mod tests {
    use super::{NormalizedRect, ZoneBounds, ZoneLayout};
    use crate::model::note::Section;

    fn centered_at(x: f64, y: f64) -> NormalizedRect {
        NormalizedRect::new(x - 0.05, y - 0.02, 0.1, 0.04)
    }

    #[test]
    fn default_layout_resolves_each_zone() {
        let layout = ZoneLayout::default();
        assert_eq!(layout.locate(&centered_at(0.5, 0.15)), Section::Keep);
        assert_eq!(layout.locate(&centered_at(0.15, 0.5)), Section::Stop);
        assert_eq!(layout.locate(&centered_at(0.85, 0.5)), Section::Start);
        assert_eq!(layout.locate(&centered_at(0.15, 0.85)), Section::Less);
        assert_eq!(layout.locate(&centered_at(0.85, 0.85)), Section::More);
        assert_eq!(layout.locate(&centered_at(0.5, 0.5)), Section::Puzzling);
    }

    #[test]
    fn outside_every_zone_falls_back_to_puzzling() {
        let layout = ZoneLayout::default();
        assert_eq!(layout.locate_point(-0.1, -0.1), Section::Puzzling);
        assert_eq!(layout.locate_point(0.1, 0.1), Section::Puzzling);
    }

    #[test]
    fn edges_are_inclusive_and_first_declared_zone_wins() {
        let layout = ZoneLayout::default();
        // Shared edge between keep (y <= 0.3) and stop (y >= 0.3); keep is declared first.
        assert_eq!(layout.locate_point(0.25, 0.3), Section::Keep);
        assert_eq!(layout.locate_point(0.75, 0.0), Section::Keep);
    }

    #[test]
    fn substituted_geometry_changes_resolution_only() {
        let layout = ZoneLayout::new(
            vec![ZoneBounds {
                section: Section::More,
                bounds: NormalizedRect::new(0.0, 0.0, 1.0, 1.0),
            }],
            Section::Stop,
        );
        assert_eq!(layout.locate_point(0.5, 0.5), Section::More);
        assert_eq!(layout.locate_point(1.5, 0.5), Section::Stop);
    }
}
