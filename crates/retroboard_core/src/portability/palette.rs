//! Nearest-reference color classification.
//!
//! # Invariants
//! - A `Palette` is never empty, so classification is total over all RGB inputs.
//! - Ties resolve to the entry declared first; entries are scanned in order
//!   with a strict `<` comparison.

use crate::model::note::NoteColor;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static DEFAULT_PALETTE: Lazy<Palette> = Lazy::new(Palette::default);

/// 8-bit sRGB sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Squared Euclidean distance. Orders identically to the true distance.
    pub fn distance_squared(self, other: Rgb) -> u32 {
        let dr = i32::from(self.r) - i32::from(other.r);
        let dg = i32::from(self.g) - i32::from(other.g);
        let db = i32::from(self.b) - i32::from(other.b);
        (dr * dr + dg * dg + db * db) as u32
    }
}

impl From<image::Rgb<u8>> for Rgb {
    fn from(value: image::Rgb<u8>) -> Self {
        let [r, g, b] = value.0;
        Self { r, g, b }
    }
}

/// One reference color of the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub color: NoteColor,
    pub reference: Rgb,
}

/// Built-in references, in tie-break order.
pub const DEFAULT_PALETTE_ENTRIES: [PaletteEntry; 4] = [
    PaletteEntry {
        color: NoteColor::Yellow,
        reference: Rgb::new(255, 215, 0),
    },
    PaletteEntry {
        color: NoteColor::Pink,
        reference: Rgb::new(255, 153, 204),
    },
    PaletteEntry {
        color: NoteColor::Blue,
        reference: Rgb::new(102, 179, 255),
    },
    PaletteEntry {
        color: NoteColor::Green,
        reference: Rgb::new(102, 255, 102),
    },
];

/// Ordered, non-empty set of reference colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PaletteEntry>", into = "Vec<PaletteEntry>")]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    pub fn new(entries: Vec<PaletteEntry>) -> Result<Self, PaletteError> {
        if entries.is_empty() {
            return Err(PaletteError::Empty);
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    /// Returns the label whose reference is nearest to `sample`.
    pub fn classify(&self, sample: Rgb) -> NoteColor {
        let mut best = self.entries[0];
        let mut best_distance = sample.distance_squared(best.reference);
        for entry in &self.entries[1..] {
            let distance = sample.distance_squared(entry.reference);
            if distance < best_distance {
                best = *entry;
                best_distance = distance;
            }
        }
        best.color
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            entries: DEFAULT_PALETTE_ENTRIES.to_vec(),
        }
    }
}

impl TryFrom<Vec<PaletteEntry>> for Palette {
    type Error = PaletteError;

    fn try_from(value: Vec<PaletteEntry>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Palette> for Vec<PaletteEntry> {
    fn from(value: Palette) -> Self {
        value.entries
    }
}

/// Classifies against the built-in palette.
pub fn classify_color(r: u8, g: u8, b: u8) -> NoteColor {
    DEFAULT_PALETTE.classify(Rgb::new(r, g, b))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteError {
    Empty,
}

impl Display for PaletteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "palette must contain at least one reference color"),
        }
    }
}

impl Error for PaletteError {}
