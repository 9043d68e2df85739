//! Note domain model.
//!
//! # Responsibility
//! - Define the portable note record used by export, import and recovery.
//! - Define the closed color and zone label sets and their wire names.
//!
//! # Invariants
//! - `color` and `section` always belong to their closed sets. Unknown wire
//!   values fail deserialization instead of being coerced.
//! - `id` is non-empty and is never reassigned once a note is stored.
//! - `x`/`y` are opaque position hints and are omitted from the wire when unset.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::id::IdGenerator;

/// Opaque note identifier, unique within one board.
pub type NoteId = String;

/// Display color of a note.
///
/// Declaration order is the palette order used to break classification ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    Yellow,
    Pink,
    Blue,
    Green,
}

impl NoteColor {
    /// All colors in palette order.
    pub const ALL: [NoteColor; 4] = [Self::Yellow, Self::Pink, Self::Blue, Self::Green];

    /// Returns the stable wire/storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Pink => "pink",
            Self::Blue => "blue",
            Self::Green => "green",
        }
    }

    /// Parses a wire/storage name. Returns `None` for anything outside the set.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "yellow" => Some(Self::Yellow),
            "pink" => Some(Self::Pink),
            "blue" => Some(Self::Blue),
            "green" => Some(Self::Green),
            _ => None,
        }
    }
}

impl Display for NoteColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thematic zone of the board a note is grouped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Keep,
    Stop,
    Start,
    Less,
    More,
    /// The "unclear" bucket; also the recovery fallback zone.
    Puzzling,
}

impl Section {
    /// All sections in board declaration order.
    pub const ALL: [Section; 6] = [
        Self::Keep,
        Self::Stop,
        Self::Start,
        Self::Less,
        Self::More,
        Self::Puzzling,
    ];

    /// Returns the stable wire/storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Stop => "stop",
            Self::Start => "start",
            Self::Less => "less",
            Self::More => "more",
            Self::Puzzling => "puzzling",
        }
    }

    /// Parses a wire/storage name. Returns `None` for anything outside the set.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "keep" => Some(Self::Keep),
            "stop" => Some(Self::Stop),
            "start" => Some(Self::Start),
            "less" => Some(Self::Less),
            "more" => Some(Self::More),
            "puzzling" => Some(Self::Puzzling),
            _ => None,
        }
    }
}

impl Display for Section {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Portable unit of board content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Absent ids deserialize as empty; import replaces them regardless.
    #[serde(default)]
    pub id: NoteId,
    /// Free-form text. Length caps are a presentation concern.
    pub text: String,
    pub color: NoteColor,
    pub section: Section,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl Note {
    /// Creates a note without position hints.
    pub fn new(
        id: impl Into<NoteId>,
        text: impl Into<String>,
        color: NoteColor,
        section: Section,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            color,
            section,
            x: None,
            y: None,
        }
    }

    /// Returns the same note carrying both position hints.
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Returns a copy with a freshly generated identifier; content is untouched.
    pub fn with_fresh_id(&self, ids: &dyn IdGenerator) -> Self {
        Self {
            id: ids.next_id(),
            ..self.clone()
        }
    }

    /// Validates invariants that the type system cannot express.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.id.trim().is_empty() {
            return Err(NoteValidationError::EmptyId);
        }
        for (axis, value) in [("x", self.x), ("y", self.y)] {
            if let Some(value) = value {
                if !value.is_finite() {
                    return Err(NoteValidationError::NonFinitePosition { axis, value });
                }
            }
        }
        Ok(())
    }
}

/// Note fields supplied by a caller before an identifier exists.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDraft {
    pub text: String,
    pub color: NoteColor,
    pub section: Section,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl NoteDraft {
    /// Empty yellow note in `section`, the board's "add note" default.
    pub fn blank(section: Section) -> Self {
        Self {
            text: String::new(),
            color: NoteColor::Yellow,
            section,
            x: None,
            y: None,
        }
    }

    /// Materializes the draft with the given identifier.
    pub fn into_note(self, id: NoteId) -> Note {
        Note {
            id,
            text: self.text,
            color: self.color,
            section: self.section,
            x: self.x,
            y: self.y,
        }
    }
}

/// Note invariant violations.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteValidationError {
    EmptyId,
    NonFinitePosition { axis: &'static str, value: f64 },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "note id must not be empty"),
            Self::NonFinitePosition { axis, value } => {
                write!(f, "note position `{axis}` must be finite, got {value}")
            }
        }
    }
}

impl Error for NoteValidationError {}

#[cfg(test)]
mod tests {
    use super::{Note, NoteColor, NoteValidationError, Section};

    #[test]
    fn labels_round_trip_through_wire_names() {
        for color in NoteColor::ALL {
            assert_eq!(NoteColor::parse(color.as_str()), Some(color));
        }
        for section in Section::ALL {
            assert_eq!(Section::parse(section.as_str()), Some(section));
        }
        assert_eq!(NoteColor::parse("Yellow"), None);
        assert_eq!(Section::parse("later"), None);
    }

    #[test]
    fn validate_rejects_blank_id_and_non_finite_hints() {
        let blank = Note::new("  ", "text", NoteColor::Blue, Section::Stop);
        assert_eq!(blank.validate(), Err(NoteValidationError::EmptyId));

        let drifting = Note::new("n-1", "text", NoteColor::Blue, Section::Stop)
            .with_position(f64::NAN, 1.0);
        assert!(matches!(
            drifting.validate(),
            Err(NoteValidationError::NonFinitePosition { axis: "x", .. })
        ));
    }
}
