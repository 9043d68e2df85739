//! Versioned portable document codec.
//!
//! # Responsibility
//! - Export a note sequence as a `PortableDocument` JSON artifact.
//! - Parse documents back, rejecting malformed input and unknown versions.
//!
//! # Invariants
//! - Export carries note ids verbatim; import replaces every id unconditionally.
//! - Import is all-or-nothing: any error yields no notes.
//! - Version is checked before the document structure, so an unsupported
//!   file is reported as such even if its layout differs.
//! - Out-of-set `color`/`section` values are format errors, never coerced.

use crate::model::id::IdGenerator;
use crate::model::note::Note;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Schema version written by this codec.
pub const DOCUMENT_VERSION: &str = "1.0";

/// Schema versions this codec can import.
pub const SUPPORTED_VERSIONS: &[&str] = &[DOCUMENT_VERSION];

/// Export artifact for a full note set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableDocument {
    pub version: String,
    #[serde(rename = "exportDate", with = "iso_millis")]
    pub export_date: DateTime<Utc>,
    pub notes: Vec<Note>,
}

impl PortableDocument {
    /// Builds a current-version document; notes are copied verbatim.
    pub fn new(notes: &[Note], exported_at: DateTime<Utc>) -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            export_date: exported_at,
            notes: notes.to_vec(),
        }
    }
}

/// Codec failures.
#[derive(Debug)]
pub enum CodecError {
    /// Input is not a well-formed document.
    Format {
        reason: String,
        source: Option<serde_json::Error>,
    },
    /// Input is well-formed but declares a version this codec cannot read.
    UnsupportedVersion { found: Option<String> },
    /// Export serialization failed.
    Serialize(serde_json::Error),
}

impl CodecError {
    fn format(reason: impl Into<String>, source: Option<serde_json::Error>) -> Self {
        Self::Format {
            reason: reason.into(),
            source,
        }
    }

    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    pub fn is_unsupported_version(&self) -> bool {
        matches!(self, Self::UnsupportedVersion { .. })
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Format { .. } => "format_error",
            Self::UnsupportedVersion { .. } => "version_error",
            Self::Serialize(_) => "serialize_error",
        }
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format {
                reason,
                source: Some(err),
            } => write!(f, "invalid board document: {reason}: {err}"),
            Self::Format {
                reason,
                source: None,
            } => write!(f, "invalid board document: {reason}"),
            Self::UnsupportedVersion { found: Some(found) } => {
                write!(f, "unsupported board document version `{found}`")
            }
            Self::UnsupportedVersion { found: None } => {
                write!(f, "board document does not declare a version")
            }
            Self::Serialize(err) => write!(f, "failed to serialize board document: {err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Format {
                source: Some(err), ..
            } => Some(err),
            Self::Serialize(err) => Some(err),
            _ => None,
        }
    }
}

/// Serializes `notes` as pretty-printed JSON stamped with `exported_at`.
pub fn export_document(notes: &[Note], exported_at: DateTime<Utc>) -> Result<String, CodecError> {
    let document = PortableDocument::new(notes, exported_at);
    let json = serde_json::to_string_pretty(&document).map_err(CodecError::Serialize)?;
    info!(
        "event=document_export module=portability status=ok version={} notes={} bytes={}",
        DOCUMENT_VERSION,
        notes.len(),
        json.len()
    );
    Ok(json)
}

/// Same as [`export_document`] stamped with the current time.
pub fn export_document_now(notes: &[Note]) -> Result<String, CodecError> {
    export_document(notes, Utc::now())
}

/// Parses and version-checks a document without touching note ids.
pub fn parse_document(raw: &[u8]) -> Result<PortableDocument, CodecError> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|err| CodecError::format("not valid JSON", Some(err)))?;

    let Value::Object(fields) = &value else {
        return Err(CodecError::format("top-level value must be an object", None));
    };

    match fields.get("version") {
        Some(Value::String(version)) if SUPPORTED_VERSIONS.contains(&version.as_str()) => {}
        Some(Value::String(version)) => {
            return Err(CodecError::UnsupportedVersion {
                found: Some(version.clone()),
            })
        }
        Some(other) => {
            return Err(CodecError::UnsupportedVersion {
                found: Some(other.to_string()),
            })
        }
        None => return Err(CodecError::UnsupportedVersion { found: None }),
    }

    serde_json::from_value(value)
        .map_err(|err| CodecError::format("document structure mismatch", Some(err)))
}

/// Imports a document, assigning every note a fresh identifier.
pub fn import_document(raw: &[u8], ids: &dyn IdGenerator) -> Result<Vec<Note>, CodecError> {
    let document = match parse_document(raw) {
        Ok(document) => document,
        Err(err) => {
            warn!(
                "event=document_import module=portability status=error bytes={} error_code={}",
                raw.len(),
                err.code()
            );
            return Err(err);
        }
    };

    let notes: Vec<Note> = document
        .notes
        .iter()
        .map(|note| note.with_fresh_id(ids))
        .collect();
    info!(
        "event=document_import module=portability status=ok version={} notes={}",
        document.version,
        notes.len()
    );
    Ok(notes)
}

/// Writes RFC 3339 with millisecond precision and a `Z` suffix.
///
/// Reads any ISO-8601 date or date-time; values without an offset are UTC.
mod iso_millis {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("`{raw}` is not an ISO-8601 date or date-time"))
        })
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
            return Some(value.with_timezone(&Utc));
        }
        if let Ok(value) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(value.and_utc());
        }
        if let Ok(value) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
            return Some(value.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|value| value.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::{export_document, iso_millis, parse_document, CodecError};
    use crate::model::note::{Note, NoteColor, Section};
    use chrono::{TimeZone, Utc};

    #[test]
    fn export_uses_camel_case_date_and_millisecond_precision() {
        let exported_at = Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap();
        let notes = vec![Note::new("a", "Ship smaller PRs", NoteColor::Pink, Section::Start)];
        let json = export_document(&notes, exported_at).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["exportDate"], "2026-10-19T09:30:00.000Z");
        assert_eq!(value["notes"][0]["id"], "a");
        assert_eq!(value["notes"][0]["color"], "pink");
        assert_eq!(value["notes"][0]["section"], "start");
        assert!(value["notes"][0].get("x").is_none());
        assert!(json.contains("\n  \"version\""));
    }

    #[test]
    fn non_string_version_is_unsupported() {
        let err = parse_document(br#"{"version":1.0,"exportDate":"x","notes":[]}"#).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnsupportedVersion { found: Some(ref found) } if found == "1.0"
        ));
    }

    #[test]
    fn export_date_accepts_iso_forms_without_offset() {
        assert_eq!(
            iso_millis::parse("2024-05-02T08:15:30"),
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 8, 15, 30).unwrap())
        );
        assert_eq!(
            iso_millis::parse("2024-05-02T08:15"),
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 8, 15, 0).unwrap())
        );
        assert_eq!(
            iso_millis::parse("2024-05-02"),
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(
            iso_millis::parse("2024-05-02T10:15:30+02:00"),
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 8, 15, 30).unwrap())
        );
        assert_eq!(iso_millis::parse("yesterday"), None);
        assert_eq!(iso_millis::parse("2024-13-40"), None);
    }

    #[test]
    fn non_object_top_level_is_format_error() {
        assert!(parse_document(b"[]").unwrap_err().is_format());
    }

    #[test]
    fn out_of_set_labels_are_format_errors() {
        let raw = br#"{
            "version": "1.0",
            "exportDate": "2026-10-19T09:30:00.000Z",
            "notes": [{ "id": "a", "text": "t", "color": "purple", "section": "keep" }]
        }"#;
        assert!(parse_document(raw).unwrap_err().is_format());
    }
}
