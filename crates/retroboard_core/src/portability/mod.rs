//! Board data portability and visual recovery pipeline.
//!
//! # Responsibility
//! - Serialize notes into a versioned portable document and parse it back.
//! - Rebuild structured notes from a rasterized board snapshot plus OCR
//!   fragments, using zone geometry and color distance only.
//!
//! # Invariants
//! - Classification tables are data (`Palette`, `ZoneLayout`, `ChromeFilter`)
//!   and never hardcoded branches.
//! - Imported and recovered notes always receive freshly generated ids.
//! - A single unsampleable fragment never fails a whole recovery batch.

pub mod codec;
pub mod filter;
pub mod ocr;
pub mod palette;
pub mod recovery;
pub mod zones;
