//! Visual recovery of notes from a rasterized board snapshot.
//!
//! # Responsibility
//! - Turn OCR fragments plus the raster they came from into structured notes.
//! - Resolve each note's zone from geometry and its color from one pixel.
//!
//! # Invariants
//! - Output order is the OCR emission order; processing is sequential.
//! - The raster is only read, never mutated.
//! - A fragment whose center cannot be sampled is dropped with a warning and
//!   the batch continues.
//! - Recovered notes get fresh ids and no position hints.

use crate::model::id::IdGenerator;
use crate::model::note::Note;
use crate::portability::filter::{ChromeFilter, FilterVerdict};
use crate::portability::ocr::{
    EngineError, OcrEngine, PixelBox, RecognizedFragment, DEFAULT_OCR_LANGUAGE,
};
use crate::portability::palette::{Palette, Rgb};
use crate::portability::zones::{NormalizedRect, ZoneLayout};
use image::RgbImage;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Classification tables and engine hints used by recovery.
///
/// Every field defaults to the built-in board layout, so a partial JSON
/// config only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    pub palette: Palette,
    pub zones: ZoneLayout,
    #[serde(rename = "denylist")]
    pub filter: ChromeFilter,
    pub language: String,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            zones: ZoneLayout::default(),
            filter: ChromeFilter::default(),
            language: DEFAULT_OCR_LANGUAGE.to_string(),
        }
    }
}

impl RecoveryConfig {
    /// Loads a config from JSON; absent fields keep their defaults.
    pub fn from_json(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }
}

/// Why a fragment's color could not be sampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplingError {
    DegenerateBox(PixelBox),
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

impl Display for SamplingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateBox(bbox) => write!(
                f,
                "degenerate bounding box ({},{})-({},{})",
                bbox.x0, bbox.y0, bbox.x1, bbox.y1
            ),
            Self::OutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(f, "sample point ({x},{y}) outside {width}x{height} image"),
        }
    }
}

impl Error for SamplingError {}

/// Failures that abort a whole recovery run.
#[derive(Debug)]
pub enum RecoveryError {
    /// The supplied bytes are not a decodable raster.
    Decode(image::ImageError),
    /// The OCR engine failed; propagated unchanged.
    Engine(EngineError),
}

impl Display for RecoveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "failed to decode board image: {err}"),
            Self::Engine(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RecoveryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Decode(err) => Some(err),
            Self::Engine(err) => Some(err),
        }
    }
}

impl From<EngineError> for RecoveryError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<image::ImageError> for RecoveryError {
    fn from(value: image::ImageError) -> Self {
        Self::Decode(value)
    }
}

/// Notes recovered from one snapshot plus counts of what was left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecoveryReport {
    pub notes: Vec<Note>,
    /// Blank or chrome fragments.
    pub discarded: usize,
    /// Fragments whose center pixel could not be sampled.
    pub unsampleable: usize,
}

/// Decodes PNG/JPEG bytes into an RGB raster.
pub fn decode_raster(bytes: &[u8]) -> Result<RgbImage, RecoveryError> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

/// Divides a pixel box by the image dimensions.
pub fn normalize_box(bbox: &PixelBox, width: u32, height: u32) -> NormalizedRect {
    let (w, h) = (f64::from(width), f64::from(height));
    NormalizedRect::new(
        f64::from(bbox.x0) / w,
        f64::from(bbox.y0) / h,
        f64::from(bbox.width()) / w,
        f64::from(bbox.height()) / h,
    )
}

/// Samples the pixel under the absolute center of `bbox`.
pub fn sample_center(image: &RgbImage, bbox: &PixelBox) -> Result<Rgb, SamplingError> {
    if bbox.is_degenerate() {
        return Err(SamplingError::DegenerateBox(*bbox));
    }
    let cx = f64::from(bbox.x0) + f64::from(bbox.width()) / 2.0;
    let cy = f64::from(bbox.y0) + f64::from(bbox.height()) / 2.0;
    let (x, y) = (cx.floor() as u32, cy.floor() as u32);
    image
        .get_pixel_checked(x, y)
        .map(|pixel| Rgb::from(*pixel))
        .ok_or(SamplingError::OutOfBounds {
            x,
            y,
            width: image.width(),
            height: image.height(),
        })
}

/// Rebuilds notes from `fragments` recognized over `image`.
pub fn recover_notes(
    image: &RgbImage,
    fragments: &[RecognizedFragment],
    config: &RecoveryConfig,
    ids: &dyn IdGenerator,
) -> RecoveryReport {
    let started_at = Instant::now();
    let mut report = RecoveryReport::default();

    for (index, fragment) in fragments.iter().enumerate() {
        let text = match config.filter.evaluate(&fragment.text) {
            FilterVerdict::Keep(text) => text,
            FilterVerdict::Blank | FilterVerdict::Chrome(_) => {
                report.discarded += 1;
                continue;
            }
        };

        let normalized = normalize_box(&fragment.bbox, image.width(), image.height());
        let section = config.zones.locate(&normalized);

        let sample = match sample_center(image, &fragment.bbox) {
            Ok(sample) => sample,
            Err(err) => {
                warn!(
                    "event=recovery_fragment module=portability status=skip index={} reason={}",
                    index, err
                );
                report.unsampleable += 1;
                continue;
            }
        };
        let color = config.palette.classify(sample);

        report
            .notes
            .push(Note::new(ids.next_id(), text, color, section));
    }

    info!(
        "event=recovery_run module=portability status=ok duration_ms={} fragments={} notes={} discarded={} unsampleable={}",
        started_at.elapsed().as_millis(),
        fragments.len(),
        report.notes.len(),
        report.discarded,
        report.unsampleable
    );
    report
}

/// Runs `engine` over `image` with the configured language, then recovers notes.
pub fn recover_with_engine(
    engine: &dyn OcrEngine,
    image: &RgbImage,
    config: &RecoveryConfig,
    ids: &dyn IdGenerator,
) -> Result<RecoveryReport, RecoveryError> {
    let fragments = engine.recognize(image, &config.language).map_err(|err| {
        warn!(
            "event=recovery_run module=portability status=error engine={} error_code=engine_failed",
            engine.name()
        );
        err
    })?;
    Ok(recover_notes(image, &fragments, config, ids))
}

#[cfg(test)]
mod tests {
    use super::{normalize_box, sample_center, RecoveryConfig, SamplingError};
    use crate::model::note::Section;
    use crate::portability::ocr::PixelBox;
    use crate::portability::palette::Rgb;
    use image::{Rgb as Pixel, RgbImage};

    #[test]
    fn normalize_divides_by_image_dimensions() {
        let rect = normalize_box(&PixelBox::new(100, 100, 300, 140), 1000, 1000);
        assert!((rect.x - 0.1).abs() < 1e-9);
        assert!((rect.y - 0.1).abs() < 1e-9);
        assert!((rect.width - 0.2).abs() < 1e-9);
        assert!((rect.height - 0.04).abs() < 1e-9);
    }

    #[test]
    fn sample_reads_center_pixel() {
        let mut image = RgbImage::from_pixel(10, 10, Pixel([0, 0, 0]));
        image.put_pixel(5, 3, Pixel([1, 2, 3]));
        let sample = sample_center(&image, &PixelBox::new(2, 2, 8, 5)).unwrap();
        assert_eq!(sample, Rgb::new(1, 2, 3));
    }

    #[test]
    fn sample_rejects_degenerate_and_out_of_bounds_boxes() {
        let image = RgbImage::new(10, 10);
        assert!(matches!(
            sample_center(&image, &PixelBox::new(4, 4, 4, 9)),
            Err(SamplingError::DegenerateBox(_))
        ));
        assert!(matches!(
            sample_center(&image, &PixelBox::new(20, 20, 40, 40)),
            Err(SamplingError::OutOfBounds { x: 30, y: 30, .. })
        ));
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let config = RecoveryConfig::from_json(br#"{"language":"deu"}"#).unwrap();
        assert_eq!(config.language, "deu");
        assert_eq!(config.zones.fallback(), Section::Puzzling);
        assert_eq!(config.filter, RecoveryConfig::default().filter);
    }
}
