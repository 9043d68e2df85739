//! OCR engine contract and adapters.
//!
//! # Responsibility
//! - Define the fragment shape consumed by recovery.
//! - Provide interchangeable engines: precomputed fragments and a Tesseract
//!   subprocess adapter.
//!
//! # Invariants
//! - Engines return fragments in their own emission order; recovery keeps it.
//! - Bounding boxes are absolute pixels and are never re-derived by the core.
//! - Engine failures are opaque `EngineError`s and are not retried.

use image::RgbImage;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;
use uuid::Uuid;

/// Language hint passed to engines when none is configured.
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

const TESSERACT_TSV_COLUMNS: usize = 12;
const TSV_LEVEL_BLOCK: u32 = 2;
const TSV_LEVEL_WORD: u32 = 5;

/// Absolute pixel bounding box, `x0,y0` top-left and `x1,y1` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelBox {
    pub const fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    /// Zero-area or inverted boxes carry no samplable center.
    pub fn is_degenerate(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }
}

/// One OCR-detected text region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedFragment {
    pub text: String,
    pub bbox: PixelBox,
}

impl RecognizedFragment {
    pub fn new(text: impl Into<String>, bbox: PixelBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// Text recognizer over a decoded raster.
pub trait OcrEngine {
    /// Short stable name used in logs and errors.
    fn name(&self) -> &'static str;

    fn recognize(
        &self,
        image: &RgbImage,
        language: &str,
    ) -> Result<Vec<RecognizedFragment>, EngineError>;
}

/// Opaque OCR engine failure.
#[derive(Debug)]
pub struct EngineError {
    engine: &'static str,
    message: String,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl EngineError {
    pub fn new(engine: &'static str, message: impl Into<String>) -> Self {
        Self {
            engine,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        engine: &'static str,
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            engine,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn engine(&self) -> &'static str {
        self.engine
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ocr engine `{}` failed: {}", self.engine, self.message)
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn Error + 'static))
    }
}

/// Engine replaying fragments recognized earlier, e.g. loaded from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecomputedOcr {
    fragments: Vec<RecognizedFragment>,
}

impl PrecomputedOcr {
    pub fn new(fragments: Vec<RecognizedFragment>) -> Self {
        Self { fragments }
    }

    /// Parses a JSON array of `{ "text", "bbox": { "x0", "y0", "x1", "y1" } }`.
    pub fn from_json(raw: &[u8]) -> Result<Self, EngineError> {
        let fragments = serde_json::from_slice::<Vec<RecognizedFragment>>(raw).map_err(|err| {
            EngineError::with_source("precomputed", "invalid fragment list", err)
        })?;
        Ok(Self::new(fragments))
    }
}

impl OcrEngine for PrecomputedOcr {
    fn name(&self) -> &'static str {
        "precomputed"
    }

    fn recognize(
        &self,
        _image: &RgbImage,
        _language: &str,
    ) -> Result<Vec<RecognizedFragment>, EngineError> {
        Ok(self.fragments.clone())
    }
}

/// Runs the `tesseract` binary and groups its TSV words into text blocks.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
}

impl TesseractCli {
    pub fn new() -> Self {
        Self::with_binary("tesseract")
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractCli {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(
        &self,
        image: &RgbImage,
        language: &str,
    ) -> Result<Vec<RecognizedFragment>, EngineError> {
        let started_at = Instant::now();
        let input_path =
            std::env::temp_dir().join(format!("retroboard_ocr_{}.png", Uuid::new_v4()));
        image
            .save(&input_path)
            .map_err(|err| EngineError::with_source(self.name(), "failed to stage image", err))?;

        let output = Command::new(&self.binary)
            .arg(&input_path)
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .arg("tsv")
            .output();
        if let Err(err) = std::fs::remove_file(&input_path) {
            warn!(
                "event=ocr_cleanup module=portability status=error engine=tesseract path={} reason={}",
                input_path.display(),
                err
            );
        }

        let output = output
            .map_err(|err| EngineError::with_source(self.name(), "failed to run binary", err))?;
        if !output.status.success() {
            error!(
                "event=ocr_run module=portability status=error engine=tesseract duration_ms={} exit={:?}",
                started_at.elapsed().as_millis(),
                output.status.code()
            );
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::new(
                self.name(),
                format!("exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let fragments = parse_tesseract_tsv(&stdout)?;
        info!(
            "event=ocr_run module=portability status=ok engine=tesseract duration_ms={} fragments={}",
            started_at.elapsed().as_millis(),
            fragments.len()
        );
        Ok(fragments)
    }
}

#[derive(Default)]
struct BlockAccumulator {
    bbox: Option<PixelBox>,
    lines: BTreeMap<(u32, u32), Vec<String>>,
}

/// Aggregates Tesseract TSV output into block-level fragments.
///
/// Block boxes come from level-2 rows; text is the block's level-5 words,
/// joined by spaces within a line and by newlines between lines.
pub fn parse_tesseract_tsv(tsv: &str) -> Result<Vec<RecognizedFragment>, EngineError> {
    let mut order: Vec<(u32, u32)> = Vec::new();
    let mut blocks: BTreeMap<(u32, u32), BlockAccumulator> = BTreeMap::new();

    for (index, line) in tsv.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with("level") {
            continue;
        }
        let columns: Vec<&str> = line.splitn(TESSERACT_TSV_COLUMNS, '\t').collect();
        if columns.len() < TESSERACT_TSV_COLUMNS - 1 {
            return Err(EngineError::new(
                "tesseract",
                format!("malformed tsv row {}", index + 1),
            ));
        }
        let field = |position: usize| -> Result<u32, EngineError> {
            columns[position].trim().parse::<u32>().map_err(|err| {
                EngineError::with_source(
                    "tesseract",
                    format!("invalid tsv column {position} on row {}", index + 1),
                    err,
                )
            })
        };

        let level = field(0)?;
        let key = (field(1)?, field(2)?);
        if !blocks.contains_key(&key) {
            order.push(key);
        }
        let block = blocks.entry(key).or_default();

        if level == TSV_LEVEL_BLOCK {
            let (left, top, width, height) = (field(6)?, field(7)?, field(8)?, field(9)?);
            block.bbox = Some(PixelBox::new(
                left,
                top,
                left.saturating_add(width),
                top.saturating_add(height),
            ));
        } else if level == TSV_LEVEL_WORD {
            let word = columns.get(11).map_or("", |value| value.trim());
            if !word.is_empty() {
                block
                    .lines
                    .entry((field(3)?, field(4)?))
                    .or_default()
                    .push(word.to_string());
            }
        }
    }

    let mut fragments = Vec::new();
    for key in order {
        let Some(block) = blocks.remove(&key) else {
            continue;
        };
        let Some(bbox) = block.bbox else {
            continue;
        };
        let text = block
            .lines
            .into_values()
            .map(|words| words.join(" "))
            .collect::<Vec<_>>()
            .join("\n");
        fragments.push(RecognizedFragment::new(text, bbox));
    }
    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::{
        parse_tesseract_tsv, OcrEngine, PixelBox, PrecomputedOcr, RecognizedFragment,
        TesseractCli,
    };
    use image::RgbImage;

    const HEADER: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn tsv_words_group_into_blocks_in_emission_order() {
        let tsv = [
            HEADER,
            "1\t1\t0\t0\t0\t0\t0\t0\t1000\t800\t-1\t",
            "2\t1\t1\t0\t0\t0\t300\t20\t400\t40\t-1\t",
            "5\t1\t1\t1\t1\t1\t300\t20\t80\t40\t96.1\tKEEP",
            "2\t1\t2\t0\t0\t0\t100\t300\t200\t60\t-1\t",
            "5\t1\t2\t1\t1\t1\t100\t300\t60\t20\t91.0\tDeploy",
            "5\t1\t2\t1\t1\t2\t170\t300\t40\t20\t90.2\twas",
            "5\t1\t2\t1\t2\t1\t100\t330\t60\t20\t88.7\trocky",
        ]
        .join("\n");

        let fragments = parse_tesseract_tsv(&tsv).unwrap();
        assert_eq!(
            fragments,
            vec![
                RecognizedFragment::new("KEEP", PixelBox::new(300, 20, 700, 60)),
                RecognizedFragment::new("Deploy was\nrocky", PixelBox::new(100, 300, 300, 360)),
            ]
        );
    }

    #[test]
    fn malformed_tsv_is_an_engine_error() {
        let err = parse_tesseract_tsv("2\t1\tx\t0\t0\t0\t1\t1\t1\t1\t-1\t").unwrap_err();
        assert_eq!(err.engine(), "tesseract");
        assert!(err.to_string().contains("invalid tsv column 2"));
    }

    #[test]
    fn oversized_tsv_geometry_saturates_instead_of_overflowing() {
        let tsv = [
            HEADER,
            "2\t1\t1\t0\t0\t0\t4294967290\t4294967000\t100\t4294967295\t-1\t",
            "5\t1\t1\t1\t1\t1\t4294967290\t4294967000\t10\t10\t90.0\tEdge",
        ]
        .join("\n");

        let fragments = parse_tesseract_tsv(&tsv).unwrap();
        assert_eq!(
            fragments,
            vec![RecognizedFragment::new(
                "Edge",
                PixelBox::new(4_294_967_290, 4_294_967_000, u32::MAX, u32::MAX)
            )]
        );
    }

    #[test]
    fn default_tesseract_engine_uses_binary_on_path() {
        let engine = TesseractCli::default();
        assert_eq!(engine.name(), "tesseract");
        assert_eq!(format!("{engine:?}"), format!("{:?}", TesseractCli::new()));
    }

    #[test]
    fn missing_tesseract_binary_is_an_engine_error() {
        let engine = TesseractCli::with_binary("/nonexistent/retroboard-tesseract");
        let err = engine.recognize(&RgbImage::new(4, 4), "eng").unwrap_err();
        assert_eq!(err.engine(), "tesseract");
        assert!(err.to_string().contains("failed to run binary"));
    }

    #[test]
    fn precomputed_engine_replays_json_fragments() {
        let raw = br#"[{"text":"Ship it","bbox":{"x0":1,"y0":2,"x1":30,"y1":40}}]"#;
        let engine = PrecomputedOcr::from_json(raw).unwrap();
        let fragments = engine.recognize(&RgbImage::new(1, 1), "eng").unwrap();
        assert_eq!(
            fragments,
            vec![RecognizedFragment::new("Ship it", PixelBox::new(1, 2, 30, 40))]
        );
    }

    #[test]
    fn precomputed_engine_rejects_invalid_json() {
        assert!(PrecomputedOcr::from_json(b"{not json").is_err());
    }
}
