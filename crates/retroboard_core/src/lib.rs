//! Core logic for the retrospective board.
//! Owns note invariants, the local board store and the portability pipeline
//! (document export/import and visual recovery from board snapshots).

pub mod db;
pub mod logging;
pub mod model;
pub mod portability;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::board::{Board, BoardId, ANONYMOUS_ACTOR, DEFAULT_BOARD_NAME};
pub use model::id::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use model::note::{Note, NoteColor, NoteDraft, NoteId, NoteValidationError, Section};
pub use portability::codec::{
    export_document, export_document_now, import_document, parse_document, CodecError,
    PortableDocument, DOCUMENT_VERSION,
};
pub use portability::filter::{ChromeFilter, FilterVerdict};
pub use portability::ocr::{
    EngineError, OcrEngine, PixelBox, PrecomputedOcr, RecognizedFragment, TesseractCli,
};
pub use portability::palette::{classify_color, Palette, PaletteEntry, Rgb};
pub use portability::recovery::{
    decode_raster, recover_notes, recover_with_engine, RecoveryConfig, RecoveryError,
    RecoveryReport, SamplingError,
};
pub use portability::zones::{NormalizedRect, ZoneBounds, ZoneLayout};
pub use repo::board_repo::{BoardRepository, RepoError, RepoResult, SqliteBoardRepository};
pub use service::board_service::{BoardService, BoardServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
