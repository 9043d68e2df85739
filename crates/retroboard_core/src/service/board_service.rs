//! Board use-case service.
//!
//! # Responsibility
//! - Provide board/note CRUD entry points with explicit board and actor ids.
//! - Wire export, document import and image recovery to the board store.
//!
//! # Invariants
//! - New notes, imported notes and recovered notes always get fresh ids from
//!   the injected generator.
//! - A failed import (format, version or storage) leaves the board unchanged.
//!
//! # See also
//! - `portability::codec`, `portability::recovery`

use crate::model::board::{Board, DEFAULT_BOARD_NAME};
use crate::model::id::{IdGenerator, UuidIdGenerator};
use crate::model::note::{Note, NoteColor, NoteDraft, Section};
use crate::portability::codec::{self, CodecError};
use crate::portability::ocr::{OcrEngine, RecognizedFragment};
use crate::portability::recovery::{
    recover_notes, recover_with_engine, RecoveryConfig, RecoveryError, RecoveryReport,
};
use crate::repo::board_repo::{BoardRepository, RepoError};
use chrono::{DateTime, Utc};
use image::RgbImage;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for board use-cases.
#[derive(Debug)]
pub enum BoardServiceError {
    /// Board name is blank.
    InvalidName,
    /// Target board does not exist.
    BoardNotFound(String),
    /// Document could not be exported or imported.
    Codec(CodecError),
    /// Image recovery failed as a whole.
    Recovery(RecoveryError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for BoardServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "board name must not be blank"),
            Self::BoardNotFound(board_id) => write!(f, "board not found: {board_id}"),
            Self::Codec(err) => write!(f, "{err}"),
            Self::Recovery(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BoardServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Codec(err) => Some(err),
            Self::Recovery(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BoardServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::BoardNotFound(board_id) => Self::BoardNotFound(board_id),
            other => Self::Repo(other),
        }
    }
}

impl From<CodecError> for BoardServiceError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

impl From<RecoveryError> for BoardServiceError {
    fn from(value: RecoveryError) -> Self {
        Self::Recovery(value)
    }
}

pub type ServiceResult<T> = Result<T, BoardServiceError>;

/// Board service facade over repository implementations.
pub struct BoardService<R: BoardRepository> {
    repo: R,
    ids: Box<dyn IdGenerator>,
}

impl<R: BoardRepository> BoardService<R> {
    /// Creates a service minting UUID v4 identifiers.
    pub fn new(repo: R) -> Self {
        Self::with_id_generator(repo, Box::new(UuidIdGenerator))
    }

    /// Creates a service with a caller-supplied identifier generator.
    pub fn with_id_generator(repo: R, ids: Box<dyn IdGenerator>) -> Self {
        Self { repo, ids }
    }

    /// Creates a board; `None` uses the default board name.
    pub fn create_board(&self, name: Option<&str>, actor: &str) -> ServiceResult<Board> {
        let name = match name {
            Some(value) if value.trim().is_empty() => return Err(BoardServiceError::InvalidName),
            Some(value) => value.trim(),
            None => DEFAULT_BOARD_NAME,
        };
        let board_id = self.ids.next_id();
        Ok(self.repo.create_board(&board_id, name, actor)?)
    }

    pub fn get_board(&self, board_id: &str) -> ServiceResult<Option<Board>> {
        Ok(self.repo.get_board(board_id)?)
    }

    /// Adds one note with a fresh id.
    pub fn add_note(&self, board_id: &str, actor: &str, draft: NoteDraft) -> ServiceResult<Note> {
        let note = draft.into_note(self.ids.next_id());
        self.repo.insert_note(board_id, actor, &note)?;
        Ok(note)
    }

    pub fn update_note_text(&self, board_id: &str, note_id: &str, text: &str) -> ServiceResult<()> {
        Ok(self.repo.update_note_text(board_id, note_id, text)?)
    }

    pub fn move_note(&self, board_id: &str, note_id: &str, section: Section) -> ServiceResult<()> {
        Ok(self.repo.move_note(board_id, note_id, section)?)
    }

    pub fn change_note_color(
        &self,
        board_id: &str,
        note_id: &str,
        color: NoteColor,
    ) -> ServiceResult<()> {
        Ok(self.repo.change_note_color(board_id, note_id, color)?)
    }

    pub fn delete_note(&self, board_id: &str, note_id: &str) -> ServiceResult<()> {
        Ok(self.repo.delete_note(board_id, note_id)?)
    }

    pub fn list_notes(&self, board_id: &str) -> ServiceResult<Vec<Note>> {
        Ok(self.repo.list_notes(board_id)?)
    }

    pub fn clear_board(&mut self, board_id: &str) -> ServiceResult<usize> {
        Ok(self.repo.clear_board(board_id)?)
    }

    /// Exports every note of the board as a portable document stamped now.
    pub fn export_board(&self, board_id: &str) -> ServiceResult<String> {
        self.export_board_at(board_id, Utc::now())
    }

    /// Exports every note of the board stamped with `exported_at`.
    pub fn export_board_at(
        &self,
        board_id: &str,
        exported_at: DateTime<Utc>,
    ) -> ServiceResult<String> {
        let notes = self.repo.list_notes(board_id)?;
        Ok(codec::export_document(&notes, exported_at)?)
    }

    /// Imports a portable document into the board.
    ///
    /// Returns the stored notes, carrying their regenerated ids.
    pub fn import_document(
        &mut self,
        board_id: &str,
        actor: &str,
        raw: &[u8],
    ) -> ServiceResult<Vec<Note>> {
        let notes = codec::import_document(raw, self.ids.as_ref())?;
        self.repo.import_notes(board_id, actor, &notes)?;
        Ok(notes)
    }

    /// Recovers notes from already recognized fragments and stores them.
    pub fn recover_into_board(
        &mut self,
        board_id: &str,
        actor: &str,
        image: &RgbImage,
        fragments: &[RecognizedFragment],
        config: &RecoveryConfig,
    ) -> ServiceResult<RecoveryReport> {
        let report = recover_notes(image, fragments, config, self.ids.as_ref());
        self.repo.import_notes(board_id, actor, &report.notes)?;
        Ok(report)
    }

    /// Runs `engine` over the image, then stores the recovered notes.
    pub fn recover_with_engine_into_board(
        &mut self,
        board_id: &str,
        actor: &str,
        engine: &dyn OcrEngine,
        image: &RgbImage,
        config: &RecoveryConfig,
    ) -> ServiceResult<RecoveryReport> {
        let report = recover_with_engine(engine, image, config, self.ids.as_ref())?;
        self.repo.import_notes(board_id, actor, &report.notes)?;
        Ok(report)
    }
}
