//! Board/note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist board metadata and per-board note collections keyed by note id.
//! - Apply batch imports atomically.
//!
//! # Invariants
//! - Every operation names its board explicitly; there is no current board.
//! - Note writes validate the note before SQL mutations.
//! - Read paths reject out-of-set color/section values instead of masking them.
//! - `import_notes` writes all notes or none.
//! - `list_notes` returns creation order (`created_at ASC`, then insertion order).

use crate::db::DbError;
use crate::model::board::{Board, BoardId};
use crate::model::note::{Note, NoteColor, NoteId, NoteValidationError, Section};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const NOTE_SELECT_SQL: &str = "SELECT id, text, color, section, x, y FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for board store operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Db(DbError),
    BoardNotFound(BoardId),
    NoteNotFound { board_id: BoardId, note_id: NoteId },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::BoardNotFound(board_id) => write!(f, "board not found: {board_id}"),
            Self::NoteNotFound { board_id, note_id } => {
                write!(f, "note not found: {note_id} on board {board_id}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted board data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Store contract consumed by the board service.
pub trait BoardRepository {
    fn create_board(&self, board_id: &str, name: &str, actor: &str) -> RepoResult<Board>;
    fn get_board(&self, board_id: &str) -> RepoResult<Option<Board>>;
    fn insert_note(&self, board_id: &str, actor: &str, note: &Note) -> RepoResult<()>;
    fn get_note(&self, board_id: &str, note_id: &str) -> RepoResult<Option<Note>>;
    fn update_note_text(&self, board_id: &str, note_id: &str, text: &str) -> RepoResult<()>;
    fn move_note(&self, board_id: &str, note_id: &str, section: Section) -> RepoResult<()>;
    fn change_note_color(&self, board_id: &str, note_id: &str, color: NoteColor)
        -> RepoResult<()>;
    fn delete_note(&self, board_id: &str, note_id: &str) -> RepoResult<()>;
    fn list_notes(&self, board_id: &str) -> RepoResult<Vec<Note>>;
    /// Inserts every note in one transaction. Returns the inserted count.
    fn import_notes(&mut self, board_id: &str, actor: &str, notes: &[Note]) -> RepoResult<usize>;
    /// Deletes every note of the board. Returns the deleted count.
    fn clear_board(&mut self, board_id: &str) -> RepoResult<usize>;
}

/// SQLite-backed board store.
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    fn require_board(&self, board_id: &str) -> RepoResult<()> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM boards WHERE id = ?1);",
            [board_id],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(RepoError::BoardNotFound(board_id.to_string()))
        }
    }

    fn touch_note(&self, board_id: &str, note_id: &str, column: &str, value: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE notes
                 SET {column} = ?3, updated_at = (strftime('%s', 'now') * 1000)
                 WHERE board_id = ?1 AND id = ?2;"
            ),
            params![board_id, note_id, value],
        )?;
        if changed == 0 {
            return Err(self.missing_note(board_id, note_id));
        }
        touch_board(self.conn, board_id)?;
        Ok(())
    }

    fn missing_note(&self, board_id: &str, note_id: &str) -> RepoError {
        match self.require_board(board_id) {
            Err(err) => err,
            Ok(()) => RepoError::NoteNotFound {
                board_id: board_id.to_string(),
                note_id: note_id.to_string(),
            },
        }
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn create_board(&self, board_id: &str, name: &str, actor: &str) -> RepoResult<Board> {
        self.conn.execute(
            "INSERT INTO boards (id, name, created_by) VALUES (?1, ?2, ?3);",
            params![board_id, name, actor],
        )?;
        self.get_board(board_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("board `{board_id}` missing after insert"))
        })
    }

    fn get_board(&self, board_id: &str) -> RepoResult<Option<Board>> {
        let board = self
            .conn
            .query_row(
                "SELECT id, name, created_by, created_at, updated_at
                 FROM boards
                 WHERE id = ?1;",
                [board_id],
                |row| {
                    Ok(Board {
                        id: row.get("id")?,
                        name: row.get("name")?,
                        created_by: row.get("created_by")?,
                        created_at: row.get("created_at")?,
                        updated_at: row.get("updated_at")?,
                    })
                },
            )
            .optional()?;
        Ok(board)
    }

    fn insert_note(&self, board_id: &str, actor: &str, note: &Note) -> RepoResult<()> {
        note.validate()?;
        self.require_board(board_id)?;
        insert_note_row(self.conn, board_id, actor, note)?;
        touch_board(self.conn, board_id)?;
        Ok(())
    }

    fn get_note(&self, board_id: &str, note_id: &str) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE board_id = ?1 AND id = ?2;"))?;
        let mut rows = stmt.query(params![board_id, note_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_note_row(row)?)),
            None => Ok(None),
        }
    }

    fn update_note_text(&self, board_id: &str, note_id: &str, text: &str) -> RepoResult<()> {
        self.touch_note(board_id, note_id, "text", text)
    }

    fn move_note(&self, board_id: &str, note_id: &str, section: Section) -> RepoResult<()> {
        self.touch_note(board_id, note_id, "section", section.as_str())
    }

    fn change_note_color(
        &self,
        board_id: &str,
        note_id: &str,
        color: NoteColor,
    ) -> RepoResult<()> {
        self.touch_note(board_id, note_id, "color", color.as_str())
    }

    fn delete_note(&self, board_id: &str, note_id: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM notes WHERE board_id = ?1 AND id = ?2;",
            params![board_id, note_id],
        )?;
        if changed == 0 {
            return Err(self.missing_note(board_id, note_id));
        }
        touch_board(self.conn, board_id)?;
        Ok(())
    }

    fn list_notes(&self, board_id: &str) -> RepoResult<Vec<Note>> {
        self.require_board(board_id)?;
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL} WHERE board_id = ?1 ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([board_id])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn import_notes(&mut self, board_id: &str, actor: &str, notes: &[Note]) -> RepoResult<usize> {
        let started_at = Instant::now();
        for note in notes {
            note.validate()?;
        }
        self.require_board(board_id)?;

        let tx = self.conn.transaction()?;
        for note in notes {
            if let Err(err) = insert_note_row(&tx, board_id, actor, note) {
                error!(
                    "event=notes_import module=repo status=error duration_ms={} notes={} error_code=insert_failed",
                    started_at.elapsed().as_millis(),
                    notes.len()
                );
                // Dropping `tx` rolls back every row written so far.
                return Err(err.into());
            }
        }
        touch_board(&tx, board_id)?;
        tx.commit()?;

        info!(
            "event=notes_import module=repo status=ok duration_ms={} notes={}",
            started_at.elapsed().as_millis(),
            notes.len()
        );
        Ok(notes.len())
    }

    fn clear_board(&mut self, board_id: &str) -> RepoResult<usize> {
        self.require_board(board_id)?;
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM notes WHERE board_id = ?1;", [board_id])?;
        touch_board(&tx, board_id)?;
        tx.commit()?;
        Ok(deleted)
    }
}

fn insert_note_row(
    conn: &Connection,
    board_id: &str,
    actor: &str,
    note: &Note,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO notes (board_id, id, text, color, section, x, y, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            board_id,
            note.id.as_str(),
            note.text.as_str(),
            note.color.as_str(),
            note.section.as_str(),
            note.x,
            note.y,
            actor,
        ],
    )
}

fn touch_board(conn: &Connection, board_id: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE boards SET updated_at = (strftime('%s', 'now') * 1000) WHERE id = ?1;",
        [board_id],
    )
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let color_text: String = row.get("color")?;
    let color = NoteColor::parse(&color_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid color `{color_text}` in notes.color"))
    })?;

    let section_text: String = row.get("section")?;
    let section = Section::parse(&section_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid section `{section_text}` in notes.section"))
    })?;

    let note = Note {
        id: row.get("id")?,
        text: row.get("text")?,
        color,
        section,
        x: row.get("x")?,
        y: row.get("y")?,
    };
    note.validate()?;
    Ok(note)
}
