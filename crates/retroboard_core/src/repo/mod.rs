//! Repository layer for the local board store.
//!
//! # Responsibility
//! - Define the board/note store contract used by services.
//! - Keep SQLite query details out of service orchestration.
//!
//! # Invariants
//! - Repository writes validate notes before persistence.
//! - Missing boards and notes surface as semantic errors, not SQL errors.

pub mod board_repo;
