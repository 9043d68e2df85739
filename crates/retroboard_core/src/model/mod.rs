//! Board domain model shared by storage, export/import and image recovery.
//!
//! # Responsibility
//! - Define the portable `Note` record and its closed label sets.
//! - Define board metadata and identifier generation capabilities.
//!
//! # Invariants
//! - Every note carries exactly one `NoteColor` and one `Section`.
//! - Identifiers are produced through an injected `IdGenerator`, never by
//!   hidden global state.

pub mod board;
pub mod id;
pub mod note;
