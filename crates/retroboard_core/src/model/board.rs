//! Board metadata model.

/// Opaque board identifier.
pub type BoardId = String;

/// Name given to boards created without an explicit one.
pub const DEFAULT_BOARD_NAME: &str = "Retrospective Board";

/// Actor recorded when no authenticated user is known.
pub const ANONYMOUS_ACTOR: &str = "anonymous";

/// Board metadata as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    /// Actor that created the board.
    pub created_by: String,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
    /// Last metadata or note mutation in epoch milliseconds.
    pub updated_at: i64,
}
