//! Turn storage trait.

use chrono::NaiveDate;
use thiserror::Error;

use crate::turn::{Turn, TurnState};

/// Error type for turn storage operations.
#[derive(Debug, Error)]
pub enum TurnError {
    /// Turn not found.
    #[error("turn not found: {0}")]
    NotFound(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Trait for turn storage backends.
///
/// Implementations must support a conditional state update
/// ([`TurnStore::update_if_state`]) so callers can commit queue-affecting
/// transitions as a compare-and-swap on the current state.
pub trait TurnStore: Send + Sync {
    /// Insert a freshly issued turn.
    fn insert(&self, turn: &Turn) -> Result<(), TurnError>;

    /// Get a turn by ID.
    fn get(&self, id: &str) -> Result<Option<Turn>, TurnError>;

    /// Get a turn by its display code. Codes repeat across calendar days,
    /// so the most recently issued match is returned.
    fn get_by_code(&self, code: &str) -> Result<Option<Turn>, TurnError>;

    /// The highest-ranked pending turn of a sector, if any.
    ///
    /// Ordering is total: priority descending, then creation time ascending,
    /// then ID ascending.
    fn next_candidate(&self, sector_id: &str) -> Result<Option<Turn>, TurnError>;

    /// All pending turns of a sector in claim order.
    fn list_pending(&self, sector_id: &str) -> Result<Vec<Turn>, TurnError>;

    /// Unconditionally persist a turn's current fields.
    fn update(&self, turn: &Turn) -> Result<(), TurnError>;

    /// Persist a turn's fields only if its stored state is one of
    /// `expected`. Returns false when another writer got there first (or the
    /// row is gone); the caller decides whether to retry or fail.
    fn update_if_state(&self, turn: &Turn, expected: &[TurnState]) -> Result<bool, TurnError>;

    /// Number of non-cancelled special (appointment) turns of a sector on a
    /// given day. Used for capacity checks at issuance time.
    fn count_special_for_day(&self, sector_id: &str, day: NaiveDate) -> Result<i64, TurnError>;
}
