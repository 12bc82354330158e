//! Redirection of turns between sectors.
//!
//! A redirected turn keeps its code, priority and original creation time, so
//! it re-enters the destination queue with the seniority it already earned.
//! The operator assignment and call timestamp are cleared because they belong
//! to the sector the turn is leaving.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::warn;

use crate::lifecycle::{InvalidTransition, TurnAction};
use crate::queue::SectorLocks;
use crate::turn::{Turn, TurnError, TurnState, TurnStore};

/// Error type for redirection attempts.
#[derive(Debug, Error)]
pub enum RedirectError {
    /// Source and destination sector are the same.
    #[error("turn {turn_id} is already in sector {sector_id}")]
    SameSector { turn_id: String, sector_id: String },

    /// Turn does not exist.
    #[error("turn not found: {0}")]
    NotFound(String),

    /// The turn's current state does not allow redirection.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    /// The conditional update kept losing to competing writers.
    #[error("could not redirect turn {turn_id} after {attempts} attempts")]
    Contended { turn_id: String, attempts: u32 },

    /// Storage error.
    #[error(transparent)]
    Store(#[from] TurnError),
}

/// Outcome of a successful redirection.
#[derive(Debug, Clone)]
pub struct Redirection {
    /// The turn as persisted in the destination queue.
    pub turn: Turn,
    /// Sector the turn left.
    pub from_sector_id: String,
    /// State the turn was in when redirected.
    pub from_state: TurnState,
}

/// Moves turns between sector queues while preserving seniority.
pub struct Redirector {
    turns: Arc<dyn TurnStore>,
    locks: Arc<SectorLocks>,
    retries: u32,
}

impl Redirector {
    pub fn new(turns: Arc<dyn TurnStore>, locks: Arc<SectorLocks>, retries: u32) -> Self {
        Self {
            turns,
            locks,
            retries: retries.max(1),
        }
    }

    /// Redirect a turn to another sector's queue.
    pub async fn redirect(
        &self,
        turn_id: &str,
        to_sector_id: &str,
    ) -> Result<Redirection, RedirectError> {
        let current = self
            .turns
            .get(turn_id)?
            .ok_or_else(|| RedirectError::NotFound(turn_id.to_string()))?;
        if current.sector_id == to_sector_id {
            return Err(RedirectError::SameSector {
                turn_id: turn_id.to_string(),
                sector_id: to_sector_id.to_string(),
            });
        }

        // Both queues are affected: the turn leaves one and enters the other.
        let _guards = self
            .locks
            .acquire_pair(&current.sector_id, to_sector_id)
            .await;

        for attempt in 0..self.retries {
            let current = self
                .turns
                .get(turn_id)?
                .ok_or_else(|| RedirectError::NotFound(turn_id.to_string()))?;

            let next_state = current.state.apply(TurnAction::Redirect)?;
            let from_sector_id = current.sector_id.clone();
            let from_state = current.state;

            let mut moved = current;
            moved.sector_id = to_sector_id.to_string();
            moved.state = next_state;
            moved.employee_id = None;
            moved.called_at = None;
            moved.updated_at = Utc::now();

            if self.turns.update_if_state(&moved, &[from_state])? {
                return Ok(Redirection {
                    turn: moved,
                    from_sector_id,
                    from_state,
                });
            }

            warn!(
                turn_id,
                attempt = attempt + 1,
                "redirect lost to a competing writer, retrying"
            );
        }

        Err(RedirectError::Contended {
            turn_id: turn_id.to_string(),
            attempts: self.retries,
        })
    }
}
