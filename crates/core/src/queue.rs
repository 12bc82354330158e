//! Queue claim protocol.
//!
//! Claims are serialized per sector with a keyed async mutex, then committed
//! with a conditional state update so that a turn is handed to exactly one
//! operator even if a competing writer slips in outside the lock.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use crate::lifecycle::TurnAction;
use crate::turn::{Turn, TurnError, TurnState, TurnStore};

/// Keyed async mutexes, one per sector ID, created on first use.
#[derive(Default)]
pub struct SectorLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SectorLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, sector_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(sector_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire the lock of a single sector.
    pub async fn acquire(&self, sector_id: &str) -> OwnedMutexGuard<()> {
        self.lock_for(sector_id).lock_owned().await
    }

    /// Acquire the locks of two sectors, always in ascending ID order so two
    /// concurrent redirections between the same pair cannot deadlock.
    pub async fn acquire_pair(
        &self,
        a: &str,
        b: &str,
    ) -> (OwnedMutexGuard<()>, OwnedMutexGuard<()>) {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let first_guard = self.lock_for(first).lock_owned().await;
        let second_guard = self.lock_for(second).lock_owned().await;
        (first_guard, second_guard)
    }
}

/// Error type for claim attempts.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// The conditional update kept losing to competing writers.
    #[error("could not claim a turn in sector {sector_id} after {attempts} attempts")]
    Contended { sector_id: String, attempts: u32 },

    /// Storage error.
    #[error(transparent)]
    Store(#[from] TurnError),
}

/// Picks the next pending turn of a sector and assigns it to an operator.
pub struct QueueSelector {
    turns: Arc<dyn TurnStore>,
    locks: Arc<SectorLocks>,
    retries: u32,
}

impl QueueSelector {
    pub fn new(turns: Arc<dyn TurnStore>, locks: Arc<SectorLocks>, retries: u32) -> Self {
        Self {
            turns,
            locks,
            retries: retries.max(1),
        }
    }

    /// Claim the highest-ranked pending turn of a sector for an operator.
    ///
    /// Returns `Ok(None)` when the queue is empty. On success the returned
    /// turn is already persisted as Called with the operator assigned; the
    /// second element is the pending state the turn was claimed from.
    pub async fn claim_next(
        &self,
        sector_id: &str,
        employee_id: &str,
    ) -> Result<Option<(Turn, TurnState)>, ClaimError> {
        let _guard = self.locks.acquire(sector_id).await;

        for attempt in 0..self.retries {
            let Some(candidate) = self.turns.next_candidate(sector_id)? else {
                return Ok(None);
            };

            // Candidates are pending by construction, so this cannot fail
            // unless the row changed under us. Re-reading handles that.
            let from_state = candidate.state;
            let Ok(next_state) = from_state.apply(TurnAction::Call) else {
                continue;
            };

            let now = Utc::now();
            let mut claimed = candidate;
            claimed.state = next_state;
            claimed.employee_id = Some(employee_id.to_string());
            claimed.called_at = Some(now);
            claimed.updated_at = now;

            let committed = self
                .turns
                .update_if_state(&claimed, &[TurnState::Generated, TurnState::Redirected])?;
            if committed {
                return Ok(Some((claimed, from_state)));
            }

            warn!(
                sector_id,
                attempt = attempt + 1,
                "claim lost to a competing writer, retrying"
            );
        }

        Err(ClaimError::Contended {
            sector_id: sector_id.to_string(),
            attempts: self.retries,
        })
    }
}
