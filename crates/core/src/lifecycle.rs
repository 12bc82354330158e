//! The authoritative turn transition table.
//!
//! Every mutation of a turn's state goes through [`TurnState::apply`], so
//! illegal transitions are rejected by a single centralized check instead of
//! guards scattered across handlers.

use thiserror::Error;

use crate::turn::TurnState;

/// Operator action requested against a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAction {
    /// Claim the turn and call the citizen to the counter.
    Call,
    /// Citizen arrived, begin service.
    StartService,
    /// Service completed.
    Finish,
    /// Citizen did not respond to the call.
    MarkAbsent,
    /// Move the turn to another sector's queue.
    Redirect,
    /// Withdraw the turn.
    Cancel,
}

impl TurnAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnAction::Call => "call",
            TurnAction::StartService => "start_service",
            TurnAction::Finish => "finish",
            TurnAction::MarkAbsent => "mark_absent",
            TurnAction::Redirect => "redirect",
            TurnAction::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for TurnAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested action is not legal from the turn's current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} a turn in state {from}")]
pub struct InvalidTransition {
    pub from: TurnState,
    pub action: TurnAction,
}

impl TurnState {
    /// Apply an action, returning the next state or [`InvalidTransition`].
    ///
    /// This is a pure function: persisting the result and setting the
    /// associated timestamps is the caller's responsibility.
    pub fn apply(self, action: TurnAction) -> Result<TurnState, InvalidTransition> {
        use TurnAction::*;
        use TurnState::*;

        let next = match (self, action) {
            (Generated, Call) | (Redirected, Call) => Called,
            (Generated, Redirect) | (Called, Redirect) | (Redirected, Redirect) => Redirected,
            (Called, StartService) => InService,
            (Called, MarkAbsent) => Absent,
            (InService, Finish) => Finished,
            (from, Cancel) if from.can_cancel() => Cancelled,
            (from, action) => return Err(InvalidTransition { from, action }),
        };
        Ok(next)
    }
}
