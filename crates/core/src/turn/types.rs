//! Core turn data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current state of a turn.
///
/// State machine flow:
/// ```text
/// Generated -> Called -> InService -> Finished
///     |          |
///     v          v
/// Redirected   Absent
///     |
///     +-> Called (re-enters the queue of the destination sector)
///
/// Any non-terminal state can transition to Cancelled.
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// Ticket issued, waiting in its sector's queue.
    Generated,
    /// Claimed by an operator, citizen is being called to the counter.
    Called,
    /// Citizen showed up, service in progress.
    InService,
    /// Service completed (terminal).
    Finished,
    /// Citizen did not respond to the call (terminal).
    Absent,
    /// Moved to another sector's queue, waiting again.
    Redirected,
    /// Withdrawn before completion (terminal).
    Cancelled,
}

impl TurnState {
    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TurnState::Finished | TurnState::Absent | TurnState::Cancelled
        )
    }

    /// Returns true if the turn is waiting in a queue (eligible for claim).
    pub fn is_pending(&self) -> bool {
        matches!(self, TurnState::Generated | TurnState::Redirected)
    }

    /// Returns true if the turn can still be cancelled.
    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// State name as stored in the database and exposed over the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnState::Generated => "generated",
            TurnState::Called => "called",
            TurnState::InService => "in_service",
            TurnState::Finished => "finished",
            TurnState::Absent => "absent",
            TurnState::Redirected => "redirected",
            TurnState::Cancelled => "cancelled",
        }
    }

    /// Parse a state name as produced by [`TurnState::as_str`].
    pub fn parse(s: &str) -> Option<TurnState> {
        match s {
            "generated" => Some(TurnState::Generated),
            "called" => Some(TurnState::Called),
            "in_service" => Some(TurnState::InService),
            "finished" => Some(TurnState::Finished),
            "absent" => Some(TurnState::Absent),
            "redirected" => Some(TurnState::Redirected),
            "cancelled" => Some(TurnState::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnKind {
    /// Walk-in turn, served in priority/arrival order.
    Normal,
    /// Pre-scheduled appointment for a specific time slot.
    Special { appointment_at: DateTime<Utc> },
}

impl TurnKind {
    /// Kind name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnKind::Normal => "normal",
            TurnKind::Special { .. } => "special",
        }
    }

    /// Appointment time for special turns.
    pub fn appointment_at(&self) -> Option<DateTime<Utc>> {
        match self {
            TurnKind::Normal => None,
            TurnKind::Special { appointment_at } => Some(*appointment_at),
        }
    }
}

/// A citizen's service turn.
///
/// Turns are never physically deleted: terminal states (Finished, Absent,
/// Cancelled) are retained for the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    /// Unique identifier (UUID).
    pub id: String,

    /// Human-readable ticket code, unique within (sector, calendar day).
    /// Example: `MESA-00042`.
    pub code: String,

    /// Current owning sector. Mutated only through redirection.
    pub sector_id: String,

    /// Citizen the turn was issued to.
    pub citizen_id: String,

    /// Operator attending the turn. Set when the turn is claimed, cleared
    /// again if the turn is redirected to another sector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,

    /// Current state.
    pub state: TurnState,

    /// Normal walk-in or pre-scheduled appointment.
    pub kind: TurnKind,

    /// Priority for queue ordering (higher = dequeued first).
    pub priority: u16,

    /// Operator notes recorded on finish / mark-absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// When the ticket was issued. Preserved across redirections so a
    /// citizen never loses queue seniority.
    pub created_at: DateTime<Utc>,

    /// When the turn was last claimed. Cleared on redirection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub called_at: Option<DateTime<Utc>>,

    /// When service started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attended_at: Option<DateTime<Utc>>,

    /// When service completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Turn {
    /// Create a freshly issued turn in the Generated state.
    pub fn new(
        code: impl Into<String>,
        sector_id: impl Into<String>,
        citizen_id: impl Into<String>,
        kind: TurnKind,
        priority: u16,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            code: code.into(),
            sector_id: sector_id.into(),
            citizen_id: citizen_id.into(),
            employee_id: None,
            state: TurnState::Generated,
            kind,
            priority,
            notes: None,
            created_at: now,
            called_at: None,
            attended_at: None,
            finished_at: None,
            updated_at: now,
        }
    }

    /// Checks that the set of non-null timestamps matches the state.
    ///
    /// `called_at` is set iff the turn has been claimed and not since
    /// redirected; `attended_at` implies service started; `finished_at`
    /// implies Finished.
    pub fn timestamps_consistent(&self) -> bool {
        let called = self.called_at.is_some();
        let attended = self.attended_at.is_some();
        let finished = self.finished_at.is_some();

        match self.state {
            TurnState::Generated => !called && !attended && !finished,
            TurnState::Redirected => !called && !attended && !finished,
            TurnState::Called => called && !attended && !finished,
            TurnState::InService => called && attended && !finished,
            TurnState::Finished => called && attended && finished,
            TurnState::Absent => called && !attended && !finished,
            // A turn can be cancelled at any point, so no constraint beyond
            // ordering applies.
            TurnState::Cancelled => !finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TurnState::Finished.is_terminal());
        assert!(TurnState::Absent.is_terminal());
        assert!(TurnState::Cancelled.is_terminal());
        assert!(!TurnState::Generated.is_terminal());
        assert!(!TurnState::Called.is_terminal());
        assert!(!TurnState::InService.is_terminal());
        assert!(!TurnState::Redirected.is_terminal());
    }

    #[test]
    fn test_cancellable_states() {
        assert!(TurnState::Generated.can_cancel());
        assert!(TurnState::Called.can_cancel());
        assert!(TurnState::InService.can_cancel());
        assert!(TurnState::Redirected.can_cancel());
        assert!(!TurnState::Finished.can_cancel());
        assert!(!TurnState::Absent.can_cancel());
        assert!(!TurnState::Cancelled.can_cancel());
    }

    #[test]
    fn test_pending_states() {
        assert!(TurnState::Generated.is_pending());
        assert!(TurnState::Redirected.is_pending());
        assert!(!TurnState::Called.is_pending());
        assert!(!TurnState::Finished.is_pending());
    }

    #[test]
    fn test_state_roundtrip() {
        for state in [
            TurnState::Generated,
            TurnState::Called,
            TurnState::InService,
            TurnState::Finished,
            TurnState::Absent,
            TurnState::Redirected,
            TurnState::Cancelled,
        ] {
            assert_eq!(TurnState::parse(state.as_str()), Some(state));
        }
        assert_eq!(TurnState::parse("bogus"), None);
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&TurnState::InService).unwrap();
        assert_eq!(json, r#""in_service""#);

        let deserialized: TurnState = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, TurnState::InService);
    }

    #[test]
    fn test_kind_serialization() {
        let kind = TurnKind::Special {
            appointment_at: Utc::now(),
        };
        let json = serde_json::to_string(&kind).unwrap();
        assert!(json.contains("\"type\":\"special\""));

        let deserialized: TurnKind = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, kind);

        assert_eq!(
            serde_json::to_string(&TurnKind::Normal).unwrap(),
            r#"{"type":"normal"}"#
        );
    }

    #[test]
    fn test_new_turn_is_generated() {
        let turn = Turn::new("MESA-00001", "sector-1", "citizen-1", TurnKind::Normal, 0);
        assert_eq!(turn.state, TurnState::Generated);
        assert!(turn.employee_id.is_none());
        assert!(turn.called_at.is_none());
        assert!(turn.timestamps_consistent());
        assert!(!turn.id.is_empty());
    }

    #[test]
    fn test_timestamps_consistency() {
        let mut turn = Turn::new("MESA-00001", "s1", "c1", TurnKind::Normal, 0);
        assert!(turn.timestamps_consistent());

        // Called without called_at is inconsistent.
        turn.state = TurnState::Called;
        assert!(!turn.timestamps_consistent());
        turn.called_at = Some(Utc::now());
        assert!(turn.timestamps_consistent());

        turn.state = TurnState::InService;
        assert!(!turn.timestamps_consistent());
        turn.attended_at = Some(Utc::now());
        assert!(turn.timestamps_consistent());

        turn.state = TurnState::Finished;
        assert!(!turn.timestamps_consistent());
        turn.finished_at = Some(Utc::now());
        assert!(turn.timestamps_consistent());
    }

    #[test]
    fn test_kind_appointment_at() {
        let at = Utc::now();
        assert_eq!(TurnKind::Normal.appointment_at(), None);
        assert_eq!(
            TurnKind::Special { appointment_at: at }.appointment_at(),
            Some(at)
        );
    }
}
