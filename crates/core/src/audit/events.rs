use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Turn lifecycle
    TurnCreated {
        turn_id: String,
        code: String,
        sector_id: String,
        citizen_id: String,
        kind: String,
        priority: u16,
    },
    TurnStateChanged {
        turn_id: String,
        from_state: String,
        to_state: String,
        /// Operator that triggered the transition, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        employee_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    TurnRedirected {
        turn_id: String,
        from_sector_id: String,
        to_sector_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        employee_id: Option<String>,
    },

    // Sector administration
    SectorUpdated {
        sector_id: String,
        active: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        employee_id: Option<String>,
    },
}

impl AuditEvent {
    /// Returns the event type as a string for storage
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::TurnCreated { .. } => "turn_created",
            Self::TurnStateChanged { .. } => "turn_state_changed",
            Self::TurnRedirected { .. } => "turn_redirected",
            Self::SectorUpdated { .. } => "sector_updated",
        }
    }

    /// Extract turn_id if this event is turn-related
    pub fn turn_id(&self) -> Option<&str> {
        match self {
            Self::TurnCreated { turn_id, .. }
            | Self::TurnStateChanged { turn_id, .. }
            | Self::TurnRedirected { turn_id, .. } => Some(turn_id),
            _ => None,
        }
    }

    /// Extract the operator that triggered the event, if any
    pub fn employee_id(&self) -> Option<&str> {
        match self {
            Self::TurnStateChanged { employee_id, .. }
            | Self::TurnRedirected { employee_id, .. }
            | Self::SectorUpdated { employee_id, .. } => employee_id.as_deref(),
            _ => None,
        }
    }
}

/// A stored audit record with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub turn_id: Option<String>,
    pub employee_id: Option<String>,
    pub data: AuditEvent,
}
