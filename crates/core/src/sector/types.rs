//! Sector data types.

use serde::{Deserialize, Serialize};

/// A service sector (counter group) with its own queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sector {
    /// Unique identifier.
    pub id: String,

    /// Short code used as the ticket code prefix, e.g. `MESA`.
    pub code: String,

    /// Human-readable name shown on displays.
    pub name: String,

    /// Inactive sectors reject new turns, claims and redirections.
    pub active: bool,

    /// Maximum number of special (appointment) turns per day, if limited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_capacity: Option<u32>,
}

impl Sector {
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            active: true,
            max_capacity: None,
        }
    }
}
