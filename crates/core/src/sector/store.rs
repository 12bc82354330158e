//! Sector storage trait.

use thiserror::Error;

use crate::sector::Sector;

/// Error type for sector storage operations.
#[derive(Debug, Error)]
pub enum SectorError {
    /// Sector not found.
    #[error("sector not found: {0}")]
    NotFound(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Trait for sector storage backends.
pub trait SectorStore: Send + Sync {
    /// Insert a sector, or overwrite its fields if the ID already exists.
    fn upsert(&self, sector: &Sector) -> Result<(), SectorError>;

    /// Get a sector by ID.
    fn get(&self, id: &str) -> Result<Option<Sector>, SectorError>;

    /// All sectors, active and inactive, ordered by code.
    fn list(&self) -> Result<Vec<Sector>, SectorError>;

    /// Activate or deactivate a sector.
    fn set_active(&self, id: &str, active: bool) -> Result<(), SectorError>;
}
