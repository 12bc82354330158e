//! Daily ticket code generation.
//!
//! Codes look like `MESA-00042`: the sector code plus a zero-padded counter
//! that starts at 1 each calendar day, per sector. The counter lives in its
//! own table so that issuing a code is a single atomic upsert and two
//! concurrent requests can never observe the same value.

use std::path::Path;
use std::sync::Mutex;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use thiserror::Error;

/// Error type for code generation.
#[derive(Debug, Error)]
pub enum CodeGenError {
    /// Database error.
    #[error("database error: {0}")]
    Store(String),
}

/// Trait for per-sector daily ticket code generators.
pub trait CodeGenerator: Send + Sync {
    /// Issue the next code for a sector on a given day.
    ///
    /// Consecutive calls for the same (sector, day) pair return strictly
    /// increasing counters with no gaps and no repeats.
    fn next_code(&self, sector_code: &str, day: NaiveDate) -> Result<String, CodeGenError>;
}

/// SQLite-backed code generator.
pub struct SqliteCodeGenerator {
    conn: Mutex<Connection>,
}

impl SqliteCodeGenerator {
    pub fn new(path: &Path) -> Result<Self, CodeGenError> {
        let conn = Connection::open(path).map_err(|e| CodeGenError::Store(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory generator (useful for testing).
    pub fn in_memory() -> Result<Self, CodeGenError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CodeGenError::Store(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CodeGenError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS ticket_counters (
                sector_code TEXT NOT NULL,
                day TEXT NOT NULL,
                value INTEGER NOT NULL,
                PRIMARY KEY (sector_code, day)
            );
            "#,
        )
        .map_err(|e| CodeGenError::Store(e.to_string()))?;

        Ok(())
    }
}

impl CodeGenerator for SqliteCodeGenerator {
    fn next_code(&self, sector_code: &str, day: NaiveDate) -> Result<String, CodeGenError> {
        let conn = self.conn.lock().unwrap();

        let value: i64 = conn
            .query_row(
                "INSERT INTO ticket_counters (sector_code, day, value) VALUES (?, ?, 1) \
                 ON CONFLICT(sector_code, day) DO UPDATE SET value = value + 1 \
                 RETURNING value",
                params![sector_code, day.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| CodeGenError::Store(e.to_string()))?;

        Ok(format!("{}-{:05}", sector_code, value))
    }
}
