//! SQLite-backed sector store implementation.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use super::{Sector, SectorError, SectorStore};

/// SQLite-backed sector store.
pub struct SqliteSectorStore {
    conn: Mutex<Connection>,
}

impl SqliteSectorStore {
    pub fn new(path: &Path) -> Result<Self, SectorError> {
        let conn = Connection::open(path).map_err(|e| SectorError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite sector store (useful for testing).
    pub fn in_memory() -> Result<Self, SectorError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SectorError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), SectorError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sectors (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                max_capacity INTEGER
            );
            "#,
        )
        .map_err(|e| SectorError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_sector(row: &rusqlite::Row) -> rusqlite::Result<Sector> {
        Ok(Sector {
            id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            active: row.get::<_, i64>(3)? != 0,
            max_capacity: row.get(4)?,
        })
    }
}

impl SectorStore for SqliteSectorStore {
    fn upsert(&self, sector: &Sector) -> Result<(), SectorError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO sectors (id, code, name, active, max_capacity) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET code = excluded.code, name = excluded.name, \
             active = excluded.active, max_capacity = excluded.max_capacity",
            params![
                sector.id,
                sector.code,
                sector.name,
                sector.active as i64,
                sector.max_capacity,
            ],
        )
        .map_err(|e| SectorError::Database(e.to_string()))?;

        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Sector>, SectorError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT id, code, name, active, max_capacity FROM sectors WHERE id = ?",
            params![id],
            Self::row_to_sector,
        );

        match result {
            Ok(sector) => Ok(Some(sector)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(SectorError::Database(e.to_string())),
        }
    }

    fn list(&self) -> Result<Vec<Sector>, SectorError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT id, code, name, active, max_capacity FROM sectors ORDER BY code")
            .map_err(|e| SectorError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_sector)
            .map_err(|e| SectorError::Database(e.to_string()))?;

        let mut sectors = Vec::new();
        for row_result in rows {
            sectors.push(row_result.map_err(|e| SectorError::Database(e.to_string()))?);
        }

        Ok(sectors)
    }

    fn set_active(&self, id: &str, active: bool) -> Result<(), SectorError> {
        let conn = self.conn.lock().unwrap();

        let changed = conn
            .execute(
                "UPDATE sectors SET active = ? WHERE id = ?",
                params![active as i64, id],
            )
            .map_err(|e| SectorError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(SectorError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
