//! SQLite-backed turn store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};

use super::{Turn, TurnError, TurnKind, TurnState, TurnStore};

const TURN_COLUMNS: &str = "id, code, sector_id, citizen_id, employee_id, state, kind, \
     appointment_at, priority, notes, created_at, called_at, attended_at, finished_at, updated_at";

/// SQLite-backed turn store.
pub struct SqliteTurnStore {
    conn: Mutex<Connection>,
}

impl SqliteTurnStore {
    /// Create a new SQLite turn store, creating the database file and tables
    /// if needed.
    pub fn new(path: &Path) -> Result<Self, TurnError> {
        let conn = Connection::open(path).map_err(|e| TurnError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite turn store (useful for testing).
    pub fn in_memory() -> Result<Self, TurnError> {
        let conn = Connection::open_in_memory().map_err(|e| TurnError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TurnError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS turns (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL,
                sector_id TEXT NOT NULL,
                citizen_id TEXT NOT NULL,
                employee_id TEXT,
                state TEXT NOT NULL,
                kind TEXT NOT NULL,
                appointment_at TEXT,
                priority INTEGER NOT NULL DEFAULT 0,
                notes TEXT,
                created_at TEXT NOT NULL,
                called_at TEXT,
                attended_at TEXT,
                finished_at TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_turns_code_day
                ON turns(code, substr(created_at, 1, 10));
            CREATE INDEX IF NOT EXISTS idx_turns_queue
                ON turns(sector_id, state, priority DESC, created_at);
            "#,
        )
        .map_err(|e| TurnError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_turn(row: &rusqlite::Row) -> rusqlite::Result<Turn> {
        let id: String = row.get(0)?;
        let code: String = row.get(1)?;
        let sector_id: String = row.get(2)?;
        let citizen_id: String = row.get(3)?;
        let employee_id: Option<String> = row.get(4)?;
        let state_str: String = row.get(5)?;
        let kind_str: String = row.get(6)?;
        let appointment_at: Option<String> = row.get(7)?;
        let priority: u16 = row.get(8)?;
        let notes: Option<String> = row.get(9)?;
        let created_at: String = row.get(10)?;
        let called_at: Option<String> = row.get(11)?;
        let attended_at: Option<String> = row.get(12)?;
        let finished_at: Option<String> = row.get(13)?;
        let updated_at: String = row.get(14)?;

        let state = TurnState::parse(&state_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                format!("unknown turn state: {}", state_str).into(),
            )
        })?;

        let kind = match kind_str.as_str() {
            "normal" => TurnKind::Normal,
            "special" => TurnKind::Special {
                appointment_at: appointment_at
                    .as_deref()
                    .and_then(parse_ts)
                    .unwrap_or_else(Utc::now),
            },
            other => {
                return Err(rusqlite::Error::FromSqlConversionFailure(
                    6,
                    rusqlite::types::Type::Text,
                    format!("unknown turn kind: {}", other).into(),
                ))
            }
        };

        Ok(Turn {
            id,
            code,
            sector_id,
            citizen_id,
            employee_id,
            state,
            kind,
            priority,
            notes,
            created_at: parse_ts(&created_at).unwrap_or_else(Utc::now),
            called_at: called_at.as_deref().and_then(parse_ts),
            attended_at: attended_at.as_deref().and_then(parse_ts),
            finished_at: finished_at.as_deref().and_then(parse_ts),
            updated_at: parse_ts(&updated_at).unwrap_or_else(Utc::now),
        })
    }
}

fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn fmt_ts(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339())
}

impl TurnStore for SqliteTurnStore {
    fn insert(&self, turn: &Turn) -> Result<(), TurnError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO turns (id, code, sector_id, citizen_id, employee_id, state, kind, \
             appointment_at, priority, notes, created_at, called_at, attended_at, finished_at, \
             updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                turn.id,
                turn.code,
                turn.sector_id,
                turn.citizen_id,
                turn.employee_id,
                turn.state.as_str(),
                turn.kind.as_str(),
                fmt_ts(turn.kind.appointment_at()),
                turn.priority,
                turn.notes,
                turn.created_at.to_rfc3339(),
                fmt_ts(turn.called_at),
                fmt_ts(turn.attended_at),
                fmt_ts(turn.finished_at),
                turn.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| TurnError::Database(e.to_string()))?;

        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Turn>, TurnError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            &format!("SELECT {} FROM turns WHERE id = ?", TURN_COLUMNS),
            params![id],
            Self::row_to_turn,
        );

        match result {
            Ok(turn) => Ok(Some(turn)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TurnError::Database(e.to_string())),
        }
    }

    fn get_by_code(&self, code: &str) -> Result<Option<Turn>, TurnError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            &format!(
                "SELECT {} FROM turns WHERE code = ? ORDER BY created_at DESC LIMIT 1",
                TURN_COLUMNS
            ),
            params![code],
            Self::row_to_turn,
        );

        match result {
            Ok(turn) => Ok(Some(turn)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TurnError::Database(e.to_string())),
        }
    }

    fn next_candidate(&self, sector_id: &str) -> Result<Option<Turn>, TurnError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            &format!(
                "SELECT {} FROM turns WHERE sector_id = ? AND state IN ('generated', 'redirected') \
                 ORDER BY priority DESC, created_at ASC, id ASC LIMIT 1",
                TURN_COLUMNS
            ),
            params![sector_id],
            Self::row_to_turn,
        );

        match result {
            Ok(turn) => Ok(Some(turn)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TurnError::Database(e.to_string())),
        }
    }

    fn list_pending(&self, sector_id: &str) -> Result<Vec<Turn>, TurnError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM turns WHERE sector_id = ? AND state IN ('generated', 'redirected') \
                 ORDER BY priority DESC, created_at ASC, id ASC",
                TURN_COLUMNS
            ))
            .map_err(|e| TurnError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![sector_id], Self::row_to_turn)
            .map_err(|e| TurnError::Database(e.to_string()))?;

        let mut turns = Vec::new();
        for row_result in rows {
            turns.push(row_result.map_err(|e| TurnError::Database(e.to_string()))?);
        }

        Ok(turns)
    }

    fn update(&self, turn: &Turn) -> Result<(), TurnError> {
        let conn = self.conn.lock().unwrap();

        let changed = conn
            .execute(
                "UPDATE turns SET sector_id = ?, employee_id = ?, state = ?, notes = ?, \
                 called_at = ?, attended_at = ?, finished_at = ?, updated_at = ? WHERE id = ?",
                params![
                    turn.sector_id,
                    turn.employee_id,
                    turn.state.as_str(),
                    turn.notes,
                    fmt_ts(turn.called_at),
                    fmt_ts(turn.attended_at),
                    fmt_ts(turn.finished_at),
                    turn.updated_at.to_rfc3339(),
                    turn.id,
                ],
            )
            .map_err(|e| TurnError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(TurnError::NotFound(turn.id.clone()));
        }
        Ok(())
    }

    fn update_if_state(&self, turn: &Turn, expected: &[TurnState]) -> Result<bool, TurnError> {
        let conn = self.conn.lock().unwrap();

        let placeholders = vec!["?"; expected.len()].join(", ");
        let sql = format!(
            "UPDATE turns SET sector_id = ?, employee_id = ?, state = ?, notes = ?, \
             called_at = ?, attended_at = ?, finished_at = ?, updated_at = ? \
             WHERE id = ? AND state IN ({})",
            placeholders
        );

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = vec![
            Box::new(turn.sector_id.clone()),
            Box::new(turn.employee_id.clone()),
            Box::new(turn.state.as_str()),
            Box::new(turn.notes.clone()),
            Box::new(fmt_ts(turn.called_at)),
            Box::new(fmt_ts(turn.attended_at)),
            Box::new(fmt_ts(turn.finished_at)),
            Box::new(turn.updated_at.to_rfc3339()),
            Box::new(turn.id.clone()),
        ];
        for state in expected {
            all_params.push(Box::new(state.as_str()));
        }

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let changed = conn
            .execute(&sql, param_refs.as_slice())
            .map_err(|e| TurnError::Database(e.to_string()))?;

        Ok(changed > 0)
    }

    fn count_special_for_day(&self, sector_id: &str, day: NaiveDate) -> Result<i64, TurnError> {
        let conn = self.conn.lock().unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM turns WHERE sector_id = ? AND kind = 'special' \
                 AND substr(appointment_at, 1, 10) = ? AND state != 'cancelled'",
                params![sector_id, day.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| TurnError::Database(e.to_string()))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_store() -> SqliteTurnStore {
        SqliteTurnStore::in_memory().unwrap()
    }

    fn sample_turn(code: &str, sector: &str) -> Turn {
        Turn::new(code, sector, "citizen-1", TurnKind::Normal, 0)
    }

    #[test]
    fn test_insert_and_get() {
        let store = create_test_store();
        let turn = sample_turn("MESA-00001", "s1");

        store.insert(&turn).unwrap();
        let fetched = store.get(&turn.id).unwrap().unwrap();
        assert_eq!(fetched, turn);
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = create_test_store();
        assert!(store.get("nope").unwrap().is_none());
        assert!(store.get_by_code("MESA-99999").unwrap().is_none());
    }

    #[test]
    fn test_get_by_code() {
        let store = create_test_store();
        let turn = sample_turn("MESA-00007", "s1");
        store.insert(&turn).unwrap();

        let fetched = store.get_by_code("MESA-00007").unwrap().unwrap();
        assert_eq!(fetched.id, turn.id);
    }

    #[test]
    fn test_duplicate_code_same_day_rejected() {
        let store = create_test_store();
        store.insert(&sample_turn("MESA-00001", "s1")).unwrap();

        let result = store.insert(&sample_turn("MESA-00001", "s1"));
        assert!(matches!(result, Err(TurnError::Database(_))));
    }

    #[test]
    fn test_next_candidate_ordering() {
        let store = create_test_store();
        let base = Utc::now();

        // Equal priority: FIFO by created_at. Higher priority jumps the line.
        let mut t1 = sample_turn("MESA-00001", "s1");
        t1.priority = 5;
        t1.created_at = base;
        let mut t2 = sample_turn("MESA-00002", "s1");
        t2.priority = 5;
        t2.created_at = base + Duration::minutes(1);
        let mut t3 = sample_turn("MESA-00003", "s1");
        t3.priority = 9;
        t3.created_at = base + Duration::minutes(2);

        store.insert(&t1).unwrap();
        store.insert(&t2).unwrap();
        store.insert(&t3).unwrap();

        let first = store.next_candidate("s1").unwrap().unwrap();
        assert_eq!(first.id, t3.id);

        let pending = store.list_pending("s1").unwrap();
        let ids: Vec<&str> = pending.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![t3.id.as_str(), t1.id.as_str(), t2.id.as_str()]);
    }

    #[test]
    fn test_next_candidate_skips_other_sectors_and_states() {
        let store = create_test_store();

        let mut called = sample_turn("MESA-00001", "s1");
        called.state = TurnState::Called;
        called.called_at = Some(Utc::now());
        store.insert(&called).unwrap();

        let other_sector = sample_turn("CAJA-00001", "s2");
        store.insert(&other_sector).unwrap();

        assert!(store.next_candidate("s1").unwrap().is_none());
        assert_eq!(
            store.next_candidate("s2").unwrap().unwrap().id,
            other_sector.id
        );
    }

    #[test]
    fn test_redirected_turn_is_candidate() {
        let store = create_test_store();
        let mut turn = sample_turn("MESA-00001", "s1");
        turn.state = TurnState::Redirected;
        store.insert(&turn).unwrap();

        assert_eq!(store.next_candidate("s1").unwrap().unwrap().id, turn.id);
    }

    #[test]
    fn test_update() {
        let store = create_test_store();
        let mut turn = sample_turn("MESA-00001", "s1");
        store.insert(&turn).unwrap();

        turn.state = TurnState::Called;
        turn.employee_id = Some("emp-1".to_string());
        turn.called_at = Some(Utc::now());
        turn.updated_at = Utc::now();
        store.update(&turn).unwrap();

        let fetched = store.get(&turn.id).unwrap().unwrap();
        assert_eq!(fetched.state, TurnState::Called);
        assert_eq!(fetched.employee_id, Some("emp-1".to_string()));
        assert!(fetched.called_at.is_some());
    }

    #[test]
    fn test_update_missing_turn() {
        let store = create_test_store();
        let turn = sample_turn("MESA-00001", "s1");
        assert!(matches!(store.update(&turn), Err(TurnError::NotFound(_))));
    }

    #[test]
    fn test_update_if_state_succeeds_on_match() {
        let store = create_test_store();
        let mut turn = sample_turn("MESA-00001", "s1");
        store.insert(&turn).unwrap();

        turn.state = TurnState::Called;
        turn.called_at = Some(Utc::now());
        let updated = store
            .update_if_state(&turn, &[TurnState::Generated, TurnState::Redirected])
            .unwrap();
        assert!(updated);

        let fetched = store.get(&turn.id).unwrap().unwrap();
        assert_eq!(fetched.state, TurnState::Called);
    }

    #[test]
    fn test_update_if_state_fails_on_mismatch() {
        let store = create_test_store();
        let mut turn = sample_turn("MESA-00001", "s1");
        store.insert(&turn).unwrap();

        // Another writer already claimed the turn.
        let mut claimed = turn.clone();
        claimed.state = TurnState::Called;
        claimed.called_at = Some(Utc::now());
        store.update(&claimed).unwrap();

        turn.state = TurnState::Called;
        let updated = store
            .update_if_state(&turn, &[TurnState::Generated])
            .unwrap();
        assert!(!updated);

        // The stored row is untouched by the losing writer.
        let fetched = store.get(&turn.id).unwrap().unwrap();
        assert_eq!(fetched.state, TurnState::Called);
        assert_eq!(fetched.called_at, claimed.called_at);
    }

    #[test]
    fn test_special_kind_roundtrip() {
        let store = create_test_store();
        let at = Utc::now() + Duration::days(1);
        let turn = Turn::new(
            "MESA-00001",
            "s1",
            "c1",
            TurnKind::Special { appointment_at: at },
            0,
        );
        store.insert(&turn).unwrap();

        let fetched = store.get(&turn.id).unwrap().unwrap();
        assert_eq!(fetched.kind.appointment_at().map(|t| t.timestamp()), Some(at.timestamp()));
    }

    #[test]
    fn test_count_special_for_day() {
        let store = create_test_store();
        let day = Utc::now() + Duration::days(2);

        for i in 0..3 {
            let turn = Turn::new(
                format!("MESA-0000{}", i + 1),
                "s1",
                "c1",
                TurnKind::Special {
                    appointment_at: day,
                },
                0,
            );
            store.insert(&turn).unwrap();
        }
        // Normal turns and other sectors do not count.
        store.insert(&sample_turn("MESA-00009", "s1")).unwrap();

        let count = store
            .count_special_for_day("s1", day.date_naive())
            .unwrap();
        assert_eq!(count, 3);

        let none = store
            .count_special_for_day("s2", day.date_naive())
            .unwrap();
        assert_eq!(none, 0);
    }

    #[test]
    fn test_file_based_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let store = SqliteTurnStore::new(&db_path).unwrap();
        store.insert(&sample_turn("MESA-00001", "s1")).unwrap();
        assert!(db_path.exists());
        assert!(store.get_by_code("MESA-00001").unwrap().is_some());
    }
}
