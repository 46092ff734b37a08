//! SQLite-based store implementation

use chrono::{DateTime, Local, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use timeclock_util::UserId;
use tracing::{debug, warn};

use crate::traits::{check_same_key, check_writable};
use crate::{
    ArrivalStatus, AttendanceRecord, AuditEvent, RecordKey, RecordStore, StoreError, StoreResult,
};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- One row per user per calendar day
            CREATE TABLE IF NOT EXISTS attendance (
                user_id TEXT NOT NULL,
                day TEXT NOT NULL,
                check_in TEXT,
                check_out TEXT,
                arrival_status TEXT NOT NULL,
                late_reason TEXT,
                PRIMARY KEY (user_id, day)
            );

            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

/// Columns exactly as stored, before parsing
struct RawRow {
    user_id: String,
    day: String,
    check_in: Option<String>,
    check_out: Option<String>,
    arrival_status: String,
    late_reason: Option<String>,
}

const SELECT_COLUMNS: &str =
    "SELECT user_id, day, check_in, check_out, arrival_status, late_reason FROM attendance";

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        user_id: row.get(0)?,
        day: row.get(1)?,
        check_in: row.get(2)?,
        check_out: row.get(3)?,
        arrival_status: row.get(4)?,
        late_reason: row.get(5)?,
    })
}

fn parse_timestamp(s: &str) -> StoreResult<DateTime<Local>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|e| StoreError::Serialization(format!("bad timestamp '{}': {}", s, e)))
}

impl RawRow {
    fn into_record(self) -> StoreResult<AttendanceRecord> {
        let date = NaiveDate::parse_from_str(&self.day, DAY_FORMAT)
            .map_err(|e| StoreError::Serialization(format!("bad day '{}': {}", self.day, e)))?;
        let arrival_status: ArrivalStatus =
            self.arrival_status.parse().map_err(StoreError::Serialization)?;

        Ok(AttendanceRecord {
            user_id: UserId::new(self.user_id),
            date,
            check_in_time: self.check_in.as_deref().map(parse_timestamp).transpose()?,
            check_out_time: self.check_out.as_deref().map(parse_timestamp).transpose()?,
            arrival_status,
            late_reason: self.late_reason,
        })
    }
}

fn get_record(conn: &Connection, key: &RecordKey) -> StoreResult<Option<AttendanceRecord>> {
    let raw = conn
        .query_row(
            &format!("{} WHERE user_id = ? AND day = ?", SELECT_COLUMNS),
            params![key.user_id.as_str(), key.date.format(DAY_FORMAT).to_string()],
            read_row,
        )
        .optional()?;

    raw.map(RawRow::into_record).transpose()
}

fn upsert_record(conn: &Connection, record: &AttendanceRecord) -> StoreResult<()> {
    conn.execute(
        r#"
        INSERT INTO attendance (user_id, day, check_in, check_out, arrival_status, late_reason)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, day)
        DO UPDATE SET
            check_in = excluded.check_in,
            check_out = excluded.check_out,
            arrival_status = excluded.arrival_status,
            late_reason = excluded.late_reason
        "#,
        params![
            record.user_id.as_str(),
            record.date.format(DAY_FORMAT).to_string(),
            record.check_in_time.map(|t| t.to_rfc3339()),
            record.check_out_time.map(|t| t.to_rfc3339()),
            record.arrival_status.as_str(),
            record.late_reason,
        ],
    )?;
    Ok(())
}

impl RecordStore for SqliteStore {
    fn get(&self, key: &RecordKey) -> StoreResult<Option<AttendanceRecord>> {
        let conn = self.conn()?;
        get_record(&conn, key)
    }

    fn put(&self, record: &AttendanceRecord) -> StoreResult<()> {
        check_writable(record)?;
        let conn = self.conn()?;
        upsert_record(&conn, record)?;

        debug!(key = %record.key(), "Record written");
        Ok(())
    }

    fn insert_if_absent(&self, record: &AttendanceRecord) -> StoreResult<bool> {
        check_writable(record)?;
        let conn = self.conn()?;

        let inserted = conn.execute(
            r#"
            INSERT INTO attendance (user_id, day, check_in, check_out, arrival_status, late_reason)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, day) DO NOTHING
            "#,
            params![
                record.user_id.as_str(),
                record.date.format(DAY_FORMAT).to_string(),
                record.check_in_time.map(|t| t.to_rfc3339()),
                record.check_out_time.map(|t| t.to_rfc3339()),
                record.arrival_status.as_str(),
                record.late_reason,
            ],
        )?;

        debug!(key = %record.key(), inserted = inserted == 1, "Record insert attempted");
        Ok(inserted == 1)
    }

    fn compare_and_swap(
        &self,
        expected: &AttendanceRecord,
        new: &AttendanceRecord,
    ) -> StoreResult<bool> {
        check_same_key(expected, new)?;
        check_writable(new)?;
        let mut conn = self.conn()?;

        // IMMEDIATE takes the write lock up front, so another process sharing
        // the file cannot slip a write between our read and our update.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = get_record(&tx, &new.key())?;
        if current.as_ref() != Some(expected) {
            debug!(key = %new.key(), "Record changed underneath, swap refused");
            return Ok(false);
        }

        upsert_record(&tx, new)?;
        tx.commit()?;

        debug!(key = %new.key(), "Record swapped");
        Ok(true)
    }

    fn list_for_user(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? AND day BETWEEN ? AND ? ORDER BY day ASC",
            SELECT_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![
                user_id.as_str(),
                from.format(DAY_FORMAT).to_string(),
                to.format(DAY_FORMAT).to_string(),
            ],
            read_row,
        )?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }

        Ok(records)
    }

    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = parse_timestamp(&timestamp_str)?;
            let event: crate::AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}
