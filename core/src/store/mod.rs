//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The lifecycle manager sees the `ComplaintStore` contract: load the
//! whole collection, replace the whole collection. There is no
//! per-record update primitive.

use crate::{
    complaint::Complaint,
    error::GrievanceResult,
    event::{EventLogEntry, LifecycleEvent},
};
use rusqlite::{params, Connection};

mod complaint;

/// The single named blob holding every complaint.
pub const COMPLAINTS_KEY: &str = "grievance_portal_data";

/// The collection as read, plus the revision it was read at.
/// Revision 0 means the blob has never been written.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub complaints: Vec<Complaint>,
    pub revision: u64,
}

pub trait ComplaintStore {
    /// Current collection and its revision. A missing or corrupt blob
    /// reads as an empty collection, never as an error.
    fn snapshot(&self) -> GrievanceResult<StoreSnapshot>;

    fn load(&self) -> GrievanceResult<Vec<Complaint>> {
        Ok(self.snapshot()?.complaints)
    }

    /// Overwrite the whole collection.
    fn replace(&self, complaints: &[Complaint]) -> GrievanceResult<()>;

    /// Overwrite only if nobody wrote since `expected_revision` was read,
    /// appending `events` to the audit log in the same transaction.
    /// Returns false, writing nothing, when another writer got there first.
    fn replace_if_unchanged(
        &self,
        expected_revision: u64,
        complaints: &[Complaint],
        events: &[LifecycleEvent],
    ) -> GrievanceResult<bool>;

    /// True once the blob has been written at least once.
    fn is_initialized(&self) -> GrievanceResult<bool>;
}

pub struct PortalStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl PortalStore {
    pub fn open(path: &str) -> GrievanceResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GrievanceResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn, path: None })
    }

    /// Open a second connection to the same database.
    /// For plain in-memory databases this is a new, isolated database.
    pub fn reopen(&self) -> GrievanceResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    pub fn migrate(&self) -> GrievanceResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_portal.sql"))?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, event: &LifecycleEvent) -> GrievanceResult<()> {
        insert_event(&self.conn, event)
    }

    /// Audit trail for one complaint, oldest first.
    pub fn events_for(&self, tracking_id: &str) -> GrievanceResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, tracking_id, event_type, payload
             FROM event_log WHERE tracking_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![tracking_id], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    tracking_id: row.get(1)?,
                    event_type: row.get(2)?,
                    payload: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self) -> GrievanceResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM event_log", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn insert_event(conn: &Connection, event: &LifecycleEvent) -> GrievanceResult<()> {
    conn.execute(
        "INSERT INTO event_log (tracking_id, event_type, payload, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            event.tracking_id(),
            event.type_name(),
            serde_json::to_string(event)?,
            event.at().to_rfc3339(),
        ],
    )?;
    Ok(())
}
