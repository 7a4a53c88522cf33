use super::{insert_event, ComplaintStore, PortalStore, StoreSnapshot, COMPLAINTS_KEY};
use crate::{complaint::Complaint, error::GrievanceResult, event::LifecycleEvent};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

impl PortalStore {
    // ── Blob ───────────────────────────────────────────────────────

    fn read_blob(&self, key: &str) -> GrievanceResult<Option<(String, u64)>> {
        let row = self
            .conn
            .query_row(
                "SELECT payload, revision FROM blob_store WHERE key = ?1",
                params![key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64)),
            )
            .optional()?;
        Ok(row)
    }

    /// Upsert `payload` under `key` as-is, without decoding it, and bump
    /// the key's revision.
    pub fn put_raw_blob(&self, key: &str, payload: &str) -> GrievanceResult<()> {
        self.conn.execute(
            "INSERT INTO blob_store (key, payload, revision, updated_at)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                revision = blob_store.revision + 1,
                updated_at = excluded.updated_at",
            params![key, payload, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn blob_revision(&self) -> GrievanceResult<u64> {
        Ok(self.read_blob(COMPLAINTS_KEY)?.map(|(_, rev)| rev).unwrap_or(0))
    }
}

fn decode(payload: &str) -> Vec<Complaint> {
    match serde_json::from_str::<Vec<Complaint>>(payload) {
        Ok(complaints) => complaints,
        Err(e) => {
            log::warn!("Discarding unreadable complaint blob ({} bytes): {e}", payload.len());
            Vec::new()
        }
    }
}

impl ComplaintStore for PortalStore {
    fn snapshot(&self) -> GrievanceResult<StoreSnapshot> {
        Ok(match self.read_blob(COMPLAINTS_KEY)? {
            Some((payload, revision)) => StoreSnapshot {
                complaints: decode(&payload),
                revision,
            },
            None => StoreSnapshot::default(),
        })
    }

    fn replace(&self, complaints: &[Complaint]) -> GrievanceResult<()> {
        let payload = serde_json::to_string(complaints)?;
        self.put_raw_blob(COMPLAINTS_KEY, &payload)
    }

    fn replace_if_unchanged(
        &self,
        expected_revision: u64,
        complaints: &[Complaint],
        events: &[LifecycleEvent],
    ) -> GrievanceResult<bool> {
        let payload = serde_json::to_string(complaints)?;
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        let changed = if expected_revision == 0 {
            tx.execute(
                "INSERT OR IGNORE INTO blob_store (key, payload, revision, updated_at)
                 VALUES (?1, ?2, 1, ?3)",
                params![COMPLAINTS_KEY, payload, now],
            )?
        } else {
            tx.execute(
                "UPDATE blob_store SET payload = ?1, revision = revision + 1, updated_at = ?2
                 WHERE key = ?3 AND revision = ?4",
                params![payload, now, COMPLAINTS_KEY, expected_revision as i64],
            )?
        };
        if changed != 1 {
            // Dropping the transaction rolls it back.
            return Ok(false);
        }
        for event in events {
            insert_event(&tx, event)?;
        }
        tx.commit()?;
        Ok(true)
    }

    fn is_initialized(&self) -> GrievanceResult<bool> {
        Ok(self.read_blob(COMPLAINTS_KEY)?.is_some())
    }
}
