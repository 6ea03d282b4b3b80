use super::{Database, format_timestamp, timestamp_column};
use crate::error::Result;
use crate::types::push::DeliveryRecord;

use rusqlite::params;
use time::OffsetDateTime;

impl Database {
    /// Appends one attempt. `status_code` 0 marks a transport failure.
    pub fn log_delivery(
        &self,
        subscription_id: &str,
        status_code: u16,
        error: &str,
        sent_at: OffsetDateTime,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO delivery_log (subscription_id, sent_at, status_code, error) VALUES (?1, ?2, ?3, ?4)",
                params![subscription_id, format_timestamp(sent_at)?, status_code, error],
            )?;
            Ok(())
        })
    }

    pub fn deliveries_for_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<DeliveryRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, subscription_id, sent_at, status_code, error
                 FROM delivery_log
                 WHERE subscription_id = ?1
                 ORDER BY id",
            )?;
            stmt.query_map([subscription_id], |row| {
                Ok(DeliveryRecord {
                    id: row.get(0)?,
                    subscription_id: row.get(1)?,
                    sent_at: timestamp_column(row, 2)?,
                    status_code: row.get(3)?,
                    error: row.get(4)?,
                })
            })?
            .collect()
        })
    }

    pub fn delivery_count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM delivery_log", [], |row| row.get(0))
        })
    }

    /// Deletes entries strictly older than `cutoff` and returns how many went.
    pub fn purge_deliveries_before(&self, cutoff: OffsetDateTime) -> Result<usize> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM delivery_log WHERE sent_at < ?1",
                [format_timestamp(cutoff)?],
            )
        })
    }
}
