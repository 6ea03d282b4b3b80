use super::{Database, timestamp_column};
use crate::error::Result;
use crate::types::push::{Subscription, SubscriptionSummary, Upsert};

use rand::RngCore;
use rand::rngs::OsRng;
use rusqlite::{OptionalExtension, Row, TransactionBehavior, params};

const SUBSCRIPTION_ID_BYTES: usize = 16;

impl Database {
    /// Inserts a subscriber, or rotates topic and keys of the one already
    /// registered for `endpoint`. The existing id always survives.
    pub fn upsert_subscription(
        &self,
        topic: &str,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<Upsert> {
        let new_id = generate_subscription_id();
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM subscriptions WHERE endpoint = ?1",
                    [endpoint],
                    |row| row.get(0),
                )
                .optional()?;

            let upsert = match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE subscriptions SET topic = ?1, key_p256dh = ?2, key_auth = ?3 WHERE id = ?4",
                        params![topic, p256dh, auth, id],
                    )?;
                    Upsert::Updated(id)
                }
                None => {
                    tx.execute(
                        "INSERT INTO subscriptions (id, topic, endpoint, key_p256dh, key_auth) VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![new_id, topic, endpoint, p256dh, auth],
                    )?;
                    Upsert::Created(new_id)
                }
            };
            tx.commit()?;
            Ok(upsert)
        })
    }

    /// Subscribers whose topic equals `topic`; every subscriber when `topic` is empty.
    pub fn subscriptions_by_topic(&self, topic: &str) -> Result<Vec<Subscription>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, topic, endpoint, key_p256dh, key_auth, created_at
                 FROM subscriptions
                 WHERE ?1 = '' OR topic = ?1
                 ORDER BY rowid",
            )?;
            stmt.query_map([topic], subscription_from_row)?.collect()
        })
    }

    pub fn subscription(&self, id: &str) -> Result<Option<Subscription>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, topic, endpoint, key_p256dh, key_auth, created_at
                 FROM subscriptions
                 WHERE id = ?1",
                [id],
                subscription_from_row,
            )
            .optional()
        })
    }

    /// Same filter as [`Database::subscriptions_by_topic`], without key material.
    pub fn list_subscriptions(&self, topic: &str) -> Result<Vec<SubscriptionSummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, topic, endpoint, created_at
                 FROM subscriptions
                 WHERE ?1 = '' OR topic = ?1
                 ORDER BY rowid",
            )?;
            stmt.query_map([topic], |row| {
                Ok(SubscriptionSummary {
                    id: row.get(0)?,
                    topic: row.get(1)?,
                    endpoint: row.get(2)?,
                    created_at: timestamp_column(row, 3)?,
                })
            })?
            .collect()
        })
    }

    /// Returns whether a row was removed. Deleting an unknown endpoint is not an error.
    pub fn delete_subscription_by_endpoint(&self, endpoint: &str) -> Result<bool> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM subscriptions WHERE endpoint = ?1", [endpoint])
                .map(|removed| removed > 0)
        })
    }

    /// Returns whether a row was removed. Deleting an unknown id is not an error.
    pub fn delete_subscription_by_id(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM subscriptions WHERE id = ?1", [id])
                .map(|removed| removed > 0)
        })
    }
}

fn subscription_from_row(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: row.get(0)?,
        topic: row.get(1)?,
        endpoint: row.get(2)?,
        p256dh: row.get(3)?,
        auth: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
    })
}

fn generate_subscription_id() -> String {
    let mut bytes = [0u8; SUBSCRIPTION_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
