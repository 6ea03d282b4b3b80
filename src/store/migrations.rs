use rusqlite::Connection;
use tracing::debug;

pub(super) fn run(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS subscriptions (
            id          TEXT PRIMARY KEY,
            topic       TEXT NOT NULL DEFAULT '',
            endpoint    TEXT NOT NULL,
            key_p256dh  TEXT NOT NULL,
            key_auth    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(endpoint)
        );

        CREATE INDEX IF NOT EXISTS idx_subscriptions_topic
            ON subscriptions(topic);

        CREATE TABLE IF NOT EXISTS delivery_log (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            subscription_id  TEXT NOT NULL,
            sent_at          TEXT NOT NULL DEFAULT (datetime('now')),
            status_code      INTEGER NOT NULL,
            error            TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_delivery_log_sent_at
            ON delivery_log(sent_at);
        ",
    )?;

    debug!("database migrations complete");
    Ok(())
}
