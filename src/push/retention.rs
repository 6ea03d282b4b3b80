use crate::error::{Error, Result};
use crate::ports;
use crate::store::Database;

use time::Duration;
use tracing::info;

pub const DEFAULT_MAX_AGE: &str = "30d";

/// Parses `<digits><unit>` where unit is `d`, `h` or `m`, e.g. `30d`.
pub fn parse_max_age(raw: &str) -> Result<Duration> {
    let invalid = || Error::InvalidDuration(raw.to_string());

    let unit = raw.chars().last().ok_or_else(invalid)?;
    let digits = &raw[..raw.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let amount: i64 = digits.parse().map_err(|_| invalid())?;

    let unit_seconds: i64 = match unit {
        'd' => 86_400,
        'h' => 3_600,
        'm' => 60,
        _ => return Err(invalid()),
    };
    let seconds = amount.checked_mul(unit_seconds).ok_or_else(invalid)?;
    Ok(Duration::seconds(seconds))
}

/// Deletes delivery log entries older than `max_age` and returns how many went.
pub fn purge_delivery_log<T: ports::TimeProvider>(
    db: &Database,
    time: &T,
    max_age: &str,
) -> Result<usize> {
    let age = parse_max_age(max_age)?;
    let cutoff = time
        .before_now(age)
        .ok_or_else(|| Error::InvalidDuration(max_age.to_string()))?;
    let deleted = db.purge_deliveries_before(cutoff)?;
    info!(max_age, deleted, "purged delivery log");
    Ok(deleted)
}
