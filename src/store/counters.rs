//! Named Counters
//!
//! Tiny upsert-increment table behind commands like `!lost`.

use chrono::Utc;
use rusqlite::params;

use super::{Store, StoreError};

impl Store {
    /// Atomically increment a named counter, creating it at 1 when absent,
    /// and return the new value.
    pub async fn increment_counter(&self, name: &str) -> Result<i64, StoreError> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let now = Utc::now().to_rfc3339();
            let value = conn.query_row(
                "INSERT INTO counters (counter_name, value, last_update)
                 VALUES (?1, 1, ?2)
                 ON CONFLICT(counter_name)
                 DO UPDATE SET value = counters.value + 1, last_update = ?2
                 RETURNING value",
                params![name, now],
                |row| row.get(0),
            )?;
            Ok(value)
        })
        .await
    }
}
