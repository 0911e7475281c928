//! SQLite-backed publish ledger

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use socialpub_core::PublishLedger;
use socialpub_domain::{PublishResult, Result};
use tokio::task;

use super::manager::{from_millis, map_join_error, map_sql_error, to_millis, DbManager};

/// Records successful publishes keyed by (subject, idempotency key)
pub struct SqlitePublishLedger {
    db: Arc<DbManager>,
}

impl SqlitePublishLedger {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PublishLedger for SqlitePublishLedger {
    async fn find(&self, subject_id: &str, key: &str) -> Result<Option<PublishResult>> {
        let db = Arc::clone(&self.db);
        let subject_id = subject_id.to_string();
        let key = key.to_string();

        task::spawn_blocking(move || -> Result<Option<PublishResult>> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT remote_post_id, created_at FROM publish_ledger
                 WHERE subject_id = ?1 AND idempotency_key = ?2",
                params![subject_id, key],
                |row| Ok(PublishResult::new(row.get::<_, String>(0)?, from_millis(1, row.get(1)?)?)),
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn record(&self, subject_id: &str, key: &str, result: &PublishResult) -> Result<()> {
        let db = Arc::clone(&self.db);
        let subject_id = subject_id.to_string();
        let key = key.to_string();
        let result = result.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            // First write wins; a replayed key never overwrites the original post.
            conn.execute(
                "INSERT OR IGNORE INTO publish_ledger
                    (subject_id, idempotency_key, remote_post_id, created_at, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    subject_id,
                    key,
                    result.remote_post_id(),
                    to_millis(result.created_at()),
                    to_millis(Utc::now()),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}
