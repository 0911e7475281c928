//! SQLite-backed credential store
//!
//! One row per subject, always written as a whole record.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use socialpub_core::TokenStore;
use socialpub_domain::{Credential, Result, SocialPubError};
use tokio::task;

use super::manager::{from_millis, map_join_error, map_sql_error, to_millis, DbManager};
use crate::errors::InfraError;

const SELECT_COLUMNS: &str = "subject_id, access_token, refresh_token, expires_at, granted_scopes,
     external_urn, created_at, updated_at";

/// SQLite implementation of the `TokenStore` port
pub struct SqliteCredentialRepository {
    db: Arc<DbManager>,
}

impl SqliteCredentialRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for SqliteCredentialRepository {
    async fn get(&self, subject_id: &str) -> Result<Option<Credential>> {
        let db = Arc::clone(&self.db);
        let subject_id = subject_id.to_string();

        task::spawn_blocking(move || -> Result<Option<Credential>> {
            let conn = db.get_connection()?;
            let row = conn
                .query_row(
                    &format!("SELECT {SELECT_COLUMNS} FROM social_credentials WHERE subject_id = ?1"),
                    params![subject_id],
                    map_credential_row,
                )
                .optional()
                .map_err(map_sql_error)?;

            row.map(StoredCredential::into_credential).transpose()
        })
        .await
        .map_err(map_join_error)?
    }

    async fn put(&self, credential: &Credential) -> Result<()> {
        let db = Arc::clone(&self.db);
        let credential = credential.clone();

        task::spawn_blocking(move || -> Result<()> {
            let scopes = serde_json::to_string(&credential.granted_scopes)
                .map_err(|err| SocialPubError::from(InfraError::from(err)))?;
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT OR REPLACE INTO social_credentials
                    (subject_id, access_token, refresh_token, expires_at, granted_scopes,
                     external_urn, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    credential.subject_id,
                    credential.access_token,
                    credential.refresh_token,
                    to_millis(credential.expires_at),
                    scopes,
                    credential.external_urn,
                    to_millis(credential.created_at),
                    to_millis(credential.updated_at),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, subject_id: &str) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let subject_id = subject_id.to_string();

        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let removed = conn
                .execute("DELETE FROM social_credentials WHERE subject_id = ?1", params![subject_id])
                .map_err(map_sql_error)?;
            Ok(removed > 0)
        })
        .await
        .map_err(map_join_error)?
    }
}

/// Row shape before the scope JSON is decoded
struct StoredCredential {
    credential: Credential,
    scopes_json: String,
}

impl StoredCredential {
    fn into_credential(self) -> Result<Credential> {
        let granted_scopes: BTreeSet<String> = serde_json::from_str(&self.scopes_json)
            .map_err(|err| SocialPubError::from(InfraError::from(err)))?;
        Ok(Credential { granted_scopes, ..self.credential })
    }
}

fn map_credential_row(row: &Row<'_>) -> rusqlite::Result<StoredCredential> {
    Ok(StoredCredential {
        credential: Credential {
            subject_id: row.get(0)?,
            access_token: row.get(1)?,
            refresh_token: row.get(2)?,
            expires_at: from_millis(3, row.get(3)?)?,
            granted_scopes: BTreeSet::new(),
            external_urn: row.get(5)?,
            created_at: from_millis(6, row.get(6)?)?,
            updated_at: from_millis(7, row.get(7)?)?,
        },
        scopes_json: row.get(4)?,
    })
}
