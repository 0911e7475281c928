//! In-memory port implementations
//!
//! Process-local stores for hosts that do not persist credentials, and for
//! tests. Each record is replaced as a whole, matching the SQLite stores.

use async_trait::async_trait;
use dashmap::DashMap;
use socialpub_core::{PublishLedger, TokenStore};
use socialpub_domain::{Credential, PublishResult, Result};

/// Credential store keyed by subject id
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    records: DashMap<String, Credential>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, subject_id: &str) -> Result<Option<Credential>> {
        Ok(self.records.get(subject_id).map(|entry| entry.value().clone()))
    }

    async fn put(&self, credential: &Credential) -> Result<()> {
        self.records.insert(credential.subject_id.clone(), credential.clone());
        Ok(())
    }

    async fn delete(&self, subject_id: &str) -> Result<bool> {
        Ok(self.records.remove(subject_id).is_some())
    }
}

/// Publish ledger keyed by (subject id, idempotency key)
#[derive(Debug, Default)]
pub struct MemoryPublishLedger {
    entries: DashMap<(String, String), PublishResult>,
}

impl MemoryPublishLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl PublishLedger for MemoryPublishLedger {
    async fn find(&self, subject_id: &str, key: &str) -> Result<Option<PublishResult>> {
        let lookup = (subject_id.to_string(), key.to_string());
        Ok(self.entries.get(&lookup).map(|entry| entry.value().clone()))
    }

    async fn record(&self, subject_id: &str, key: &str, result: &PublishResult) -> Result<()> {
        self.entries
            .entry((subject_id.to_string(), key.to_string()))
            .or_insert_with(|| result.clone());
        Ok(())
    }
}
