//! Shared helpers for `socialpub-infra` integration tests.
//!
//! Wires the real LinkedIn adapters and stores against a wiremock server so
//! tests exercise the HTTP wire format end to end.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use socialpub_common::RetryPolicy;
use socialpub_core::{MediaSettings, MediaUploadOrchestrator, PostPublisher, TokenManager};
use socialpub_domain::{parse_scopes, Credential, PlatformConfig};
use socialpub_infra::{
    DbManager, FsMediaSourceLoader, HttpClient, LinkedInClient, LinkedInEndpoints,
    LinkedInOAuthClient, MemoryPublishLedger, MemoryTokenStore,
};
use tempfile::TempDir;
use wiremock::MockServer;

pub const SUBJECT: &str = "user-1";
pub const AUTHOR_URN: &str = "urn:li:person:member-1";

/// Temporary SQLite database that lives as long as the value.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let manager = DbManager::new(temp_dir.path().join("test.db"), 4).unwrap();
        manager.run_migrations().unwrap();
        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Retry policy with millisecond backoff and no jitter.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::builder()
        .max_retries(3)
        .base_delay(Duration::from_millis(20))
        .max_delay(Duration::from_millis(200))
        .no_jitter()
        .build()
        .unwrap()
}

pub fn http_client() -> HttpClient {
    HttpClient::builder()
        .policy(fast_policy())
        .attempt_timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}

/// Endpoints pointing both base URLs at the mock server.
pub fn endpoints(server: &MockServer) -> LinkedInEndpoints {
    let config = PlatformConfig {
        api_base_url: server.uri(),
        oauth_base_url: server.uri(),
        client_id: "client-123".into(),
        client_secret: Some("secret-456".into()),
        redirect_uri: "http://localhost:8888/callback".into(),
        scopes: vec!["openid".into(), "w_member_social".into()],
    };
    LinkedInEndpoints::from_config(&config).unwrap()
}

pub fn credential(access: &str, expires_in_secs: i64, refresh: Option<&str>) -> Credential {
    let now = Utc::now();
    Credential {
        subject_id: SUBJECT.into(),
        access_token: access.into(),
        refresh_token: refresh.map(Into::into),
        expires_at: now + chrono::Duration::seconds(expires_in_secs),
        granted_scopes: parse_scopes("openid w_member_social"),
        external_urn: Some(AUTHOR_URN.into()),
        created_at: now,
        updated_at: now,
    }
}

/// Fully wired publishing stack backed by in-memory stores.
pub struct Stack {
    pub store: Arc<MemoryTokenStore>,
    pub ledger: Arc<MemoryPublishLedger>,
    pub tokens: Arc<TokenManager>,
    pub orchestrator: Arc<MediaUploadOrchestrator>,
    pub publisher: PostPublisher,
    pub media_dir: TempDir,
}

impl Stack {
    pub async fn new(server: &MockServer, credential: Option<Credential>) -> Self {
        let store = Arc::new(MemoryTokenStore::new());
        if let Some(credential) = credential {
            socialpub_core::TokenStore::put(store.as_ref(), &credential).await.unwrap();
        }
        let ledger = Arc::new(MemoryPublishLedger::new());

        let http = http_client();
        let oauth = Arc::new(LinkedInOAuthClient::new(http.clone(), endpoints(server)));
        let api = Arc::new(LinkedInClient::new(http, endpoints(server)));

        let tokens =
            Arc::new(TokenManager::new(store.clone(), oauth, chrono::Duration::seconds(300)));
        let media_dir = TempDir::new().unwrap();
        let loader = Arc::new(FsMediaSourceLoader::new().with_root(media_dir.path()));
        let settings = MediaSettings {
            poll_interval: Duration::from_millis(10),
            poll_deadline: Duration::from_secs(2),
            max_concurrent: 2,
        };
        let orchestrator =
            Arc::new(MediaUploadOrchestrator::new(api.clone(), loader, tokens.clone(), settings));
        let publisher = PostPublisher::new(tokens.clone(), orchestrator.clone(), api)
            .with_ledger(ledger.clone());

        Self { store, ledger, tokens, orchestrator, publisher, media_dir }
    }

    /// Write a media file the loader can find by `name`.
    pub fn media_file(&self, name: &str, bytes: &[u8]) {
        std::fs::write(self.media_dir.path().join(name), bytes).unwrap();
    }
}
