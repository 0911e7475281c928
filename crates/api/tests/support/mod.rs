#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use socialpub_api::{AppContext, AppPorts};
use socialpub_core::TokenStore;
use socialpub_domain::{parse_scopes, Config, Credential, DatabaseConfig, HttpConfig};
use socialpub_infra::{
    FsMediaSourceLoader, HttpClient, LinkedInClient, LinkedInEndpoints, LinkedInOAuthClient,
    MemoryPublishLedger, MemoryTokenStore,
};
use tempfile::TempDir;
use wiremock::MockServer;

pub const SUBJECT: &str = "user-1";
pub const AUTHOR_URN: &str = "urn:li:person:member-1";

/// Configuration pointing at the mock server with millisecond backoff.
pub fn test_config(server: &MockServer, temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.platform.api_base_url = server.uri();
    config.platform.oauth_base_url = server.uri();
    config.platform.client_id = "client-123".into();
    config.http = HttpConfig {
        attempt_timeout_ms: 2_000,
        base_delay_ms: 10,
        max_delay_ms: 50,
        jitter_factor: 0.0,
        ..HttpConfig::default()
    };
    config.media.poll_interval_ms = 10;
    config.media.poll_deadline_secs = 2;
    config.database = DatabaseConfig {
        path: temp_dir.path().join("socialpub.db").to_string_lossy().into_owned(),
        pool_size: 2,
    };
    config
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

/// Context wired onto in-memory stores and the real LinkedIn adapters.
pub struct MemoryContext {
    pub ctx: AppContext,
    pub store: Arc<MemoryTokenStore>,
    pub ledger: Arc<MemoryPublishLedger>,
    _temp_dir: TempDir,
}

impl MemoryContext {
    pub async fn new(server: &MockServer, credential: Option<Credential>) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(server, &temp_dir);

        let store = Arc::new(MemoryTokenStore::new());
        if let Some(credential) = credential {
            store.put(&credential).await.unwrap();
        }
        let ledger = Arc::new(MemoryPublishLedger::new());

        let http = HttpClient::from_config(&config.http).unwrap();
        let endpoints = LinkedInEndpoints::from_config(&config.platform).unwrap();
        let client = Arc::new(LinkedInClient::new(http.clone(), endpoints.clone()));
        let ports = AppPorts {
            store: store.clone(),
            oauth: Arc::new(LinkedInOAuthClient::new(http, endpoints)),
            media_api: client.clone(),
            loader: Arc::new(FsMediaSourceLoader::new().with_root(temp_dir.path())),
            posts: client,
            ledger: Some(ledger.clone()),
        };

        Self { ctx: AppContext::from_ports(config, ports), store, ledger, _temp_dir: temp_dir }
    }
}
