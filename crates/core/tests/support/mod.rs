//! Shared test helpers for `socialpub-core` integration tests.
//!
//! In-memory mocks for every core port. Each mock records the calls it
//! receives and replays scripted responses, falling back to a successful
//! default once its script runs out.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use socialpub_core::{
    MediaApi, MediaSettings, MediaSourceLoader, MediaUploadOrchestrator, OAuthClient, PostApi,
    PostPublisher, PublishLedger, TokenManager, TokenStore,
};
use socialpub_domain::{
    parse_scopes, CreatedPost, Credential, MediaKind, MediaPayload, MediaSource,
    PlatformAssetStatus, PlatformError, PlatformIdentity, PostRequest, PublishResult,
    Result as DomainResult, SocialPubError, TokenGrant, UploadRegistration, UploadTarget,
};

pub const SUBJECT: &str = "user-1";
pub const AUTHOR_URN: &str = "urn:li:person:member-1";

/// Credential expiring `expires_in_secs` from now.
pub fn credential(expires_in_secs: i64, refresh_token: Option<&str>) -> Credential {
    let now = Utc::now();
    Credential {
        subject_id: SUBJECT.to_string(),
        access_token: "initial-access".to_string(),
        refresh_token: refresh_token.map(ToString::to_string),
        expires_at: now + chrono::Duration::seconds(expires_in_secs),
        granted_scopes: parse_scopes("openid profile w_member_social"),
        external_urn: Some(AUTHOR_URN.to_string()),
        created_at: now,
        updated_at: now,
    }
}

fn pop<T>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
    queue.lock().unwrap().pop_front()
}

// ---------------------------------------------------------------------------
// Token store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryTokenStore {
    records: Mutex<HashMap<String, Credential>>,
    puts: AtomicUsize,
}

impl MemoryTokenStore {
    pub fn with(credential: Credential) -> Self {
        let store = Self::default();
        store.records.lock().unwrap().insert(credential.subject_id.clone(), credential);
        store
    }

    pub fn current(&self, subject_id: &str) -> Option<Credential> {
        self.records.lock().unwrap().get(subject_id).cloned()
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, subject_id: &str) -> DomainResult<Option<Credential>> {
        Ok(self.current(subject_id))
    }

    async fn put(&self, credential: &Credential) -> DomainResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().insert(credential.subject_id.clone(), credential.clone());
        Ok(())
    }

    async fn delete(&self, subject_id: &str) -> DomainResult<bool> {
        Ok(self.records.lock().unwrap().remove(subject_id).is_some())
    }
}

// ---------------------------------------------------------------------------
// OAuth client
// ---------------------------------------------------------------------------

pub struct MockOAuthClient {
    refresh_calls: AtomicUsize,
    refresh_results: Mutex<VecDeque<Result<TokenGrant, PlatformError>>>,
    refresh_tokens_seen: Mutex<Vec<String>>,
    refresh_delay: Duration,
    exchange_results: Mutex<VecDeque<Result<TokenGrant, PlatformError>>>,
    identity: PlatformIdentity,
}

impl Default for MockOAuthClient {
    fn default() -> Self {
        Self {
            refresh_calls: AtomicUsize::new(0),
            refresh_results: Mutex::new(VecDeque::new()),
            refresh_tokens_seen: Mutex::new(Vec::new()),
            refresh_delay: Duration::ZERO,
            exchange_results: Mutex::new(VecDeque::new()),
            identity: PlatformIdentity {
                member_id: "member-1".to_string(),
                name: Some("Test Member".to_string()),
                email: None,
            },
        }
    }
}

impl MockOAuthClient {
    /// Hold every refresh for `delay` to widen race windows.
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn push_refresh(&self, result: Result<TokenGrant, PlatformError>) {
        self.refresh_results.lock().unwrap().push_back(result);
    }

    pub fn push_exchange(&self, result: Result<TokenGrant, PlatformError>) {
        self.exchange_results.lock().unwrap().push_back(result);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_tokens_seen(&self) -> Vec<String> {
        self.refresh_tokens_seen.lock().unwrap().clone()
    }
}

pub fn grant(access_token: &str, refresh_token: Option<&str>) -> TokenGrant {
    TokenGrant {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.map(ToString::to_string),
        expires_in_secs: 3600,
        scope: Some("openid profile w_member_social".to_string()),
    }
}

#[async_trait]
impl OAuthClient for MockOAuthClient {
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant, PlatformError> {
        let call = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.refresh_tokens_seen.lock().unwrap().push(refresh_token.to_string());
        if !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }
        pop(&self.refresh_results)
            .unwrap_or_else(|| Ok(grant(&format!("refreshed-access-{call}"), None)))
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, PlatformError> {
        pop(&self.exchange_results)
            .unwrap_or_else(|| Ok(grant(&format!("access-for-{code}"), Some("fresh-refresh"))))
    }

    async fn fetch_identity(&self, _access_token: &str) -> Result<PlatformIdentity, PlatformError> {
        Ok(self.identity.clone())
    }
}

// ---------------------------------------------------------------------------
// Media endpoints
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockMediaApi {
    registrations: AtomicUsize,
    register_results: Mutex<VecDeque<Result<UploadRegistration, PlatformError>>>,
    register_tokens: Mutex<Vec<String>>,
    upload_results: Mutex<VecDeque<Result<(), PlatformError>>>,
    uploads: Mutex<Vec<(UploadTarget, usize)>>,
    status_scripts: Mutex<HashMap<String, VecDeque<Result<PlatformAssetStatus, PlatformError>>>>,
    status_calls: AtomicUsize,
    status_tokens: Mutex<Vec<String>>,
}

pub fn asset_urn(n: usize) -> String {
    format!("urn:li:digitalmediaAsset:C{n}")
}

pub fn pending() -> PlatformAssetStatus {
    PlatformAssetStatus::Pending { status: "PROCESSING".to_string() }
}

impl MockMediaApi {
    pub fn push_register(&self, result: Result<UploadRegistration, PlatformError>) {
        self.register_results.lock().unwrap().push_back(result);
    }

    pub fn push_upload(&self, result: Result<(), PlatformError>) {
        self.upload_results.lock().unwrap().push_back(result);
    }

    /// Statuses returned for `asset_id` before it defaults to ready.
    pub fn script_status(
        &self,
        asset_id: &str,
        script: Vec<Result<PlatformAssetStatus, PlatformError>>,
    ) {
        self.status_scripts.lock().unwrap().insert(asset_id.to_string(), script.into());
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    pub fn register_tokens(&self) -> Vec<String> {
        self.register_tokens.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<(UploadTarget, usize)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn status_tokens(&self) -> Vec<String> {
        self.status_tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaApi for MockMediaApi {
    async fn register_upload(
        &self,
        access_token: &str,
        _owner_urn: &str,
        _kind: MediaKind,
    ) -> Result<UploadRegistration, PlatformError> {
        self.register_tokens.lock().unwrap().push(access_token.to_string());
        if let Some(result) = pop(&self.register_results) {
            return result;
        }
        let n = self.registrations.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(UploadRegistration {
            asset_id: asset_urn(n),
            upload_target: UploadTarget {
                url: format!("https://upload.test/{n}"),
                headers: BTreeMap::new(),
            },
        })
    }

    async fn upload(&self, target: &UploadTarget, payload: MediaPayload) -> Result<(), PlatformError> {
        self.uploads.lock().unwrap().push((target.clone(), payload.bytes.len()));
        pop(&self.upload_results).unwrap_or(Ok(()))
    }

    async fn asset_status(
        &self,
        access_token: &str,
        asset_id: &str,
    ) -> Result<PlatformAssetStatus, PlatformError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status_tokens.lock().unwrap().push(access_token.to_string());
        let scripted =
            self.status_scripts.lock().unwrap().get_mut(asset_id).and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| Ok(PlatformAssetStatus::Ready { asset_id: asset_id.to_string() }))
    }
}

/// Loader that returns the reference bytes, except for listed references.
#[derive(Default)]
pub struct StaticLoader {
    missing: HashSet<String>,
}

impl StaticLoader {
    pub fn missing(reference: &str) -> Self {
        Self { missing: HashSet::from([reference.to_string()]) }
    }
}

#[async_trait]
impl MediaSourceLoader for StaticLoader {
    async fn load(&self, source: &MediaSource) -> DomainResult<MediaPayload> {
        if self.missing.contains(&source.reference) {
            return Err(SocialPubError::NotFound(source.reference.clone()));
        }
        Ok(MediaPayload {
            bytes: source.reference.as_bytes().to_vec(),
            content_type: "image/png".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Post creation and ledger
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockPostApi {
    results: Mutex<VecDeque<Result<CreatedPost, PlatformError>>>,
    calls: Mutex<Vec<(String, PostRequest)>>,
}

impl MockPostApi {
    pub fn push(&self, result: Result<CreatedPost, PlatformError>) {
        self.results.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<(String, PostRequest)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostApi for MockPostApi {
    async fn create_post(
        &self,
        access_token: &str,
        request: &PostRequest,
    ) -> Result<CreatedPost, PlatformError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((access_token.to_string(), request.clone()));
            calls.len()
        };
        pop(&self.results)
            .unwrap_or_else(|| Ok(CreatedPost { post_id: format!("urn:li:share:{n}") }))
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    entries: Mutex<HashMap<(String, String), PublishResult>>,
}

impl MemoryLedger {
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl PublishLedger for MemoryLedger {
    async fn find(&self, subject_id: &str, key: &str) -> DomainResult<Option<PublishResult>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(&(subject_id.to_string(), key.to_string()))
            .cloned())
    }

    async fn record(&self, subject_id: &str, key: &str, result: &PublishResult) -> DomainResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert((subject_id.to_string(), key.to_string()), result.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub fn fast_settings() -> MediaSettings {
    MediaSettings {
        poll_interval: Duration::from_millis(5),
        poll_deadline: Duration::from_secs(2),
        max_concurrent: 3,
    }
}

/// Fully wired core over mocks.
pub struct Harness {
    pub store: Arc<MemoryTokenStore>,
    pub oauth: Arc<MockOAuthClient>,
    pub media_api: Arc<MockMediaApi>,
    pub posts: Arc<MockPostApi>,
    pub ledger: Arc<MemoryLedger>,
    pub tokens: Arc<TokenManager>,
    pub orchestrator: Arc<MediaUploadOrchestrator>,
    pub publisher: PostPublisher,
}

impl Harness {
    pub fn new(credential: Credential) -> Self {
        Self::build(
            credential,
            MockOAuthClient::default(),
            StaticLoader::default(),
            fast_settings(),
            None,
        )
    }

    pub fn build(
        credential: Credential,
        oauth: MockOAuthClient,
        loader: StaticLoader,
        settings: MediaSettings,
        deadline: Option<Duration>,
    ) -> Self {
        let store = Arc::new(MemoryTokenStore::with(credential));
        let oauth = Arc::new(oauth);
        let media_api = Arc::new(MockMediaApi::default());
        let posts = Arc::new(MockPostApi::default());
        let ledger = Arc::new(MemoryLedger::default());

        let tokens = Arc::new(TokenManager::new(
            store.clone(),
            oauth.clone(),
            chrono::Duration::seconds(300),
        ));
        let orchestrator = Arc::new(MediaUploadOrchestrator::new(
            media_api.clone(),
            Arc::new(loader),
            tokens.clone(),
            settings,
        ));
        let publisher = PostPublisher::new(tokens.clone(), orchestrator.clone(), posts.clone())
            .with_ledger(ledger.clone())
            .with_deadline(deadline);

        Self { store, oauth, media_api, posts, ledger, tokens, orchestrator, publisher }
    }
}
