//! Application context - dependency injection container

use std::sync::Arc;

use socialpub_core::{
    MediaApi, MediaSettings, MediaSourceLoader, MediaUploadOrchestrator, OAuthClient, PostApi,
    PostPublisher, PublishLedger, TokenManager, TokenStore,
};
use socialpub_domain::{Config, Result};
use socialpub_infra::{
    config, init_tracing, DbManager, FsMediaSourceLoader, HttpClient, LinkedInClient,
    LinkedInEndpoints, LinkedInOAuthClient, SqliteCredentialRepository, SqlitePublishLedger,
};
use tracing::info;

/// Outbound adapters the services are wired onto
pub struct AppPorts {
    pub store: Arc<dyn TokenStore>,
    pub oauth: Arc<dyn OAuthClient>,
    pub media_api: Arc<dyn MediaApi>,
    pub loader: Arc<dyn MediaSourceLoader>,
    pub posts: Arc<dyn PostApi>,
    pub ledger: Option<Arc<dyn PublishLedger>>,
}

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    /// Present when the context owns a SQLite database
    pub db: Option<Arc<DbManager>>,
    pub tokens: Arc<TokenManager>,
    pub media: Arc<MediaUploadOrchestrator>,
    pub publisher: Arc<PostPublisher>,
}

impl AppContext {
    /// Load configuration, install logging and wire the production adapters.
    ///
    /// # Errors
    /// Returns `SocialPubError::Config` for an invalid configuration and
    /// `SocialPubError::Database` if the database cannot be opened.
    pub fn new() -> Result<Self> {
        let config = config::load()?;
        init_tracing(&config.logging)?;
        Self::new_with_config(config)
    }

    /// Wire the LinkedIn adapters and SQLite stores described by `config`.
    ///
    /// # Errors
    /// Same as [`AppContext::new`], without loading or logging setup.
    pub fn new_with_config(config: Config) -> Result<Self> {
        let http = HttpClient::from_config(&config.http)?;
        let endpoints = LinkedInEndpoints::from_config(&config.platform)?;
        let db = Arc::new(DbManager::open(&config.database)?);

        let client = Arc::new(LinkedInClient::new(http.clone(), endpoints.clone()));
        let ports = AppPorts {
            store: Arc::new(SqliteCredentialRepository::new(Arc::clone(&db))),
            oauth: Arc::new(LinkedInOAuthClient::new(http, endpoints)),
            media_api: client.clone(),
            loader: Arc::new(FsMediaSourceLoader::new()),
            posts: client,
            ledger: Some(Arc::new(SqlitePublishLedger::new(Arc::clone(&db)))),
        };

        let mut ctx = Self::from_ports(config, ports);
        ctx.db = Some(db);
        info!(db_path = %ctx.config.database.path, "application context initialised");
        Ok(ctx)
    }

    /// Wire the services onto caller-supplied adapters.
    pub fn from_ports(config: Config, ports: AppPorts) -> Self {
        let tokens =
            Arc::new(TokenManager::new(ports.store, ports.oauth, config.auth.refresh_margin()));
        let media = Arc::new(MediaUploadOrchestrator::new(
            ports.media_api,
            ports.loader,
            Arc::clone(&tokens),
            MediaSettings::from(&config.media),
        ));

        let mut publisher = PostPublisher::new(Arc::clone(&tokens), Arc::clone(&media), ports.posts)
            .with_deadline(config.publish.deadline());
        if let Some(ledger) = ports.ledger {
            publisher = publisher.with_ledger(ledger);
        }

        Self { config, db: None, tokens, media, publisher: Arc::new(publisher) }
    }

    /// Verify the owned database still answers.
    ///
    /// # Errors
    /// Returns `SocialPubError::Database` if the query fails.
    pub fn health_check(&self) -> Result<()> {
        match &self.db {
            Some(db) => db.health_check(),
            None => Ok(()),
        }
    }
}
