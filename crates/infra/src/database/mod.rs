//! Database implementations

pub mod credential_repository;
pub mod ledger_repository;
pub mod manager;

pub use credential_repository::SqliteCredentialRepository;
pub use ledger_repository::SqlitePublishLedger;
pub use manager::{DbManager, SqliteConnection, SqlitePool};
