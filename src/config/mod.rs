/// Ledger, lock and cache settings loaded from config.toml
pub mod app;

/// Database configuration and connection management
pub mod database;

pub use app::{AppConfig, CacheConfig, LedgerConfig, LockConfig, load_config, load_default_config};
