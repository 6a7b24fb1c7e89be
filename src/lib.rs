//! Lemma-Search: a crawler and lemma-based search engine
//!
//! This crate crawls a configured set of websites, builds a lemma inverted
//! index of their Russian-language content and answers free-text queries with
//! ranked, snippet-annotated results.

pub mod config;
pub mod crawler;
pub mod engine;
pub mod indexer;
pub mod lemma;
pub mod morphology;
pub mod search;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Lemma-Search operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Morphology error: {0}")]
    Morphology(String),

    #[error("URL is outside of configured sites: {0}")]
    OutOfScope(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Crawl task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Returns true for the cooperative cancellation condition
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

// Re-export commonly used types
pub use config::Config;
pub use engine::{Engine, IndexPageOutcome, StartOutcome, StopOutcome};
pub use lemma::Lemmatizer;
pub use search::{SearchResponse, SearchResult};
pub use state::SiteStatus;
pub use url::{normalize_url, site_domain};
