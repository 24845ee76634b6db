//! Crawlbox: a breadth-first crawler driven by an external frontier
//!
//! This crate enumerates the pages reachable inside a URL scope, or downloads
//! and archives page bodies. Every known URL lives in one of three frontier
//! partitions (todo, done, trash) held by a key-value service, so an
//! interrupted run resumes where the previous one stopped.

pub mod archive;
pub mod config;
pub mod crawler;
pub mod frontier;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
///
/// Only run-level failures end up here. Per-URL problems (transport errors,
/// bad status codes, unusable links) are resolved inside the task processor
/// and never abort a run.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Frontier error: {0}")]
    Frontier(#[from] frontier::FrontierError),

    #[error("Archive error: {0}")]
    Archive(#[from] archive::ArchiveError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::crawler::{CrawlMode, Crawler};
pub use crate::frontier::{Frontier, Partition};
pub use crate::url::{encode_url, normalize_url, LinkFilter};
