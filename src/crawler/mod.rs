//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a pooled, periodically rebuilt client
//! - HTML link extraction
//! - Per-URL retry and partition bookkeeping
//! - Session counters and progress reporting
//! - Batch coordination with a barrier between rounds

mod coordinator;
mod fetcher;
mod parser;
mod stats;
mod task;

pub use coordinator::{read_url_list, Crawler};
pub use fetcher::{build_http_client, content_type, fetch, FetchOutcome};
pub use parser::extract_links;
pub use stats::{
    format_thousands, round_half_away_from_zero, spawn_reporter, SessionStats, StatsSnapshot,
};
pub use task::{process_url, CrawlMode, Resolution, TaskContext, MAX_RETRIES};
