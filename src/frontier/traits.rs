//! Frontier trait and error types
//!
//! This module defines the interface every frontier backend provides and
//! the error type shared by all backends.

use crate::frontier::Partition;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// `url -> tries` pairs, as stored in a partition
pub type Entries = HashMap<String, u32>;

/// Errors that can occur during frontier operations
#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Frontier service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Frontier service returned {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Unknown partition: {0}")]
    UnknownPartition(String),

    #[error("Corrupt tries value {value:?} for {key}")]
    CorruptValue { key: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for frontier operations
pub type FrontierResult<T> = Result<T, FrontierError>;

/// The persistent frontier: three partitions of `url -> tries` entries
///
/// Every call is atomic from the caller's point of view: a `pop` never
/// returns an entry that a concurrent `upsert` loses, and `has_keys`
/// observes every `upsert`/`pop` that has returned.
#[async_trait]
pub trait Frontier: Send + Sync {
    /// Ensures the given partitions exist; idempotent
    async fn create_partitions(&self, partitions: &[Partition]) -> FrontierResult<()>;

    /// Lists every key of a partition
    async fn list_keys(&self, partition: Partition) -> FrontierResult<Vec<String>>;

    /// Lists every entry of a partition
    async fn list_entries(&self, partition: Partition) -> FrontierResult<Entries>;

    /// Reports, for each key, whether it exists in any of `partitions`
    async fn has_keys(
        &self,
        partitions: &[Partition],
        keys: &[String],
    ) -> FrontierResult<HashMap<String, bool>>;

    /// Inserts or overwrites entries in one partition
    async fn upsert(&self, partition: Partition, entries: &Entries) -> FrontierResult<()>;

    /// Atomically removes and returns up to `max` entries
    ///
    /// An empty result means the partition is empty.
    async fn pop(&self, partition: Partition, max: usize) -> FrontierResult<Entries>;

    /// Writes a point-in-time copy of the frontier, where the backend supports it
    async fn backup(&self) -> FrontierResult<()> {
        Ok(())
    }
}
