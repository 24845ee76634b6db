//! Frontier module: the persistent record of every known URL
//!
//! This module handles:
//! - The three frontier partitions (todo, done, trash)
//! - The `Frontier` trait every backend implements
//! - A client for the remote key-value frontier service
//! - An embedded SQLite backend offering the same operations

mod remote;
mod schema;
mod sqlite;
mod traits;

pub use remote::RemoteFrontier;
pub use sqlite::SqliteFrontier;
pub use traits::{Entries, Frontier, FrontierError, FrontierResult};

use crate::config::Config;
use crate::url::encode_url;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A named partition of the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Awaiting a first fetch or a retry
    Todo,
    /// Fetched with HTTP 200 and processed
    Done,
    /// Abandoned after a transport error or too many attempts
    Trash,
}

impl Partition {
    /// Every partition, in the order they are created
    pub const ALL: [Partition; 3] = [Partition::Todo, Partition::Done, Partition::Trash];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Done => "done",
            Self::Trash => "trash",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "done" => Some(Self::Done),
            "trash" => Some(Self::Trash),
            _ => None,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opens the frontier named by `config.frontier.endpoint`
///
/// The database name is the encoded base URL, so every scope gets its own
/// frontier. An `http(s)://` endpoint selects the remote service; anything
/// else is a directory holding `<database>.db`.
pub fn open_frontier(config: &Config) -> FrontierResult<Arc<dyn Frontier>> {
    let database = encode_url(&config.crawl.base_url);
    let endpoint = config.frontier.endpoint.as_str();

    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        tracing::info!("Using frontier service at {}: {}", endpoint, database);
        return Ok(Arc::new(RemoteFrontier::new(endpoint, &database)?));
    }

    std::fs::create_dir_all(endpoint)?;
    let path = Path::new(endpoint).join(format!("{}.db", database));
    tracing::info!("Using embedded frontier at {}", path.display());
    Ok(Arc::new(SqliteFrontier::open(&path)?))
}
