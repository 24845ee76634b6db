//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the batch loop that drives a run:
//! - Seeding the frontier
//! - Popping up to `max-workers` URLs per round and processing them
//!   concurrently, with a barrier between rounds
//! - Rebuilding the HTTP client every `pool-refresh-rounds` rounds
//! - Running the stats reporter and frontier backups alongside the loop
//! - Exporting the known links of a scope

use crate::archive::{Archive, DownloadedIndex};
use crate::config::{validate, Config};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::stats::{spawn_reporter, SessionStats};
use crate::crawler::task::{process_url, CrawlMode, TaskContext};
use crate::frontier::{open_frontier, Entries, Frontier, Partition};
use crate::url::{encode_url, normalize_url, LinkFilter};
use crate::Result;
use reqwest::Client;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};

/// A crawler bound to one scope and its frontier
pub struct Crawler {
    config: Arc<Config>,
    frontier: Arc<dyn Frontier>,
    filter: LinkFilter,
    stats: Arc<SessionStats>,
}

/// Aborts a background task when the run that owns it ends
struct BackgroundTask(JoinHandle<()>);

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl Crawler {
    /// Opens the frontier named by the configuration and loads its counts
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to crawl, download, or export
    /// * `Err(CrawlError)` - The frontier could not be opened or read
    pub async fn new(config: Config) -> Result<Self> {
        let frontier = open_frontier(&config)?;
        Self::with_frontier(config, frontier).await
    }

    /// Builds a crawler over an already opened frontier
    ///
    /// The configuration is validated, partitions are created if missing,
    /// then counted to seed the session counters.
    pub async fn with_frontier(
        config: Config,
        frontier: Arc<dyn Frontier>,
    ) -> Result<Self> {
        validate(&config)?;
        frontier.create_partitions(&Partition::ALL).await?;

        let todo = frontier.list_keys(Partition::Todo).await?.len();
        let done = frontier.list_keys(Partition::Done).await?.len();
        let trash = frontier.list_keys(Partition::Trash).await?.len();
        tracing::info!(
            "Frontier holds {} todo, {} done, {} trashed",
            todo,
            done,
            trash
        );

        Ok(Self {
            filter: LinkFilter::from_config(&config.crawl),
            stats: Arc::new(SessionStats::new(todo as i64, done as i64, trash as i64)),
            config: Arc::new(config),
            frontier,
        })
    }

    /// The scope identifier: the encoded base URL
    pub fn name(&self) -> String {
        encode_url(&self.config.crawl.base_url)
    }

    /// Live counters of this crawler's session
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// The frontier this crawler reads and writes
    pub fn frontier(&self) -> &Arc<dyn Frontier> {
        &self.frontier
    }

    /// Crawls the scope until the todo partition is empty
    ///
    /// The canonical base URL is seeded unless some partition already knows
    /// it, so re-running a finished crawl makes no requests.
    pub async fn crawl(&self) -> Result<()> {
        let seed = normalize_url(&self.config.crawl.base_url)?.to_string();
        self.seed(vec![seed]).await?;
        self.run(CrawlMode::Crawl, DownloadedIndex::default()).await
    }

    /// Downloads and archives `urls` instead of crawling
    ///
    /// Pages archived by earlier runs are moved to done without a request.
    pub async fn download(&self, urls: &[String]) -> Result<()> {
        let archive = Archive::new(&self.config.output.archive_dir);
        let downloaded = archive.snapshot()?;
        tracing::info!("{} pages already archived", downloaded.len());

        let urls: Vec<String> = urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(String::from)
            .collect();
        self.seed(urls).await?;
        self.run(CrawlMode::Download, downloaded).await
    }

    /// Every URL in the done and todo partitions, sorted
    pub async fn links(&self) -> Result<Vec<String>> {
        let done = self.frontier.list_entries(Partition::Done).await?;
        let todo = self.frontier.list_entries(Partition::Todo).await?;

        let mut links: Vec<String> = done.into_keys().chain(todo.into_keys()).collect();
        links.sort();
        links.dedup();
        Ok(links)
    }

    /// Writes `links()` to `<links-dir>/<name>.txt`, one URL per line
    pub async fn dump(&self) -> Result<PathBuf> {
        let links = self.links().await?;
        let dir = Path::new(&self.config.output.links_dir);
        tokio::fs::create_dir_all(dir).await?;

        let path = dir.join(format!("{}.txt", self.name()));
        let mut contents = links.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        tokio::fs::write(&path, contents).await?;

        tracing::info!("Wrote {} links to {}", links.len(), path.display());
        Ok(path)
    }

    /// Adds the URLs no partition knows yet to todo
    async fn seed(&self, urls: Vec<String>) -> Result<usize> {
        if urls.is_empty() {
            return Ok(0);
        }

        let known = self.frontier.has_keys(&Partition::ALL, &urls).await?;
        let fresh: Entries = urls
            .into_iter()
            .filter(|url| !known.get(url).copied().unwrap_or(false))
            .map(|url| (url, 0))
            .collect();

        if !fresh.is_empty() {
            self.frontier.upsert(Partition::Todo, &fresh).await?;
            self.stats.add_todo(fresh.len() as i64);
        }
        tracing::debug!("Seeded {} URLs", fresh.len());
        Ok(fresh.len())
    }

    /// Runs rounds until a pop returns nothing
    async fn run(&self, mode: CrawlMode, downloaded: DownloadedIndex) -> Result<()> {
        let workers = &self.config.workers;
        let reporting = &self.config.reporting;

        let ctx = Arc::new(TaskContext {
            frontier: Arc::clone(&self.frontier),
            filter: self.filter.clone(),
            stats: Arc::clone(&self.stats),
            archive: Archive::new(&self.config.output.archive_dir),
            downloaded,
            mode,
        });
        let mut client = build_http_client(workers)?;

        self.stats.begin_run();
        tracing::info!("Starting {:?} run of {}", mode, self.config.crawl.base_url);

        let _reporter = BackgroundTask(spawn_reporter(
            Arc::clone(&self.stats),
            Duration::from_secs(reporting.stats_interval_secs),
        ));
        let _backup = (reporting.backup_interval_secs > 0).then(|| {
            BackgroundTask(spawn_backup(
                Arc::clone(&self.frontier),
                Duration::from_secs(reporting.backup_interval_secs),
            ))
        });

        let mut round: u64 = 0;
        loop {
            let batch = self.frontier.pop(Partition::Todo, workers.max_workers).await?;
            if batch.is_empty() {
                break;
            }

            round += 1;
            tracing::debug!("Round {}: {} URLs", round, batch.len());
            run_round(&ctx, &client, batch).await?;

            if round % workers.pool_refresh_rounds == 0 {
                tracing::debug!("Rebuilding HTTP client after {} rounds", round);
                client = build_http_client(workers)?;
            }
        }

        self.stats.set_todo(0);
        tracing::info!("{}", self.stats.snapshot());
        tracing::info!("Finished after {} rounds", round);
        Ok(())
    }
}

/// Reads a download list: one URL per line
///
/// Lines are trimmed; blank lines and lines starting with `#` are skipped.
pub fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

/// Processes one batch concurrently and waits for every task
///
/// The first fatal error is returned only after the whole round has settled.
async fn run_round(
    ctx: &Arc<TaskContext>,
    client: &Client,
    batch: Entries,
) -> Result<()> {
    let in_round: Arc<HashSet<String>> = Arc::new(batch.keys().cloned().collect());
    let mut tasks = JoinSet::new();

    for (url, tries) in batch {
        let ctx = Arc::clone(ctx);
        let client = client.clone();
        let in_round = Arc::clone(&in_round);
        tasks.spawn(async move {
            let result = process_url(&ctx, &client, &in_round, &url, tries).await;
            (url, result)
        });
    }

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((url, Ok(resolution))) => {
                tracing::trace!("{} -> {:?}", url, resolution);
            }
            Ok((url, Err(e))) => {
                tracing::error!("Error processing {}: {}", url, e);
                first_error.get_or_insert(e);
            }
            Err(e) => {
                tracing::error!("URL task failed: {}", e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Backs the frontier up every `interval`; failures are logged
fn spawn_backup(frontier: Arc<dyn Frontier>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match frontier.backup().await {
                Ok(()) => tracing::trace!("Frontier backed up"),
                Err(e) => tracing::warn!("Frontier backup failed: {}", e),
            }
        }
    })
}
