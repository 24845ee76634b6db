//! Per-URL task processing
//!
//! A task takes one URL popped from the todo partition and resolves it:
//!
//! | Fetch outcome | Resolution |
//! |---------------|------------|
//! | Already archived (download mode) | done, no request |
//! | Transport error | trash |
//! | Non-200, attempts ≤ 3 | back to todo with the attempt recorded |
//! | Non-200, attempts > 3 | trash |
//! | 200, crawl mode | links enqueued, done |
//! | 200, download mode | body archived, done |
//!
//! Frontier and archive failures are returned to the coordinator and end the
//! run. Everything else is settled here.

use crate::archive::{extension_for_content_type, Archive, DownloadedIndex};
use crate::crawler::fetcher::{content_type, describe_transport_error, fetch, FetchOutcome};
use crate::crawler::parser::extract_links;
use crate::crawler::stats::SessionStats;
use crate::frontier::{Entries, Frontier, Partition};
use crate::url::LinkFilter;
use crate::Result;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;

/// Attempts allowed beyond the first before a URL is trashed
pub const MAX_RETRIES: u32 = 3;

/// What a crawler run does with successfully fetched pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlMode {
    /// Extract links and grow the frontier
    Crawl,
    /// Archive the body; never extract links
    Download,
}

/// Where a task left its URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Fetched and processed
    Done,
    /// Already archived; moved to done without a request
    Skipped,
    /// Returned to todo for another attempt
    Requeued { tries: u32 },
    /// Abandoned
    Trashed,
}

/// Shared state for every task of a run
pub struct TaskContext {
    pub frontier: Arc<dyn Frontier>,
    pub filter: LinkFilter,
    pub stats: Arc<SessionStats>,
    pub archive: Archive,
    pub downloaded: DownloadedIndex,
    pub mode: CrawlMode,
}

/// Processes one URL popped from the todo partition
///
/// `in_round` holds every URL of the current round. Discovered links equal to
/// one of them are dropped: those URLs are in flight and belong to no
/// partition until their own task settles them.
pub async fn process_url(
    ctx: &TaskContext,
    client: &Client,
    in_round: &HashSet<String>,
    url: &str,
    tries: u32,
) -> Result<Resolution> {
    if ctx.mode == CrawlMode::Download && ctx.downloaded.contains_url(url) {
        tracing::trace!("Already downloaded {}", url);
        move_to(ctx, Partition::Done, url, tries).await?;
        ctx.stats.record_done();
        return Ok(Resolution::Skipped);
    }

    let tries = tries.saturating_add(1);

    let response = match fetch(client, url).await {
        FetchOutcome::Success(response) => response,
        FetchOutcome::Transport(error) => {
            tracing::debug!("Failed to fetch {}: {}", url, error);
            return trash(ctx, url, tries).await;
        }
        FetchOutcome::Status(status) => {
            if tries > MAX_RETRIES {
                tracing::debug!("Giving up on {} after {} attempts (HTTP {})", url, tries, status);
                return trash(ctx, url, tries).await;
            }
            tracing::trace!("HTTP {} for {}, attempt {}", status, url, tries);
            move_to(ctx, Partition::Todo, url, tries).await?;
            return Ok(Resolution::Requeued { tries });
        }
    };

    ctx.stats.record_parsed();

    match ctx.mode {
        CrawlMode::Download => {
            let declared = content_type(&response);
            let Some(extension) = extension_for_content_type(&declared) else {
                tracing::warn!("No file extension for content type {:?} of {}", declared, url);
                return trash(ctx, url, tries).await;
            };

            let body = match response.bytes().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!("Failed to read {}: {}", url, describe_transport_error(&e));
                    return trash(ctx, url, tries).await;
                }
            };

            let path = ctx.archive.store(url, extension, body.to_vec()).await?;
            tracing::trace!("Saved {} to {}", url, path.display());
        }
        CrawlMode::Crawl => {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!("Failed to read {}: {}", url, describe_transport_error(&e));
                    return trash(ctx, url, tries).await;
                }
            };

            let added = enqueue_links(ctx, in_round, &body).await?;
            tracing::debug!("Got {} new links from {}", added, url);
        }
    }

    move_to(ctx, Partition::Done, url, tries).await?;
    ctx.stats.record_done();
    Ok(Resolution::Done)
}

/// Filters the page's links and adds the unknown ones to todo
///
/// Returns the number of URLs added.
async fn enqueue_links(
    ctx: &TaskContext,
    in_round: &HashSet<String>,
    body: &str,
) -> Result<usize> {
    let mut candidates: Vec<String> = extract_links(body)
        .iter()
        .filter_map(|raw| ctx.filter.filter(raw))
        .filter(|url| !in_round.contains(url))
        .collect();
    candidates.sort();
    candidates.dedup();

    if candidates.is_empty() {
        return Ok(0);
    }

    let known = ctx.frontier.has_keys(&Partition::ALL, &candidates).await?;
    let fresh: Entries = candidates
        .into_iter()
        .filter(|url| !known.get(url).copied().unwrap_or(false))
        .map(|url| (url, 0))
        .collect();

    if fresh.is_empty() {
        return Ok(0);
    }

    tracing::trace!("Posting {} more links todo", fresh.len());
    ctx.frontier.upsert(Partition::Todo, &fresh).await?;
    ctx.stats.add_todo(fresh.len() as i64);
    Ok(fresh.len())
}

async fn move_to(
    ctx: &TaskContext,
    partition: Partition,
    url: &str,
    tries: u32,
) -> Result<()> {
    let mut entry = Entries::with_capacity(1);
    entry.insert(url.to_string(), tries);
    ctx.frontier.upsert(partition, &entry).await?;
    Ok(())
}

async fn trash(ctx: &TaskContext, url: &str, tries: u32) -> Result<Resolution> {
    move_to(ctx, Partition::Trash, url, tries).await?;
    ctx.stats.record_trash();
    Ok(Resolution::Trashed)
}
