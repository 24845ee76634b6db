use serde::Deserialize;

/// Main configuration structure for Crawlbox
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub frontier: FrontierConfig,
    #[serde(default)]
    pub workers: WorkerConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl scope configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Seed URL and scope anchor
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Links whose canonical form contains any of these are dropped
    #[serde(rename = "exclude-keywords", default)]
    pub exclude_keywords: Vec<String>,

    /// When non-empty, links must contain at least one of these
    #[serde(rename = "include-keywords", default)]
    pub include_keywords: Vec<String>,

    /// Enables trace-level logging
    #[serde(default)]
    pub verbose: bool,
}

/// Frontier service location
#[derive(Debug, Clone, Deserialize)]
pub struct FrontierConfig {
    /// `http(s)://` address of the key-value service, or a directory for
    /// the embedded SQLite frontier
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}

/// Worker pool and HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Maximum number of URLs fetched concurrently in one round
    #[serde(rename = "max-workers", default = "default_max_workers")]
    pub max_workers: usize,

    /// Maximum idle connections kept per host
    #[serde(
        rename = "max-idle-connections",
        default = "default_max_idle_connections"
    )]
    pub max_idle_connections: usize,

    /// Per-request timeout (seconds)
    #[serde(
        rename = "request-timeout-secs",
        default = "default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,

    /// Number of rounds after which the HTTP client is rebuilt
    #[serde(
        rename = "pool-refresh-rounds",
        default = "default_pool_refresh_rounds"
    )]
    pub pool_refresh_rounds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            max_idle_connections: default_max_idle_connections(),
            request_timeout_secs: default_request_timeout_secs(),
            pool_refresh_rounds: default_pool_refresh_rounds(),
        }
    }
}

/// Periodic activity configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    /// Interval between progress lines (seconds)
    #[serde(rename = "stats-interval-secs", default = "default_interval_secs")]
    pub stats_interval_secs: u64,

    /// Interval between frontier backups (seconds, 0 disables)
    #[serde(rename = "backup-interval-secs", default = "default_interval_secs")]
    pub backup_interval_secs: u64,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            stats_interval_secs: default_interval_secs(),
            backup_interval_secs: default_interval_secs(),
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving downloaded page archives
    #[serde(rename = "archive-dir", default = "default_archive_dir")]
    pub archive_dir: String,

    /// Directory receiving link-list exports
    #[serde(rename = "links-dir", default = "default_links_dir")]
    pub links_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            archive_dir: default_archive_dir(),
            links_dir: default_links_dir(),
        }
    }
}

impl Config {
    /// Builds a configuration for `base_url` with every other setting at its default
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            crawl: CrawlConfig {
                base_url: base_url.into(),
                exclude_keywords: Vec::new(),
                include_keywords: Vec::new(),
                verbose: false,
            },
            frontier: FrontierConfig::default(),
            workers: WorkerConfig::default(),
            reporting: ReportingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

fn default_endpoint() -> String {
    ".".to_string()
}

fn default_max_workers() -> usize {
    100
}

fn default_max_idle_connections() -> usize {
    100
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_pool_refresh_rounds() -> u64 {
    100
}

fn default_interval_secs() -> u64 {
    5
}

fn default_archive_dir() -> String {
    "downloaded".to_string()
}

fn default_links_dir() -> String {
    ".".to_string()
}
