use serde::Deserialize;

/// Main configuration structure for Lemma-Search
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub morphology: MorphologyConfig,
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of fetch workers; derived from available parallelism when absent
    #[serde(rename = "fetch-workers", default)]
    pub fetch_workers: Option<usize>,

    /// Timeout for a single HTTP fetch (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Wall-clock budget for crawling one site (seconds)
    #[serde(rename = "site-time-budget-secs", default = "default_site_budget")]
    pub site_time_budget_secs: u64,

    /// Maximum number of staged pages the loader drains at once
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Batches smaller than this relax the fetch delay
    #[serde(rename = "comfortable-batch-size", default = "default_comfortable_batch")]
    pub comfortable_batch_size: usize,

    /// Fetch delay a crawl session starts with (milliseconds)
    #[serde(rename = "initial-fetch-delay-ms", default = "default_initial_delay")]
    pub initial_fetch_delay_ms: u64,

    /// Lower bound for the fetch delay (milliseconds)
    #[serde(rename = "min-fetch-delay-ms", default = "default_min_delay")]
    pub min_fetch_delay_ms: u64,

    #[serde(rename = "delay-increase-step-ms", default = "default_increase_step")]
    pub delay_increase_step_ms: u64,

    #[serde(rename = "delay-decrease-step-ms", default = "default_decrease_step")]
    pub delay_decrease_step_ms: u64,

    /// Loader sleep when the staging buffer is empty (milliseconds)
    #[serde(rename = "loader-idle-backoff-ms", default = "default_idle_backoff")]
    pub loader_idle_backoff_ms: u64,

    /// How often the supervisor checks for completion (milliseconds)
    #[serde(rename = "supervisor-poll-interval-ms", default = "default_poll_interval")]
    pub supervisor_poll_interval_ms: u64,

    /// How long to wait for workers to acknowledge cancellation (milliseconds)
    #[serde(rename = "shutdown-grace-ms", default = "default_grace")]
    pub shutdown_grace_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            fetch_workers: None,
            request_timeout_secs: default_request_timeout(),
            site_time_budget_secs: default_site_budget(),
            batch_size: default_batch_size(),
            comfortable_batch_size: default_comfortable_batch(),
            initial_fetch_delay_ms: default_initial_delay(),
            min_fetch_delay_ms: default_min_delay(),
            delay_increase_step_ms: default_increase_step(),
            delay_decrease_step_ms: default_decrease_step(),
            loader_idle_backoff_ms: default_idle_backoff(),
            supervisor_poll_interval_ms: default_poll_interval(),
            shutdown_grace_ms: default_grace(),
        }
    }
}

/// User agent rotation configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserAgentConfig {
    /// Agents to rotate through; the built-in list is used when empty
    #[serde(default)]
    pub agents: Vec<String>,
}

/// Search tunables
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Lemmas whose site frequency exceeds this are ignored when ranking
    #[serde(rename = "word-rank-limit", default = "default_word_rank_limit")]
    pub word_rank_limit: u32,

    /// Characters kept on each side of a highlighted match
    #[serde(rename = "snippet-interval", default = "default_snippet_interval")]
    pub snippet_interval: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            word_rank_limit: default_word_rank_limit(),
            snippet_interval: default_snippet_interval(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Morphology configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MorphologyConfig {
    /// OpenCorpora dictionary dump or a tab-separated `form  lemma  TAG` file;
    /// validation rejects a config without one
    #[serde(rename = "dictionary-path", default)]
    pub dictionary_path: Option<String>,
}

/// A site to crawl and search
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Root URL of the site (e.g., "https://lenta.ru")
    pub url: String,

    /// Human-readable site name shown in search results
    pub name: String,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_site_budget() -> u64 {
    40 * 60
}

fn default_batch_size() -> usize {
    200
}

fn default_comfortable_batch() -> usize {
    50
}

fn default_initial_delay() -> u64 {
    400
}

fn default_min_delay() -> u64 {
    200
}

fn default_increase_step() -> u64 {
    300
}

fn default_decrease_step() -> u64 {
    100
}

fn default_idle_backoff() -> u64 {
    5000
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_grace() -> u64 {
    5000
}

fn default_word_rank_limit() -> u32 {
    100
}

fn default_snippet_interval() -> usize {
    100
}
