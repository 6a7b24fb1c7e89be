//! Crawler module for fetching the pages of configured sites
//!
//! This module contains the core crawling logic, including:
//! - The link frontier with atomic batch claims
//! - The staging buffer and adaptive throttle between fetchers and the loader
//! - HTTP fetching and HTML link extraction
//! - Fetch workers and the per-site supervisor

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod session;
mod staging;
mod throttle;
mod worker;

pub use coordinator::{CrawlReport, Coordinator, SiteOutcome, STOPPED_BY_USER, MAIN_PAGE_UNAVAILABLE};
pub use fetcher::{build_http_client, FetchResult, Fetcher, DEFAULT_USER_AGENTS};
pub use frontier::Frontier;
pub use parser::{extract_title, parse_html, ParsedPage};
pub use session::CrawlSession;
pub use staging::{StagedPage, StagingBuffer};
pub use throttle::Throttle;
pub use worker::run_fetch_worker;

use crate::EngineError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleeps for `duration` unless the token fires first
///
/// # Errors
///
/// Returns `EngineError::Cancelled` if cancelled before or during the sleep.
pub(crate) async fn sleep_or_cancel(
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<(), EngineError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(EngineError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
