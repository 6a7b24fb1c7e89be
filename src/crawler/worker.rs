//! Fetch worker loop
//!
//! Workers claim their share of the frontier, fetch each URL after the
//! throttle delay, stage successful pages for the loader and feed discovered
//! links back into the frontier.

use crate::crawler::{parse_html, sleep_or_cancel, CrawlSession, FetchResult, Fetcher, StagedPage};
use crate::EngineError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Pause while other workers still hold claims that may yield new links
const IN_FLIGHT_POLL: Duration = Duration::from_millis(100);

/// Decrements the session's live worker count however the worker exits
struct WorkerGuard(Arc<CrawlSession>);

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.0.worker_finished();
    }
}

/// Runs one fetch worker until the frontier is drained
///
/// Each pass claims the frontier's unclaimed URLs divided among the workers
/// still running, so the survivors pick up the slack when others exit.
///
/// The caller must have registered the worker with
/// `CrawlSession::worker_started` before spawning it.
///
/// # Errors
///
/// Returns `EngineError::Cancelled` as soon as the token fires, leaving any
/// remaining claimed URLs unfetched.
pub async fn run_fetch_worker(
    worker_id: usize,
    session: Arc<CrawlSession>,
    fetcher: Fetcher,
    cancel: CancellationToken,
) -> Result<(), EngineError> {
    let _guard = WorkerGuard(Arc::clone(&session));
    let mut fetched = 0usize;

    loop {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let batch = session.frontier.claim_share(session.active_workers().max(1));
        if batch.is_empty() {
            if session.frontier.has_in_flight() {
                sleep_or_cancel(IN_FLIGHT_POLL, &cancel).await?;
                continue;
            }
            break;
        }

        for url in batch {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            sleep_or_cancel(session.throttle.delay(), &cancel).await?;

            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(EngineError::Cancelled),
                result = fetcher.fetch(&url) => result,
            };

            if handle_fetch_result(&session, &url, result) {
                fetched += 1;
            }
            session.frontier.mark_loaded(&url);
        }
    }

    tracing::debug!("Worker {} finished after {} pages", worker_id, fetched);
    Ok(())
}

/// Stages a fetched page and queues its links; returns true if staged
fn handle_fetch_result(session: &CrawlSession, url: &str, result: FetchResult) -> bool {
    match result {
        FetchResult::Success {
            final_url,
            status_code,
            body,
        } => {
            let base = match Url::parse(&final_url) {
                Ok(base) => base,
                Err(e) => {
                    tracing::warn!("Unparseable final URL {} for {}: {}", final_url, url, e);
                    return false;
                }
            };
            if !session.scope.contains(&base) {
                tracing::debug!("{} redirected off-site to {}", url, final_url);
                return false;
            }

            let parsed = parse_html(&body, &base, &session.scope);
            session.staging.push(StagedPage {
                url: url.to_string(),
                status_code,
                html: body,
            });

            let discovered = session.frontier.insert_all(parsed.links);
            tracing::trace!("{} yielded {} new links", url, discovered);
            true
        }
        FetchResult::HttpError { status_code } => {
            tracing::warn!("HTTP {} for {}", status_code, url);
            false
        }
        FetchResult::NetworkError { error } => {
            tracing::warn!("Failed to fetch {}: {}", url, error);
            false
        }
        FetchResult::ContentMismatch { content_type } => {
            tracing::debug!("Skipping {} ({})", url, content_type);
            false
        }
    }
}
