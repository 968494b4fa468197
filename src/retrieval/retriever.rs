//! Concurrent page retrieval

use crate::config::RetrievalConfig;
use crate::crawler::{FetchError, FetchResponse, Fetcher};
use crate::retrieval::extract::{extract_text, preview};
use crate::storage::{PageText, PageTextStore};
use crate::SiftError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Counters for one retrieval pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrievalReport {
    /// Pages fetched, cleaned and stored
    pub retrieved: u64,

    /// Pages that failed or answered with a non-200 status
    pub failed: u64,

    /// True if the pass stopped early on cancellation
    pub cancelled: bool,
}

/// Fetches each page, reduces it to text and stores the result
///
/// At most `config.max_concurrent_pages` fetches run at once. A failed page
/// is logged and skipped; only storage failures abort the pass.
pub async fn retrieve_pages<F, S>(
    fetcher: Arc<F>,
    store: &mut S,
    pages: &[String],
    config: &RetrievalConfig,
    timeout: Duration,
    cancel: CancellationToken,
) -> Result<RetrievalReport, SiftError>
where
    F: Fetcher + 'static,
    S: PageTextStore,
{
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_pages.max(1) as usize));
    let mut in_flight: JoinSet<(String, Result<FetchResponse, FetchError>)> = JoinSet::new();
    let mut report = RetrievalReport::default();

    tracing::info!("Retrieving text for {} pages", pages.len());

    for url in pages {
        let fetcher = Arc::clone(&fetcher);
        let semaphore = Arc::clone(&semaphore);
        let url = url.clone();

        in_flight.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    return (
                        url.clone(),
                        Err(FetchError::Other {
                            url,
                            message: e.to_string(),
                        }),
                    )
                }
            };

            let result = match tokio::time::timeout(timeout, fetcher.fetch(&url, timeout)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout { url: url.clone() }),
            };
            (url, result)
        });
    }

    loop {
        let joined = tokio::select! {
            _ = cancel.cancelled() => {
                report.cancelled = true;
                break;
            }
            joined = in_flight.join_next() => joined,
        };

        let Some(joined) = joined else {
            break;
        };

        let (url, result) = match joined {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Page fetch task failed: {}", e);
                report.failed += 1;
                continue;
            }
        };

        let response = match result {
            Ok(response) if response.status_code == 200 => response,
            Ok(response) => {
                tracing::warn!("Failed to retrieve {}: HTTP {}", url, response.status_code);
                report.failed += 1;
                continue;
            }
            Err(e) => {
                tracing::warn!("{}", e);
                report.failed += 1;
                continue;
            }
        };

        let text = extract_text(&response.text());
        tracing::debug!(
            "Retrieved {}:\n{}",
            url,
            preview(&text, config.preview_chars)
        );

        store.save_page_text(&PageText {
            url,
            status_code: response.status_code,
            text,
            fetched_at: Utc::now().to_rfc3339(),
        })?;
        report.retrieved += 1;
    }

    if report.cancelled {
        tracing::warn!("Retrieval cancelled with {} page(s) outstanding", in_flight.len());
        in_flight.abort_all();
    }

    tracing::info!(
        "Retrieval finished: {} stored, {} failed",
        report.retrieved,
        report.failed
    );

    Ok(report)
}
