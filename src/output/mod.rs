//! Output module for generating discovery summaries and reports
//!
//! This module handles:
//! - Generating markdown summaries of discovery results
//! - Printing ledger statistics to the console

mod markdown;
pub mod stats;
mod traits;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{load_statistics, print_statistics, DiscoveryStatistics};
pub use traits::{DiscoverySummary, OutputError, OutputResult};

use crate::state::UrlKind;
use crate::storage::{Ledger, PageTextStore, RunStore};
use crate::SiftError;

/// Generates a discovery summary from storage
///
/// # Arguments
///
/// * `storage` - The storage backend containing discovery data
///
/// # Returns
///
/// * `Ok(DiscoverySummary)` - Successfully generated summary
/// * `Err(SiftError)` - Failed to generate summary
pub fn generate_summary<S>(storage: &S) -> Result<DiscoverySummary, SiftError>
where
    S: Ledger + RunStore + PageTextStore,
{
    let run = storage.get_latest_run()?.ok_or(OutputError::NoRuns)?;

    let duration_seconds = match (
        chrono::DateTime::parse_from_rfc3339(&run.started_at),
        run.finished_at
            .as_deref()
            .map(chrono::DateTime::parse_from_rfc3339),
    ) {
        (Ok(started), Some(Ok(finished))) => Some((finished - started).num_seconds().max(0) as u64),
        _ => None,
    };

    let stats = stats::load_statistics(storage)?;

    let (first_level_sitemaps, nested_sitemaps) = storage
        .urls_by_kind(UrlKind::Sitemap)?
        .into_iter()
        .partition::<Vec<_>, _>(|record| record.level == 0);

    Ok(DiscoverySummary {
        run_id: run.id,
        started_at: run.started_at,
        finished_at: run.finished_at,
        duration_seconds,
        status: run.status.to_db_string().to_string(),
        config_hash: run.config_hash,
        total_urls: stats.total_urls,
        total_pages: stats.count(UrlKind::Page),
        total_sitemaps: stats.count(UrlKind::Sitemap),
        pages_with_text: stats.pages_with_text,
        first_level_sitemaps: first_level_sitemaps.into_iter().map(|r| r.url).collect(),
        nested_sitemaps: nested_sitemaps.into_iter().map(|r| r.url).collect(),
        page_levels: stats.page_levels,
        sitemap_levels: stats.sitemap_levels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DiscoveredUrl;
    use crate::storage::{RunStatus, SqliteStorage};

    #[test]
    fn test_generate_summary_requires_run() {
        let storage = SqliteStorage::new_in_memory().unwrap();

        assert!(matches!(
            generate_summary(&storage),
            Err(SiftError::Output(OutputError::NoRuns))
        ));
    }

    #[test]
    fn test_generate_summary_splits_sitemaps() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("hash").unwrap();
        let seed = Some("http://x/sitemap.xml");

        for record in [
            DiscoveredUrl::new("http://x/posts.xml", UrlKind::Sitemap, 0, seed, run_id),
            DiscoveredUrl::new(
                "http://x/posts-2024.xml",
                UrlKind::Sitemap,
                1,
                Some("http://x/posts.xml"),
                run_id,
            ),
            DiscoveredUrl::new(
                "http://x/p/1",
                UrlKind::Page,
                2,
                Some("http://x/posts-2024.xml"),
                run_id,
            ),
        ] {
            storage.insert(&record).unwrap();
        }
        storage.finish_run(run_id, RunStatus::Completed).unwrap();

        let summary = generate_summary(&storage).unwrap();

        assert_eq!(summary.run_id, run_id);
        assert_eq!(summary.status, "completed");
        assert_eq!(summary.total_urls, 3);
        assert_eq!(summary.total_pages, 1);
        assert_eq!(summary.first_level_sitemaps, vec!["http://x/posts.xml"]);
        assert_eq!(summary.nested_sitemaps, vec!["http://x/posts-2024.xml"]);
        assert_eq!(summary.max_level(), Some(2));
        assert!(summary.duration_seconds.is_some());
    }
}
