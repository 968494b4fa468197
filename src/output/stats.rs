//! Statistics generation from the discovery ledger
//!
//! This module provides functionality for extracting and displaying
//! ledger statistics from the storage layer.

use crate::state::UrlKind;
use crate::storage::{Ledger, PageTextStore};
use crate::SiftError;
use std::collections::BTreeMap;

/// Ledger statistics summary
#[derive(Debug, Clone, Default)]
pub struct DiscoveryStatistics {
    /// Total number of recorded URLs
    pub total_urls: u64,

    /// Count of records by kind
    pub urls_by_kind: BTreeMap<UrlKind, u64>,

    /// Records at level 0, i.e. listed directly by a seed
    pub first_level: u64,

    /// Page count at each level
    pub page_levels: BTreeMap<u32, u64>,

    /// Sitemap count at each level
    pub sitemap_levels: BTreeMap<u32, u64>,

    /// Pages with retrieved text
    pub pages_with_text: u64,
}

impl DiscoveryStatistics {
    pub fn count(&self, kind: UrlKind) -> u64 {
        self.urls_by_kind.get(&kind).copied().unwrap_or(0)
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(DiscoveryStatistics)` - Successfully loaded statistics
/// * `Err(SiftError)` - Failed to query statistics
pub fn load_statistics<S: Ledger + PageTextStore>(
    storage: &S,
) -> Result<DiscoveryStatistics, SiftError> {
    let total_urls = storage.count_total()?;

    let mut urls_by_kind = BTreeMap::new();
    for kind in UrlKind::all_kinds() {
        urls_by_kind.insert(kind, storage.count_by_kind(kind)?);
    }

    Ok(DiscoveryStatistics {
        total_urls,
        urls_by_kind,
        first_level: storage.count_by_level_prefix(1)?,
        page_levels: storage.level_breakdown(UrlKind::Page)?,
        sitemap_levels: storage.level_breakdown(UrlKind::Sitemap)?,
        pages_with_text: storage.count_page_texts()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &DiscoveryStatistics) {
    println!("=== Discovery Statistics ===\n");

    println!("Overview:");
    println!("  Total URLs recorded: {}", stats.total_urls);
    println!("  Pages: {}", stats.count(UrlKind::Page));
    println!("  Sitemaps: {}", stats.count(UrlKind::Sitemap));
    println!("  Listed directly by a seed: {}", stats.first_level);
    println!();

    print_levels("Pages by Level:", &stats.page_levels, stats.count(UrlKind::Page));
    print_levels(
        "Sitemaps by Level:",
        &stats.sitemap_levels,
        stats.count(UrlKind::Sitemap),
    );

    let pages = stats.count(UrlKind::Page);
    let coverage = if pages > 0 {
        (stats.pages_with_text as f64 / pages as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Retrieval Coverage: {:.1}% ({} / {} pages with text)",
        coverage, stats.pages_with_text, pages
    );
}

fn print_levels(title: &str, levels: &BTreeMap<u32, u64>, total: u64) {
    if levels.is_empty() {
        return;
    }

    println!("{}", title);
    for (level, count) in levels {
        let percentage = if total > 0 {
            (*count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  Level {}: {} ({:.1}%)", level, count, percentage);
    }
    println!();
}
