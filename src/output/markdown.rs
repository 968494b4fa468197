//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of discovery
//! results: run metadata, ledger totals, the sitemap tree split and the
//! level breakdown.

use crate::output::traits::{DiscoverySummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Sitemaps listed per section before the rest are elided
const MAX_LISTED_SITEMAPS: usize = 50;

/// Generates a markdown summary file
///
/// # Arguments
///
/// * `summary` - The discovery summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(
    summary: &DiscoverySummary,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a discovery summary as markdown
pub fn format_markdown_summary(summary: &DiscoverySummary) -> String {
    let mut md = String::new();

    md.push_str("# Sumi-Sift Discovery Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", summary.run_id));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Ledger totals
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Total URLs**: {}\n", summary.total_urls));
    md.push_str(&format!("- **Pages**: {}\n", summary.total_pages));
    md.push_str(&format!("- **Sitemaps**: {}\n", summary.total_sitemaps));
    if let Some(max_level) = summary.max_level() {
        md.push_str(&format!("- **Deepest Level**: {}\n", max_level));
    }
    md.push_str(&format!(
        "- **Pages With Text**: {} ({:.2}%)\n\n",
        summary.pages_with_text,
        summary.retrieval_coverage()
    ));

    // Level breakdown
    if summary.max_level().is_some() {
        md.push_str("## Level Breakdown\n\n");
        md.push_str("| Level | Sitemaps | Pages |\n");
        md.push_str("|-------|----------|-------|\n");

        let mut levels: Vec<u32> = summary
            .sitemap_levels
            .keys()
            .chain(summary.page_levels.keys())
            .copied()
            .collect();
        levels.sort_unstable();
        levels.dedup();

        for level in levels {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                level,
                summary.sitemap_levels.get(&level).copied().unwrap_or(0),
                summary.page_levels.get(&level).copied().unwrap_or(0)
            ));
        }
        md.push('\n');
    }

    push_sitemap_list(&mut md, "First-Level Sitemaps", &summary.first_level_sitemaps);
    push_sitemap_list(&mut md, "Nested Sitemaps", &summary.nested_sitemaps);

    md
}

fn push_sitemap_list(md: &mut String, title: &str, sitemaps: &[String]) {
    if sitemaps.is_empty() {
        return;
    }

    md.push_str(&format!("## {}\n\n", title));
    md.push_str(&format!("Total: {}\n\n", sitemaps.len()));
    for url in sitemaps.iter().take(MAX_LISTED_SITEMAPS) {
        md.push_str(&format!("- {}\n", url));
    }
    if sitemaps.len() > MAX_LISTED_SITEMAPS {
        md.push_str(&format!(
            "\n... and {} more\n\n",
            sitemaps.len() - MAX_LISTED_SITEMAPS
        ));
    } else {
        md.push('\n');
    }
}
