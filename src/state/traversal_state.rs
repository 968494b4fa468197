use std::collections::HashSet;

/// Per-run bookkeeping of the sitemap traversal
///
/// The ledger says what was ever recorded; this says what this run has
/// already scheduled and observed. It is owned by one traversal and is
/// never shared across runs.
#[derive(Debug, Default, Clone)]
pub struct TraversalState {
    /// Sitemaps scheduled for expansion (or replayed) in this run
    pub visited_sitemaps: HashSet<String>,

    /// Pages observed in this run, whether or not they were new to the ledger
    pub collected_pages: HashSet<String>,
}

impl TraversalState {
    /// Creates an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a sitemap as visited
    ///
    /// Returns true if this call marked it, false if it was already visited.
    /// This is the single test-and-set guarding against cycles.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        !self.visited_sitemaps.contains(url) && self.visited_sitemaps.insert(url.to_string())
    }

    /// Returns true if the sitemap was already visited in this run
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited_sitemaps.contains(url)
    }

    /// Records an observed page
    pub fn collect_page(&mut self, url: &str) {
        if !self.collected_pages.contains(url) {
            self.collected_pages.insert(url.to_string());
        }
    }

    /// Consumes the state, returning `(pages, sitemaps_visited)`
    pub fn into_parts(self) -> (HashSet<String>, HashSet<String>) {
        (self.collected_pages, self.visited_sitemaps)
    }
}
