//! State module for tracking discovery progress
//!
//! # Components
//!
//! - `UrlKind`: Whether a discovered URL is a sitemap or a content page
//! - `DiscoveredUrl`: The immutable ledger record for one URL
//! - `TraversalState`: One run's visited sitemaps and collected pages

mod traversal_state;
mod url_kind;

pub use traversal_state::TraversalState;
pub use url_kind::{DiscoveredUrl, UrlKind};
