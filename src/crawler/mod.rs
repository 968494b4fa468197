//! Crawler module for sitemap discovery
//!
//! This module contains the core discovery logic, including:
//! - HTTP fetching behind the `Fetcher` capability
//! - Sitemap parsing with a fallback for malformed XML
//! - The traversal engine that expands nested sitemaps
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod parser;

pub use coordinator::{
    run_discovery, Coordinator, DiscoveryReport, EngineOptions, TraversalEngine, TraversalStats,
};
pub use fetcher::{
    build_http_client, user_agent_string, FetchError, FetchResponse, Fetcher, HttpFetcher,
};
pub use parser::parse_sitemap;
