//! URL handling module for Sumi-Sift
//!
//! This module classifies sitemap locations and builds the seed sitemap URLs
//! a traversal starts from.

mod classify;
mod seeds;

pub use classify::classify;
pub use seeds::{build_seed_urls, seeds_from_config};
