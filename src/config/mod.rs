//! Configuration module for Sumi-Sift
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_sift::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sift.toml")).unwrap();
//! println!("Seeds resolve against: {}", config.discovery.base_url);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, DiscoveryConfig, OutputConfig, RetrievalConfig, UserAgentConfig};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
