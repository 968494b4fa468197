//! Discovery coordinator - sitemap traversal and run orchestration
//!
//! This module contains the traversal loop that expands sitemap trees of
//! arbitrary depth, including:
//! - Scheduling sitemaps exactly once per run (cycle guard)
//! - Fetching sitemaps concurrently with a per-fetch timeout
//! - Recording every child in the ledger exactly once
//! - Replaying branches that an earlier run already expanded
//! - Handling cancellation and returning partial results
//!
//! The `Coordinator` wraps a traversal in a run record backed by SQLite.

use crate::config::{Config, DiscoveryConfig};
use crate::crawler::fetcher::{FetchError, FetchResponse, Fetcher, HttpFetcher};
use crate::crawler::parser::parse_sitemap;
use crate::retrieval::{retrieve_pages, RetrievalReport};
use crate::state::{DiscoveredUrl, TraversalState, UrlKind};
use crate::storage::{
    InsertOutcome, Ledger, RunStatus, RunStore, SqliteStorage, StorageError,
};
use crate::url::{classify, seeds_from_config};
use crate::SiftError;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Tuning knobs for one traversal
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Maximum number of sitemap fetches in flight
    pub max_concurrent_fetches: usize,

    /// Per-fetch timeout
    pub fetch_timeout: Duration,

    /// Deepest level at which children are still recorded
    pub max_depth: Option<u32>,

    /// Run stamped on every ledger record
    pub run_id: i64,
}

impl EngineOptions {
    /// Builds options from the discovery section of the configuration
    pub fn from_config(config: &DiscoveryConfig, run_id: i64) -> Self {
        Self {
            max_concurrent_fetches: config.max_concurrent_fetches.max(1) as usize,
            fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
            max_depth: config.max_depth,
            run_id,
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
            fetch_timeout: Duration::from_secs(30),
            max_depth: None,
            run_id: 0,
        }
    }
}

/// Counters accumulated during one traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Sitemaps fetched successfully
    pub sitemaps_fetched: u64,

    /// Sitemap fetches abandoned (non-2xx, transport failure, timeout)
    pub failed_fetches: u64,

    /// Ledger inserts that created a record
    pub inserted: u64,

    /// Ledger inserts that found an existing record
    pub duplicates: u64,

    /// Sitemaps rebuilt from the ledger instead of fetched
    pub replayed: u64,
}

/// Result of one traversal
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Every page observed in this run, sorted
    pub pages: Vec<String>,

    /// Every sitemap expanded or replayed in this run, sorted
    pub sitemaps_visited: Vec<String>,

    pub stats: TraversalStats,

    /// True if the traversal stopped early on cancellation
    pub cancelled: bool,
}

type FetchOutput = (String, u32, Result<FetchResponse, FetchError>);

/// Expands seed sitemaps into the full set of declared pages
///
/// All ledger writes and all updates to the per-run state happen in the
/// controller loop of `discover`, one at a time. Only fetches run
/// concurrently.
pub struct TraversalEngine<'a, F: Fetcher + 'static, L: Ledger> {
    fetcher: Arc<F>,
    ledger: &'a mut L,
    options: EngineOptions,
    cancel: CancellationToken,
}

impl<'a, F: Fetcher + 'static, L: Ledger> TraversalEngine<'a, F, L> {
    /// Creates an engine over an already opened ledger
    pub fn new(fetcher: Arc<F>, ledger: &'a mut L, options: EngineOptions) -> Self {
        Self {
            fetcher,
            ledger,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses the given token to stop the traversal early
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs the traversal from the given seed sitemaps
    ///
    /// Seeds are expanded at level 0. Failing branches are logged and
    /// counted; only ledger failures abort the traversal.
    ///
    /// # Returns
    ///
    /// * `Ok(DiscoveryReport)` - Pages and sitemaps seen, possibly partial
    ///   if cancelled
    /// * `Err(SiftError)` - The ledger could not be read or written
    pub async fn discover(&mut self, seeds: &[String]) -> Result<DiscoveryReport, SiftError> {
        let mut state = TraversalState::new();
        let mut stats = TraversalStats::default();
        let mut pending: VecDeque<(String, u32)> = VecDeque::new();
        let mut in_flight: JoinSet<FetchOutput> = JoinSet::new();
        let mut cancelled = false;
        let start_time = Instant::now();

        for seed in seeds {
            self.schedule(&mut state, &mut pending, seed, 0);
        }

        tracing::info!("Starting discovery from {} seed sitemap(s)", pending.len());

        loop {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            while in_flight.len() < self.options.max_concurrent_fetches {
                match pending.pop_front() {
                    Some((url, level)) => self.spawn_fetch(&mut in_flight, url, level),
                    None => break,
                }
            }

            if in_flight.is_empty() {
                break;
            }

            let joined = tokio::select! {
                _ = self.cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                joined = in_flight.join_next() => joined,
            };

            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok((url, level, result)) => {
                    self.expand(&mut state, &mut pending, &mut stats, &url, level, result)?;
                }
                Err(e) => {
                    tracing::warn!("Sitemap fetch task failed: {}", e);
                    stats.failed_fetches += 1;
                }
            }

            let done = stats.sitemaps_fetched + stats.failed_fetches;
            if done > 0 && done % 10 == 0 {
                tracing::info!(
                    "Progress: {} sitemaps done, {} queued, {} pages, {:.2} sitemaps/sec",
                    done,
                    pending.len() + in_flight.len(),
                    state.collected_pages.len(),
                    done as f64 / start_time.elapsed().as_secs_f64()
                );
            }
        }

        if cancelled {
            tracing::warn!(
                "Discovery cancelled with {} fetch(es) in flight and {} queued",
                in_flight.len(),
                pending.len()
            );
            in_flight.abort_all();
        }

        let (pages, sitemaps) = state.into_parts();
        let mut pages: Vec<String> = pages.into_iter().collect();
        let mut sitemaps_visited: Vec<String> = sitemaps.into_iter().collect();
        pages.sort();
        sitemaps_visited.sort();

        tracing::info!(
            "Discovery {}: {} pages from {} sitemaps ({} new records, {} duplicates, {} failed fetches) in {:?}",
            if cancelled { "cancelled" } else { "completed" },
            pages.len(),
            sitemaps_visited.len(),
            stats.inserted,
            stats.duplicates,
            stats.failed_fetches,
            start_time.elapsed()
        );

        Ok(DiscoveryReport {
            pages,
            sitemaps_visited,
            stats,
            cancelled,
        })
    }

    /// Marks a sitemap visited and queues it, unless already visited or
    /// past the depth limit
    fn schedule(
        &self,
        state: &mut TraversalState,
        pending: &mut VecDeque<(String, u32)>,
        url: &str,
        level: u32,
    ) {
        if let Some(max_depth) = self.options.max_depth {
            if level > max_depth {
                tracing::debug!("Not expanding {}: beyond max depth {}", url, max_depth);
                return;
            }
        }

        if state.mark_visited(url) {
            pending.push_back((url.to_string(), level));
        } else {
            tracing::trace!("Sitemap {} already visited", url);
        }
    }

    fn spawn_fetch(&self, in_flight: &mut JoinSet<FetchOutput>, url: String, level: u32) {
        let fetcher = Arc::clone(&self.fetcher);
        let timeout = self.options.fetch_timeout;

        tracing::debug!("Fetching sitemap {} (children at level {})", url, level);

        in_flight.spawn(async move {
            let result = match tokio::time::timeout(timeout, fetcher.fetch(&url, timeout)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout { url: url.clone() }),
            };
            (url, level, result)
        });
    }

    /// Records the children of a fetched sitemap
    fn expand(
        &mut self,
        state: &mut TraversalState,
        pending: &mut VecDeque<(String, u32)>,
        stats: &mut TraversalStats,
        url: &str,
        level: u32,
        result: Result<FetchResponse, FetchError>,
    ) -> Result<(), SiftError> {
        let response = match result {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                tracing::warn!("Sitemap {} returned HTTP {}", url, response.status_code);
                stats.failed_fetches += 1;
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("{}", e);
                stats.failed_fetches += 1;
                return Ok(());
            }
        };

        stats.sitemaps_fetched += 1;

        let children = parse_sitemap(&response.body);
        tracing::debug!("Sitemap {} lists {} entries", url, children.len());

        for child in &children {
            let kind = classify(child);
            let record = DiscoveredUrl::new(child.as_str(), kind, level, Some(url), self.options.run_id);
            let outcome = self.ledger.insert(&record)?;

            match outcome {
                InsertOutcome::Inserted => stats.inserted += 1,
                InsertOutcome::AlreadyExists => {
                    tracing::trace!("Already recorded: {}", child);
                    stats.duplicates += 1;
                }
            }

            match (kind, outcome) {
                (UrlKind::Page, _) => state.collect_page(child),
                (UrlKind::Sitemap, InsertOutcome::Inserted) => {
                    self.schedule(state, pending, child, level + 1)
                }
                (UrlKind::Sitemap, InsertOutcome::AlreadyExists) => {
                    self.resume_known(state, pending, stats, child)?
                }
            }
        }

        self.ledger
            .record_expansion(url, self.options.run_id, &children)?;

        Ok(())
    }

    /// Handles a sitemap the ledger already knows about
    ///
    /// Expanded branches are rebuilt from the ledger without fetching.
    /// Branches an earlier run recorded but never expanded are queued at
    /// the level their record implies.
    fn resume_known(
        &mut self,
        state: &mut TraversalState,
        pending: &mut VecDeque<(String, u32)>,
        stats: &mut TraversalStats,
        url: &str,
    ) -> Result<(), SiftError> {
        let mut stack = vec![url.to_string()];

        while let Some(sitemap) = stack.pop() {
            if state.is_visited(&sitemap) {
                continue;
            }

            if self.ledger.is_expanded(&sitemap)? {
                state.mark_visited(&sitemap);
                stats.replayed += 1;
                tracing::debug!("Replaying {} from the ledger", sitemap);

                for child in self.ledger.children_of(&sitemap)? {
                    match child.kind {
                        UrlKind::Page => state.collect_page(&child.url),
                        UrlKind::Sitemap => stack.push(child.url),
                    }
                }
            } else {
                let record = self.ledger.get(&sitemap)?.ok_or_else(|| {
                    StorageError::CorruptRecord {
                        url: sitemap.clone(),
                        message: "record missing after duplicate insert".to_string(),
                    }
                })?;
                self.schedule(state, pending, &sitemap, record.level + 1);
            }
        }

        Ok(())
    }
}

/// Main discovery coordinator structure
///
/// Owns the storage handle and the HTTP fetcher for one run.
pub struct Coordinator {
    config: Config,
    storage: SqliteStorage,
    fetcher: Arc<HttpFetcher>,
    seeds: Vec<String>,
    run_id: i64,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Opens the ledger, builds the HTTP client and starts a run record.
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `config_hash` - Hash of the configuration file, stored on the run
    pub fn new(config: Config, config_hash: &str) -> Result<Self, SiftError> {
        let seeds = seeds_from_config(&config.discovery)?;
        let fetcher = Arc::new(HttpFetcher::from_config(&config.user_agent)?);

        let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

        if let Some(previous) = storage.get_latest_run()? {
            if previous.status != RunStatus::Completed {
                tracing::info!(
                    "Previous run {} ended as {}; expanded branches will be replayed",
                    previous.id,
                    previous.status.to_db_string()
                );
            }
        }

        let run_id = storage.create_run(config_hash)?;
        tracing::info!("Starting run {}", run_id);

        Ok(Self {
            config,
            storage,
            fetcher,
            seeds,
            run_id,
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Runs the traversal and finishes the run record
    ///
    /// The run ends as `completed`, `interrupted` (cancelled) or `failed`
    /// (ledger error).
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<DiscoveryReport, SiftError> {
        let options = EngineOptions::from_config(&self.config.discovery, self.run_id);

        let result = {
            let mut engine = TraversalEngine::new(Arc::clone(&self.fetcher), &mut self.storage, options)
                .with_cancel_token(cancel);
            engine.discover(&self.seeds).await
        };

        match result {
            Ok(report) => {
                let status = if report.cancelled {
                    RunStatus::Interrupted
                } else {
                    RunStatus::Completed
                };
                self.storage.finish_run(self.run_id, status)?;
                Ok(report)
            }
            Err(e) => {
                if let Err(mark_err) = self.storage.finish_run(self.run_id, RunStatus::Failed) {
                    tracing::error!("Could not mark run {} as failed: {}", self.run_id, mark_err);
                }
                Err(e)
            }
        }
    }

    /// Retrieves and stores the text of discovered pages
    pub async fn retrieve(
        &mut self,
        pages: &[String],
        cancel: CancellationToken,
    ) -> Result<RetrievalReport, SiftError> {
        retrieve_pages(
            Arc::clone(&self.fetcher),
            &mut self.storage,
            pages,
            &self.config.retrieval,
            Duration::from_millis(self.config.discovery.fetch_timeout_ms),
            cancel,
        )
        .await
    }
}

/// Runs a complete discovery operation
///
/// # Example
///
/// ```no_run
/// use sumi_sift::config::load_config_with_hash;
/// use sumi_sift::crawler::run_discovery;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let report = run_discovery(config, &hash, CancellationToken::new()).await?;
/// println!("{} pages", report.pages.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_discovery(
    config: Config,
    config_hash: &str,
    cancel: CancellationToken,
) -> Result<DiscoveryReport, SiftError> {
    let mut coordinator = Coordinator::new(config, config_hash)?;
    coordinator.run(cancel).await
}
