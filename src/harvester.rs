//! End-to-end image harvesting pipeline
//!
//! [`ImageHarvester`] ties the pieces together: inventory of what is missing,
//! the concurrent resolver run, and the failure report.

use crate::config::Config;
use crate::db::CatalogDb;
use crate::error::Result;
use crate::executor::Executor;
use crate::fetch::ImageFetcher;
use crate::inventory::{compute_worklist, existing_asset_ids, load_exclusions};
use crate::ledger::write_report;
use crate::resolver::CascadingResolver;
use crate::types::{Event, Identifier, RunSummary};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Capacity of the event channel; slow subscribers lag instead of blocking workers
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Fetches missing catalog images and reports the ones nobody has
///
/// ```no_run
/// use imagery_dl::{Config, ImageHarvester, Identifier};
/// use std::collections::HashSet;
///
/// # async fn demo() -> imagery_dl::Result<()> {
/// let harvester = ImageHarvester::new(Config::default())?;
///
/// let mut events = harvester.subscribe();
/// tokio::spawn(async move {
///     while let Ok(event) = events.recv().await {
///         println!("{:?}", event);
///     }
/// });
///
/// let catalog: HashSet<Identifier> = ["ISC 5602455", "YG1 EMB77010"]
///     .into_iter()
///     .map(Identifier::from)
///     .collect();
/// let summary = harvester.run(catalog).await?;
/// println!("{} unresolved", summary.unresolved.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ImageHarvester {
    config: Config,
    resolver: Arc<CascadingResolver>,
    event_tx: broadcast::Sender<Event>,
    cancel_token: CancellationToken,
}

impl ImageHarvester {
    /// Validate `config` and build the HTTP client and source chain
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher = ImageFetcher::new(&config.fetch, &config.assets)?;
        let resolver = CascadingResolver::standard(&fetcher, &config.sources);
        Ok(Self::with_resolver(config, resolver))
    }

    /// Harvester using a caller-supplied source chain
    pub fn with_resolver(config: Config, resolver: CascadingResolver) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            resolver: Arc::new(resolver),
            event_tx,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Subscribe to progress events
    ///
    /// Events are dropped when nobody is subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Token that stops the current run from starting new items
    ///
    /// Cancellation is permanent: later runs on this harvester skip every item.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch images for every catalog identifier that lacks one
    ///
    /// Identifiers with an image already on disk, or on the exclusion list, are
    /// left alone. The failure report is rewritten at the end of every run,
    /// including cancelled ones.
    pub async fn run(&self, catalog_ids: HashSet<Identifier>) -> Result<RunSummary> {
        let started_at = Utc::now();
        let assets = &self.config.assets;

        tokio::fs::create_dir_all(&assets.image_dir).await?;
        let existing = existing_asset_ids(&assets.image_dir).await?;
        let excluded = load_exclusions(&assets.exclusion_file).await?;
        let worklist = compute_worklist(&catalog_ids, &existing, &excluded);

        tracing::info!(
            catalog = catalog_ids.len(),
            existing = existing.len(),
            excluded = excluded.len(),
            worklist = worklist.len(),
            "computed worklist"
        );

        self.event_tx
            .send(Event::RunStarted {
                total: worklist.len(),
            })
            .ok();

        let worklist_len = worklist.len();
        let report = Executor::new(Arc::clone(&self.resolver), self.config.fetch.concurrency)
            .with_events(self.event_tx.clone())
            .with_cancellation(self.cancel_token.clone())
            .run_all(worklist)
            .await;

        write_report(&report.unresolved, &assets.failure_report).await?;

        let summary = RunSummary {
            catalog_items: catalog_ids.len(),
            existing_assets: existing.len(),
            excluded: excluded.len(),
            worklist: worklist_len,
            resolved: report.resolved,
            unresolved: report.unresolved.into_iter().collect(),
            skipped: report.skipped,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            resolved = summary.resolved,
            unresolved = summary.unresolved.len(),
            skipped = summary.skipped,
            elapsed_secs = (summary.finished_at - summary.started_at).num_seconds(),
            "run finished"
        );
        Ok(summary)
    }

    /// [`run`](Self::run) over the identifiers held in the catalog database
    pub async fn run_from_catalog(&self, catalog: &CatalogDb) -> Result<RunSummary> {
        let ids = catalog.catalog_item_ids().await?;
        self.run(ids).await
    }

    /// [`run`](Self::run) that stops starting new items on SIGTERM/SIGINT
    ///
    /// Items already in flight finish and the failure report is still written.
    pub async fn run_with_shutdown(&self, catalog_ids: HashSet<Identifier>) -> Result<RunSummary> {
        let token = self.cancel_token.clone();
        let watcher = tokio::spawn(async move {
            crate::wait_for_signal().await;
            tracing::info!("shutdown requested, finishing in-flight items");
            token.cancel();
        });

        let result = self.run(catalog_ids).await;
        watcher.abort();
        result
    }
}
