//! # imagery-dl
//!
//! Library for keeping a product image directory in step with a parts catalog.
//!
//! ## Design Philosophy
//!
//! imagery-dl is designed to be:
//! - **Incremental** - Only catalog items without an image are fetched
//! - **Cascading** - Each item tries a cheap direct guess, then a vendor-specific
//!   source, then a distributor search, stopping at the first hit
//! - **Library-first** - The `imagery-dl` binary is a thin wrapper
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use imagery_dl::{Config, ImageHarvester, Identifier};
//! use std::collections::HashSet;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.assets.image_dir = "/srv/catalog/images".into();
//!
//!     let harvester = ImageHarvester::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = harvester.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let catalog: HashSet<Identifier> = ["ISC 5602455", "GUH-5510-3.000"]
//!         .into_iter()
//!         .map(Identifier::from)
//!         .collect();
//!     let summary = harvester.run(catalog).await?;
//!     println!("{} items left without an image", summary.unresolved.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Catalog database access
pub mod db;
/// Error types
pub mod error;
/// Bounded-concurrency worklist execution
pub mod executor;
/// Shared HTTP fetch-and-persist primitive
pub mod fetch;
/// End-to-end pipeline
pub mod harvester;
/// Which catalog items still need an image
pub mod inventory;
/// Unresolved item collection and failure report
pub mod ledger;
/// Per-item source cascade
pub mod resolver;
/// Retry logic with exponential backoff
pub mod retry;
/// Image sources
pub mod strategy;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{AssetConfig, CatalogConfig, Config, FetchConfig, RetryConfig, SourceEndpoints};
pub use db::CatalogDb;
pub use error::{DatabaseError, Error, Result, StrategyError};
pub use executor::{ExecutionReport, Executor};
pub use harvester::ImageHarvester;
pub use inventory::compute_worklist;
pub use ledger::FailureLedger;
pub use resolver::CascadingResolver;
pub use strategy::Strategy;
pub use types::{Event, Identifier, Outcome, RunSummary};

/// Resolve once the process is asked to stop (SIGTERM or SIGINT; Ctrl+C elsewhere)
#[cfg(unix)]
pub(crate) async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => tokio::select! {
            _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
            _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
        },
        (sigterm, sigint) => {
            // Registration can fail in restricted environments (containers, tests)
            tracing::warn!(
                sigterm = sigterm.is_ok(),
                sigint = sigint.is_ok(),
                "Could not register signal handlers, using ctrl_c fallback"
            );
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            }
        }
    }
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        return;
    }
    tracing::info!("Received Ctrl+C signal");
}
