//! Bounded-concurrency driver running the resolver over a worklist
//!
//! At most `concurrency` identifiers are being resolved at any moment. Each
//! identifier is resolved exactly once; unresolved ones end up in the
//! [`FailureLedger`], which only the executor writes to.

use crate::ledger::FailureLedger;
use crate::resolver::CascadingResolver;
use crate::types::{Event, Identifier, Outcome};
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Number of progress lines logged over a full run
const PROGRESS_LOG_STEPS: usize = 20;

/// Result of [`Executor::run_all`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Identifiers every source failed for
    pub unresolved: BTreeSet<Identifier>,
    /// Number of identifiers that got an image
    pub resolved: usize,
    /// Identifiers never started because the run was cancelled
    pub skipped: usize,
}

enum ItemResult {
    Resolved,
    Unresolved,
    Skipped,
}

/// Runs the cascade for every identifier of a worklist
#[derive(Debug)]
pub struct Executor {
    resolver: Arc<CascadingResolver>,
    concurrency: usize,
    event_tx: Option<broadcast::Sender<Event>>,
    cancel_token: CancellationToken,
}

impl Executor {
    /// Executor with `concurrency` workers (at least one)
    pub fn new(resolver: Arc<CascadingResolver>, concurrency: usize) -> Self {
        Self {
            resolver,
            concurrency: concurrency.max(1),
            event_tx: None,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Publish per-item and progress events on `event_tx`
    pub fn with_events(mut self, event_tx: broadcast::Sender<Event>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Stop starting new items once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Effective worker count
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn emit_event(&self, event: Event) {
        if let Some(tx) = &self.event_tx {
            // send() returns Err if there are no receivers, which is fine - we just drop the event
            tx.send(event).ok();
        }
    }

    /// Resolve every identifier in `worklist`
    pub async fn run_all(&self, worklist: BTreeSet<Identifier>) -> ExecutionReport {
        let total = worklist.len();
        let ledger = FailureLedger::new();
        let completed = AtomicUsize::new(0);
        let log_every = (total / PROGRESS_LOG_STEPS).max(1);

        info!(total, concurrency = self.concurrency, "resolving images");

        let results: Vec<ItemResult> = stream::iter(worklist)
            .map(|id| {
                let ledger = &ledger;
                let completed = &completed;
                async move {
                    if self.cancel_token.is_cancelled() {
                        debug!(identifier = %id, "run cancelled, skipping");
                        return ItemResult::Skipped;
                    }

                    let result = match self.resolver.resolve(&id).await {
                        Outcome::Resolved { source } => {
                            self.emit_event(Event::ItemResolved {
                                id,
                                source: source.to_string(),
                            });
                            ItemResult::Resolved
                        }
                        Outcome::Unresolved => {
                            self.emit_event(Event::ItemUnresolved { id: id.clone() });
                            ledger.append(id);
                            ItemResult::Unresolved
                        }
                    };

                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    self.emit_event(Event::Progress {
                        completed: done,
                        total,
                    });
                    if done % log_every == 0 || done == total {
                        info!(completed = done, total, "progress");
                    }
                    result
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let (mut resolved, mut skipped) = (0, 0);
        for result in &results {
            match result {
                ItemResult::Resolved => resolved += 1,
                ItemResult::Skipped => skipped += 1,
                ItemResult::Unresolved => {}
            }
        }

        let report = ExecutionReport {
            unresolved: ledger.into_sorted().into_iter().collect(),
            resolved,
            skipped,
        };

        if skipped > 0 {
            info!(skipped, "run cancelled before all items were started");
        }
        self.emit_event(Event::RunFinished {
            resolved: report.resolved,
            unresolved: report.unresolved.len(),
            skipped: report.skipped,
        });
        report
    }
}
