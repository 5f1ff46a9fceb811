//! Collector for identifiers no source could resolve

use crate::error::Result;
use crate::types::Identifier;
use crate::utils::write_atomic;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Append-only list of unresolved identifiers, safe to share between workers
#[derive(Debug, Default)]
pub struct FailureLedger {
    entries: Mutex<Vec<Identifier>>,
}

impl FailureLedger {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an unresolved identifier
    pub fn append(&self, id: Identifier) {
        self.lock().push(id);
    }

    /// Number of recorded identifiers
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// `true` when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sorted copy of the recorded identifiers
    pub fn snapshot(&self) -> BTreeSet<Identifier> {
        self.lock().iter().cloned().collect()
    }

    /// Consume the ledger, returning its entries sorted
    pub fn into_sorted(self) -> Vec<Identifier> {
        let mut entries = self
            .entries
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.sort();
        entries
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Identifier>> {
        // A worker that panicked while pushing cannot leave the Vec half-written
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Write the failure report: one identifier per line, sorted
///
/// Parent directories are created as needed and the file is replaced
/// atomically, so readers never see a truncated report.
pub async fn write_report<'a, I>(ids: I, path: &Path) -> Result<()>
where
    I: IntoIterator<Item = &'a Identifier>,
{
    let sorted: BTreeSet<&Identifier> = ids.into_iter().collect();

    let mut content = String::new();
    for id in &sorted {
        content.push_str(id.as_str());
        content.push('\n');
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    write_atomic(path, content.as_bytes()).await?;

    info!(path = %path.display(), count = sorted.len(), "wrote failure report");
    Ok(())
}
