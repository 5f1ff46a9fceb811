//! Asset inventory: which catalog items still need an image
//!
//! [`compute_worklist`] is the pure core. [`existing_asset_ids`] and
//! [`load_exclusions`] turn the image directory and the exclusion list into the
//! identifier sets it consumes.

use crate::error::Result;
use crate::types::Identifier;
use crate::utils::{PARTIAL_EXTENSION, strip_extension};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use tracing::{debug, warn};

/// Items in the catalog that have no image and are not excluded
///
/// `catalog − existing − excluded`. Pure and idempotent.
pub fn compute_worklist(
    catalog: &HashSet<Identifier>,
    existing: &HashSet<Identifier>,
    excluded: &HashSet<Identifier>,
) -> BTreeSet<Identifier> {
    catalog
        .iter()
        .filter(|id| !existing.contains(*id) && !excluded.contains(*id))
        .cloned()
        .collect()
}

/// Identifiers that already have an image in `dir`
///
/// Every regular file counts, whatever its extension: `"ISC 5602455.jpg"`
/// yields `"ISC 5602455"`. Leftover `.part` files from an interrupted run are
/// ignored so the item is fetched again.
pub async fn existing_asset_ids(dir: &Path) -> Result<HashSet<Identifier>> {
    let mut ids = HashSet::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            warn!(file = ?name, "skipping non UTF-8 file name in image directory");
            continue;
        };
        if Path::new(name).extension().and_then(|e| e.to_str()) == Some(PARTIAL_EXTENSION) {
            continue;
        }
        ids.insert(Identifier::new(strip_extension(name)));
    }

    debug!(dir = %dir.display(), count = ids.len(), "scanned image directory");
    Ok(ids)
}

/// Load the exclusion list: one identifier per line, surrounding whitespace
/// trimmed, blank lines ignored
///
/// A missing file is treated as an empty list.
pub async fn load_exclusions(path: &Path) -> Result<HashSet<Identifier>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "exclusion list not found, nothing excluded");
            return Ok(HashSet::new());
        }
        Err(e) => return Err(e.into()),
    };

    Ok(parse_id_lines(&content))
}

/// Parse a newline-separated identifier list
pub fn parse_id_lines(content: &str) -> HashSet<Identifier> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Identifier::from)
        .collect()
}
