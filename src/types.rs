//! Core types for imagery-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of the brand prefix at the start of every identifier
pub const BRAND_PREFIX_LEN: usize = 3;

/// Byte offset where the manufacturer part number starts
///
/// One delimiter character sits between the brand prefix and the part number
/// (`"YG1 EDP12345"`, `"GUH-5510-3.000"`).
pub const PART_NUMBER_OFFSET: usize = 4;

/// Catalog item identifier: a brand prefix, a delimiter, and a part number
///
/// Identifiers are opaque tokens. Anything shorter than [`PART_NUMBER_OFFSET`]
/// still is a valid identifier, it just has no brand and no vendor-specific
/// source will be tried for it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Wrap a raw identifier
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The full identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Brand prefix, or `None` when the identifier is too short to carry one
    ///
    /// ```
    /// use imagery_dl::Identifier;
    ///
    /// assert_eq!(Identifier::new("ISC 5602455").brand(), Some("ISC"));
    /// assert_eq!(Identifier::new("ISC").brand(), None);
    /// ```
    pub fn brand(&self) -> Option<&str> {
        self.split().map(|(brand, _)| brand)
    }

    /// Manufacturer part number
    ///
    /// For identifiers without a brand this is the whole identifier, so generic
    /// searches still have something to look up.
    pub fn part_number(&self) -> &str {
        self.split().map(|(_, part)| part).unwrap_or(&self.0)
    }

    /// `true` when the identifier has a brand prefix and a part number
    pub fn is_well_formed(&self) -> bool {
        self.split().is_some()
    }

    /// Brand and part number joined by a space, used as the file name by
    /// sources that key their images by manufacturer part
    pub fn brand_part_name(&self) -> String {
        match self.split() {
            Some((brand, part)) => format!("{} {}", brand, part),
            None => self.0.clone(),
        }
    }

    fn split(&self) -> Option<(&str, &str)> {
        let brand = self.0.get(..BRAND_PREFIX_LEN)?;
        let part = self.0.get(PART_NUMBER_OFFSET..)?;
        if part.is_empty() {
            return None;
        }
        Some((brand, part))
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Result of running the source cascade for one identifier
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// An image was written to the image directory
    Resolved {
        /// Name of the source that produced it
        source: &'static str,
    },
    /// Every source failed
    Unresolved,
}

impl Outcome {
    /// `true` for [`Outcome::Resolved`]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Outcome::Resolved { .. })
    }
}

/// Event emitted while a run progresses
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Worklist computed, resolution about to start
    RunStarted {
        /// Number of identifiers in the worklist
        total: usize,
    },

    /// An identifier got an image
    ItemResolved {
        /// The identifier
        id: Identifier,
        /// Source that produced the image
        source: String,
    },

    /// No source produced an image for an identifier
    ItemUnresolved {
        /// The identifier
        id: Identifier,
    },

    /// One more identifier finished (either way)
    Progress {
        /// Identifiers finished so far
        completed: usize,
        /// Size of the worklist
        total: usize,
    },

    /// All dispatched identifiers finished
    RunFinished {
        /// Identifiers that got an image
        resolved: usize,
        /// Identifiers left without an image
        unresolved: usize,
        /// Identifiers never started because the run was cancelled
        skipped: usize,
    },
}

/// Summary of a complete run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// Identifiers in the catalog
    pub catalog_items: usize,
    /// Identifiers that already had an image on disk
    pub existing_assets: usize,
    /// Identifiers on the exclusion list
    pub excluded: usize,
    /// Identifiers that needed an image
    pub worklist: usize,
    /// Identifiers that got an image during this run
    pub resolved: usize,
    /// Identifiers no source could resolve, sorted
    pub unresolved: Vec<Identifier>,
    /// Identifiers not attempted because the run was cancelled
    pub skipped: usize,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
}
