//! Configuration types for imagery-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Local directories and files the pipeline reads and writes
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Directory holding one image per catalog item (default: "./images")
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,

    /// Plain-text list of identifiers to never fetch, one per line (default: "excluded.txt")
    #[serde(default = "default_exclusion_file")]
    pub exclusion_file: PathBuf,

    /// Where the identifiers that no source could resolve are written (default: "failed_items.txt")
    #[serde(default = "default_failure_report")]
    pub failure_report: PathBuf,

    /// Extension given to downloaded images, without the dot (default: "jpg")
    #[serde(default = "default_image_extension")]
    pub image_extension: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            exclusion_file: default_exclusion_file(),
            failure_report: default_failure_report(),
            image_extension: default_image_extension(),
        }
    }
}

/// HTTP client and worker pool settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Number of identifiers resolved concurrently (default: 10)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Upper bound on every single HTTP request (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent sent with every request
    ///
    /// Several vendor sites reject requests that do not look like a browser,
    /// so this defaults to a desktop Chrome string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Retry policy for transient failures of a single request
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            retry: RetryConfig::default(),
        }
    }
}

/// Retry configuration for transient request failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt (default: 1)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 10 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Base URLs of every image source
///
/// These are third-party endpoints outside our control. They are configurable
/// so a moved site can be followed without a rebuild (and so tests can point
/// them at a local mock server).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceEndpoints {
    /// Image host tried first for every identifier: `{direct_base}/{identifier}.jpg`
    #[serde(default = "default_direct_base")]
    pub direct_base: String,

    /// Iscar catalog image endpoint (brands ISC and TUN)
    #[serde(default = "default_iscar_catalog")]
    pub iscar_catalog: String,

    /// Guhring tool family image directory (brand GUH)
    #[serde(default = "default_guhring_images")]
    pub guhring_images: String,

    /// YG-1 site root (brand YG1)
    #[serde(default = "default_yg1_base")]
    pub yg1_base: String,

    /// Web search endpoint used to find Mitsubishi product pages
    #[serde(default = "default_search_base")]
    pub search_base: String,

    /// Mitsubishi site root, used to resolve relative image paths (brand MIT)
    #[serde(default = "default_mitsubishi_base")]
    pub mitsubishi_base: String,

    /// Helical site root (brand HEL)
    #[serde(default = "default_helical_base")]
    pub helical_base: String,

    /// MSC autocomplete endpoint used as the last-resort search
    #[serde(default = "default_msc_suggest")]
    pub msc_suggest: String,

    /// MSC product image CDN prefix
    #[serde(default = "default_msc_images")]
    pub msc_images: String,

    /// Value of the `brUid` header the MSC suggestion endpoint expects
    #[serde(default = "default_msc_client_uid")]
    pub msc_client_uid: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            direct_base: default_direct_base(),
            iscar_catalog: default_iscar_catalog(),
            guhring_images: default_guhring_images(),
            yg1_base: default_yg1_base(),
            search_base: default_search_base(),
            mitsubishi_base: default_mitsubishi_base(),
            helical_base: default_helical_base(),
            msc_suggest: default_msc_suggest(),
            msc_images: default_msc_images(),
            msc_client_uid: default_msc_client_uid(),
        }
    }
}

impl SourceEndpoints {
    fn urls(&self) -> [(&'static str, &str); 9] {
        [
            ("sources.direct_base", &self.direct_base),
            ("sources.iscar_catalog", &self.iscar_catalog),
            ("sources.guhring_images", &self.guhring_images),
            ("sources.yg1_base", &self.yg1_base),
            ("sources.search_base", &self.search_base),
            ("sources.mitsubishi_base", &self.mitsubishi_base),
            ("sources.helical_base", &self.helical_base),
            ("sources.msc_suggest", &self.msc_suggest),
            ("sources.msc_images", &self.msc_images),
        ]
    }
}

/// Catalog store settings
///
/// The catalog is the set of identifiers present in both the staging table and
/// the master table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// SQLite database holding the item tables (None = caller supplies identifiers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Staging table name (default: "staging_item_master")
    #[serde(default = "default_staging_table")]
    pub staging_table: String,

    /// Identifier column of the staging table (default: "item_number")
    #[serde(default = "default_staging_column")]
    pub staging_column: String,

    /// Master table name (default: "item_master")
    #[serde(default = "default_master_table")]
    pub master_table: String,

    /// Identifier column of the master table (default: "item_code")
    #[serde(default = "default_master_column")]
    pub master_column: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            staging_table: default_staging_table(),
            staging_column: default_staging_column(),
            master_table: default_master_table(),
            master_column: default_master_column(),
        }
    }
}

/// Main configuration for [`ImageHarvester`](crate::ImageHarvester)
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Local directories and report files
    #[serde(default)]
    pub assets: AssetConfig,

    /// HTTP client and concurrency settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Image source endpoints
    #[serde(default)]
    pub sources: SourceEndpoints,

    /// Catalog store
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config {
            message: format!("invalid config file: {}", e),
            key: None,
        })
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the rest of the crate relies on
    pub fn validate(&self) -> Result<()> {
        if self.fetch.concurrency == 0 {
            return Err(Error::config(
                "fetch.concurrency",
                "concurrency must be at least 1",
            ));
        }
        if self.fetch.request_timeout.is_zero() {
            return Err(Error::config(
                "fetch.request_timeout",
                "request timeout must be greater than zero",
            ));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(Error::config("fetch.user_agent", "user agent is empty"));
        }

        let ext = &self.assets.image_extension;
        if ext.is_empty() || ext.contains('.') || ext.contains('/') {
            return Err(Error::config(
                "assets.image_extension",
                format!("invalid image extension '{}'", ext),
            ));
        }

        for (key, value) in self.sources.urls() {
            url::Url::parse(value).map_err(|e| {
                Error::config(key, format!("invalid URL '{}': {}", value, e))
            })?;
        }

        // Table and column names are interpolated into the catalog query
        for (key, value) in [
            ("catalog.staging_table", &self.catalog.staging_table),
            ("catalog.staging_column", &self.catalog.staging_column),
            ("catalog.master_table", &self.catalog.master_table),
            ("catalog.master_column", &self.catalog.master_column),
        ] {
            if !is_sql_identifier(value) {
                return Err(Error::config(
                    key,
                    format!("'{}' is not a plain SQL identifier", value),
                ));
            }
        }

        Ok(())
    }
}

fn is_sql_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("./images")
}

fn default_exclusion_file() -> PathBuf {
    PathBuf::from("excluded.txt")
}

fn default_failure_report() -> PathBuf {
    PathBuf::from("failed_items.txt")
}

fn default_image_extension() -> String {
    "jpg".into()
}

fn default_concurrency() -> usize {
    10
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/58.0.3029.110 Safari/537.36"
        .into()
}

fn default_max_attempts() -> u32 {
    1
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_direct_base() -> String {
    "https://zuwzc.brnind.com".into()
}

fn default_iscar_catalog() -> String {
    "http://www.iscar.com/SM/getCatalogImage.aspx".into()
}

fn default_guhring_images() -> String {
    "https://www.guhring.com/App/GuhringUSA_files/ToolImages".into()
}

fn default_yg1_base() -> String {
    "https://www.yg1usa.com".into()
}

fn default_search_base() -> String {
    "https://www.google.com/search".into()
}

fn default_mitsubishi_base() -> String {
    "https://www.mitsubishicarbide.net".into()
}

fn default_helical_base() -> String {
    "https://www.helicaltool.com".into()
}

fn default_msc_suggest() -> String {
    "https://www.mscdirect.com/search/suggestions/beta".into()
}

fn default_msc_images() -> String {
    "https://cdn.mscdirect.com/global/images/ProductImages".into()
}

fn default_msc_client_uid() -> String {
    "uid=4797467037409:v=12.0:ts=1653171470053:hc=1006".into()
}

fn default_staging_table() -> String {
    "staging_item_master".into()
}

fn default_staging_column() -> String {
    "item_number".into()
}

fn default_master_table() -> String {
    "item_master".into()
}

fn default_master_column() -> String {
    "item_code".into()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
