//! Image sources
//!
//! Every source implements [`Strategy`]. Internally a source reports a
//! structured [`StrategyError`]; the only thing the rest of the crate ever sees
//! is the boolean from [`Strategy::attempt`].
//!
//! ## Submodules
//!
//! - [`direct`] — guess the image URL on the shared image host
//! - [`catalog_image`] — vendor catalog URLs built from the part number (ISC, TUN, GUH)
//! - [`scrape`] — vendor product pages parsed for an image reference (YG1, MIT, HEL)
//! - [`catalog_search`] — distributor autocomplete search, the last resort
//! - [`registry`] — brand prefix → vendor source lookup table

use crate::error::StrategyError;
use crate::types::Identifier;
use async_trait::async_trait;
use tracing::debug;

pub mod catalog_image;
pub mod catalog_search;
pub mod direct;
pub mod registry;
pub mod scrape;

pub use catalog_image::{CatalogImage, FamilyImage};
pub use catalog_search::CatalogSearch;
pub use direct::DirectGuess;
pub use registry::VendorRegistry;
pub use scrape::{HelicalPage, MitsubishiSearch, Yg1Page};

/// One way of obtaining an image for an identifier
///
/// On success the image has been written to the image directory. On failure
/// nothing is left on disk.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Short stable name used in logs and events
    fn name(&self) -> &'static str;

    /// Try to fetch and store an image, reporting why it failed
    async fn try_fetch(&self, id: &Identifier) -> Result<(), StrategyError>;

    /// Try to fetch and store an image
    ///
    /// Never fails: every error is logged with its kind and collapsed to `false`.
    async fn attempt(&self, id: &Identifier) -> bool {
        match self.try_fetch(id).await {
            Ok(()) => true,
            Err(e) => {
                debug!(
                    identifier = %id,
                    strategy = self.name(),
                    kind = e.kind(),
                    error = %e,
                    "source failed"
                );
                false
            }
        }
    }
}

/// Extract the `attr` attribute of the first element matching `css`
///
/// Parsing happens synchronously and the document is dropped before returning,
/// which keeps the (non-`Send`) HTML tree out of any future.
pub(crate) fn first_attr(html: &str, css: &str, attr: &str) -> Result<Option<String>, String> {
    let selector = scraper::Selector::parse(css).map_err(|e| format!("bad selector {css}: {e}"))?;
    let doc = scraper::Html::parse_document(html);
    Ok(doc
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string))
}

/// Concatenated text of the first element matching `css`
pub(crate) fn first_text(html: &str, css: &str) -> Result<Option<String>, String> {
    let selector = scraper::Selector::parse(css).map_err(|e| format!("bad selector {css}: {e}"))?;
    let doc = scraper::Html::parse_document(html);
    Ok(doc
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>()))
}

/// Resolve a possibly relative reference against a site root
pub(crate) fn resolve_url(base: &str, reference: &str) -> Result<String, StrategyError> {
    let base_url = url::Url::parse(base)
        .map_err(|e| StrategyError::parse(base, format!("invalid base URL: {}", e)))?;
    base_url
        .join(reference)
        .map(String::from)
        .map_err(|e| StrategyError::parse(base, format!("invalid reference '{}': {}", reference, e)))
}

/// Append query parameters to an endpoint
pub(crate) fn with_query(endpoint: &str, params: &[(&str, &str)]) -> Result<String, StrategyError> {
    url::Url::parse_with_params(endpoint, params)
        .map(String::from)
        .map_err(|e| StrategyError::parse(endpoint, format!("invalid endpoint: {}", e)))
}
