//! Per-identifier source cascade
//!
//! Sources are tried in a fixed order and the first success wins:
//!
//! 1. the direct guess on the shared image host
//! 2. the vendor source registered for the identifier's brand, if any
//! 3. the distributor catalog search
//!
//! Malformed identifiers have no brand, so step 2 is skipped for them.

use crate::config::SourceEndpoints;
use crate::fetch::ImageFetcher;
use crate::strategy::{CatalogSearch, DirectGuess, Strategy, VendorRegistry};
use crate::types::{Identifier, Outcome};
use std::sync::Arc;
use tracing::{debug, info};

/// Tries each source in turn until one produces an image
#[derive(Clone)]
pub struct CascadingResolver {
    direct: Arc<dyn Strategy>,
    vendors: VendorRegistry,
    fallback: Arc<dyn Strategy>,
}

impl CascadingResolver {
    /// Resolver over explicit sources
    pub fn new(
        direct: Arc<dyn Strategy>,
        vendors: VendorRegistry,
        fallback: Arc<dyn Strategy>,
    ) -> Self {
        Self {
            direct,
            vendors,
            fallback,
        }
    }

    /// Resolver wired to the configured production endpoints
    pub fn standard(fetcher: &ImageFetcher, endpoints: &SourceEndpoints) -> Self {
        let direct = Arc::new(DirectGuess::new(fetcher.clone(), &endpoints.direct_base));
        let fallback = Arc::new(CatalogSearch::new(
            fetcher.clone(),
            &endpoints.msc_suggest,
            &endpoints.msc_images,
            &endpoints.msc_client_uid,
        ));
        Self::new(direct, VendorRegistry::standard(fetcher, endpoints), fallback)
    }

    /// Sources that will be tried for `id`, in order
    pub fn chain(&self, id: &Identifier) -> Vec<Arc<dyn Strategy>> {
        let mut chain = Vec::with_capacity(3);
        chain.push(Arc::clone(&self.direct));
        if let Some(vendor) = id.brand().and_then(|brand| self.vendors.get(brand)) {
            chain.push(vendor);
        }
        chain.push(Arc::clone(&self.fallback));
        chain
    }

    /// Run the cascade for one identifier
    pub async fn resolve(&self, id: &Identifier) -> Outcome {
        for source in self.chain(id) {
            if source.attempt(id).await {
                debug!(identifier = %id, strategy = source.name(), "image resolved");
                return Outcome::Resolved {
                    source: source.name(),
                };
            }
            debug!(identifier = %id, strategy = source.name(), "trying next source");
        }

        info!(identifier = %id, "no source produced an image");
        Outcome::Unresolved
    }
}

impl std::fmt::Debug for CascadingResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadingResolver")
            .field("direct", &self.direct.name())
            .field("vendors", &self.vendors)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}
