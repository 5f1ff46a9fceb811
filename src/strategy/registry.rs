//! Brand prefix → vendor source lookup table

use super::{
    CatalogImage, FamilyImage, HelicalPage, MitsubishiSearch, Strategy, Yg1Page,
};
use crate::config::SourceEndpoints;
use crate::fetch::ImageFetcher;
use std::collections::HashMap;
use std::sync::Arc;

/// Vendor-specific sources keyed by brand prefix
///
/// Brands without an entry simply have no vendor source. Supporting a new
/// vendor is a matter of registering one more entry.
#[derive(Clone, Default)]
pub struct VendorRegistry {
    vendors: HashMap<String, Arc<dyn Strategy>>,
}

impl VendorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every vendor source this crate ships
    pub fn standard(fetcher: &ImageFetcher, endpoints: &SourceEndpoints) -> Self {
        let mut registry = Self::new();
        registry
            .register(
                "ISC",
                Arc::new(CatalogImage::new(
                    fetcher.clone(),
                    &endpoints.iscar_catalog,
                    "IS",
                )),
            )
            .register(
                "TUN",
                Arc::new(CatalogImage::new(
                    fetcher.clone(),
                    &endpoints.iscar_catalog,
                    "TL",
                )),
            )
            .register(
                "GUH",
                Arc::new(FamilyImage::new(fetcher.clone(), &endpoints.guhring_images)),
            )
            .register(
                "YG1",
                Arc::new(Yg1Page::new(fetcher.clone(), &endpoints.yg1_base)),
            )
            .register(
                "MIT",
                Arc::new(MitsubishiSearch::new(
                    fetcher.clone(),
                    &endpoints.search_base,
                    &endpoints.mitsubishi_base,
                )),
            )
            .register(
                "HEL",
                Arc::new(HelicalPage::new(fetcher.clone(), &endpoints.helical_base)),
            );
        registry
    }

    /// Add or replace the source for `brand`
    pub fn register(&mut self, brand: impl Into<String>, source: Arc<dyn Strategy>) -> &mut Self {
        self.vendors.insert(brand.into(), source);
        self
    }

    /// Source for `brand`, if one is registered
    pub fn get(&self, brand: &str) -> Option<Arc<dyn Strategy>> {
        self.vendors.get(brand).cloned()
    }

    /// Registered brands, sorted
    pub fn brands(&self) -> Vec<&str> {
        let mut brands: Vec<&str> = self.vendors.keys().map(String::as_str).collect();
        brands.sort_unstable();
        brands
    }
}

impl std::fmt::Debug for VendorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorRegistry")
            .field("brands", &self.brands())
            .finish()
    }
}
