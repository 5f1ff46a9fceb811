//! Vendor catalog images addressed directly by part number

use super::{Strategy, with_query};
use crate::error::StrategyError;
use crate::fetch::ImageFetcher;
use crate::types::Identifier;
use async_trait::async_trait;

/// Catalog image endpoint taking the part number and a company code
///
/// `GET {endpoint}?Cat={part}&Comp={company}`. Iscar serves both its own
/// brand (`IS`) and Tungaloy (`TL`) from the same endpoint.
pub struct CatalogImage {
    fetcher: ImageFetcher,
    endpoint: String,
    company: &'static str,
}

impl CatalogImage {
    /// Source for the given company code
    pub fn new(fetcher: ImageFetcher, endpoint: impl Into<String>, company: &'static str) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
            company,
        }
    }
}

#[async_trait]
impl Strategy for CatalogImage {
    fn name(&self) -> &'static str {
        "catalog_image"
    }

    async fn try_fetch(&self, id: &Identifier) -> Result<(), StrategyError> {
        let url = with_query(
            &self.endpoint,
            &[("Cat", id.part_number()), ("Comp", self.company)],
        )?;
        self.fetcher.save_image(id.as_str(), &url).await?;
        Ok(())
    }
}

/// One image per tool family: `GET {base}/{family}.jpg`
///
/// The family is the part number up to its first `-`
/// (`"5510-3.000"` → `"5510"`), so many identifiers share one remote image.
/// Each identifier still gets its own local copy.
pub struct FamilyImage {
    fetcher: ImageFetcher,
    base: String,
}

impl FamilyImage {
    /// Source reading family images below `base`
    pub fn new(fetcher: ImageFetcher, base: impl Into<String>) -> Self {
        Self {
            fetcher,
            base: base.into(),
        }
    }
}

/// Family code of a part number
pub fn family_code(part_number: &str) -> &str {
    part_number.split('-').next().unwrap_or(part_number)
}

#[async_trait]
impl Strategy for FamilyImage {
    fn name(&self) -> &'static str {
        "family_image"
    }

    async fn try_fetch(&self, id: &Identifier) -> Result<(), StrategyError> {
        let family = family_code(id.part_number());
        if family.is_empty() {
            return Err(StrategyError::NotFound(format!(
                "no family code in part number '{}'",
                id.part_number()
            )));
        }

        let url = format!(
            "{}/{}.jpg",
            self.base.trim_end_matches('/'),
            urlencoding::encode(family)
        );
        self.fetcher.save_image(id.as_str(), &url).await?;
        Ok(())
    }
}
