//! Vendor product pages parsed for an image reference
//!
//! These sources depend on third-party markup (CSS class names) that can change
//! without notice. When that happens they fail with [`StrategyError::Parse`]
//! for every identifier of the brand, which shows up in the debug log as a
//! run of `kind=parse` failures for the same source.

use super::{Strategy, first_attr, first_text, resolve_url, with_query};
use crate::error::StrategyError;
use crate::fetch::ImageFetcher;
use crate::types::Identifier;
use async_trait::async_trait;

/// YG-1 item detail page
///
/// `GET {base}/feature/itemdetail.asp?edpno={part}`; the image is the `img`
/// inside `td.item_pic`. Items without a photo show a `noimage` placeholder.
pub struct Yg1Page {
    fetcher: ImageFetcher,
    base: String,
}

impl Yg1Page {
    /// Source reading pages from the site at `base`
    pub fn new(fetcher: ImageFetcher, base: impl Into<String>) -> Self {
        Self {
            fetcher,
            base: base.into(),
        }
    }
}

#[async_trait]
impl Strategy for Yg1Page {
    fn name(&self) -> &'static str {
        "yg1_page"
    }

    async fn try_fetch(&self, id: &Identifier) -> Result<(), StrategyError> {
        let page = with_query(
            &format!("{}/feature/itemdetail.asp", self.base.trim_end_matches('/')),
            &[("edpno", id.part_number())],
        )?;
        let body = self.fetcher.get_text(&page, &[]).await?;

        let src = first_attr(&body, "td.item_pic img", "src")
            .map_err(|e| StrategyError::parse(&page, e))?
            .ok_or_else(|| StrategyError::parse(&page, "no td.item_pic img"))?;
        if src.contains("noimage") {
            return Err(StrategyError::NotFound(format!("placeholder image on {}", page)));
        }

        let image = resolve_url(&self.base, &src)?;
        self.fetcher.save_image(&id.brand_part_name(), &image).await?;
        Ok(())
    }
}

/// Mitsubishi product page found through a site-restricted web search
///
/// The vendor site has no usable search, so the first result of
/// `site:mitsubishicarbide.net/mmus/ EDP {part}` is taken as the product page.
/// The page must confirm the part number in its `span.edp` field before its
/// `div.columnProImg` image is accepted.
pub struct MitsubishiSearch {
    fetcher: ImageFetcher,
    search_base: String,
    site_base: String,
}

impl MitsubishiSearch {
    /// Source searching with `search_base` and resolving images against `site_base`
    pub fn new(
        fetcher: ImageFetcher,
        search_base: impl Into<String>,
        site_base: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            search_base: search_base.into(),
            site_base: site_base.into(),
        }
    }
}

/// Value after the first `:` of an `"EDP No.: 123"` label
fn edp_value(label: &str) -> Option<&str> {
    label.split(':').nth(1).map(str::trim)
}

#[async_trait]
impl Strategy for MitsubishiSearch {
    fn name(&self) -> &'static str {
        "mitsubishi_search"
    }

    async fn try_fetch(&self, id: &Identifier) -> Result<(), StrategyError> {
        let part = id.part_number();
        let query = format!("site:mitsubishicarbide.net/mmus/ EDP {}", part);
        let search = with_query(&self.search_base, &[("q", query.as_str())])?;
        let results = self.fetcher.get_text(&search, &[]).await?;

        let href = first_attr(&results, "div.g a[href]", "href")
            .map_err(|e| StrategyError::parse(&search, e))?
            .ok_or_else(|| StrategyError::NotFound(format!("no search results for {}", part)))?;
        let product_page = resolve_url(&self.search_base, &href)?;

        let body = self.fetcher.get_text(&product_page, &[]).await?;
        let label = first_text(&body, "span.edp")
            .map_err(|e| StrategyError::parse(&product_page, e))?
            .ok_or_else(|| StrategyError::parse(&product_page, "no span.edp"))?;
        let src = first_attr(&body, "div.columnProImg img", "src")
            .map_err(|e| StrategyError::parse(&product_page, e))?
            .ok_or_else(|| StrategyError::parse(&product_page, "no div.columnProImg img"))?;

        match edp_value(&label) {
            Some(edp) if edp == part => {}
            other => {
                return Err(StrategyError::NotFound(format!(
                    "product page {} is for EDP {:?}, not {}",
                    product_page, other, part
                )));
            }
        }

        let image = resolve_url(&self.site_base, &src)?;
        self.fetcher.save_image(&id.brand_part_name(), &image).await?;
        Ok(())
    }
}

/// Helical tool detail page
///
/// `GET {base}/products/tool-details-{part}`; the image is the `img` inside
/// `div.main-image-wrapper`.
pub struct HelicalPage {
    fetcher: ImageFetcher,
    base: String,
}

impl HelicalPage {
    /// Source reading pages from the site at `base`
    pub fn new(fetcher: ImageFetcher, base: impl Into<String>) -> Self {
        Self {
            fetcher,
            base: base.into(),
        }
    }
}

#[async_trait]
impl Strategy for HelicalPage {
    fn name(&self) -> &'static str {
        "helical_page"
    }

    async fn try_fetch(&self, id: &Identifier) -> Result<(), StrategyError> {
        let page = format!(
            "{}/products/tool-details-{}",
            self.base.trim_end_matches('/'),
            urlencoding::encode(id.part_number())
        );
        let body = self.fetcher.get_text(&page, &[]).await?;

        let src = first_attr(&body, "div.main-image-wrapper img", "src")
            .map_err(|e| StrategyError::parse(&page, e))?
            .ok_or_else(|| StrategyError::parse(&page, "no div.main-image-wrapper img"))?;

        let image = resolve_url(&self.base, &src)?;
        self.fetcher.save_image(&id.brand_part_name(), &image).await?;
        Ok(())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::test_fetcher;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/html; charset=utf-8")
            .set_body_string(format!("<html><body>{}</body></html>", body))
    }

    async fn mount_image(server: &MockServer, at: &str) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpg".to_vec()))
            .mount(server)
            .await;
    }

    #[test]
    fn edp_value_takes_text_after_colon() {
        assert_eq!(edp_value("EDP No.: MV1234 "), Some("MV1234"));
        assert_eq!(edp_value("no colon"), None);
    }

    #[tokio::test]
    async fn yg1_saves_item_picture_under_brand_part_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feature/itemdetail.asp"))
            .and(query_param("edpno", "EMB77010"))
            .respond_with(html(
                r#"<table><tr><td class="item_pic"><img src="/upload/EMB77010.jpg"></td></tr></table>"#,
            ))
            .mount(&server)
            .await;
        mount_image(&server, "/upload/EMB77010.jpg").await;

        let dir = tempdir().unwrap();
        let source = Yg1Page::new(test_fetcher(dir.path()), server.uri());

        assert!(source.attempt(&Identifier::from("YG1-EMB77010")).await);
        assert!(dir.path().join("YG1 EMB77010.jpg").exists());
    }

    #[tokio::test]
    async fn yg1_placeholder_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feature/itemdetail.asp"))
            .respond_with(html(
                r#"<table><tr><td class="item_pic"><img src="/images/noimage.gif"></td></tr></table>"#,
            ))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let source = Yg1Page::new(test_fetcher(dir.path()), server.uri());

        let err = source
            .try_fetch(&Identifier::from("YG1 EMB1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn yg1_changed_markup_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(html(r#"<div class="product-photo"><img src="/a.jpg"></div>"#))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let source = Yg1Page::new(test_fetcher(dir.path()), server.uri());

        let err = source
            .try_fetch(&Identifier::from("YG1 EMB1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[tokio::test]
    async fn mitsubishi_follows_first_result_and_checks_edp() {
        let server = MockServer::start().await;
        let product = format!("{}/mmus/en/product/MV1234", server.uri());
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "site:mitsubishicarbide.net/mmus/ EDP MV1234"))
            .respond_with(html(&format!(
                r#"<div class="g"><a href="{}">Result</a></div><div class="g"><a href="/other">Other</a></div>"#,
                product
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/mmus/en/product/MV1234"))
            .respond_with(html(
                r#"<span class="edp">EDP No.: MV1234</span>
                   <div class="columnProImg"><img src="/mmus/img/MV1234.png"></div>"#,
            ))
            .mount(&server)
            .await;
        mount_image(&server, "/mmus/img/MV1234.png").await;

        let dir = tempdir().unwrap();
        let source = MitsubishiSearch::new(
            test_fetcher(dir.path()),
            format!("{}/search", server.uri()),
            server.uri(),
        );

        assert!(source.attempt(&Identifier::from("MIT MV1234")).await);
        assert!(dir.path().join("MIT MV1234.jpg").exists());
    }

    #[tokio::test]
    async fn mitsubishi_rejects_page_for_other_edp() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(html(r#"<div class="g"><a href="/product/X">Result</a></div>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/product/X"))
            .respond_with(html(
                r#"<span class="edp">EDP No.: MV9999</span>
                   <div class="columnProImg"><img src="/img/X.png"></div>"#,
            ))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let source = MitsubishiSearch::new(
            test_fetcher(dir.path()),
            format!("{}/search", server.uri()),
            server.uri(),
        );

        let err = source
            .try_fetch(&Identifier::from("MIT MV1234"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn mitsubishi_without_results_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(html("<p>No results</p>"))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let source = MitsubishiSearch::new(
            test_fetcher(dir.path()),
            format!("{}/search", server.uri()),
            server.uri(),
        );

        let err = source
            .try_fetch(&Identifier::from("MIT MV1234"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn helical_saves_main_image() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/tool-details-33362"))
            .respond_with(html(&format!(
                r#"<div class="main-image-wrapper"><img src="{}/cdn/33362.jpg"></div>"#,
                server.uri()
            )))
            .mount(&server)
            .await;
        mount_image(&server, "/cdn/33362.jpg").await;

        let dir = tempdir().unwrap();
        let source = HelicalPage::new(test_fetcher(dir.path()), server.uri());

        assert!(source.attempt(&Identifier::from("HEL 33362")).await);
        assert!(dir.path().join("HEL 33362.jpg").exists());
    }

    #[tokio::test]
    async fn helical_missing_page_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let source = HelicalPage::new(test_fetcher(dir.path()), server.uri());
        assert!(!source.attempt(&Identifier::from("HEL 1")).await);
    }
}
