//! Distributor autocomplete search, the last source tried for every item
//!
//! The suggestion endpoint answers with product suggestions for a search term.
//! A suggestion is accepted when its alternate part number equals our part
//! number, or contains both the part number and the brand token. The loose
//! second rule can pick a neighbouring product; it is kept because it recovers
//! many images the exact rule misses.

use super::{Strategy, with_query};
use crate::error::StrategyError;
use crate::fetch::ImageFetcher;
use crate::types::Identifier;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionResponse {
    #[serde(default)]
    search_suggestion: Option<Vec<Suggestion>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Suggestion {
    #[serde(default)]
    alternate_part_number: Option<String>,
    #[serde(default)]
    image_info: Option<ImageInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageInfo {
    #[serde(default)]
    large_image_link: Option<String>,
}

/// Whether a suggested alternate part number refers to our item
///
/// Without a brand only the exact rule applies.
///
/// ```
/// use imagery_dl::strategy::catalog_search::matches_part;
///
/// assert!(matches_part("EMB77010", "EMB77010", Some("YG1")));
/// assert!(matches_part("YG1 EMB77010", "EMB77010", Some("YG1")));
/// assert!(!matches_part("EMB77010-X", "EMB77010", Some("YG1")));
/// assert!(!matches_part("EMB77010-X", "EMB77010", None));
/// ```
pub fn matches_part(alternate: &str, part: &str, brand: Option<&str>) -> bool {
    if alternate == part {
        return true;
    }
    match brand {
        Some(brand) => alternate.contains(part) && alternate.contains(brand),
        None => false,
    }
}

/// Distributor suggestion search (MSC)
pub struct CatalogSearch {
    fetcher: ImageFetcher,
    suggest_endpoint: String,
    image_base: String,
    client_uid: String,
}

impl CatalogSearch {
    /// Source querying `suggest_endpoint` and downloading images below `image_base`
    pub fn new(
        fetcher: ImageFetcher,
        suggest_endpoint: impl Into<String>,
        image_base: impl Into<String>,
        client_uid: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            suggest_endpoint: suggest_endpoint.into(),
            image_base: image_base.into(),
            client_uid: client_uid.into(),
        }
    }
}

#[async_trait]
impl Strategy for CatalogSearch {
    fn name(&self) -> &'static str {
        "catalog_search"
    }

    async fn try_fetch(&self, id: &Identifier) -> Result<(), StrategyError> {
        let part = id.part_number();
        let brand = id.brand();

        let url = with_query(&self.suggest_endpoint, &[("searchterm", part)])?;
        let response: SuggestionResponse = self
            .fetcher
            .get_json(&url, &[("brUid", self.client_uid.as_str())])
            .await?;

        // The first matching suggestion decides, even if it has no image
        let matched = response
            .search_suggestion
            .unwrap_or_default()
            .into_iter()
            .find(|s| {
                s.alternate_part_number
                    .as_deref()
                    .is_some_and(|alt| matches_part(alt, part, brand))
            })
            .ok_or_else(|| StrategyError::NotFound(format!("no suggestion matches {}", part)))?;

        let link = matched
            .image_info
            .and_then(|info| info.large_image_link)
            .filter(|link| !link.is_empty())
            .ok_or_else(|| {
                StrategyError::NotFound(format!("matching suggestion for {} has no image", part))
            })?;

        let image = format!(
            "{}/{}",
            self.image_base.trim_end_matches('/'),
            link.trim_start_matches('/')
        );
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
    use serde_json::json;
    use tempfile::tempdir;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer, dir: &std::path::Path) -> CatalogSearch {
        CatalogSearch::new(
            test_fetcher(dir),
            format!("{}/search/suggestions/beta", server.uri()),
            format!("{}/ProductImages", server.uri()),
            "uid=test",
        )
    }

    async fn mount_suggestions(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/search/suggestions/beta"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn loose_rule_requires_brand_token() {
        assert!(matches_part("HEL 33362 END MILL", "33362", Some("HEL")));
        assert!(!matches_part("33362-B", "33362", Some("HEL")));
        assert!(!matches_part("HEL 3336", "33362", Some("HEL")));
    }

    #[tokio::test]
    async fn exact_match_downloads_large_image() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/suggestions/beta"))
            .and(query_param("searchterm", "EMB77010"))
            .and(header("brUid", "uid=test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "searchSuggestion": [
                    {"alternatePartNumber": "EMB7701", "imageInfo": {"largeImageLink": "wrong.jpg"}},
                    {"alternatePartNumber": "EMB77010", "imageInfo": {"largeImageLink": "abc/EMB77010.jpg"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ProductImages/abc/EMB77010.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpg".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        assert!(
            source(&server, dir.path())
                .attempt(&Identifier::from("YG1 EMB77010"))
                .await
        );
        assert!(dir.path().join("YG1 EMB77010.jpg").exists());
    }

    #[tokio::test]
    async fn suggestions_without_part_number_are_skipped() {
        let server = MockServer::start().await;
        mount_suggestions(
            &server,
            json!({
                "searchSuggestion": [
                    {"imageInfo": {"largeImageLink": "none.jpg"}},
                    {"alternatePartNumber": "HEL 33362", "imageInfo": {"largeImageLink": "h.jpg"}}
                ]
            }),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/ProductImages/h.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpg".to_vec()))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        assert!(
            source(&server, dir.path())
                .attempt(&Identifier::from("HEL 33362"))
                .await
        );
    }

    #[tokio::test]
    async fn first_match_without_image_ends_search() {
        let server = MockServer::start().await;
        mount_suggestions(
            &server,
            json!({
                "searchSuggestion": [
                    {"alternatePartNumber": "EMB77010", "imageInfo": {"largeImageLink": ""}},
                    {"alternatePartNumber": "EMB77010", "imageInfo": {"largeImageLink": "later.jpg"}}
                ]
            }),
        )
        .await;

        let dir = tempdir().unwrap();
        let err = source(&server, dir.path())
            .try_fetch(&Identifier::from("YG1 EMB77010"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn no_suggestions_is_not_found() {
        let server = MockServer::start().await;
        mount_suggestions(&server, json!({"searchSuggestion": null})).await;

        let dir = tempdir().unwrap();
        let err = source(&server, dir.path())
            .try_fetch(&Identifier::from("YG1 EMB77010"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn bot_wall_html_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Access denied</html>"))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let err = source(&server, dir.path())
            .try_fetch(&Identifier::from("YG1 EMB77010"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[tokio::test]
    async fn malformed_identifier_searches_whole_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("searchterm", "AB"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "searchSuggestion": [
                    {"alternatePartNumber": "AB", "imageInfo": {"largeImageLink": "ab.jpg"}}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ProductImages/ab.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpg".to_vec()))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        assert!(source(&server, dir.path()).attempt(&Identifier::from("AB")).await);
        assert!(dir.path().join("AB.jpg").exists());
    }
}
