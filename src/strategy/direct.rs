//! Direct guess on the shared image host

use super::Strategy;
use crate::error::StrategyError;
use crate::fetch::ImageFetcher;
use crate::types::Identifier;
use async_trait::async_trait;

/// `GET {base}/{identifier}.jpg`, saved under the identifier
///
/// Cheapest and most reliable source, so it is always tried first.
pub struct DirectGuess {
    fetcher: ImageFetcher,
    base: String,
}

impl DirectGuess {
    /// Source reading from the image host at `base`
    pub fn new(fetcher: ImageFetcher, base: impl Into<String>) -> Self {
        Self {
            fetcher,
            base: base.into(),
        }
    }

    fn image_url(&self, id: &Identifier) -> String {
        format!(
            "{}/{}.jpg",
            self.base.trim_end_matches('/'),
            urlencoding::encode(id.as_str())
        )
    }
}

#[async_trait]
impl Strategy for DirectGuess {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn try_fetch(&self, id: &Identifier) -> Result<(), StrategyError> {
        let url = self.image_url(id);
        self.fetcher.save_image(id.as_str(), &url).await?;
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
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn url_escapes_identifier() {
        let dir = tempdir().unwrap();
        let source = DirectGuess::new(test_fetcher(dir.path()), "https://img.test/");
        assert_eq!(
            source.image_url(&Identifier::from("YG1 EDP#12")),
            "https://img.test/YG1%20EDP%2312.jpg"
        );
    }

    #[tokio::test]
    async fn fetches_image_named_after_identifier() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ISC%205602455.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let source = DirectGuess::new(test_fetcher(dir.path()), server.uri());

        assert!(source.attempt(&Identifier::from("ISC 5602455")).await);
        assert!(dir.path().join("ISC 5602455.jpg").exists());
    }

    #[tokio::test]
    async fn missing_image_is_a_plain_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let source = DirectGuess::new(test_fetcher(dir.path()), server.uri());

        assert!(!source.attempt(&Identifier::from("ISC 1")).await);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
