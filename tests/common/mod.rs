//! Common test utilities for imagery-dl integration tests

use imagery_dl::{Config, Event};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config writing into `dir` with every source pointed at `server`
pub fn mock_config(server: &MockServer, dir: &TempDir) -> Config {
    let uri = server.uri();
    let mut config = Config::default();

    config.assets.image_dir = dir.path().join("images");
    config.assets.exclusion_file = dir.path().join("excluded.txt");
    config.assets.failure_report = dir.path().join("out/failed_items.txt");

    config.fetch.request_timeout = Duration::from_secs(5);
    config.fetch.retry.max_attempts = 0;

    config.sources.direct_base = format!("{uri}/direct");
    config.sources.iscar_catalog = format!("{uri}/SM/getCatalogImage.aspx");
    config.sources.guhring_images = format!("{uri}/guhring");
    config.sources.yg1_base = format!("{uri}/yg1");
    config.sources.search_base = format!("{uri}/search");
    config.sources.mitsubishi_base = format!("{uri}/mmus");
    config.sources.helical_base = format!("{uri}/helical");
    config.sources.msc_suggest = format!("{uri}/msc/suggest");
    config.sources.msc_images = format!("{uri}/msc/images");
    config
}

/// Serve a small image body at `at`
pub async fn mount_image(server: &MockServer, at: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\xff\xd8\xff\xe0jpeg".to_vec()))
        .mount(server)
        .await;
}

/// Drain every event already in the channel
pub fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Sorted file names in `dir`
pub fn file_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}
