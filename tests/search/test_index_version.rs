// Load-time index version resolution against a fake version endpoint

use std::time::Duration;

use httpmock::prelude::*;
use nixpkgs_search::search::{HttpVersionSource, StaticVersionSource};
use nixpkgs_search::{NixpkgsConfig, NixpkgsEngine, SearchError};

use super::common::test_config;

fn config_for(server: &MockServer) -> NixpkgsConfig {
    NixpkgsConfig {
        base_url: server.url("/backend"),
        version_url: server.url("/VERSION"),
        ..test_config(false)
    }
}

#[tokio::test]
async fn test_engine_resolves_version_once_over_http() {
    let server = MockServer::start();
    let version_mock = server.mock(|when, then| {
        when.method(GET).path("/VERSION");
        then.status(200).body("43\n");
    });

    let config = config_for(&server);
    let engine = NixpkgsEngine::from_config(&config).await.unwrap();

    version_mock.assert_hits(1);
    assert_eq!(engine.index(), "latest-43-nixos-unstable");
    assert_eq!(
        engine.search_url(),
        format!("{}/latest-43-nixos-unstable/_search", server.url("/backend"))
    );
}

#[tokio::test]
async fn test_channel_is_part_of_index() {
    let config = NixpkgsConfig {
        channel: "24.05".to_string(),
        ..test_config(false)
    };

    let engine = NixpkgsEngine::initialize(&config, &StaticVersionSource("42".to_string()))
        .await
        .unwrap();

    assert_eq!(engine.index(), "latest-42-nixos-24.05");
}

#[tokio::test]
async fn test_version_endpoint_failure_is_fatal() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/VERSION");
        then.status(404).body("Not Found");
    });

    let result = NixpkgsEngine::from_config(&config_for(&server)).await;

    match result {
        Err(SearchError::VersionResolution { source_name, reason }) => {
            assert!(source_name.ends_with("/VERSION"));
            assert!(reason.contains("404"));
        }
        Err(other) => panic!("expected VersionResolution, got {:?}", other),
        Ok(_) => panic!("engine must not be created without a version"),
    }
}

#[tokio::test]
async fn test_garbage_version_is_rejected() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/VERSION");
        then.status(200).body("<html>rate limited</html>");
    });

    let result = NixpkgsEngine::from_config(&config_for(&server)).await;
    assert!(matches!(result, Err(SearchError::VersionResolution { .. })));
}

#[tokio::test]
async fn test_empty_version_is_rejected() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/VERSION");
        then.status(200).body("   \n");
    });

    let result = NixpkgsEngine::from_config(&config_for(&server)).await;
    assert!(matches!(result, Err(SearchError::VersionResolution { .. })));
}

#[tokio::test]
async fn test_slow_version_endpoint_times_out() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/VERSION");
        then.status(200).body("42").delay(Duration::from_secs(3));
    });

    let config = NixpkgsConfig {
        version_timeout_ms: 200,
        ..config_for(&server)
    };
    let result = NixpkgsEngine::from_config(&config).await;

    assert!(matches!(result, Err(SearchError::Timeout { timeout_ms: 200 })));
}

#[tokio::test]
async fn test_http_version_source_reports_timeout() {
    use nixpkgs_search::VersionSource;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/VERSION");
        then.status(200).body("42").delay(Duration::from_secs(3));
    });

    let source =
        HttpVersionSource::new(server.url("/VERSION"), Duration::from_millis(150)).unwrap();

    assert!(matches!(
        source.fetch().await,
        Err(SearchError::Timeout { timeout_ms: 150 })
    ));
}

#[tokio::test]
async fn test_explicit_index_needs_no_version_endpoint() {
    let server = MockServer::start();
    let version_mock = server.mock(|when, then| {
        when.method(GET).path("/VERSION");
        then.status(200).body("43");
    });

    let config = NixpkgsConfig {
        index: Some("latest-40-nixos-23.11".to_string()),
        ..config_for(&server)
    };
    let engine = NixpkgsEngine::from_config(&config).await.unwrap();

    version_mock.assert_hits(0);
    assert_eq!(engine.index(), "latest-40-nixos-23.11");
}

#[tokio::test]
async fn test_http_version_source_returns_raw_text() {
    use nixpkgs_search::VersionSource;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/VERSION");
        then.status(200).body("44\n");
    });

    let source = HttpVersionSource::new(server.url("/VERSION"), Duration::from_secs(2)).unwrap();
    assert_eq!(source.fetch().await.unwrap(), "44\n");
    assert_eq!(source.describe(), server.url("/VERSION"));
}
