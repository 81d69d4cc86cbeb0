//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the full router with a
//! scriptable upstream, so Torznab behaviour can be tested without a tracker.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use gffree_core::{testing::MockUpstream, Config, ProxyEndpoint, ResultCache, UpstreamClient};
use gffree_server::state::AppState;

/// Re-export fixtures for test convenience
pub use gffree_core::testing::fixtures;

/// Test fixture for API testing with a mock upstream.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_caps() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.get("/api?t=caps").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock upstream - script pages and inspect requests
    pub upstream: Arc<MockUpstream>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl TestResponse {
    /// Parse the body as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }

    /// Number of `<item>` elements in a Torznab feed.
    pub fn item_count(&self) -> usize {
        self.body.matches("<item>").count()
    }
}

/// Config used by the fixture: no pacing delays, small page ceiling.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.upstream.base_url = "https://tracker.test".to_string();
    config.upstream.api_token = "configured-token".to_string();
    config.upstream.rate_limit_cooldown_secs = 0;
    config.upstream.page_delay_ms = 0;
    config.filter.max_pages = 6;
    config.filter.rss_start_page = 5;
    config
}

impl TestFixture {
    /// Create a new test fixture with the default test config.
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a test fixture with a custom config.
    pub async fn with_config(config: Config) -> Self {
        let upstream = Arc::new(MockUpstream::new());
        let cache = Arc::new(ResultCache::from_config(&config.cache));
        let endpoint = ProxyEndpoint::from_config(
            &config,
            Arc::clone(&upstream) as Arc<dyn UpstreamClient>,
            cache,
        )
        .expect("Failed to build endpoint");

        let state = Arc::new(AppState::new(config, endpoint));
        let router = gffree_server::api::create_router(state);

        Self { router, upstream }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        TestResponse {
            status,
            content_type,
            body: String::from_utf8_lossy(&body_bytes).into_owned(),
        }
    }
}
