//! Torznab request handling.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::category::{CategoryMapping, CategoryTranslator};
use crate::config::{Config, ConfigError, FilterConfig};
use crate::metrics::TORZNAB_REQUESTS;
use crate::torznab::{EncodeError, ProtocolEncoder};
use crate::upstream::{
    AgeFilter, FetchSettings, ResultCache, SearchMode, UpstreamClient, UpstreamFetcher,
};

use super::params::{RequestType, TorznabParams};
use super::probe::probe_records;

/// Served when even the error document cannot be encoded.
const FALLBACK_ERROR: &str =
    r#"<?xml version="1.0" encoding="UTF-8"?><error code="900" description="Internal error"/>"#;

/// An XML body and the HTTP status to send it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    pub status: u16,
    pub body: String,
}

impl ProxyResponse {
    fn ok(body: String) -> Self {
        Self { status: 200, body }
    }
}

pub struct ProxyEndpoint {
    fetcher: UpstreamFetcher,
    encoder: ProtocolEncoder,
    filter: FilterConfig,
    fallback_token: Option<String>,
}

impl ProxyEndpoint {
    pub fn new(
        fetcher: UpstreamFetcher,
        encoder: ProtocolEncoder,
        filter: FilterConfig,
        fallback_token: Option<String>,
    ) -> Self {
        Self {
            fetcher,
            encoder,
            filter,
            fallback_token,
        }
    }

    /// Wire up fetcher and encoder from a validated config.
    pub fn from_config(
        config: &Config,
        client: Arc<dyn UpstreamClient>,
        cache: Arc<ResultCache>,
    ) -> Result<Self, ConfigError> {
        let translator = Arc::new(CategoryTranslator::new(CategoryMapping::from_config(
            &config.categories,
        )?));
        let fetcher = UpstreamFetcher::new(
            client,
            cache,
            Arc::clone(&translator),
            AgeFilter::new(config.filter.min_age_hours),
            FetchSettings::from(&config.upstream),
        );
        let encoder = ProtocolEncoder::new(
            config.upstream.base_url.clone(),
            translator,
            config.filter.min_age_hours,
            config.filter.results_limit,
        );

        Ok(Self::new(
            fetcher,
            encoder,
            config.filter.clone(),
            config.upstream.fallback_token().map(str::to_string),
        ))
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        self.fetcher.cache()
    }

    pub async fn handle(&self, params: &TorznabParams) -> ProxyResponse {
        let Some(raw_type) = params.request_type() else {
            TORZNAB_REQUESTS.with_label_values(&["error"]).inc();
            return self.error(400, 200, "Missing parameter (t)");
        };
        let Some(request_type) = RequestType::parse(raw_type) else {
            warn!(t = raw_type, "Unknown request type");
            TORZNAB_REQUESTS.with_label_values(&["error"]).inc();
            return self.error(400, 201, "Unknown request type");
        };
        TORZNAB_REQUESTS
            .with_label_values(&[request_type.label()])
            .inc();

        let encoded = match request_type {
            RequestType::Capabilities => self.encoder.encode_capabilities(),
            RequestType::Search(mode) => self.search(params, mode).await,
        };

        match encoded {
            Ok(body) => ProxyResponse::ok(body),
            Err(e) => {
                error!(error = %e, "Failed to encode Torznab response");
                self.error(500, 900, &e.to_string())
            }
        }
    }

    async fn search(
        &self,
        params: &TorznabParams,
        mode: SearchMode,
    ) -> Result<String, EncodeError> {
        let request = params.search_request(
            mode,
            self.fallback_token.as_deref(),
            self.filter.rss_start_page,
        );

        info!(
            mode = mode.as_str(),
            query = ?request.query,
            categories = ?request.categories,
            imdb_id = ?request.imdb_id,
            tmdb_id = ?request.tmdb_id,
            tvdb_id = ?request.tvdb_id,
            start_page = request.start_page,
            credential = if request.credential.is_some() { "***" } else { "none" },
            "Search request"
        );

        let fetched = self
            .fetcher
            .fetch(
                &request,
                self.filter.results_limit as usize,
                self.filter.max_pages,
            )
            .await;

        let records = if fetched.is_empty() && request.is_unfiltered() {
            info!("Validation probe detected, returning placeholder results");
            TORZNAB_REQUESTS.with_label_values(&["probe"]).inc();
            probe_records()
        } else {
            fetched.to_vec()
        };

        let selected: Vec<_> = records
            .into_iter()
            .skip(params.offset())
            .take(params.limit().unwrap_or(usize::MAX))
            .collect();

        info!(results = selected.len(), "Returning eligible torrents");
        self.encoder
            .encode_search(&selected, mode, request.credential.as_deref())
    }

    fn error(&self, status: u16, code: u16, description: &str) -> ProxyResponse {
        let body = self
            .encoder
            .encode_error(code, description)
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to encode Torznab error");
                FALLBACK_ERROR.to_string()
            });
        ProxyResponse { status, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockUpstream};
    use crate::upstream::UpstreamError;

    fn config() -> Config {
        let mut config = Config::default();
        config.upstream.base_url = "https://tracker.test".to_string();
        config.upstream.api_token = "configured-token".to_string();
        config.upstream.rate_limit_cooldown_secs = 0;
        config.upstream.page_delay_ms = 0;
        config.filter.max_pages = 6;
        config.filter.rss_start_page = 5;
        config
    }

    fn endpoint(upstream: &Arc<MockUpstream>) -> ProxyEndpoint {
        endpoint_with(upstream, config())
    }

    fn endpoint_with(upstream: &Arc<MockUpstream>, config: Config) -> ProxyEndpoint {
        ProxyEndpoint::from_config(
            &config,
            Arc::clone(upstream) as Arc<dyn UpstreamClient>,
            Arc::new(ResultCache::from_config(&config.cache)),
        )
        .unwrap()
    }

    fn params(t: &str) -> TorznabParams {
        TorznabParams {
            t: Some(t.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_caps() {
        let upstream = Arc::new(MockUpstream::new());
        let response = endpoint(&upstream).handle(&params("caps")).await;

        assert_eq!(response.status, 200);
        assert!(response.body.contains("<caps>"));
        assert!(upstream.recorded_queries().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let upstream = Arc::new(MockUpstream::new());
        let response = endpoint(&upstream).handle(&params("bogus")).await;

        assert_eq!(response.status, 400);
        assert!(response
            .body
            .contains(r#"<error code="201" description="Unknown request type"/>"#));
        assert!(upstream.recorded_queries().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_type() {
        let upstream = Arc::new(MockUpstream::new());
        let response = endpoint(&upstream).handle(&TorznabParams::default()).await;

        assert_eq!(response.status, 400);
        assert!(response.body.contains(r#"code="200""#));
    }

    #[tokio::test]
    async fn test_validation_probe_when_unfiltered_search_is_empty() {
        let upstream = Arc::new(MockUpstream::new());
        let response = endpoint(&upstream).handle(&params("search")).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body.matches("<item>").count(), 2);
        assert!(response.body.contains("/torrents/mock-validation-movie</guid>"));
        assert!(response.body.contains("/torrents/mock-validation-tv</guid>"));
        assert!(response
            .body
            .contains(r#"<torznab:attr name="category" value="2000"/>"#));
        assert!(response
            .body
            .contains(r#"<torznab:attr name="category" value="5000"/>"#));
        // RSS polling starts deep in the listing
        assert_eq!(upstream.requested_pages().await, vec![5]);
    }

    #[tokio::test]
    async fn test_no_probe_for_query_search() {
        let upstream = Arc::new(MockUpstream::new());
        let mut p = params("search");
        p.q = Some("nothing matches".to_string());

        let response = endpoint(&upstream).handle(&p).await;

        assert_eq!(response.status, 200);
        assert!(!response.body.contains("<item>"));
        assert_eq!(upstream.requested_pages().await, vec![1]);
    }

    #[tokio::test]
    async fn test_search_uses_caller_credential() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.set_page(1, vec![fixtures::old_record("1")]).await;
        let mut p = params("movie");
        p.q = Some("x".to_string());
        p.apikey = Some("caller-token".to_string());

        let response = endpoint(&upstream).handle(&p).await;

        assert!(response.body.contains("api_token=caller-token"));
        assert_eq!(upstream.recorded_queries().await[0].credential, "caller-token");
    }

    #[tokio::test]
    async fn test_search_falls_back_to_configured_credential() {
        let upstream = Arc::new(MockUpstream::new());
        let mut p = params("search");
        p.q = Some("x".to_string());

        endpoint(&upstream).handle(&p).await;

        assert_eq!(upstream.recorded_queries().await[0].credential, "configured-token");
    }

    #[tokio::test]
    async fn test_offset_and_limit() {
        let upstream = Arc::new(MockUpstream::new());
        upstream
            .set_page(
                1,
                (0..5).map(|i| fixtures::old_record(&format!("r{}", i))).collect(),
            )
            .await;
        let endpoint = endpoint(&upstream);

        let mut p = params("search");
        p.q = Some("x".to_string());
        p.offset = Some("1".to_string());
        p.limit = Some("2".to_string());
        let body = endpoint.handle(&p).await.body;
        assert_eq!(body.matches("<item>").count(), 2);
        assert!(body.contains("/torrents/r1</guid>"));
        assert!(body.contains("/torrents/r2</guid>"));

        p.limit = Some("0".to_string());
        let body = endpoint.handle(&p).await.body;
        assert_eq!(body.matches("<item>").count(), 4);

        p.offset = Some("10".to_string());
        let body = endpoint.handle(&p).await.body;
        assert!(!body.contains("<item>"));
    }

    #[tokio::test]
    async fn test_identical_requests_served_from_cache() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.set_page(1, vec![fixtures::old_record("1")]).await;
        let endpoint = endpoint(&upstream);
        let mut p = params("search");
        p.q = Some("x".to_string());

        let first = endpoint.handle(&p).await;
        let calls = upstream.recorded_queries().await.len();
        let second = endpoint.handle(&p).await;

        assert_eq!(first, second);
        assert_eq!(upstream.recorded_queries().await.len(), calls);
    }

    #[tokio::test]
    async fn test_results_respect_minimum_age() {
        let upstream = Arc::new(MockUpstream::new());
        upstream
            .set_page(
                1,
                vec![fixtures::young_record("fresh"), fixtures::old_record("old")],
            )
            .await;
        let mut p = params("search");
        p.q = Some("x".to_string());

        let body = endpoint(&upstream).handle(&p).await.body;

        assert!(body.contains("/torrents/old</guid>"));
        assert!(!body.contains("/torrents/fresh</guid>"));
    }

    #[tokio::test]
    async fn test_upstream_failure_still_returns_feed() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.fail_next(1, UpstreamError::Timeout).await;
        let mut p = params("tvsearch");
        p.q = Some("x".to_string());

        let response = endpoint(&upstream).handle(&p).await;

        assert_eq!(response.status, 200);
        assert!(response.body.contains("<channel>"));
        assert!(!response.body.contains("<item>"));
    }

    #[tokio::test]
    async fn test_category_filter_translated() {
        let upstream = Arc::new(MockUpstream::new());
        let mut p = params("search");
        p.q = Some("x".to_string());
        p.cat = Some("2030,5030".to_string());

        endpoint(&upstream).handle(&p).await;

        let queries = upstream.recorded_queries().await;
        assert_eq!(queries[0].categories, [17, 18].into_iter().collect());
    }
}
