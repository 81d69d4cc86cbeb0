//! Paginated, age-filtered fetching from the upstream.
//!
//! Pages are requested strictly one after the other. Every upstream failure
//! ends pagination and the records gathered so far are returned: callers
//! never see upstream instability as an error.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::category::CategoryTranslator;
use crate::config::UpstreamConfig;
use crate::metrics::UPSTREAM_REQUESTS;

use super::cache::{fingerprint, CachedRecords, ResultCache};
use super::{AgeFilter, PageQuery, SearchRequest, TorrentRecord, UpstreamClient, UpstreamError};

/// Pacing and paging parameters.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Records requested per page.
    pub page_size: u32,
    /// Wait before retrying a rate-limited page.
    pub rate_limit_cooldown: Duration,
    /// Pause between consecutive pages.
    pub page_delay: Duration,
}

impl From<&UpstreamConfig> for FetchSettings {
    fn from(config: &UpstreamConfig) -> Self {
        Self {
            page_size: config.page_size,
            rate_limit_cooldown: config.rate_limit_cooldown(),
            page_delay: config.page_delay(),
        }
    }
}

/// Fetches eligible records for a search, going through the result cache.
pub struct UpstreamFetcher {
    client: Arc<dyn UpstreamClient>,
    cache: Arc<ResultCache>,
    translator: Arc<CategoryTranslator>,
    age_filter: AgeFilter,
    settings: FetchSettings,
}

impl UpstreamFetcher {
    pub fn new(
        client: Arc<dyn UpstreamClient>,
        cache: Arc<ResultCache>,
        translator: Arc<CategoryTranslator>,
        age_filter: AgeFilter,
        settings: FetchSettings,
    ) -> Self {
        Self {
            client,
            cache,
            translator,
            age_filter,
            settings,
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Collect up to `limit` eligible records, scanning pages
    /// `request.start_page..=max_pages`.
    pub async fn fetch(&self, request: &SearchRequest, limit: usize, max_pages: u32) -> CachedRecords {
        let Some(credential) = request.credential.as_deref() else {
            error!("No API token provided (pass it as apikey or set upstream.api_token)");
            return Arc::new(Vec::new());
        };
        if limit == 0 {
            return Arc::new(Vec::new());
        }

        let key = fingerprint(credential, request);
        if let Some(cached) = self.cache.get(&key).await {
            debug!(results = cached.len(), "Serving search from cache");
            return cached;
        }

        let categories = request
            .categories
            .as_ref()
            .map(|wire| self.translator.to_upstream(wire))
            .unwrap_or_default();

        let mut eligible: Vec<TorrentRecord> = Vec::new();
        let mut page = request.start_page.max(1);

        'pages: while page <= max_pages {
            let query = PageQuery {
                credential: credential.to_string(),
                page,
                per_page: self.settings.page_size,
                name: request.query.clone(),
                imdb_id: request.imdb_id.clone(),
                tmdb_id: request.tmdb_id.clone(),
                tvdb_id: request.tvdb_id.clone(),
                categories: categories.clone(),
                season: request.season,
                episode: request.episode,
            };

            info!(page, query = ?request.query, backend = self.client.name(), "Fetching page");

            let records = match self.fetch_page_with_retry(&query).await {
                Ok(records) => records,
                Err(e) => {
                    warn!(page, error = %e, eligible = eligible.len(), "Upstream request failed, stopping pagination");
                    break;
                }
            };

            if records.is_empty() {
                info!(page, "No more torrents upstream");
                break;
            }

            let page_len = records.len();
            for record in records {
                if self.age_filter.is_eligible(&record) {
                    eligible.push(record);
                    if eligible.len() >= limit {
                        info!(limit, "Reached result limit");
                        break 'pages;
                    }
                }
            }

            info!(page, torrents = page_len, eligible = eligible.len(), "Page scanned");

            if page < max_pages {
                tokio::time::sleep(self.settings.page_delay).await;
            }
            page += 1;
        }

        let records = Arc::new(eligible);
        self.cache.put(key, Arc::clone(&records)).await;
        records
    }

    /// One page, retried once after a cooldown if the upstream answered 429.
    async fn fetch_page_with_retry(&self, query: &PageQuery) -> Result<Vec<TorrentRecord>, UpstreamError> {
        match self.request_page(query).await {
            Err(UpstreamError::RateLimited) => {
                warn!(
                    page = query.page,
                    cooldown_ms = self.settings.rate_limit_cooldown.as_millis() as u64,
                    "Rate limited (429), waiting before retrying"
                );
                tokio::time::sleep(self.settings.rate_limit_cooldown).await;
                self.request_page(query).await
            }
            other => other,
        }
    }

    async fn request_page(&self, query: &PageQuery) -> Result<Vec<TorrentRecord>, UpstreamError> {
        let result = self.client.fetch_page(query).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        UPSTREAM_REQUESTS.with_label_values(&[outcome]).inc();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockUpstream};

    fn settings() -> FetchSettings {
        FetchSettings {
            page_size: 25,
            rate_limit_cooldown: Duration::ZERO,
            page_delay: Duration::ZERO,
        }
    }

    fn fetcher(upstream: &Arc<MockUpstream>) -> UpstreamFetcher {
        UpstreamFetcher::new(
            Arc::clone(upstream) as Arc<dyn UpstreamClient>,
            Arc::new(ResultCache::new(Duration::from_secs(60), 100)),
            Arc::new(CategoryTranslator::default()),
            AgeFilter::new(37),
            settings(),
        )
    }

    fn request(credential: Option<&str>) -> SearchRequest {
        SearchRequest {
            query: Some("dune".to_string()),
            start_page: 1,
            credential: credential.map(str::to_string),
            ..Default::default()
        }
    }

    fn old_records(prefix: &str, n: usize) -> Vec<TorrentRecord> {
        (0..n)
            .map(|i| fixtures::old_record(&format!("{}-{}", prefix, i)))
            .collect()
    }

    #[tokio::test]
    async fn test_missing_credential_skips_upstream() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.set_page(1, old_records("p1", 3)).await;

        let result = fetcher(&upstream).fetch(&request(None), 50, 5).await;

        assert!(result.is_empty());
        assert!(upstream.recorded_queries().await.is_empty());
    }

    #[tokio::test]
    async fn test_paginates_until_exhausted() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.set_page(1, old_records("p1", 2)).await;
        upstream.set_page(2, old_records("p2", 2)).await;

        let result = fetcher(&upstream).fetch(&request(Some("tok")), 50, 10).await;

        assert_eq!(result.len(), 4);
        assert_eq!(result[0].id, "p1-0");
        assert_eq!(result[3].id, "p2-1");
        // page 3 was requested and came back empty
        assert_eq!(upstream.requested_pages().await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_filters_young_records() {
        let upstream = Arc::new(MockUpstream::new());
        upstream
            .set_page(
                1,
                vec![
                    fixtures::old_record("old"),
                    fixtures::young_record("young"),
                    fixtures::record_created("bad", "garbage"),
                ],
            )
            .await;

        let result = fetcher(&upstream).fetch(&request(Some("tok")), 50, 1).await;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "old");
    }

    #[tokio::test]
    async fn test_short_circuits_at_limit() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.set_page(1, old_records("p1", 3)).await;
        upstream.set_page(2, old_records("p2", 3)).await;
        upstream.set_page(3, old_records("p3", 3)).await;

        let result = fetcher(&upstream).fetch(&request(Some("tok")), 5, 10).await;

        assert_eq!(result.len(), 5);
        assert_eq!(result[4].id, "p2-1");
        assert_eq!(upstream.requested_pages().await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_stops_at_max_pages() {
        let upstream = Arc::new(MockUpstream::new());
        for page in 1..=5 {
            upstream.set_page(page, old_records(&format!("p{}", page), 1)).await;
        }

        let result = fetcher(&upstream).fetch(&request(Some("tok")), 50, 3).await;

        assert_eq!(result.len(), 3);
        assert_eq!(upstream.requested_pages().await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_starts_at_requested_page() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.set_page(4, old_records("p4", 1)).await;
        upstream.set_page(5, old_records("p5", 1)).await;

        let mut req = request(Some("tok"));
        req.start_page = 5;
        let result = fetcher(&upstream).fetch(&req, 50, 6).await;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "p5-0");
        assert_eq!(upstream.requested_pages().await, vec![5, 6]);
    }

    #[tokio::test]
    async fn test_retries_once_after_rate_limit() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.set_page(1, old_records("p1", 2)).await;
        upstream.fail_next(1, UpstreamError::RateLimited).await;

        let result = fetcher(&upstream).fetch(&request(Some("tok")), 50, 1).await;

        assert_eq!(result.len(), 2);
        assert_eq!(upstream.requested_pages().await, vec![1, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_cooldown_applied_once_per_page() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.set_page(1, old_records("p1", 2)).await;
        upstream.set_page(2, old_records("p2", 2)).await;
        upstream.fail_next(1, UpstreamError::RateLimited).await;

        let cooldown = Duration::from_secs(5);
        let page_delay = Duration::from_millis(300);
        let fetcher = UpstreamFetcher::new(
            Arc::clone(&upstream) as Arc<dyn UpstreamClient>,
            Arc::new(ResultCache::new(Duration::from_secs(60), 100)),
            Arc::new(CategoryTranslator::default()),
            AgeFilter::new(37),
            FetchSettings {
                page_size: 25,
                rate_limit_cooldown: cooldown,
                page_delay,
            },
        );

        let started = tokio::time::Instant::now();
        let result = fetcher.fetch(&request(Some("tok")), 50, 2).await;

        assert_eq!(result.len(), 4);
        assert_eq!(upstream.requested_pages().await, vec![1, 1, 2]);
        // one cooldown for page 1, one courtesy delay before page 2
        assert_eq!(started.elapsed(), cooldown + page_delay);
    }

    #[tokio::test]
    async fn test_second_rate_limit_stops_with_partial_results() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.set_page(1, old_records("p1", 2)).await;
        upstream.set_page(2, old_records("p2", 2)).await;
        upstream.fail_next(2, UpstreamError::RateLimited).await;
        upstream.fail_next(2, UpstreamError::RateLimited).await;

        let result = fetcher(&upstream).fetch(&request(Some("tok")), 50, 5).await;

        assert_eq!(result.len(), 2);
        assert_eq!(upstream.requested_pages().await, vec![1, 2, 2]);
    }

    #[tokio::test]
    async fn test_other_errors_stop_without_retry() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.set_page(1, old_records("p1", 2)).await;
        upstream
            .fail_next(
                2,
                UpstreamError::Status {
                    status: 502,
                    message: "bad gateway".to_string(),
                },
            )
            .await;

        let result = fetcher(&upstream).fetch(&request(Some("tok")), 50, 5).await;

        assert_eq!(result.len(), 2);
        assert_eq!(upstream.requested_pages().await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.set_page(1, old_records("p1", 2)).await;
        let fetcher = fetcher(&upstream);

        let first = fetcher.fetch(&request(Some("tok")), 50, 3).await;
        let requests_after_first = upstream.recorded_queries().await.len();
        let second = fetcher.fetch(&request(Some("tok")), 50, 3).await;

        assert_eq!(first, second);
        assert_eq!(upstream.recorded_queries().await.len(), requests_after_first);
    }

    #[tokio::test]
    async fn test_empty_result_is_cached() {
        let upstream = Arc::new(MockUpstream::new());
        let fetcher = fetcher(&upstream);

        assert!(fetcher.fetch(&request(Some("tok")), 50, 3).await.is_empty());
        assert!(fetcher.fetch(&request(Some("tok")), 50, 3).await.is_empty());

        assert_eq!(upstream.requested_pages().await, vec![1]);
    }

    #[tokio::test]
    async fn test_error_result_is_cached() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.fail_next(1, UpstreamError::Timeout).await;
        let fetcher = fetcher(&upstream);

        assert!(fetcher.fetch(&request(Some("tok")), 50, 3).await.is_empty());
        assert_eq!(fetcher.cache().len().await, 1);
    }

    #[tokio::test]
    async fn test_credentials_partition_cache() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.set_page(1, old_records("p1", 1)).await;
        let fetcher = fetcher(&upstream);

        fetcher.fetch(&request(Some("alice-token-1")), 50, 1).await;
        fetcher.fetch(&request(Some("bob-token-2")), 50, 1).await;

        let credentials: Vec<String> = upstream
            .recorded_queries()
            .await
            .into_iter()
            .map(|q| q.credential)
            .collect();
        assert_eq!(credentials, vec!["alice-token-1", "bob-token-2"]);
    }

    #[tokio::test]
    async fn test_builds_upstream_query() {
        let upstream = Arc::new(MockUpstream::new());
        let req = SearchRequest {
            query: Some("show".to_string()),
            categories: Some([5030, 9999].into_iter().collect()),
            imdb_id: Some("944947".to_string()),
            season: Some(1),
            episode: Some(3),
            start_page: 1,
            credential: Some("tok".to_string()),
            ..Default::default()
        };

        fetcher(&upstream).fetch(&req, 50, 1).await;

        let queries = upstream.recorded_queries().await;
        assert_eq!(queries.len(), 1);
        let q = &queries[0];
        assert_eq!(q.credential, "tok");
        assert_eq!(q.page, 1);
        assert_eq!(q.per_page, 25);
        assert_eq!(q.name.as_deref(), Some("show"));
        assert_eq!(q.imdb_id.as_deref(), Some("944947"));
        assert_eq!(q.categories, [18].into_iter().collect());
        assert_eq!(q.season, Some(1));
        assert_eq!(q.episode, Some(3));
    }
}
