//! Mock upstream for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::upstream::{PageQuery, TorrentRecord, UpstreamClient, UpstreamError};

/// Mock implementation of the UpstreamClient trait.
///
/// Pages are scripted by number; pages without a script come back empty.
/// Errors queued with [`MockUpstream::fail_next`] are returned before the
/// page's records, one per request.
#[derive(Debug, Default, Clone)]
pub struct MockUpstream {
    pages: Arc<RwLock<HashMap<u32, Vec<TorrentRecord>>>>,
    errors: Arc<RwLock<HashMap<u32, VecDeque<UpstreamError>>>>,
    queries: Arc<RwLock<Vec<PageQuery>>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the records returned for a page.
    pub async fn set_page(&self, page: u32, records: Vec<TorrentRecord>) {
        self.pages.write().await.insert(page, records);
    }

    /// Queue an error for the next request of a page.
    pub async fn fail_next(&self, page: u32, error: UpstreamError) {
        self.errors
            .write()
            .await
            .entry(page)
            .or_default()
            .push_back(error);
    }

    /// Every query received, in order.
    pub async fn recorded_queries(&self) -> Vec<PageQuery> {
        self.queries.read().await.clone()
    }

    /// Page numbers requested, in order.
    pub async fn requested_pages(&self) -> Vec<u32> {
        self.queries.read().await.iter().map(|q| q.page).collect()
    }
}

#[async_trait]
impl UpstreamClient for MockUpstream {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<TorrentRecord>, UpstreamError> {
        self.queries.write().await.push(query.clone());

        if let Some(error) = self
            .errors
            .write()
            .await
            .get_mut(&query.page)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        Ok(self
            .pages
            .read()
            .await
            .get(&query.page)
            .cloned()
            .unwrap_or_default())
    }
}
