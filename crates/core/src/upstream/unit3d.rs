//! UNIT3D tracker API backend (`/api/torrents/filter`).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::UpstreamConfig;

use super::{PageQuery, TorrentRecord, UpstreamClient, UpstreamError};

/// Search path, relative to the tracker base URL.
pub const SEARCH_PATH: &str = "/api/torrents/filter";

/// HTTP client for a UNIT3D tracker's JSON search API.
pub struct Unit3dClient {
    client: Client,
    base_url: String,
}

impl Unit3dClient {
    /// Create a new client with the configured per-request timeout.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| UpstreamError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self) -> String {
        format!("{}{}", self.base_url, SEARCH_PATH)
    }
}

#[async_trait]
impl UpstreamClient for Unit3dClient {
    fn name(&self) -> &str {
        "unit3d"
    }

    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<TorrentRecord>, UpstreamError> {
        debug!(page = query.page, name = ?query.name, "Requesting upstream page");

        let response = self
            .client
            .get(self.search_url())
            .query(&query.to_params())
            .send()
            .await
            // Request URLs carry the api token; keep them out of error messages.
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout
                } else {
                    UpstreamError::ConnectionFailed(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(UpstreamError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body: FilterResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout
            } else {
                UpstreamError::Decode(e.without_url().to_string())
            }
        })?;

        debug!(page = query.page, results = body.data.len(), "Upstream page received");

        Ok(body.data.into_iter().map(TorrentRecord::from).collect())
    }
}

// UNIT3D API response types

#[derive(Debug, Deserialize)]
struct FilterResponse {
    #[serde(default)]
    data: Vec<ApiTorrent>,
}

#[derive(Debug, Deserialize)]
struct ApiTorrent {
    id: LooseValue,
    #[serde(default)]
    attributes: ApiAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct ApiAttributes {
    name: Option<String>,
    created_at: Option<String>,
    size: Option<LooseValue>,
    seeders: Option<LooseValue>,
    leechers: Option<LooseValue>,
    category_id: Option<LooseValue>,
    info_hash: Option<String>,
    freeleech: Option<LooseValue>,
    imdb_id: Option<LooseValue>,
    tmdb_id: Option<LooseValue>,
    tvdb_id: Option<LooseValue>,
    download_link: Option<String>,
}

/// Trackers are inconsistent about quoting numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl LooseValue {
    fn as_u64(&self) -> Option<u64> {
        match self {
            LooseValue::Int(n) => u64::try_from(*n).ok(),
            LooseValue::Float(f) if *f >= 0.0 => Some(*f as u64),
            LooseValue::Float(_) => None,
            LooseValue::Text(s) => s.trim().parse().ok(),
            LooseValue::Bool(_) => None,
        }
    }

    fn into_string(self) -> String {
        match self {
            LooseValue::Int(n) => n.to_string(),
            LooseValue::Float(f) => f.to_string(),
            LooseValue::Text(s) => s,
            LooseValue::Bool(b) => b.to_string(),
        }
    }
}

fn count(value: Option<LooseValue>) -> u32 {
    value
        .and_then(|v| v.as_u64())
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// External ids use 0 or "" for "unknown".
fn external_id(value: Option<LooseValue>) -> Option<String> {
    value
        .map(LooseValue::into_string)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.trim_start_matches('0').is_empty() && s != "tt0")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<ApiTorrent> for TorrentRecord {
    fn from(torrent: ApiTorrent) -> Self {
        let attrs = torrent.attributes;
        TorrentRecord {
            id: torrent.id.into_string(),
            name: non_empty(attrs.name).unwrap_or_else(|| "Unknown".to_string()),
            created_at: non_empty(attrs.created_at),
            size_bytes: attrs.size.and_then(|v| v.as_u64()).unwrap_or(0),
            seeders: count(attrs.seeders),
            leechers: count(attrs.leechers),
            category_id: attrs
                .category_id
                .and_then(|v| v.as_u64())
                .and_then(|n| u32::try_from(n).ok()),
            info_hash: non_empty(attrs.info_hash),
            freeleech: attrs.freeleech.map(LooseValue::into_string),
            imdb_id: external_id(attrs.imdb_id),
            tmdb_id: external_id(attrs.tmdb_id),
            tvdb_id: external_id(attrs.tvdb_id),
            download_link: non_empty(attrs.download_link),
        }
    }
}
