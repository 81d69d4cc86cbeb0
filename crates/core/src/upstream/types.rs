//! Types shared by the upstream client, the fetcher and the encoder.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// A torrent as reported by the upstream tracker.
///
/// Records are never mutated once built; cached lists are shared behind `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentRecord {
    /// Upstream identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Creation timestamp exactly as the upstream sent it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Size in bytes.
    pub size_bytes: u64,
    pub seeders: u32,
    pub leechers: u32,
    /// Upstream category id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u32>,
    /// Info hash as reported upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
    /// Freeleech discount, e.g. "0%", "50%", "100%".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeleech: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb_id: Option<String>,
    /// .torrent download URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
}

impl TorrentRecord {
    /// Whether the freeleech indicator denotes a non-zero download discount.
    pub fn has_download_discount(&self) -> bool {
        let Some(raw) = self.freeleech.as_deref().map(str::trim) else {
            return false;
        };
        if raw.is_empty() {
            return false;
        }
        match raw.trim_end_matches('%').trim().parse::<f64>() {
            Ok(percent) => percent > 0.0,
            Err(_) => !matches!(
                raw.to_ascii_lowercase().as_str(),
                "false" | "no" | "none" | "off"
            ),
        }
    }
}

/// Torznab search flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    General,
    Tv,
    Movie,
}

impl SearchMode {
    /// Name used in the Torznab capabilities document.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::General => "search",
            SearchMode::Tv => "tv-search",
            SearchMode::Movie => "movie-search",
        }
    }
}

/// A normalized search, built once per incoming Torznab call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchRequest {
    pub mode: SearchMode,
    /// Free-text query, trimmed; never empty when set.
    pub query: Option<String>,
    /// Torznab category ids.
    pub categories: Option<BTreeSet<u32>>,
    /// IMDb id in bare numeric form.
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<String>,
    pub tvdb_id: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// First upstream page to request.
    pub start_page: u32,
    /// Upstream API token; never empty when set.
    pub credential: Option<String>,
}

impl SearchRequest {
    pub fn has_query(&self) -> bool {
        self.query.is_some()
    }

    pub fn has_external_id(&self) -> bool {
        self.imdb_id.is_some() || self.tmdb_id.is_some() || self.tvdb_id.is_some()
    }

    /// A search with nothing to look for: RSS polling or indexer validation.
    pub fn is_unfiltered(&self) -> bool {
        !self.has_query() && !self.has_external_id()
    }
}

/// Reduce an IMDb id ("tt0111161", "111161") to the upstream's bare numeric form.
pub fn normalize_imdb_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("tt")
        .or_else(|| trimmed.strip_prefix("TT"))
        .unwrap_or(trimmed);
    normalize_numeric_id(digits)
}

/// Accept a numeric external id, dropping leading zeros. Zero means "unknown".
pub fn normalize_numeric_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let stripped = raw.trim_start_matches('0');
    (!stripped.is_empty()).then(|| stripped.to_string())
}

/// One page request against the upstream search API.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageQuery {
    pub credential: String,
    pub page: u32,
    pub per_page: u32,
    pub name: Option<String>,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<String>,
    pub tvdb_id: Option<String>,
    /// Upstream category ids.
    pub categories: BTreeSet<u32>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl PageQuery {
    /// Query-string parameters in the upstream's naming.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("api_token".to_string(), self.credential.clone()),
            ("page".to_string(), self.page.to_string()),
            ("perPage".to_string(), self.per_page.to_string()),
        ];

        if let Some(name) = &self.name {
            params.push(("name".to_string(), name.clone()));
        }
        if let Some(imdb) = &self.imdb_id {
            params.push(("imdbId".to_string(), imdb.clone()));
        }
        if let Some(tmdb) = &self.tmdb_id {
            params.push(("tmdbId".to_string(), tmdb.clone()));
        }
        if let Some(tvdb) = &self.tvdb_id {
            params.push(("tvdbId".to_string(), tvdb.clone()));
        }
        for (i, category) in self.categories.iter().enumerate() {
            params.push((format!("categories[{}]", i), category.to_string()));
        }
        if let Some(season) = self.season {
            params.push(("seasonNumber".to_string(), season.to_string()));
        }
        if let Some(episode) = self.episode {
            params.push(("episodeNumber".to_string(), episode.to_string()));
        }

        params
    }
}

/// Errors from a single upstream page request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Upstream rate limit hit (HTTP 429)")]
    RateLimited,

    #[error("Upstream returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Upstream request timeout")]
    Timeout,

    #[error("Upstream connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Failed to decode upstream response: {0}")]
    Decode(String),

    #[error("Upstream client setup failed: {0}")]
    Setup(String),
}

impl UpstreamError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::RateLimited => "rate_limited",
            UpstreamError::Status { .. } => "http_error",
            UpstreamError::Timeout => "timeout",
            UpstreamError::ConnectionFailed(_) => "connection_failed",
            UpstreamError::Decode(_) => "decode_error",
            UpstreamError::Setup(_) => "setup_error",
        }
    }
}

/// Trait for the upstream tracker API: one page per call.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Fetch one page of search results, in upstream order.
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<TorrentRecord>, UpstreamError>;
}
