//! Torznab query parameters and their normalization.

use std::collections::BTreeSet;

use crate::upstream::{normalize_imdb_id, normalize_numeric_id, SearchMode, SearchRequest};

/// Raw Torznab query parameters.
///
/// Every field is a string so that malformed numbers are dropped here
/// instead of being rejected before a Torznab error document can be built.
#[derive(Debug, Clone, Default)]
pub struct TorznabParams {
    pub t: Option<String>,
    pub q: Option<String>,
    pub cat: Option<String>,
    pub imdbid: Option<String>,
    pub tmdbid: Option<String>,
    pub tvdbid: Option<String>,
    pub season: Option<String>,
    pub ep: Option<String>,
    pub apikey: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// What a `t=` value asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Capabilities,
    Search(SearchMode),
}

impl RequestType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "caps" => Some(RequestType::Capabilities),
            "search" => Some(RequestType::Search(SearchMode::General)),
            "tvsearch" | "tv-search" => Some(RequestType::Search(SearchMode::Tv)),
            "movie" | "movie-search" => Some(RequestType::Search(SearchMode::Movie)),
            _ => None,
        }
    }

    /// Label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RequestType::Capabilities => "caps",
            RequestType::Search(mode) => mode.as_str(),
        }
    }
}

impl TorznabParams {
    /// Collect decoded query pairs. A repeated key keeps its last value and
    /// unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "t" => &mut params.t,
                "q" => &mut params.q,
                "cat" => &mut params.cat,
                "imdbid" => &mut params.imdbid,
                "tmdbid" => &mut params.tmdbid,
                "tvdbid" => &mut params.tvdbid,
                "season" => &mut params.season,
                "ep" => &mut params.ep,
                "apikey" => &mut params.apikey,
                "limit" => &mut params.limit,
                "offset" => &mut params.offset,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        params
    }

    /// The `t` value, if present and not blank.
    pub fn request_type(&self) -> Option<&str> {
        non_blank(self.t.as_deref())
    }

    /// Build the normalized search. `fallback_token` is used when the caller
    /// sent no `apikey`; unfiltered searches start at `rss_start_page`.
    pub fn search_request(
        &self,
        mode: SearchMode,
        fallback_token: Option<&str>,
        rss_start_page: u32,
    ) -> SearchRequest {
        let mut request = SearchRequest {
            mode,
            query: non_blank(self.q.as_deref()).map(str::to_string),
            categories: self.cat.as_deref().and_then(parse_categories),
            imdb_id: self.imdbid.as_deref().and_then(normalize_imdb_id),
            tmdb_id: self.tmdbid.as_deref().and_then(normalize_numeric_id),
            tvdb_id: self.tvdbid.as_deref().and_then(normalize_numeric_id),
            season: parse_uint(self.season.as_deref()),
            episode: parse_uint(self.ep.as_deref()),
            start_page: 1,
            credential: non_blank(self.apikey.as_deref())
                .or_else(|| non_blank(fallback_token))
                .map(str::to_string),
        };
        if request.is_unfiltered() {
            request.start_page = rss_start_page;
        }
        request
    }

    pub fn offset(&self) -> usize {
        parse_uint(self.offset.as_deref()).unwrap_or(0) as usize
    }

    /// Caller limit; zero and garbage mean "no limit".
    pub fn limit(&self) -> Option<usize> {
        parse_uint(self.limit.as_deref())
            .filter(|&n| n > 0)
            .map(|n| n as usize)
    }
}

/// Comma-separated category ids. One bad entry discards the whole filter.
pub fn parse_categories(raw: &str) -> Option<BTreeSet<u32>> {
    if raw.trim().is_empty() {
        return None;
    }
    raw.split(',')
        .map(|part| part.trim().parse::<u32>().ok())
        .collect()
}

fn parse_uint(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|s| s.trim().parse().ok())
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}
