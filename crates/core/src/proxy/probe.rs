//! Placeholder results for indexer validation.
//!
//! Sonarr, Radarr and Prowlarr validate an indexer with an unfiltered search
//! and reject it when nothing comes back. Because fresh uploads are filtered
//! out, an unfiltered search can legitimately be empty; one movie and one TV
//! placeholder are returned instead so both kinds of client accept the feed.

use crate::upstream::TorrentRecord;

pub const PROBE_MOVIE_ID: &str = "mock-validation-movie";
pub const PROBE_TV_ID: &str = "mock-validation-tv";

const PROBE_CREATED_AT: &str = "2020-01-01T00:00:00Z";

pub fn probe_records() -> Vec<TorrentRecord> {
    vec![
        probe_record(PROBE_MOVIE_ID, "GF-Free Proxy Validation Movie", 1, '0'),
        probe_record(PROBE_TV_ID, "GF-Free Proxy Validation TV", 2, '1'),
    ]
}

fn probe_record(id: &str, name: &str, category_id: u32, hash_suffix: char) -> TorrentRecord {
    TorrentRecord {
        id: id.to_string(),
        name: name.to_string(),
        created_at: Some(PROBE_CREATED_AT.to_string()),
        size_bytes: 1_000_000_000,
        seeders: 10,
        leechers: 2,
        category_id: Some(category_id),
        info_hash: Some(format!("{}{}", "0".repeat(39), hash_suffix)),
        freeleech: Some("0%".to_string()),
        imdb_id: None,
        tmdb_id: None,
        tvdb_id: None,
        download_link: None,
    }
}
