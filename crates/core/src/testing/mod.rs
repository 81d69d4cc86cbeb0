//! Testing utilities: a scriptable upstream and record fixtures.
//!
//! # Example
//!
//! ```rust,ignore
//! use gffree_core::testing::{fixtures, MockUpstream};
//!
//! let upstream = MockUpstream::new();
//! upstream.set_page(1, vec![fixtures::old_record("1")]).await;
//! upstream.fail_next(2, UpstreamError::RateLimited).await;
//! ```

mod mock_upstream;

pub use mock_upstream::MockUpstream;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{Duration, Utc};

    use crate::upstream::TorrentRecord;

    /// A record with reasonable defaults, created on 2020-01-01.
    pub fn record(id: &str) -> TorrentRecord {
        TorrentRecord {
            id: id.to_string(),
            name: format!("Torrent {}", id),
            created_at: Some("2020-01-01T00:00:00Z".to_string()),
            size_bytes: 1024 * 1024 * 700, // 700 MB
            seeders: 10,
            leechers: 2,
            category_id: Some(1),
            info_hash: Some(format!("{:0>40}", id)),
            freeleech: Some("0%".to_string()),
            imdb_id: None,
            tmdb_id: None,
            tvdb_id: None,
            download_link: Some(format!("https://tracker.test/torrent/download/{}", id)),
        }
    }

    /// A record with the given raw creation timestamp.
    pub fn record_created(id: &str, created_at: &str) -> TorrentRecord {
        TorrentRecord {
            created_at: Some(created_at.to_string()),
            ..record(id)
        }
    }

    /// A record comfortably past any sensible minimum age.
    pub fn old_record(id: &str) -> TorrentRecord {
        record(id)
    }

    /// A record created an hour ago.
    pub fn young_record(id: &str) -> TorrentRecord {
        let created = Utc::now() - Duration::hours(1);
        record_created(id, &created.to_rfc3339())
    }

    /// A movie record carrying external ids.
    pub fn movie_record(id: &str, name: &str) -> TorrentRecord {
        TorrentRecord {
            name: name.to_string(),
            category_id: Some(1),
            imdb_id: Some("133093".to_string()),
            tmdb_id: Some("603".to_string()),
            ..record(id)
        }
    }

    /// A TV record carrying a TVDB id.
    pub fn tv_record(id: &str, name: &str) -> TorrentRecord {
        TorrentRecord {
            name: name.to_string(),
            category_id: Some(2),
            tvdb_id: Some("81189".to_string()),
            ..record(id)
        }
    }
}
