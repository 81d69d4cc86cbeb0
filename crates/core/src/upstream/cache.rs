//! Bounded TTL cache of filtered search results.
//!
//! Shared by every in-flight request. All reads, writes and evictions go
//! through one mutex so concurrent writers cannot double-evict or lose
//! updates.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::CacheConfig;
use crate::metrics::CACHE_LOOKUPS;

use super::{SearchRequest, TorrentRecord};

/// Number of trailing credential characters that partition the cache.
const CREDENTIAL_SUFFIX_LEN: usize = 8;

/// Shared, immutable list of records.
pub type CachedRecords = Arc<Vec<TorrentRecord>>;

#[derive(Debug)]
struct CacheEntry {
    created_at: Instant,
    /// Insertion order; breaks ties between entries created in the same instant.
    sequence: u64,
    records: CachedRecords,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    next_sequence: u64,
}

/// Result cache keyed by request fingerprint.
#[derive(Debug)]
pub struct ResultCache {
    ttl: Duration,
    max_entries: usize,
    state: Mutex<CacheState>,
}

impl ResultCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl(), config.max_entries)
    }

    /// Look up a fingerprint. Expired entries are removed and reported absent.
    pub async fn get(&self, fingerprint: &str) -> Option<CachedRecords> {
        let mut state = self.state.lock().await;

        let age = match state.entries.get(fingerprint) {
            Some(entry) => entry.created_at.elapsed(),
            None => {
                CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
                return None;
            }
        };

        if age >= self.ttl {
            state.entries.remove(fingerprint);
            CACHE_LOOKUPS.with_label_values(&["expired"]).inc();
            debug!(age_secs = age.as_secs(), "Dropped expired cache entry");
            return None;
        }

        CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
        debug!(age_secs = age.as_secs(), "Cache hit");
        state
            .entries
            .get(fingerprint)
            .map(|entry| Arc::clone(&entry.records))
    }

    /// Store a fresh entry, replacing any previous one for the same fingerprint.
    ///
    /// When a new fingerprint pushes the cache past its bound, the single
    /// oldest entry in the whole cache is evicted.
    pub async fn put(&self, fingerprint: String, records: CachedRecords) {
        let mut state = self.state.lock().await;

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.entries.insert(
            fingerprint,
            CacheEntry {
                created_at: Instant::now(),
                sequence,
                records,
            },
        );

        if state.entries.len() > self.max_entries {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.created_at, entry.sequence))
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                state.entries.remove(&key);
                debug!(entries = state.entries.len(), "Evicted oldest cache entry");
            }
        }
    }

    /// Number of stored entries, including expired ones not yet looked up.
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }
}

/// Deterministic cache key for a search.
///
/// Built from the credential's trailing characters and the normalized search
/// fields, then hashed so the key never contains the credential itself. The
/// start page and mode are not part of the key.
pub fn fingerprint(credential: &str, request: &SearchRequest) -> String {
    let chars: Vec<char> = credential.chars().collect();
    let suffix: String = chars[chars.len().saturating_sub(CREDENTIAL_SUFFIX_LEN)..]
        .iter()
        .collect();

    let canonical = format!(
        "{}\u{1f}{:?}\u{1f}{:?}\u{1f}{:?}\u{1f}{:?}\u{1f}{:?}\u{1f}{:?}\u{1f}{:?}",
        suffix,
        request.query,
        request.categories,
        request.imdb_id,
        request.tmdb_id,
        request.tvdb_id,
        request.season,
        request.episode,
    );

    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}
