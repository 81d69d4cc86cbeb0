//! Upstream tracker access: the API client, age filtering, caching and
//! paginated fetching.

mod age;
mod cache;
mod fetcher;
mod types;
mod unit3d;

pub use age::{parse_timestamp, record_age, AgeFilter, TimestampError};
pub use cache::{fingerprint, CachedRecords, ResultCache};
pub use fetcher::{FetchSettings, UpstreamFetcher};
pub use types::*;
pub use unit3d::Unit3dClient;
