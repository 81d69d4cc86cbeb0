//! The Torznab request surface, independent of any HTTP framework.

mod endpoint;
mod params;
mod probe;

pub use endpoint::{ProxyEndpoint, ProxyResponse};
pub use params::{parse_categories, RequestType, TorznabParams};
pub use probe::{probe_records, PROBE_MOVIE_ID, PROBE_TV_ID};
