pub mod category;
pub mod config;
pub mod metrics;
pub mod proxy;
pub mod testing;
pub mod torznab;
pub mod upstream;

pub use category::{CategoryMapping, CategoryTranslator};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, CacheConfig,
    Config, ConfigError, FilterConfig, SanitizedConfig, ServerConfig, UpstreamConfig,
};
pub use proxy::{ProxyEndpoint, ProxyResponse, RequestType, TorznabParams};
pub use torznab::{EncodeError, ProtocolEncoder};
pub use upstream::{
    AgeFilter, ResultCache, SearchMode, SearchRequest, TorrentRecord, Unit3dClient,
    UpstreamClient, UpstreamError, UpstreamFetcher,
};
