use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub categories: CategoryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8888
}

/// Upstream tracker API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Tracker base URL (e.g., "https://generation-free.org")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Fallback API token, used when the caller does not pass `apikey`
    #[serde(default)]
    pub api_token: String,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Records requested per upstream page (default: 25)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Wait before retrying a page that answered 429 (default: 5)
    #[serde(default = "default_cooldown")]
    pub rate_limit_cooldown_secs: u64,
    /// Pause between two consecutive pages (default: 1000)
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs as u64)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    /// The fallback token, if one is configured.
    pub fn fallback_token(&self) -> Option<&str> {
        let token = self.api_token.trim();
        (!token.is_empty()).then_some(token)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: String::new(),
            timeout_secs: default_timeout(),
            page_size: default_page_size(),
            rate_limit_cooldown_secs: default_cooldown(),
            page_delay_ms: default_page_delay(),
        }
    }
}

fn default_base_url() -> String {
    "https://generation-free.org".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_page_size() -> u32 {
    25
}

fn default_cooldown() -> u64 {
    5
}

fn default_page_delay() -> u64 {
    1000
}

/// Age filter and pagination limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Minimum torrent age in hours (36h upstream policy + 1h margin)
    #[serde(default = "default_min_age")]
    pub min_age_hours: u32,
    /// Maximum upstream pages scanned per search
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Maximum eligible records collected per search
    #[serde(default = "default_results_limit")]
    pub results_limit: u32,
    /// First page scanned for searches without query or external id
    #[serde(default = "default_rss_start_page")]
    pub rss_start_page: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_age_hours: default_min_age(),
            max_pages: default_max_pages(),
            results_limit: default_results_limit(),
            rss_start_page: default_rss_start_page(),
        }
    }
}

fn default_min_age() -> u32 {
    37
}

fn default_max_pages() -> u32 {
    20
}

fn default_results_limit() -> u32 {
    50
}

fn default_rss_start_page() -> u32 {
    5
}

/// Result cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_max_entries() -> usize {
    100
}

/// Optional overrides for the category tables.
///
/// Keys are category ids written as strings, since TOML tables only allow
/// string keys. A table that is present replaces the built-in one entirely.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CategoryConfig {
    /// Upstream category id -> Torznab category ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward: Option<BTreeMap<String, Vec<u32>>>,
    /// Torznab category id -> upstream category ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse: Option<BTreeMap<String, Vec<u32>>>,
}

/// Sanitized config for the health endpoint and startup logs (token redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub upstream: SanitizedUpstreamConfig,
    pub filter: FilterConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedUpstreamConfig {
    pub base_url: String,
    pub api_token_configured: bool,
    pub timeout_secs: u32,
    pub page_size: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            upstream: SanitizedUpstreamConfig {
                base_url: config.upstream.base_url.clone(),
                api_token_configured: config.upstream.fallback_token().is_some(),
                timeout_secs: config.upstream.timeout_secs,
                page_size: config.upstream.page_size,
            },
            filter: config.filter.clone(),
            cache: config.cache.clone(),
        }
    }
}
