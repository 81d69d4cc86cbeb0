use std::sync::Arc;
use gffree_core::{Config, ProxyEndpoint, ResultCache, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    endpoint: ProxyEndpoint,
}

impl AppState {
    pub fn new(config: Config, endpoint: ProxyEndpoint) -> Self {
        Self { config, endpoint }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn endpoint(&self) -> &ProxyEndpoint {
        &self.endpoint
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        self.endpoint.cache()
    }
}
