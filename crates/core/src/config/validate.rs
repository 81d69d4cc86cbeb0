use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Upstream base URL is set and page size is positive
/// - Pagination limits are positive and the RSS start page is reachable
/// - Cache holds at least one entry
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.upstream.base_url.trim().is_empty() {
        return Err(invalid("upstream.base_url cannot be empty"));
    }
    if config.upstream.page_size == 0 {
        return Err(invalid("upstream.page_size must be at least 1"));
    }

    let filter = &config.filter;
    if filter.max_pages == 0 {
        return Err(invalid("filter.max_pages must be at least 1"));
    }
    if filter.results_limit == 0 {
        return Err(invalid("filter.results_limit must be at least 1"));
    }
    if filter.rss_start_page == 0 || filter.rss_start_page > filter.max_pages {
        return Err(ConfigError::ValidationError(format!(
            "filter.rss_start_page must be between 1 and filter.max_pages ({})",
            filter.max_pages
        )));
    }

    if config.cache.max_entries == 0 {
        return Err(invalid("cache.max_entries must be at least 1"));
    }

    for (table, entries) in [
        ("categories.forward", &config.categories.forward),
        ("categories.reverse", &config.categories.reverse),
    ] {
        if let Some(entries) = entries {
            if let Some(bad) = entries.keys().find(|k| k.trim().parse::<u32>().is_err()) {
                return Err(ConfigError::ValidationError(format!(
                    "{} has a non-numeric category id: {:?}",
                    table, bad
                )));
            }
        }
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
