use figment::{
    providers::{Env, Format, Toml},
    value::Uncased,
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides; nested keys use `__`
/// (`GFFREE_UPSTREAM__API_TOKEN` -> `upstream.api_token`).
pub const CONFIG_ENV_PREFIX: &str = "GFFREE_";

/// Flat variable names accepted for compatibility with older deployments.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("gf_base_url", "upstream.base_url"),
    ("gf_api_token", "upstream.api_token"),
    ("min_age_hours", "filter.min_age_hours"),
    ("max_pages", "filter.max_pages"),
    ("results_limit", "filter.results_limit"),
    ("cache_ttl_seconds", "cache.ttl_secs"),
];

fn legacy_env() -> Env {
    let names: Vec<&str> = LEGACY_ENV_KEYS.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        LEGACY_ENV_KEYS
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, path)| Uncased::from(*path))
            .unwrap_or_else(|| Uncased::from(key))
    })
}

fn with_env(figment: Figment) -> Figment {
    figment
        .merge(legacy_env())
        .merge(Env::prefixed(CONFIG_ENV_PREFIX).split("__"))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    with_env(Figment::new().merge(Toml::file(path)))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from defaults and environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    with_env(Figment::new())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[server]
port = 9000

[filter]
results_limit = 10
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.filter.results_limit, 10);
    }

    #[test]
    fn test_load_config_from_str_wrong_type() {
        let toml = r#"
[server]
port = "not-a-port"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[upstream]
page_size = 10
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.upstream.page_size, 10);
    }

    #[test]
    fn test_prefixed_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
[filter]
min_age_hours = 40
max_pages = 3
"#,
            )?;
            jail.set_env("GFFREE_FILTER__MIN_AGE_HOURS", "48");
            jail.set_env("GFFREE_UPSTREAM__API_TOKEN", "from-env");

            let config = load_config(Path::new("config.toml")).unwrap();
            assert_eq!(config.filter.min_age_hours, 48);
            assert_eq!(config.filter.max_pages, 3);
            assert_eq!(config.upstream.api_token, "from-env");
            Ok(())
        });
    }

    #[test]
    fn test_legacy_env_names() {
        Jail::expect_with(|jail| {
            jail.set_env("GF_API_TOKEN", "legacy-token");
            jail.set_env("MIN_AGE_HOURS", "36");
            jail.set_env("CACHE_TTL_SECONDS", "120");

            let config = load_config_from_env().unwrap();
            assert_eq!(config.upstream.api_token, "legacy-token");
            assert_eq!(config.filter.min_age_hours, 36);
            assert_eq!(config.cache.ttl_secs, 120);
            assert_eq!(config.filter.max_pages, 20);
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_beats_legacy_env() {
        Jail::expect_with(|jail| {
            jail.set_env("MAX_PAGES", "7");
            jail.set_env("GFFREE_FILTER__MAX_PAGES", "9");

            let config = load_config_from_env().unwrap();
            assert_eq!(config.filter.max_pages, 9);
            Ok(())
        });
    }
}
