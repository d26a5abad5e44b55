use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use libris_authz::ApiKey;
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "LIBRIS_ENV";
const CONFIG_DIR_ENV: &str = "LIBRIS_CONFIG_DIR";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub pagination: PaginationSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// and `LIBRIS_<SECTION>__<KEY>` variables.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{environment}.toml"));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix("LIBRIS")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = match environment.as_str() {
            "local" => Environment::Local,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                return Err(anyhow!(
                    "unsupported environment '{}'; expected local/staging/production",
                    other
                ));
            }
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject combinations the services cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.pagination.default_limit == 0 {
            return Err(anyhow!("pagination.default_limit must be at least 1"));
        }
        if self.pagination.max_limit < self.pagination.default_limit {
            return Err(anyhow!(
                "pagination.max_limit ({}) is below pagination.default_limit ({})",
                self.pagination.max_limit,
                self.pagination.default_limit
            ));
        }
        if self.cache.books_ttl_secs == 0 || self.cache.authors_ttl_secs == 0 {
            return Err(anyhow!("cache TTLs must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_url")]
    pub url: String,
    #[serde(default = "DatabaseSettings::default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseSettings {
    fn default_url() -> String {
        "sqlite://libris.db".to_string()
    }

    fn default_max_connections() -> u32 {
        5
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            max_connections: Self::default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "CacheSettings::default_max_capacity")]
    pub max_capacity: u64,
    #[serde(default = "CacheSettings::default_books_ttl_secs")]
    pub books_ttl_secs: u64,
    #[serde(default = "CacheSettings::default_authors_ttl_secs")]
    pub authors_ttl_secs: u64,
}

impl CacheSettings {
    fn default_max_capacity() -> u64 {
        10_000
    }

    fn default_books_ttl_secs() -> u64 {
        6000
    }

    fn default_authors_ttl_secs() -> u64 {
        60
    }

    pub fn books_ttl(&self) -> Duration {
        Duration::from_secs(self.books_ttl_secs)
    }

    pub fn authors_ttl(&self) -> Duration {
        Duration::from_secs(self.authors_ttl_secs)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_capacity: Self::default_max_capacity(),
            books_ttl_secs: Self::default_books_ttl_secs(),
            authors_ttl_secs: Self::default_authors_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationSettings {
    #[serde(default = "PaginationSettings::default_limit")]
    pub default_limit: u32,
    #[serde(default = "PaginationSettings::default_max_limit")]
    pub max_limit: u32,
}

impl PaginationSettings {
    fn default_limit() -> u32 {
        3
    }

    fn default_max_limit() -> u32 {
        100
    }
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_limit: Self::default_limit(),
            max_limit: Self::default_max_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthSettings {
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_pagination_matches_list_endpoint_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.pagination.default_limit, 3);
        assert_eq!(settings.pagination.max_limit, 100);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn default_cache_ttls_are_per_resource() {
        let settings = Settings::default();
        assert_eq!(settings.cache.books_ttl(), Duration::from_secs(6000));
        assert_eq!(settings.cache.authors_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let mut settings = Settings::default();
        settings.cache.authors_ttl_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn api_keys_load_from_toml() {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [[auth.api_keys]]
                name = "ops"
                key = "secret"
                roles = ["admin"]
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let settings: Settings = cfg.try_deserialize().unwrap();
        assert_eq!(settings.auth.api_keys.len(), 1);
        assert_eq!(settings.auth.api_keys[0].name, "ops");
    }
}
