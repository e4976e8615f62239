use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::assets::RetryPolicy;
use crate::render::RenderLimits;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Preview,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "preview" | "staging" => Self::Preview,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Preview => "preview",
            Self::Production => "production",
        }
    }

    /// Asset chain the environment starts from before `DOCS_*` overrides.
    pub fn default_assets(self) -> AssetConfig {
        let (cdn_enabled, fallback_enabled, max_attempts) = match self {
            Self::Development => (false, true, 2),
            Self::Test => (false, true, 1),
            Self::Preview => (true, true, 2),
            Self::Production => (true, false, 3),
        };
        AssetConfig {
            cdn_enabled,
            cdn_base_url: None,
            local_enabled: true,
            local_root: PathBuf::from("assets"),
            fallback_enabled,
            retry: RetryPolicy {
                max_attempts,
                ..RetryPolicy::default()
            },
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub assets: AssetConfig,
    pub render: RenderLimits,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let mut assets = environment.default_assets();
        if let Some(enabled) = env_flag("DOCS_CDN_ENABLED")? {
            assets.cdn_enabled = enabled;
        }
        assets.cdn_base_url = env::var("DOCS_CDN_BASE_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if let Ok(root) = env::var("DOCS_LOCAL_ASSET_ROOT") {
            assets.local_root = PathBuf::from(root);
        }
        if let Some(enabled) = env_flag("DOCS_CONFIG_FALLBACK")? {
            assets.fallback_enabled = enabled;
        }
        if let Some(attempts) = env_number::<usize>("DOCS_CDN_MAX_ATTEMPTS")? {
            assets.retry.max_attempts = attempts.max(1);
        }
        if let Some(backoff) = env_number::<u64>("DOCS_CDN_BACKOFF_MS")? {
            assets.retry.base_backoff_ms = backoff;
        }

        let mut render = RenderLimits::default();
        if let Some(pages) = env_number::<usize>("DOCS_MAX_PAGES")? {
            render.max_pages = pages;
        }
        if let Some(fields) = env_number::<usize>("DOCS_MAX_FIELDS")? {
            render.max_fields = fields;
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            assets,
            render,
        })
    }
}

fn env_flag(name: &'static str) -> Result<Option<bool>, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidFlag { name, value: raw }),
    }
}

fn env_number<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidNumber { name, value: raw })
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Which asset sources are consulted, and how the CDN retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetConfig {
    pub cdn_enabled: bool,
    pub cdn_base_url: Option<String>,
    pub local_enabled: bool,
    pub local_root: PathBuf,
    pub fallback_enabled: bool,
    pub retry: RetryPolicy,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { name: &'static str, value: String },
    InvalidNumber { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be true or false, found '{value}'")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a non-negative integer, found '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFlag { .. }
            | ConfigError::InvalidNumber { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "DOCS_CDN_ENABLED",
            "DOCS_CDN_BASE_URL",
            "DOCS_LOCAL_ASSET_ROOT",
            "DOCS_CONFIG_FALLBACK",
            "DOCS_CDN_MAX_ATTEMPTS",
            "DOCS_CDN_BACKOFF_MS",
            "DOCS_MAX_PAGES",
            "DOCS_MAX_FIELDS",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(!config.assets.cdn_enabled);
        assert!(config.assets.fallback_enabled);
        assert_eq!(config.assets.retry.max_attempts, 2);
        assert_eq!(config.render, RenderLimits::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn production_disables_compiled_fallback() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("DOCS_CDN_BASE_URL", "https://assets.example.com/docs");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert!(config.assets.cdn_enabled);
        assert!(!config.assets.fallback_enabled);
        assert_eq!(config.assets.retry.max_attempts, 3);
        assert_eq!(
            config.assets.cdn_base_url.as_deref(),
            Some("https://assets.example.com/docs")
        );
        reset_env();
    }

    #[test]
    fn docs_overrides_apply_on_top_of_environment() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "preview");
        env::set_var("DOCS_CDN_ENABLED", "off");
        env::set_var("DOCS_CDN_MAX_ATTEMPTS", "5");
        env::set_var("DOCS_CDN_BACKOFF_MS", "0");
        env::set_var("DOCS_LOCAL_ASSET_ROOT", "/srv/doc-assets");
        env::set_var("DOCS_MAX_PAGES", "4");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Preview);
        assert!(!config.assets.cdn_enabled);
        assert_eq!(config.assets.retry.max_attempts, 5);
        assert_eq!(config.assets.retry.base_backoff_ms, 0);
        assert_eq!(config.assets.local_root, PathBuf::from("/srv/doc-assets"));
        assert_eq!(config.render.max_pages, 4);
        reset_env();
    }

    #[test]
    fn rejects_malformed_flags_and_numbers() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DOCS_CONFIG_FALLBACK", "maybe");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidFlag {
                name: "DOCS_CONFIG_FALLBACK",
                ..
            })
        ));

        reset_env();
        env::set_var("DOCS_MAX_FIELDS", "-1");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                name: "DOCS_MAX_FIELDS",
                ..
            })
        ));
        reset_env();
    }
}
