//! API Configuration Module
//!
//! Server, CORS, and rate limiting settings. Configuration is loaded from
//! environment variables with defaults suited to local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BIND_HOST, DEFAULT_CORS_MAX_AGE_SECS, DEFAULT_PORT, DEFAULT_RATE_LIMIT_MAX,
    DEFAULT_RATE_LIMIT_WINDOW_SECS,
};
use crate::error::{ApiError, ApiResult};

/// Read an environment variable and parse it, falling back on absence or
/// parse failure.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a boolean flag. Only the literal opposite of `default` flips it.
fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(s) if default => s.to_lowercase() != "false",
        Ok(s) => s.to_lowercase() == "true",
        Err(_) => default,
    }
}

// ============================================================================
// SERVER CONFIGURATION
// ============================================================================

/// Which [`orchestra_storage::Store`] backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StoreKind::Postgres),
            "memory" | "in-memory" | "mem" => Ok(StoreKind::Memory),
            other => Err(ApiError::invalid_input(format!(
                "Unknown store kind '{}'. Expected 'postgres' or 'memory'",
                other
            ))),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("ORCHESTRA_LOG_FORMAT") {
            Ok(s) if s.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Process-level settings read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_host: String,
    pub port: u16,
    pub store: StoreKind,
    /// Seed an empty store before serving
    pub seed_on_start: bool,
    /// `development`, `staging`, `production`, ...
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: DEFAULT_BIND_HOST.to_string(),
            port: DEFAULT_PORT,
            store: StoreKind::Postgres,
            seed_on_start: false,
            environment: "development".to_string(),
        }
    }
}

impl ServerConfig {
    /// Create ServerConfig from environment variables.
    ///
    /// Environment variables:
    /// - `ORCHESTRA_API_BIND`: Bind host (default: 0.0.0.0)
    /// - `PORT` or `ORCHESTRA_API_PORT`: Listen port (default: 3002)
    /// - `ORCHESTRA_STORE`: `postgres` or `memory` (default: postgres)
    /// - `ORCHESTRA_SEED_ON_START`: "true" or "false" (default: false)
    /// - `ORCHESTRA_ENVIRONMENT`: Deployment environment (default: development)
    ///
    /// Unlike the other settings, a malformed port or store kind is an
    /// error rather than silently defaulted.
    pub fn from_env() -> ApiResult<Self> {
        let bind_host =
            std::env::var("ORCHESTRA_API_BIND").unwrap_or_else(|_| DEFAULT_BIND_HOST.to_string());

        let port = match std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("ORCHESTRA_API_PORT").ok())
        {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", raw)))?,
            None => DEFAULT_PORT,
        };

        let store = match std::env::var("ORCHESTRA_STORE") {
            Ok(raw) => raw.parse()?,
            Err(_) => StoreKind::Postgres,
        };

        Ok(Self {
            bind_host,
            port,
            store,
            seed_on_start: env_flag("ORCHESTRA_SEED_ON_START", false),
            environment: std::env::var("ORCHESTRA_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        })
    }

    /// Resolve the socket address to listen on.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
    }

    /// Check if running in a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS and rate limiting.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Rate Limiting Configuration
    // ========================================================================
    /// Whether rate limiting is enabled.
    pub rate_limit_enabled: bool,

    /// Requests allowed per window per client address.
    pub rate_limit_max: u32,

    /// Window over which `rate_limit_max` applies.
    pub rate_limit_window: Duration,

    /// Key the limiter on `X-Forwarded-For` / `X-Real-IP` instead of the
    /// peer address. Only safe behind a proxy that overwrites them.
    pub trust_proxy_headers: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
            rate_limit_enabled: true,
            rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
            rate_limit_window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS),
            trust_proxy_headers: false,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `ORCHESTRA_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `ORCHESTRA_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `ORCHESTRA_RATE_LIMIT_ENABLED`: "true" or "false" (default: true)
    /// - `ORCHESTRA_RATE_LIMIT_MAX`: Requests per window per address (default: 100)
    /// - `ORCHESTRA_RATE_LIMIT_WINDOW_SECS`: Window length (default: 900)
    /// - `ORCHESTRA_TRUST_PROXY_HEADERS`: "true" behind a reverse proxy (default: false)
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("ORCHESTRA_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            cors_origins,
            cors_max_age_secs: env_or("ORCHESTRA_CORS_MAX_AGE_SECS", DEFAULT_CORS_MAX_AGE_SECS),
            rate_limit_enabled: env_flag("ORCHESTRA_RATE_LIMIT_ENABLED", true),
            rate_limit_max: env_or("ORCHESTRA_RATE_LIMIT_MAX", DEFAULT_RATE_LIMIT_MAX),
            rate_limit_window: Duration::from_secs(env_or(
                "ORCHESTRA_RATE_LIMIT_WINDOW_SECS",
                DEFAULT_RATE_LIMIT_WINDOW_SECS,
            )),
            trust_proxy_headers: env_flag("ORCHESTRA_TRUST_PROXY_HEADERS", false),
        }
    }

    /// Configuration with rate limiting off, for in-process tests.
    pub fn unlimited() -> Self {
        Self {
            rate_limit_enabled: false,
            ..Self::default()
        }
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }
        self.cors_origins.iter().any(|allowed| allowed == origin)
    }

    /// Reject settings that are unsafe outside development.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        if self.cors_origins.is_empty() {
            return Err(ApiError::invalid_input(
                "CORS origins not configured for production. Set ORCHESTRA_CORS_ORIGINS.",
            ));
        }
        if !self.rate_limit_enabled {
            tracing::warn!(
                "Rate limiting is disabled in production. \
                 Set ORCHESTRA_RATE_LIMIT_ENABLED=true to enable it."
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EnvVarGuard {
        key: &'static str,
        original: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let original = std::env::var(key).ok();
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
            Self { key, original }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.original.as_deref() {
                Some(v) => std::env::set_var(self.key, v),
                None => std::env::remove_var(self.key),
            }
        }
    }

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.cors_max_age_secs, 86400);
        assert!(config.rate_limit_enabled);
        assert_eq!(config.rate_limit_max, 100);
        assert_eq!(config.rate_limit_window, Duration::from_secs(900));
        assert!(!config.trust_proxy_headers);
    }

    #[test]
    fn test_origin_allowed_dev_mode() {
        let config = ApiConfig::default();
        assert!(config.is_origin_allowed("https://anything.com"));
        assert!(config.is_origin_allowed("http://localhost:5173"));
    }

    #[test]
    fn test_origin_allowed_with_list() {
        let config = ApiConfig {
            cors_origins: vec!["http://localhost:5173".to_string()],
            ..ApiConfig::default()
        };
        assert!(config.is_origin_allowed("http://localhost:5173"));
        assert!(!config.is_origin_allowed("https://evil.example"));
    }

    #[test]
    fn test_production_requires_origins() {
        assert!(ApiConfig::default().validate_for_production().is_err());
        let config = ApiConfig {
            cors_origins: vec!["https://orchestra.example".to_string()],
            ..ApiConfig::default()
        };
        assert!(config.validate_for_production().is_ok());
    }

    #[test]
    fn test_store_kind_parsing() {
        assert_eq!("postgres".parse::<StoreKind>().ok(), Some(StoreKind::Postgres));
        assert_eq!("Memory".parse::<StoreKind>().ok(), Some(StoreKind::Memory));
        assert!("redis".parse::<StoreKind>().is_err());
    }

    #[test]
    fn test_server_config_defaults() {
        let defaults = ServerConfig::default();
        assert_eq!(defaults.port, 3002);
        assert_eq!(defaults.bind_addr().unwrap().to_string(), "0.0.0.0:3002");
        assert!(!defaults.is_production());
    }

    // Single test for everything that touches process env, so parallel
    // tests never observe each other's variables.
    #[test]
    fn test_server_config_env() {
        let _store = EnvVarGuard::set("ORCHESTRA_STORE", Some("memory"));
        let _seed = EnvVarGuard::set("ORCHESTRA_SEED_ON_START", Some("true"));
        let _bind = EnvVarGuard::set("ORCHESTRA_API_BIND", Some("127.0.0.1"));
        let _env = EnvVarGuard::set("ORCHESTRA_ENVIRONMENT", Some("production"));
        {
            let _port = EnvVarGuard::set("PORT", Some("4010"));
            let config = ServerConfig::from_env().unwrap();
            assert_eq!(config.port, 4010);
            assert_eq!(config.store, StoreKind::Memory);
            assert!(config.seed_on_start);
            assert!(config.is_production());
            assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:4010");
        }
        {
            let _port = EnvVarGuard::set("PORT", Some("not-a-port"));
            assert!(ServerConfig::from_env().is_err());
        }
    }
}
