use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid URL in {name}: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Token lifetimes from one hour up to a year.
const TOKEN_HOURS: std::ops::RangeInclusive<u64> = 1..=8760;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub pagination: PaginationConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Upper bound for every single store or cache call.
    pub operation_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub url: Option<String>,
    /// Zero means entries never expire.
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_response_compression: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub password_hash_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()?;

        config.validate()?;
        Ok(config)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.server.operation_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Server overrides
        if let Ok(v) = env::var("PORT") {
            self.server.port = parse_var("PORT", &v)?;
        }
        if let Ok(v) = env::var("OPERATION_TIMEOUT_SECS") {
            self.server.operation_timeout_secs = parse_var("OPERATION_TIMEOUT_SECS", &v)?;
        }

        // Database overrides
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.database.backend = match v.as_str() {
                "postgres" => StoreBackend::Postgres,
                "memory" => StoreBackend::Memory,
                _ => return Err(ConfigError::InvalidValue { name: "STORE_BACKEND", value: v }),
            };
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse_var("DATABASE_CONNECTION_TIMEOUT", &v)?;
        }

        // Cache overrides
        if let Ok(v) = env::var("CACHE_BACKEND") {
            self.cache.backend = match v.as_str() {
                "redis" => CacheBackend::Redis,
                "memory" => CacheBackend::Memory,
                _ => return Err(ConfigError::InvalidValue { name: "CACHE_BACKEND", value: v }),
            };
        }
        if let Ok(v) = env::var("REDIS_URL") {
            self.cache.url = Some(v);
        }
        if let Ok(v) = env::var("CACHE_TTL_SECS") {
            self.cache.ttl_secs = parse_var("CACHE_TTL_SECS", &v)?;
        }

        // Pagination overrides
        if let Ok(v) = env::var("PAGINATION_DEFAULT_LIMIT") {
            self.pagination.default_limit = parse_var("PAGINATION_DEFAULT_LIMIT", &v)?;
        }
        if let Ok(v) = env::var("PAGINATION_MAX_LIMIT") {
            self.pagination.max_limit = parse_var("PAGINATION_MAX_LIMIT", &v)?;
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RESPONSE_COMPRESSION") {
            self.api.enable_response_compression = parse_var("API_ENABLE_RESPONSE_COMPRESSION", &v)?;
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = parse_var("API_MAX_REQUEST_SIZE_BYTES", &v)?;
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = parse_var("SECURITY_ENABLE_CORS", &v)?;
        }
        if let Ok(v) = env::var("API_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("TOKEN_HOUR_LIFESPAN") {
            self.security.jwt_expiry_hours = parse_var("TOKEN_HOUR_LIFESPAN", &v)?;
        }
        if let Ok(v) = env::var("PASSWORD_HASH_COST") {
            self.security.password_hash_cost = parse_var("PASSWORD_HASH_COST", &v)?;
        }

        Ok(self)
    }

    /// Checks cross-field requirements after presets and overrides are merged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("API_SECRET"));
        }
        if self.database.backend == StoreBackend::Postgres {
            let url = self.database.url.as_deref().ok_or(ConfigError::Missing("DATABASE_URL"))?;
            check_url("DATABASE_URL", url)?;
        }
        if self.cache.backend == CacheBackend::Redis {
            let url = self.cache.url.as_deref().ok_or(ConfigError::Missing("REDIS_URL"))?;
            check_url("REDIS_URL", url)?;
        }
        if !TOKEN_HOURS.contains(&self.security.jwt_expiry_hours) {
            return Err(ConfigError::InvalidValue {
                name: "TOKEN_HOUR_LIFESPAN",
                value: self.security.jwt_expiry_hours.to_string(),
            });
        }
        if !(4..=31).contains(&self.security.password_hash_cost) {
            return Err(ConfigError::InvalidValue {
                name: "PASSWORD_HASH_COST",
                value: self.security.password_hash_cost.to_string(),
            });
        }
        if self.pagination.default_limit < 1 || self.pagination.max_limit < self.pagination.default_limit {
            return Err(ConfigError::InvalidValue {
                name: "PAGINATION_DEFAULT_LIMIT",
                value: self.pagination.default_limit.to_string(),
            });
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 8080,
                operation_timeout_secs: 10,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            cache: CacheConfig {
                backend: CacheBackend::Memory,
                url: None,
                ttl_secs: 0,
            },
            pagination: PaginationConfig {
                default_limit: 20,
                max_limit: 1000,
            },
            api: ApiConfig {
                enable_response_compression: false,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                jwt_secret: "development-secret".to_string(),
                jwt_expiry_hours: 24,
                password_hash_cost: 4,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 8080,
                operation_timeout_secs: 10,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            cache: CacheConfig {
                backend: CacheBackend::Redis,
                url: None,
                ttl_secs: 0,
            },
            pagination: PaginationConfig {
                default_limit: 20,
                max_limit: 500,
            },
            api: ApiConfig {
                enable_response_compression: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                password_hash_cost: bcrypt::DEFAULT_COST,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8080,
                operation_timeout_secs: 10,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            cache: CacheConfig {
                backend: CacheBackend::Redis,
                url: None,
                ttl_secs: 0,
            },
            pagination: PaginationConfig {
                default_limit: 20,
                max_limit: 100,
            },
            api: ApiConfig {
                enable_response_compression: true,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: false,
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                password_hash_cost: bcrypt::DEFAULT_COST,
            },
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

fn check_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidUrl { name, reason: e.to_string() })
}

/// Strips credentials from a connection URL so it can be logged.
pub fn redact_url(value: &str) -> String {
    match url::Url::parse(value) {
        Ok(mut url) => {
            let _ = url.set_username("");
            let _ = url.set_password(None);
            url.to_string()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}
