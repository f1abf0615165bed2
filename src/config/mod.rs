use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use url::Url;

/// Errors raised while assembling the configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub supabase: SupabaseConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Which `DataStore` implementation the server talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Supabase,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: String,
    #[serde(skip_serializing)]
    pub key: String,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    /// Seconds; bounds every call made by the store client
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub project_name: String,
    pub prefix: String,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub pet_photos_bucket: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV")
            .or_else(|| lookup("ENVIRONMENT"))
            .as_deref()
        {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(&lookup)?;

        config.validate()?;
        Ok(config)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Supabase
        if let Some(v) = lookup("SUPABASE_URL") {
            self.supabase.url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("SUPABASE_KEY") {
            self.supabase.key = v;
        }
        if let Some(v) = lookup("SUPABASE_JWT_SECRET") {
            self.supabase.jwt_secret = v;
        }

        // Database overrides
        if let Some(v) = lookup("STORE_BACKEND") {
            self.database.backend = match v.to_ascii_lowercase().as_str() {
                "supabase" => StoreBackend::Supabase,
                "memory" => StoreBackend::Memory,
                _ => return Err(ConfigError::Invalid { name: "STORE_BACKEND", value: v }),
            };
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = match v.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => return Err(ConfigError::Invalid { name: "DATABASE_CONNECTION_TIMEOUT", value: v }),
            };
        }

        // API overrides
        if let Some(v) = lookup("API_HOST") {
            self.api.host = v;
        }
        if let Some(v) = lookup("API_PORT") {
            self.api.port = v
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "API_PORT", value: v.clone() })?;
        }
        if let Some(v) = lookup("PROJECT_NAME") {
            self.api.project_name = v;
        }
        if let Some(v) = lookup("API_V1_STR") {
            self.api.prefix = normalize_prefix(&v);
        }
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Storage overrides
        if let Some(v) = lookup("STORAGE_PET_PHOTOS_BUCKET") {
            self.storage.pet_photos_bucket = v;
        }

        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.supabase.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("SUPABASE_JWT_SECRET"));
        }
        if self.database.backend == StoreBackend::Supabase {
            if self.supabase.url.is_empty() {
                return Err(ConfigError::Missing("SUPABASE_URL"));
            }
            let http_base = Url::parse(&self.supabase.url)
                .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
                .unwrap_or(false);
            if !http_base {
                return Err(ConfigError::Invalid { name: "SUPABASE_URL", value: self.supabase.url.clone() });
            }
            if self.supabase.key.is_empty() {
                return Err(ConfigError::Missing("SUPABASE_KEY"));
            }
        }
        Ok(())
    }

    /// `host:port` string handed to the TCP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            supabase: SupabaseConfig::empty(),
            database: DatabaseConfig {
                backend: StoreBackend::Supabase,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                ..ApiConfig::base()
            },
            security: SecurityConfig {
                cors_origins: vec![
                    "http://localhost:5173".to_string(),
                    "http://127.0.0.1:5173".to_string(),
                    "http://localhost:4173".to_string(),
                ],
            },
            storage: StorageConfig::base(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            supabase: SupabaseConfig::empty(),
            database: DatabaseConfig {
                backend: StoreBackend::Supabase,
                connection_timeout: 10,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
                ..ApiConfig::base()
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.pawtracker.app".to_string()],
            },
            storage: StorageConfig::base(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            supabase: SupabaseConfig::empty(),
            database: DatabaseConfig {
                backend: StoreBackend::Supabase,
                connection_timeout: 5,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
                ..ApiConfig::base()
            },
            security: SecurityConfig {
                cors_origins: vec!["https://pawtracker.app".to_string()],
            },
            storage: StorageConfig::base(),
        }
    }
}

impl SupabaseConfig {
    fn empty() -> Self {
        Self {
            url: String::new(),
            key: String::new(),
            jwt_secret: String::new(),
        }
    }
}

impl ApiConfig {
    fn base() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            project_name: "PawTracker API".to_string(),
            prefix: "/api".to_string(),
            enable_request_logging: true,
            max_request_size_bytes: 10 * 1024 * 1024,
        }
    }
}

impl StorageConfig {
    fn base() -> Self {
        Self {
            pet_photos_bucket: "pet_photos".to_string(),
        }
    }
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
