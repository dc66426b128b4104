//! Configuration management for ScholarMatch services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/<env>, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration (professor cache store)
    pub database: DatabaseConfig,

    /// Redis configuration (session store)
    pub redis: RedisConfig,

    /// Tool provider endpoints
    pub tools: ToolsConfig,

    /// Text-generation oracle configuration
    pub oracle: OracleConfig,

    /// Matching pipeline tunables
    pub matching: MatchingConfig,

    /// Uploaded-document storage configuration
    pub storage: StorageConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    /// Redis URL
    pub url: String,

    /// Session TTL in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Key prefix for namespacing
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

/// Endpoints for the RPC-style tool providers.
///
/// Each provider exposes operations behind a uniform invoke contract; the
/// gateway treats every failure as "no data" rather than an error.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Web search service base URL
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// University directory/page extraction service base URL
    #[serde(default = "default_university_url")]
    pub university_url: String,

    /// Scholarly-graph lookup service base URL
    #[serde(default = "default_scholar_url")]
    pub scholar_url: String,

    /// Document (CV) parsing service base URL
    #[serde(default = "default_document_url")]
    pub document_url: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OracleConfig {
    /// Generation endpoint
    #[serde(default = "default_oracle_endpoint")]
    pub endpoint: String,

    /// API key (unset ⇒ requests are sent without auth header)
    pub api_key: Option<String>,

    /// Model name
    #[serde(default = "default_oracle_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// Maximum in-flight profile enrichments
    #[serde(default = "default_enrichment_concurrency")]
    pub enrichment_concurrency: usize,

    /// Professor cache TTL in days
    #[serde(default = "default_cache_ttl_days")]
    pub cache_ttl_days: i64,

    /// Candidate list size above which the relevance filter engages
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Maximum ranked matches returned
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,

    /// Number of leading research interests used for discovery
    #[serde(default = "default_max_interests")]
    pub max_interests: usize,

    /// Publications fetched per matched scholar
    #[serde(default = "default_publications_limit")]
    pub publications_limit: usize,

    /// Publication lookback window in years
    #[serde(default = "default_publications_years")]
    pub publications_years: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding uploaded documents, laid out as
    /// `<dir>/<session_id>/<file_id><ext>`
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_session_ttl() -> u64 { 86_400 }
fn default_key_prefix() -> String { "scholarmatch".to_string() }
fn default_search_url() -> String { "http://localhost:7311".to_string() }
fn default_university_url() -> String { "http://localhost:7312".to_string() }
fn default_scholar_url() -> String { "http://localhost:7313".to_string() }
fn default_document_url() -> String { "http://localhost:7314".to_string() }
fn default_tool_timeout() -> u64 { 60 }
fn default_oracle_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_oracle_model() -> String { "gpt-4o-mini".to_string() }
fn default_oracle_timeout() -> u64 { 60 }
fn default_enrichment_concurrency() -> usize { 20 }
fn default_cache_ttl_days() -> i64 { crate::CACHE_TTL_DAYS }
fn default_max_candidates() -> usize { 30 }
fn default_max_matches() -> usize { 10 }
fn default_max_interests() -> usize { 3 }
fn default_publications_limit() -> usize { 20 }
fn default_publications_years() -> usize { 5 }
fn default_upload_dir() -> String { "uploads".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "scholarmatch".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Professor cache TTL as a chrono duration
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.matching.cache_ttl_days)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                request_timeout_secs: default_request_timeout(),
                shutdown_timeout_secs: default_shutdown_timeout(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/scholarmatch".to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                session_ttl_secs: default_session_ttl(),
                key_prefix: default_key_prefix(),
            },
            tools: ToolsConfig {
                search_url: default_search_url(),
                university_url: default_university_url(),
                scholar_url: default_scholar_url(),
                document_url: default_document_url(),
                timeout_secs: default_tool_timeout(),
            },
            oracle: OracleConfig {
                endpoint: default_oracle_endpoint(),
                api_key: None,
                model: default_oracle_model(),
                timeout_secs: default_oracle_timeout(),
            },
            matching: MatchingConfig::default(),
            storage: StorageConfig {
                upload_dir: default_upload_dir(),
            },
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: default_json_logging(),
                metrics_port: default_metrics_port(),
                service_name: default_service_name(),
            },
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            enrichment_concurrency: default_enrichment_concurrency(),
            cache_ttl_days: default_cache_ttl_days(),
            max_candidates: default_max_candidates(),
            max_matches: default_max_matches(),
            max_interests: default_max_interests(),
            publications_limit: default_publications_limit(),
            publications_years: default_publications_years(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.matching.enrichment_concurrency, 20);
        assert_eq!(config.matching.cache_ttl_days, 7);
        assert_eq!(config.matching.max_candidates, 30);
    }

    #[test]
    fn test_cache_ttl_duration() {
        let config = AppConfig::default();
        assert_eq!(config.cache_ttl(), chrono::Duration::days(7));
    }
}
