//! Configuration for the analytics gateway

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Analytics gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Analytics engine configuration
    pub engine: EngineConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

/// Analytics engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base endpoint of the engine's load API
    pub base_url: String,
    /// Bearer token presented to the engine; has no usable default and must
    /// come from the config file or `ANALYTICS__ENGINE__BEARER_TOKEN`
    pub bearer_token: String,
    /// Engine request timeout in seconds
    pub request_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins; `"*"` allows any origin (development only)
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers
    pub allowed_headers: Vec<String>,
    /// Allow credentials
    pub allow_credentials: bool,
    /// Max age for preflight requests
    pub max_age_seconds: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5111,
                max_body_size: 1024 * 1024, // 1MB
            },
            engine: EngineConfig {
                base_url:
                    "https://disastrous-spencerville.gcp-us-central1.cubecloudapp.dev/cubejs-api/v1/load"
                        .to_string(),
                bearer_token: String::new(),
                request_timeout_secs: 30,
            },
            cors: CorsConfig {
                enabled: true,
                allowed_origins: vec!["*".to_string()],
                allowed_methods: vec![
                    "GET".to_string(),
                    "POST".to_string(),
                    "PUT".to_string(),
                    "DELETE".to_string(),
                    "OPTIONS".to_string(),
                ],
                allowed_headers: vec![
                    "Authorization".to_string(),
                    "Content-Type".to_string(),
                    "X-Requested-With".to_string(),
                ],
                allow_credentials: false,
                max_age_seconds: 86400, // 24 hours
            },
        }
    }
}

impl GatewayConfig {
    /// Load configuration from file and environment
    ///
    /// The file is optional; defaults are used for anything it omits, and
    /// `ANALYTICS__*` environment variables override both (for example
    /// `ANALYTICS__ENGINE__BEARER_TOKEN`).
    pub fn from_file(path: &str) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())?;
        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("ANALYTICS").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Get server address
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Validate settings that must be explicit before serving traffic
    pub fn validate(&self) -> Result<()> {
        if self.engine.base_url.trim().is_empty() {
            return Err(anyhow!("engine.base_url must not be empty"));
        }
        if self.engine.bearer_token.trim().is_empty() {
            return Err(anyhow!(
                "engine.bearer_token is not set; provide it in the config file or via ANALYTICS__ENGINE__BEARER_TOKEN"
            ));
        }
        if self.cors.enabled
            && self.cors.allow_credentials
            && self.cors.allowed_origins.iter().any(|origin| origin == "*")
        {
            return Err(anyhow!(
                "cors.allow_credentials cannot be combined with a wildcard origin"
            ));
        }
        Ok(())
    }
}
