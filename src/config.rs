use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use relay_core::Credentials;
use relay_gateway::GatewayShape;
use relay_openai::CompletionSettings;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Chat-completion provider configuration
    pub completion: CompletionConfig,
    /// SMS gateway configuration
    pub gateway: GatewayConfig,
    /// Delivery report handling
    pub delivery_report: DeliveryReportConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 81)
    pub port: u16,
}

/// Chat-completion provider configuration
#[derive(Deserialize, Serialize, Clone)]
pub struct CompletionConfig {
    /// API key sent as a bearer token
    pub api_key: String,
    /// API base URL (default: https://api.openai.com/v1)
    pub base_url: String,
    /// Model identifier (default: gpt-4)
    pub model: String,
    /// Output token budget (default: 200)
    pub max_tokens: u32,
    /// Request timeout in seconds (default: 10)
    pub timeout_seconds: u64,
}

/// SMS gateway configuration
#[derive(Deserialize, Serialize, Clone)]
pub struct GatewayConfig {
    /// Call shape: "xml" (GET + query string) or "json" (POST) (default: xml)
    pub shape: GatewayShape,
    /// Gateway base URL
    pub base_url: String,
    /// Basic auth username
    pub username: String,
    /// Basic auth password
    pub password: String,
    /// Request extended (concatenated) messages (default: true)
    pub ems: bool,
    /// Request timeout in seconds (default: 5)
    pub timeout_seconds: u64,
}

/// Delivery report configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DeliveryReportConfig {
    /// Reject reports missing any of FN, TN, SC, ST, RF, TS (default: true)
    pub require_all_fields: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: json or pretty (default: json)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 81,
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: relay_openai::DEFAULT_BASE_URL.to_string(),
            model: relay_openai::DEFAULT_MODEL.to_string(),
            max_tokens: relay_openai::DEFAULT_MAX_TOKENS,
            timeout_seconds: 10,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            shape: GatewayShape::default(),
            base_url: relay_gateway::DEFAULT_BASE_URL.to_string(),
            username: String::new(),
            password: String::new(),
            ems: true,
            timeout_seconds: 5,
        }
    }
}

impl Default for DeliveryReportConfig {
    fn default() -> Self {
        Self {
            require_all_fields: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("shape", &self.shape)
            .field("base_url", &self.base_url)
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .field("ems", &self.ems)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl CompletionConfig {
    pub fn settings(&self) -> CompletionSettings {
        CompletionSettings {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

impl GatewayConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Self::layered()?
            // Add configuration file based on environment
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local configuration file (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (e.g. SMSRELAY_GATEWAY__SHAPE=json)
            .add_source(
                Environment::with_prefix("SMSRELAY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            // Variable names the gateway and provider documentation use
            .set_override_option("completion.api_key", env::var("OPENAI_API_KEY").ok())?
            .set_override_option("gateway.username", env::var("OCEP_SMS_USERNAME").ok())?
            .set_override_option("gateway.password", env::var("OCEP_SMS_PASSWORD").ok())?
            .build()?;

        s.try_deserialize()
    }

    /// Defaults plus the shared `config/default` file.
    fn layered() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name("config/default").required(false)))
    }

    /// Reject configurations the relay cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.completion.api_key.is_empty() {
            return Err(ConfigError::Message(
                "completion.api_key is not set (OPENAI_API_KEY)".into(),
            ));
        }
        if self.gateway.username.is_empty() || self.gateway.password.is_empty() {
            return Err(ConfigError::Message(
                "gateway credentials are not set (OCEP_SMS_USERNAME / OCEP_SMS_PASSWORD)".into(),
            ));
        }
        if self.completion.timeout_seconds == 0 || self.gateway.timeout_seconds == 0 {
            return Err(ConfigError::Message("timeouts must be at least one second".into()));
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(ConfigError::Message(format!(
                "logging.format must be json or pretty, got {}",
                self.logging.format
            )));
        }
        Ok(())
    }
}
