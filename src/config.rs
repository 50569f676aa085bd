use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Ringkas server.
#[derive(Debug)]
pub struct Config {
    /// API key authenticating requests to the generation service.
    pub generation_api_key: String,
    /// Model identifier passed to the generation service.
    pub generation_model: String,
    /// Optional base-URL override for the generation service (used by tests
    /// to point the client at a local mock).
    pub generation_url: Option<String>,
    /// Summary language used when an upload omits the `language` field.
    pub default_language: String,
    /// Directory holding uploaded files for the duration of one request.
    pub upload_dir: PathBuf,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            generation_api_key: load_env("GEMINI_API_KEY")?,
            generation_model: load_env_optional("GENERATION_MODEL")
                .unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            generation_url: load_env_optional("GENERATION_URL"),
            default_language: load_env_optional("DEFAULT_LANGUAGE")
                .unwrap_or_else(|| "Indonesian".to_string()),
            upload_dir: load_env_optional("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        model = %config.generation_model,
        default_language = %config.default_language,
        upload_dir = %config.upload_dir.display(),
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
