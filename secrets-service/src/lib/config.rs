use std::env;

use auth::PasswordScheme;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub password: PasswordConfig,
    pub google: GoogleConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Cookie signing key, at least 64 bytes.
    pub secret: String,
    pub secure_cookie: bool,
    pub inactivity_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub scheme: PasswordScheme,
    #[serde(default)]
    pub encryption_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl PasswordConfig {
    /// Encryption key if one is configured and non-blank.
    pub fn encryption_key(&self) -> Option<&str> {
        self.encryption_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. `PORT` (conventional hosting override for server.port)
    /// 2. Environment variables (DATABASE__URL, GOOGLE__CLIENT_ID, etc.)
    /// 3. Environment-specific config file (config/{RUN_MODE}.toml)
    /// 4. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: SESSION__SECRET=... overrides session.secret
            .add_source(Environment::default().separator("__"))
            .set_override_option("server.port", env::var("PORT").ok())?
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}
