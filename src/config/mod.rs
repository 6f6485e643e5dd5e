use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

use crate::web::uploads::MAX_FILE_SIZE;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Bearer tokens are issued by the external identity provider and signed
/// with a shared HS256 secret.
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub audience: Option<String>,
    pub issuer: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub dir: String,
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: "uploads".to_string(),
            max_bytes: MAX_FILE_SIZE,
        }
    }
}

/// Secret baked into `Settings::default()`; never accepted at startup.
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // THESIS_HUB__ prefix, double underscore separates levels
        Self::load(Environment::with_prefix("THESIS_HUB").separator("__"))
    }

    fn load(environment: Environment) -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("database.url", "sqlite://thesis_hub.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("uploads.dir", "uploads")?
            .set_default("uploads.max_bytes", MAX_FILE_SIZE as i64)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            .add_source(environment)

            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.ensure_secure()?;
        Ok(settings)
    }

    /// The bearer secret guards every publisher route, so a blank or
    /// built-in one is a configuration error.
    pub fn ensure_secure(&self) -> Result<(), ConfigError> {
        let secret = self.auth.jwt_secret.trim();
        if secret.is_empty() || secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::Message(
                "auth.jwt_secret must be set (THESIS_HUB__AUTH__JWT_SECRET)".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://thesis_hub.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                jwt_secret: DEFAULT_JWT_SECRET.to_string(),
                audience: None,
                issuer: None,
            },
            uploads: UploadConfig::default(),
        }
    }
}
