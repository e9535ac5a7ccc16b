//! Server Configuration

use config::{Config, ConfigError, Environment};
use std::path::PathBuf;

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default bind port
pub const DEFAULT_PORT: u16 = 5500;
/// Default model artifact location
pub const DEFAULT_MODEL_PATH: &str = "./xgb_model.onnx";

/// Environment variable prefix; only `HOUSING_MODEL_PATH` is read
const ENV_PREFIX: &str = "HOUSING";

/// Process-start configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path of the ONNX model loaded at startup
    pub model_path: PathBuf,
}

impl ServerConfig {
    /// Fixed bind address, with the model path overridable by `HOUSING_MODEL_PATH`
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    fn from_environment(env: Environment) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("model_path", DEFAULT_MODEL_PATH)?
            .add_source(env)
            .build()?;

        Ok(Self {
            model_path: settings.get::<PathBuf>("model_path")?,
            ..Self::default()
        })
    }

    /// `host:port` string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}
