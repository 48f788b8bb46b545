use common::config::StorageConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProcessorSettings {
    /// Edge of the square thumbnail bounding box, in pixels.
    pub thumbnail_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProcessorAppConfig {
    pub server: ListenConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub processor: ProcessorSettings,
}

impl ProcessorAppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3001)?
            .set_default(
                "processor.thumbnail_size",
                crate::thumbnail::DEFAULT_THUMBNAIL_SIZE,
            )?
            // Load from config/processor.toml
            .add_source(File::with_name("config/processor").required(false))
            // Override from environment (e.g., LUMINA__STORAGE__BLOB__BACKEND)
            .add_source(Environment::with_prefix("LUMINA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
