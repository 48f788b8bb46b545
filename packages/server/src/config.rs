use common::config::StorageConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. `"*"` allows any origin.
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GalleryConfig {
    /// Upper bound on the number of records one list call returns.
    pub max_list_results: usize,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            max_list_results: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorMode {
    /// Run the thumbnail processor in this process.
    #[default]
    Local,
    /// POST requests to an external processor endpoint.
    Http,
    /// Drop processing requests.
    Disabled,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProcessorConfig {
    #[serde(default)]
    pub mode: ProcessorMode,
    /// Invocation URL for `http` mode.
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
}

fn default_thumbnail_size() -> u32 {
    processor::thumbnail::DEFAULT_THUMBNAIL_SIZE
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            mode: ProcessorMode::default(),
            target: None,
            thumbnail_size: default_thumbnail_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub gallery: GalleryConfig,
    #[serde(default)]
    pub processor: ProcessorConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", vec!["*"])?
            .set_default("server.cors.max_age", 3600)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., LUMINA__STORAGE__BLOB__BACKEND)
            .add_source(
                Environment::with_prefix("LUMINA")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Settings required by the selected backends that are unset.
    ///
    /// Reported at startup; the service still starts.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = self.storage.missing_settings();
        if self.processor.mode == ProcessorMode::Http
            && self
                .processor
                .target
                .as_deref()
                .is_none_or(|t| t.trim().is_empty())
        {
            missing.push("processor.target");
        }
        missing
    }
}
