use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::SettingsError;
use crate::pipeline::services::catalog::IndexConfig;
use crate::pipeline::services::condition::GradingConfig;
use crate::pipeline::services::orchestration::RecognitionConfig;
use crate::pipeline::services::preprocessing::AspectPolicy;

/// Settings file looked up in the working directory, any format `config`
/// understands (`cardscan.toml`, `cardscan.json`, ...).
const DEFAULT_FILE: &str = "cardscan";
/// Overrides the settings file location.
const FILE_ENV: &str = "CARDSCAN_CONFIG";
/// Environment overrides, e.g. `CARDSCAN_RECOGNITION__TOP_K=3`.
const ENV_PREFIX: &str = "CARDSCAN";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub recognition: RecognitionConfig,
    pub preprocess: PreprocessSettings,
    pub index: IndexConfig,
    pub grading: GradingConfig,
    pub models: ModelPaths,
    pub service: ServiceSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreprocessSettings {
    pub policy: AspectPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelPaths {
    pub model_path: PathBuf,
    pub catalog_path: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/projection.json"),
            catalog_path: PathBuf::from("models/catalog.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub request_timeout_ms: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5_000,
        }
    }
}

impl Settings {
    /// Defaults, then the settings file, then `CARDSCAN_*` environment variables.
    pub fn load() -> Result<Self, SettingsError> {
        let file = std::env::var(FILE_ENV).ok().map(PathBuf::from);
        Self::build(file.as_deref(), environment())
    }

    /// Defaults overlaid with a single settings file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn build(file: Option<&Path>, env: Environment) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        builder = match file {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(DEFAULT_FILE).required(false)),
        };

        let settings: Settings = builder.add_source(env).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.recognition
            .validate()
            .map_err(|e| SettingsError::Invalid(format!("recognition: {}", e)))?;
        self.index
            .validate()
            .map_err(|e| SettingsError::Invalid(format!("index: {}", e)))?;
        self.grading
            .validate()
            .map_err(|e| SettingsError::Invalid(format!("grading: {}", e)))?;

        if self.service.request_timeout_ms == 0 {
            return Err(SettingsError::Invalid(
                "service: request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.service.request_timeout_ms)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
