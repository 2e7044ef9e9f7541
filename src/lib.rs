pub mod config;
pub mod error;
pub mod pipeline;

pub use config::Settings;
pub use error::{AppError, CatalogError, PipelineError, SettingsError};

pub use pipeline::services::{FileModelLoader, ModelState, RecognitionOrchestrator};
pub use pipeline::types::{CardReport, RawImage};
