pub mod config;
pub mod loader;
pub mod model_state;
pub mod orchestrator;

pub use config::RecognitionConfig;
pub use loader::{FileModelLoader, LoadedModels, ModelLoader, StaticModelLoader};
pub use model_state::ModelState;
pub use orchestrator::RecognitionOrchestrator;
