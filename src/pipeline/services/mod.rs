pub mod catalog;
pub mod condition;
pub mod features;
pub mod orchestration;
pub mod preprocessing;

pub use catalog::{Catalog, CatalogEntry, CatalogIndex, IndexConfig};
pub use condition::{ConditionAnalyzer, GradingConfig};
pub use features::{FeatureExtractor, FeatureModel, ProjectionModel};
pub use orchestration::{
    FileModelLoader, LoadedModels, ModelLoader, ModelState, RecognitionConfig,
    RecognitionOrchestrator, StaticModelLoader,
};
pub use preprocessing::{AspectPolicy, Preprocessor};
