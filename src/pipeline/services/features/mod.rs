pub mod extractor;
pub mod model;

pub use extractor::FeatureExtractor;
pub use model::{DEFAULT_GRID, FeatureModel, ProjectionArtifact, ProjectionModel};
