use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::PipelineError;
use crate::pipeline::services::catalog::{Catalog, CatalogIndex, IndexConfig};
use crate::pipeline::services::features::{FeatureExtractor, FeatureModel, ProjectionModel};

/// The immutable recognition resources: a feature model and the catalog
/// embedded with that same model.
pub struct LoadedModels {
    pub extractor: FeatureExtractor,
    pub index: CatalogIndex,
}

impl LoadedModels {
    /// Pair a model with its catalog. The catalog must have been embedded by
    /// the same model version with the same dimension.
    pub fn new(
        model: Arc<dyn FeatureModel>,
        catalog: Catalog,
        index_config: &IndexConfig,
    ) -> Result<Self, PipelineError> {
        if catalog.model_version() != model.version() {
            return Err(PipelineError::model_unavailable(format!(
                "catalog was embedded with {}, loaded model is {}",
                catalog.model_version(),
                model.version()
            )));
        }
        if let Some(dim) = catalog.dim() {
            if dim != model.embedding_dim() {
                return Err(PipelineError::model_unavailable(format!(
                    "catalog embeddings have dimension {}, model produces {}",
                    dim,
                    model.embedding_dim()
                )));
            }
        }
        index_config
            .validate()
            .map_err(|e| PipelineError::model_unavailable(format!("index config: {}", e)))?;

        Ok(Self {
            extractor: FeatureExtractor::new(model),
            index: CatalogIndex::build(catalog, index_config),
        })
    }

    pub fn model_version(&self) -> &str {
        self.extractor.model_version()
    }
}

/// Source of the recognition resources, invoked at most once per successful
/// load by [`super::ModelState`].
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> Result<LoadedModels, PipelineError>;
    fn describe(&self) -> String;
}

/// Reads a projection model artifact and a catalog snapshot from disk.
pub struct FileModelLoader {
    model_path: PathBuf,
    catalog_path: PathBuf,
    index_config: IndexConfig,
}

impl FileModelLoader {
    pub fn new(model_path: impl Into<PathBuf>, catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            catalog_path: catalog_path.into(),
            index_config: IndexConfig::default(),
        }
    }

    pub fn with_index_config(mut self, index_config: IndexConfig) -> Self {
        self.index_config = index_config;
        self
    }
}

#[async_trait]
impl ModelLoader for FileModelLoader {
    async fn load(&self) -> Result<LoadedModels, PipelineError> {
        let model_bytes = read(&self.model_path).await?;
        let catalog_bytes = read(&self.catalog_path).await?;

        let (model, catalog) = tokio::task::spawn_blocking(move || {
            let model = ProjectionModel::from_json(&model_bytes)?;
            let catalog = Catalog::from_json(&catalog_bytes)?;
            Ok::<_, PipelineError>((model, catalog))
        })
        .await
        .map_err(|e| PipelineError::model_unavailable(format!("load task failed: {}", e)))??;

        debug!(
            "Parsed model {} and {} catalog entries",
            model.version(),
            catalog.len()
        );
        LoadedModels::new(Arc::new(model), catalog, &self.index_config)
    }

    fn describe(&self) -> String {
        format!(
            "model {} with catalog {}",
            self.model_path.display(),
            self.catalog_path.display()
        )
    }
}

async fn read(path: &PathBuf) -> Result<Vec<u8>, PipelineError> {
    tokio::fs::read(path).await.map_err(|e| {
        PipelineError::model_unavailable(format!("cannot read {}: {}", path.display(), e))
    })
}

/// Serves a model and catalog that were built in memory.
pub struct StaticModelLoader {
    model: Arc<dyn FeatureModel>,
    catalog: Catalog,
    index_config: IndexConfig,
}

impl StaticModelLoader {
    pub fn new(model: Arc<dyn FeatureModel>, catalog: Catalog) -> Self {
        Self {
            model,
            catalog,
            index_config: IndexConfig::default(),
        }
    }

    pub fn with_index_config(mut self, index_config: IndexConfig) -> Self {
        self.index_config = index_config;
        self
    }
}

#[async_trait]
impl ModelLoader for StaticModelLoader {
    async fn load(&self) -> Result<LoadedModels, PipelineError> {
        LoadedModels::new(self.model.clone(), self.catalog.clone(), &self.index_config)
    }

    fn describe(&self) -> String {
        format!("in-memory model {}", self.model.version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::services::catalog::CatalogEntry;
    use crate::pipeline::types::Embedding;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cardscan-{}-{}", uuid::Uuid::new_v4(), name))
    }

    #[tokio::test]
    async fn test_file_loader_reads_model_and_catalog() {
        let model = ProjectionModel::from_seed("projection-test", 7, 4, 8);
        let mut catalog = Catalog::new("projection-test");
        catalog
            .insert(CatalogEntry::new(
                "base1-4",
                "Charizard",
                Embedding::new(vec![1.0; 8]),
            ))
            .unwrap();

        let model_path = temp_path("model.json");
        let catalog_path = temp_path("catalog.json");
        tokio::fs::write(&model_path, serde_json::to_vec(&model.to_artifact()).unwrap())
            .await
            .unwrap();
        tokio::fs::write(&catalog_path, catalog.to_json().unwrap())
            .await
            .unwrap();

        let loaded = FileModelLoader::new(&model_path, &catalog_path)
            .load()
            .await
            .unwrap();
        assert_eq!(loaded.model_version(), "projection-test");
        assert_eq!(loaded.index.len(), 1);

        let _ = tokio::fs::remove_file(model_path).await;
        let _ = tokio::fs::remove_file(catalog_path).await;
    }

    #[tokio::test]
    async fn test_missing_file_is_model_unavailable() {
        let result = FileModelLoader::new(temp_path("missing.json"), temp_path("missing.json"))
            .load()
            .await;
        assert!(matches!(result, Err(PipelineError::ModelUnavailable(_))));
    }

    #[tokio::test]
    async fn test_version_mismatch_is_rejected() {
        let model = Arc::new(ProjectionModel::from_seed("projection-a", 1, 4, 8));
        let catalog = Catalog::new("projection-b");
        let result = StaticModelLoader::new(model, catalog).load().await;
        assert!(matches!(result, Err(PipelineError::ModelUnavailable(_))));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_rejected() {
        let model = Arc::new(ProjectionModel::from_seed("projection-a", 1, 4, 8));
        let mut catalog = Catalog::new("projection-a");
        catalog
            .insert(CatalogEntry::new("x", "X", Embedding::new(vec![1.0; 3])))
            .unwrap();
        let result = StaticModelLoader::new(model, catalog).load().await;
        assert!(matches!(result, Err(PipelineError::ModelUnavailable(_))));
    }
}
