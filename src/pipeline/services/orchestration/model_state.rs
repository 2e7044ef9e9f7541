use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;
use tracing::{error, info};

use super::loader::{LoadedModels, ModelLoader};
use crate::error::PipelineError;

/// Lazily loaded recognition resources.
///
/// Concurrent first callers share one load. A failed load leaves the state
/// empty so the next caller tries again; once loaded the resources are never
/// replaced.
pub struct ModelState {
    loader: Arc<dyn ModelLoader>,
    models: OnceCell<Arc<LoadedModels>>,
}

impl ModelState {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            models: OnceCell::new(),
        }
    }

    pub async fn get(&self) -> Result<Arc<LoadedModels>, PipelineError> {
        let models = self
            .models
            .get_or_try_init(|| async {
                let started = Instant::now();
                match self.loader.load().await {
                    Ok(models) => {
                        info!(
                            "Loaded {} ({} catalog entries) in {}ms",
                            self.loader.describe(),
                            models.index.len(),
                            started.elapsed().as_millis()
                        );
                        Ok(Arc::new(models))
                    }
                    Err(e) => {
                        error!("Failed to load {}: {}", self.loader.describe(), e);
                        Err(e)
                    }
                }
            })
            .await?;
        Ok(models.clone())
    }

    pub fn is_loaded(&self) -> bool {
        self.models.initialized()
    }
}
