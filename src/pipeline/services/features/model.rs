use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PipelineError;
use crate::pipeline::types::{
    EMBEDDING_DIM, Embedding, INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH, PreprocessedTensor, dot,
};

/// Default pooling grid of the projection model.
pub const DEFAULT_GRID: usize = 14;

/// A pretrained image embedding model.
pub trait FeatureModel: Send + Sync {
    fn version(&self) -> &str;
    /// Expected (height, width, channels) of the input tensor.
    fn input_shape(&self) -> (usize, usize, usize);
    fn embedding_dim(&self) -> usize;
    fn embed(&self, tensor: &PreprocessedTensor) -> Result<Embedding, PipelineError>;
}

/// On-disk form of a [`ProjectionModel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionArtifact {
    pub version: String,
    pub input_height: usize,
    pub input_width: usize,
    pub input_channels: usize,
    pub grid: usize,
    pub dim: usize,
    pub weights: Vec<f32>,
}

/// Linear embedding model: the tensor is average-pooled onto a `grid x grid`
/// lattice, standardized, projected through a `dim x features` matrix and
/// L2-normalized.
#[derive(Debug, Clone)]
pub struct ProjectionModel {
    version: String,
    input_shape: (usize, usize, usize),
    grid: usize,
    dim: usize,
    weights: Box<[f32]>,
}

impl ProjectionModel {
    pub fn from_artifact(artifact: ProjectionArtifact) -> Result<Self, PipelineError> {
        let ProjectionArtifact {
            version,
            input_height,
            input_width,
            input_channels,
            grid,
            dim,
            weights,
        } = artifact;

        if input_height == 0 || input_width == 0 || input_channels == 0 || grid == 0 || dim == 0 {
            return Err(PipelineError::model_unavailable(format!(
                "model {} declares an empty shape",
                version
            )));
        }
        if grid > input_height || grid > input_width {
            return Err(PipelineError::model_unavailable(format!(
                "model {} pools a {}x{} input onto a {} grid",
                version, input_height, input_width, grid
            )));
        }

        let features = grid * grid * input_channels;
        if weights.len() != dim * features {
            return Err(PipelineError::model_unavailable(format!(
                "model {} has {} weights, expected {}x{}",
                version,
                weights.len(),
                dim,
                features
            )));
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(PipelineError::model_unavailable(format!(
                "model {} has non-finite weights",
                version
            )));
        }

        Ok(Self {
            version,
            input_shape: (input_height, input_width, input_channels),
            grid,
            dim,
            weights: weights.into_boxed_slice(),
        })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, PipelineError> {
        let artifact: ProjectionArtifact = serde_json::from_slice(bytes)
            .map_err(|e| PipelineError::model_unavailable(format!("unreadable model: {}", e)))?;
        Self::from_artifact(artifact)
    }

    /// Derive the weights from a fixed seed. The same seed always yields the
    /// same model.
    pub fn from_seed(version: impl Into<String>, seed: u64, grid: usize, dim: usize) -> Self {
        let grid = grid.clamp(1, INPUT_HEIGHT.min(INPUT_WIDTH));
        let dim = dim.max(1);
        let features = grid * grid * INPUT_CHANNELS;
        let mut rng = StdRng::seed_from_u64(seed);
        let weights: Vec<f32> = (0..dim * features)
            .map(|_| rng.random::<f32>() * 2.0 - 1.0)
            .collect();

        Self {
            version: version.into(),
            input_shape: (INPUT_HEIGHT, INPUT_WIDTH, INPUT_CHANNELS),
            grid,
            dim,
            weights: weights.into_boxed_slice(),
        }
    }

    pub fn reference(seed: u64) -> Self {
        Self::from_seed(format!("projection-{}", seed), seed, DEFAULT_GRID, EMBEDDING_DIM)
    }

    pub fn to_artifact(&self) -> ProjectionArtifact {
        ProjectionArtifact {
            version: self.version.clone(),
            input_height: self.input_shape.0,
            input_width: self.input_shape.1,
            input_channels: self.input_shape.2,
            grid: self.grid,
            dim: self.dim,
            weights: self.weights.to_vec(),
        }
    }

    fn pool(&self, tensor: &PreprocessedTensor) -> Vec<f32> {
        let (height, width, channels) = tensor.shape();
        let mut pooled = Vec::with_capacity(self.grid * self.grid * channels);

        for gy in 0..self.grid {
            let y0 = gy * height / self.grid;
            let y1 = ((gy + 1) * height / self.grid).max(y0 + 1);
            for gx in 0..self.grid {
                let x0 = gx * width / self.grid;
                let x1 = ((gx + 1) * width / self.grid).max(x0 + 1);
                let count = ((y1 - y0) * (x1 - x0)) as f32;
                for c in 0..channels {
                    let mut sum = 0.0;
                    for y in y0..y1 {
                        for x in x0..x1 {
                            sum += tensor.get(y, x, c);
                        }
                    }
                    pooled.push(sum / count);
                }
            }
        }
        pooled
    }
}

impl FeatureModel for ProjectionModel {
    fn version(&self) -> &str {
        &self.version
    }

    fn input_shape(&self) -> (usize, usize, usize) {
        self.input_shape
    }

    fn embedding_dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, tensor: &PreprocessedTensor) -> Result<Embedding, PipelineError> {
        if tensor.shape() != self.input_shape {
            return Err(PipelineError::inference(format!(
                "tensor shape {:?} does not match model input {:?}",
                tensor.shape(),
                self.input_shape
            )));
        }

        let mut features = self.pool(tensor);
        standardize(&mut features);

        let width = features.len();
        let values: Vec<f32> = self
            .weights
            .chunks_exact(width)
            .map(|row| dot(row, &features))
            .collect();

        debug!("{} produced a {}-d embedding", self.version, values.len());
        Ok(Embedding::new(values).normalized())
    }
}

/// Zero mean, unit variance. A flat signal becomes all zeros.
fn standardize(values: &mut [f32]) {
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    let std = variance.sqrt();

    if std < 1e-6 {
        values.iter_mut().for_each(|v| *v = 0.0);
        return;
    }
    values.iter_mut().for_each(|v| *v = (*v - mean) / std);
}
