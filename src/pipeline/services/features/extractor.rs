use std::sync::Arc;

use tracing::debug;

use crate::error::PipelineError;
use crate::pipeline::services::features::FeatureModel;
use crate::pipeline::types::{Embedding, PreprocessedTensor};

/// Runs preprocessed tensors through a loaded [`FeatureModel`] and checks the
/// output contract.
#[derive(Clone)]
pub struct FeatureExtractor {
    model: Arc<dyn FeatureModel>,
}

impl FeatureExtractor {
    pub fn new(model: Arc<dyn FeatureModel>) -> Self {
        Self { model }
    }

    pub fn model_version(&self) -> &str {
        self.model.version()
    }

    pub fn embedding_dim(&self) -> usize {
        self.model.embedding_dim()
    }

    pub fn extract(&self, tensor: &PreprocessedTensor) -> Result<Embedding, PipelineError> {
        let expected = self.model.input_shape();
        if tensor.shape() != expected {
            return Err(PipelineError::inference(format!(
                "tensor shape {:?} does not match model input {:?}",
                tensor.shape(),
                expected
            )));
        }

        let embedding = self.model.embed(tensor)?;

        if embedding.dim() != self.model.embedding_dim() {
            return Err(PipelineError::inference(format!(
                "model {} returned {} values, expected {}",
                self.model.version(),
                embedding.dim(),
                self.model.embedding_dim()
            )));
        }
        if !embedding.is_finite() {
            return Err(PipelineError::inference(format!(
                "model {} returned non-finite values",
                self.model.version()
            )));
        }

        debug!("Extracted {}-d embedding with {}", embedding.dim(), self.model.version());
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::services::features::ProjectionModel;
    use crate::pipeline::services::preprocessing::Preprocessor;
    use crate::pipeline::types::{ChannelLayout, RawImage};
    use image::{ImageBuffer, Rgb};

    struct BrokenModel;

    impl FeatureModel for BrokenModel {
        fn version(&self) -> &str {
            "broken"
        }

        fn input_shape(&self) -> (usize, usize, usize) {
            (1, 1, 3)
        }

        fn embedding_dim(&self) -> usize {
            2
        }

        fn embed(&self, _tensor: &PreprocessedTensor) -> Result<Embedding, PipelineError> {
            Ok(Embedding::new(vec![f32::NAN, 1.0]))
        }
    }

    fn card_photo() -> RawImage {
        let buffer = ImageBuffer::from_fn(180, 250, |x, y| {
            Rgb([(x % 255) as u8, (y % 255) as u8, ((x * y) % 255) as u8])
        });
        RawImage::from_raw(180, 250, ChannelLayout::Rgb, buffer.into_raw())
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = FeatureExtractor::new(Arc::new(ProjectionModel::reference(42)));
        let preprocessor = Preprocessor::default();
        let image = card_photo();

        let first = extractor
            .extract(&preprocessor.preprocess(&image).unwrap())
            .unwrap();
        for _ in 0..3 {
            let again = extractor
                .extract(&preprocessor.preprocess(&image).unwrap())
                .unwrap();
            let drift: f32 = first
                .as_slice()
                .iter()
                .zip(again.as_slice())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f32::max);
            assert!(drift < 1e-6);
        }
    }

    #[test]
    fn test_non_finite_output_is_rejected() {
        let extractor = FeatureExtractor::new(Arc::new(BrokenModel));
        let tensor = PreprocessedTensor::new(1, 1, 3, vec![0.0; 3]).unwrap();
        assert!(matches!(
            extractor.extract(&tensor),
            Err(PipelineError::Inference(_))
        ));
    }
}
