/// Recognition orchestrator - identity and condition for one photo
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Instant,
};

use tower::Service;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::{config::RecognitionConfig, model_state::ModelState};
use crate::{
    error::{PipelineError, SettingsError},
    pipeline::services::{condition::ConditionAnalyzer, preprocessing::Preprocessor},
    pipeline::types::{
        Candidate, CardReport, ConditionAnalysis, RawImage, RecognitionResult,
        similarity_to_confidence,
    },
};

#[derive(Clone)]
pub struct RecognitionOrchestrator {
    state: Arc<ModelState>,
    preprocessor: Preprocessor,
    analyzer: Arc<ConditionAnalyzer>,
    config: RecognitionConfig,
}

impl RecognitionOrchestrator {
    pub fn new(state: Arc<ModelState>, config: RecognitionConfig) -> Result<Self, SettingsError> {
        config
            .validate()
            .map_err(|e| SettingsError::Invalid(format!("recognition: {}", e)))?;

        Ok(Self {
            state,
            preprocessor: Preprocessor::default(),
            analyzer: Arc::new(ConditionAnalyzer::default()),
            config,
        })
    }

    pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn with_analyzer(mut self, analyzer: ConditionAnalyzer) -> Self {
        self.analyzer = Arc::new(analyzer);
        self
    }

    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    /// Load the model state now instead of on the first request.
    pub async fn warm_up(&self) -> Result<(), PipelineError> {
        self.state.get().await.map(|_| ())
    }

    /// Identify the card and grade its condition.
    ///
    /// Recognition failures degrade to an unrecognized result; an image the
    /// condition analyzer cannot read fails the whole request.
    pub async fn identify(&self, image: RawImage) -> Result<CardReport, PipelineError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("identify", %request_id);

        async move {
            let started = Instant::now();
            let (recognition, condition) =
                tokio::join!(self.try_recognize(&image), self.analyze_condition(&image));

            let condition = condition?;
            let (recognition, candidates) = recognition.unwrap_or_else(|e| {
                warn!("Recognition degraded to unrecognized: {}", e);
                (RecognitionResult::unrecognized(), Vec::new())
            });

            info!(
                "Identified {} (confidence {:.3}) as {} in {}ms",
                recognition.card_id().unwrap_or("unknown card"),
                recognition.confidence(),
                condition.estimated_condition(),
                started.elapsed().as_millis()
            );
            Ok::<_, PipelineError>(CardReport::new(
                request_id,
                recognition,
                condition,
                candidates,
            ))
        }
        .instrument(span)
        .await
    }

    /// Recognition alone. Never fails: any error yields an unrecognized result.
    pub async fn recognize(&self, image: &RawImage) -> RecognitionResult {
        match self.try_recognize(image).await {
            Ok((recognition, _)) => recognition,
            Err(e) => {
                warn!("Recognition degraded to unrecognized: {}", e);
                RecognitionResult::unrecognized()
            }
        }
    }

    /// Condition grading alone, on the blocking pool.
    pub async fn analyze_condition(
        &self,
        image: &RawImage,
    ) -> Result<ConditionAnalysis, PipelineError> {
        let analyzer = self.analyzer.clone();
        let image = image.clone();
        tokio::task::spawn_blocking(move || analyzer.analyze(&image))
            .await
            .map_err(|e| PipelineError::inference(format!("condition task failed: {}", e)))?
    }

    async fn try_recognize(
        &self,
        image: &RawImage,
    ) -> Result<(RecognitionResult, Vec<Candidate>), PipelineError> {
        let models = self.state.get().await?;
        let preprocessor = self.preprocessor.clone();
        let threshold = self.config.acceptance_threshold;
        let top_k = self.config.top_k;
        let image = image.clone();

        tokio::task::spawn_blocking(move || {
            let tensor = preprocessor.preprocess(&image)?;
            let embedding = models.extractor.extract(&tensor)?;
            let ranked = models.index.match_top_k(&embedding, top_k)?;

            let candidates: Vec<Candidate> = ranked
                .iter()
                .map(|scored| Candidate {
                    card_id: scored.entry.card_id.clone(),
                    card_name: scored.entry.card_name.clone(),
                    confidence: similarity_to_confidence(scored.similarity),
                })
                .collect();

            let recognition = match candidates.first() {
                Some(best) => RecognitionResult::from_confidence(
                    best.card_id.clone(),
                    best.card_name.clone(),
                    best.confidence,
                    threshold,
                ),
                None => RecognitionResult::unrecognized(),
            };
            debug!(
                "Best match {:?} at {:.3} of {} candidates",
                candidates.first().map(|c| c.card_id.as_str()),
                recognition.confidence(),
                candidates.len()
            );
            Ok::<_, PipelineError>((recognition, candidates))
        })
        .await
        .map_err(|e| PipelineError::inference(format!("recognition task failed: {}", e)))?
    }
}

impl Service<RawImage> for RecognitionOrchestrator {
    type Response = CardReport;
    type Error = PipelineError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, image: RawImage) -> Self::Future {
        let orchestrator = self.clone();
        Box::pin(async move { orchestrator.identify(image).await })
    }
}
