use std::sync::Arc;
use std::time::Duration;

use cardscan::pipeline::services::{
    ConditionAnalyzer, FileModelLoader, ModelState, Preprocessor, RecognitionOrchestrator,
};
use cardscan::{AppError, PipelineError, RawImage, Settings};
use tower::{BoxError, ServiceBuilder, ServiceExt};
use tracing::{Level, error, info};

fn init_logging() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        return Err(AppError::Usage("cardscan <image>...".to_string()));
    }

    let settings = Settings::load()?;
    let loader = FileModelLoader::new(&settings.models.model_path, &settings.models.catalog_path)
        .with_index_config(settings.index.clone());
    let state = Arc::new(ModelState::new(Arc::new(loader)));
    let orchestrator = RecognitionOrchestrator::new(state, settings.recognition.clone())?
        .with_preprocessor(Preprocessor::new(settings.preprocess.policy))
        .with_analyzer(ConditionAnalyzer::new(settings.grading.clone())?);

    orchestrator.warm_up().await?;
    info!("Model ready, identifying {} image(s)", paths.len());

    let timeout = settings.request_timeout();
    let mut failures = 0;
    for path in &paths {
        match identify_file(&orchestrator, path, timeout).await {
            Ok(line) => println!("{}", line),
            Err(e) => {
                error!("{}: {}", path, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        error!("{} of {} image(s) failed", failures, paths.len());
        std::process::exit(1);
    }
    Ok(())
}

async fn identify_file(
    orchestrator: &RecognitionOrchestrator,
    path: &str,
    timeout: Duration,
) -> Result<String, AppError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Io(e, path.to_string()))?;
    let image = RawImage::from_encoded(&bytes)?;

    let service = ServiceBuilder::new()
        .timeout(timeout)
        .service(orchestrator.clone());
    let report = service
        .oneshot(image)
        .await
        .map_err(|e| into_app_error(e, timeout))?;

    Ok(serde_json::to_string(&report)?)
}

fn into_app_error(err: BoxError, timeout: Duration) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return AppError::Timeout(timeout.as_millis() as u64);
    }
    match err.downcast::<PipelineError>() {
        Ok(e) => AppError::Pipeline(*e),
        Err(other) => AppError::Pipeline(PipelineError::inference(other.to_string())),
    }
}
