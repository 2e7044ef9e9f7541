pub mod services;
pub mod types;

pub use services::{ConditionAnalyzer, ModelState, Preprocessor, RecognitionOrchestrator};
pub use types::{CardReport, ConditionAnalysis, ConditionGrade, RawImage, RecognitionResult};
