pub mod analyzer;
pub mod config;
pub mod core;
pub mod detectors;
pub mod grading;

#[cfg(test)]
pub(crate) mod test_cards;

pub use analyzer::ConditionAnalyzer;
pub use config::{DefectWeights, GradingConfig};
pub use core::{BorderWidths, DefectDetector, GradingContext, PixelRect};
pub use detectors::{
    CenteringDetector, CornerWearDetector, EdgeWearDetector, SurfaceDetector, default_detectors,
};
pub use grading::Grader;
