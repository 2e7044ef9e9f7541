/// Condition analyzer - runs the defect detectors and grades the result
use super::{
    config::GradingConfig,
    core::{DefectDetector, GradingContext},
    detectors::default_detectors,
    grading::Grader,
};
use crate::{
    error::{PipelineError, SettingsError},
    pipeline::types::{ConditionAnalysis, DefectScores, RawImage},
};
use std::time::Instant;
use tracing::debug;

pub struct ConditionAnalyzer {
    detectors: Vec<Box<dyn DefectDetector>>,
    grader: Grader,
}

impl ConditionAnalyzer {
    pub fn new(config: GradingConfig) -> Result<Self, SettingsError> {
        config
            .validate()
            .map_err(|e| SettingsError::Invalid(format!("grading: {}", e)))?;

        Ok(Self {
            detectors: default_detectors(),
            grader: Grader::new(config),
        })
    }

    /// Swap the detector for the axis `detector` scores.
    pub fn with_detector(mut self, detector: Box<dyn DefectDetector>) -> Self {
        let axis = detector.axis();
        self.detectors.retain(|d| d.axis() != axis);
        self.detectors.push(detector);
        self
    }

    pub fn config(&self) -> &GradingConfig {
        self.grader.config()
    }

    /// Score every axis of the photo and grade it.
    pub fn analyze(&self, image: &RawImage) -> Result<ConditionAnalysis, PipelineError> {
        let started = Instant::now();
        image.validate()?;
        let context = GradingContext::new(image)?;

        let mut scores = DefectScores::default();
        for detector in &self.detectors {
            let score = detector.score(&context);
            debug!("{}: {} scored {:.3}", detector.name(), detector.axis().as_str(), score);
            scores.set(detector.axis(), score);
        }

        let analysis = self.grader.grade(scores);
        debug!(
            "Condition graded {} (severity {:.3}, confidence {:.2}) in {}us",
            analysis.estimated_condition(),
            analysis.severity(),
            analysis.confidence(),
            started.elapsed().as_micros()
        );
        Ok(analysis)
    }

    /// Grade precomputed defect scores.
    pub fn grade(&self, scores: DefectScores) -> ConditionAnalysis {
        self.grader.grade(scores)
    }
}

impl Default for ConditionAnalyzer {
    fn default() -> Self {
        Self {
            detectors: default_detectors(),
            grader: Grader::new(GradingConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::services::condition::test_cards::{CardLayout, synthetic_card};
    use crate::pipeline::types::{ChannelLayout, ConditionGrade, DefectAxis};

    struct FixedDetector(DefectAxis, f32);

    impl DefectDetector for FixedDetector {
        fn axis(&self) -> DefectAxis {
            self.0
        }

        fn score(&self, _context: &GradingContext) -> f32 {
            self.1
        }

        fn name(&self) -> &'static str {
            "FixedDetector"
        }
    }

    #[test]
    fn test_pristine_card_grades_mint_or_near_mint() {
        let analysis = ConditionAnalyzer::default()
            .analyze(&synthetic_card(CardLayout::pristine()))
            .unwrap();
        assert!(matches!(
            analysis.estimated_condition(),
            ConditionGrade::Mint | ConditionGrade::NearMint
        ));
        assert!((0.0..=1.0).contains(&analysis.confidence()));
    }

    #[test]
    fn test_worn_card_grades_heavily_played_or_damaged() {
        let analysis = ConditionAnalyzer::default()
            .analyze(&synthetic_card(CardLayout::worn()))
            .unwrap();
        assert!(
            analysis.estimated_condition() >= ConditionGrade::HeavilyPlayed,
            "worn card graded {}",
            analysis.estimated_condition()
        );
    }

    #[test]
    fn test_zero_dimension_image_is_invalid() {
        let image = RawImage::from_raw(0, 10, ChannelLayout::Rgb, Vec::new());
        let result = ConditionAnalyzer::default().analyze(&image);
        assert!(matches!(result, Err(PipelineError::InvalidImage(_))));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = GradingConfig::default().with_thresholds([0.5, 0.4, 0.3, 0.2, 0.1]);
        assert!(ConditionAnalyzer::new(config).is_err());
    }

    #[test]
    fn test_with_detector_replaces_axis() {
        let analyzer = ConditionAnalyzer::default()
            .with_detector(Box::new(FixedDetector(DefectAxis::Surface, 1.0)));
        let analysis = analyzer.analyze(&synthetic_card(CardLayout::pristine())).unwrap();
        assert_eq!(analysis.defects().surface(), 1.0);
        assert!(analysis.defects().corners() < 0.05);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let analyzer = ConditionAnalyzer::default();
        let image = synthetic_card(CardLayout::worn());
        assert_eq!(analyzer.analyze(&image).unwrap(), analyzer.analyze(&image).unwrap());
    }
}
