use super::config::GradingConfig;
use crate::pipeline::types::{ConditionAnalysis, ConditionGrade, DefectAxis, DefectScores, clamp_unit};

const AXES: [DefectAxis; 4] = [
    DefectAxis::Corners,
    DefectAxis::Edges,
    DefectAxis::Surface,
    DefectAxis::Centering,
];

/// Share of the confidence coming from the distance to a grade boundary.
const BOUNDARY_SHARE: f32 = 0.6;
/// Share coming from agreement between the axes.
const AGREEMENT_SHARE: f32 = 0.4;

/// Maps defect scores to a grade. Validated configuration is assumed.
#[derive(Debug, Clone)]
pub struct Grader {
    config: GradingConfig,
}

impl Grader {
    pub fn new(config: GradingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GradingConfig {
        &self.config
    }

    /// Weighted mean of the axes.
    pub fn severity(&self, scores: &DefectScores) -> f32 {
        let total = self.config.weights.total();
        if total <= 0.0 {
            return 0.0;
        }
        let weighted: f32 = AXES
            .iter()
            .map(|axis| self.config.weights.get(*axis) * scores.get(*axis))
            .sum();
        clamp_unit(weighted / total)
    }

    /// Number of thresholds at or below `severity` picks the band, so a
    /// higher severity can never land in a better grade.
    pub fn grade_for(&self, severity: f32) -> ConditionGrade {
        let band = self
            .config
            .thresholds
            .iter()
            .filter(|t| severity >= **t)
            .count();
        ConditionGrade::from_band(band)
    }

    pub fn grade(&self, scores: DefectScores) -> ConditionAnalysis {
        let severity = self.severity(&scores);
        let grade = self.grade_for(severity);
        let confidence = BOUNDARY_SHARE * self.boundary_certainty(severity)
            + AGREEMENT_SHARE * agreement(&scores);

        ConditionAnalysis::new(grade, clamp_unit(confidence), scores, severity)
    }

    /// 1 in the middle of a band (or further), approaching 0 at a threshold.
    fn boundary_certainty(&self, severity: f32) -> f32 {
        let thresholds = &self.config.thresholds;
        let band = thresholds.iter().filter(|t| severity >= **t).count();
        let lower = if band == 0 { 0.0 } else { thresholds[band - 1] };
        let upper = thresholds.get(band).copied().unwrap_or(1.0);
        let half_width = (upper - lower) / 2.0;

        let nearest = thresholds
            .iter()
            .map(|t| (severity - t).abs())
            .fold(f32::INFINITY, f32::min);

        if half_width <= f32::EPSILON {
            return 0.0;
        }
        (nearest / half_width).min(1.0)
    }
}

/// 1 when all axes agree, falling with their spread.
fn agreement(scores: &DefectScores) -> f32 {
    let values = scores.as_array();
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32;
    clamp_unit(1.0 - 2.0 * variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::services::condition::DefectWeights;

    fn grader() -> Grader {
        Grader::new(GradingConfig::default())
    }

    #[test]
    fn test_low_defects_grade_mint_or_near_mint() {
        let analysis = grader().grade(DefectScores::new(0.05, 0.02, 0.03, 0.01));
        assert!(matches!(
            analysis.estimated_condition(),
            ConditionGrade::Mint | ConditionGrade::NearMint
        ));
    }

    #[test]
    fn test_high_defects_grade_heavily_played_or_damaged() {
        let analysis = grader().grade(DefectScores::new(0.9, 0.85, 0.8, 0.3));
        assert!(matches!(
            analysis.estimated_condition(),
            ConditionGrade::HeavilyPlayed | ConditionGrade::Damaged
        ));
    }

    #[test]
    fn test_grade_is_monotonic_in_severity() {
        let grader = grader();
        let mut previous = ConditionGrade::Mint;
        for step in 0..=1000 {
            let grade = grader.grade_for(step as f32 / 1000.0);
            assert!(grade >= previous, "grade improved at step {}", step);
            previous = grade;
        }
        assert_eq!(grader.grade_for(0.0), ConditionGrade::Mint);
        assert_eq!(grader.grade_for(1.0), ConditionGrade::Damaged);
    }

    #[test]
    fn test_every_grade_is_reachable() {
        let grader = grader();
        let grades: Vec<ConditionGrade> = [0.01, 0.1, 0.2, 0.4, 0.5, 0.9]
            .iter()
            .map(|s| grader.grade_for(*s))
            .collect();
        assert_eq!(grades, ConditionGrade::ALL.to_vec());
    }

    #[test]
    fn test_boundary_cases_get_lower_confidence() {
        let grader = grader();
        // uniform scores: agreement is perfect, only the boundary term moves
        let near_boundary = grader.grade(DefectScores::new(0.3, 0.3, 0.3, 0.3));
        let mid_band = grader.grade(DefectScores::new(0.375, 0.375, 0.375, 0.375));
        assert!(near_boundary.confidence() < mid_band.confidence());
        assert!((mid_band.confidence() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_disagreeing_axes_lower_confidence() {
        let grader = grader();
        let agree = grader.grade(DefectScores::new(0.375, 0.375, 0.375, 0.375));
        // same weighted severity, very different axes
        let disagree = grader.grade(DefectScores::new(0.0, 0.0, 0.0, 1.0));
        assert!(disagree.confidence() < agree.confidence());
        assert!((0.0..=1.0).contains(&disagree.confidence()));
    }

    #[test]
    fn test_weights_are_normalized() {
        let doubled = GradingConfig::default().with_weights(DefectWeights {
            corners: 0.6,
            edges: 0.5,
            surface: 0.6,
            centering: 0.3,
        });
        let scores = DefectScores::new(0.2, 0.4, 0.1, 0.7);
        let a = grader().severity(&scores);
        let b = Grader::new(doubled).severity(&scores);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_unreadable_scores_grade_as_damaged() {
        let grader = grader();
        let nan = grader.grade(DefectScores::new(f32::NAN, f32::NAN, f32::NAN, f32::NAN));
        assert_eq!(nan.estimated_condition(), ConditionGrade::Damaged);
        assert_eq!(nan.severity(), 1.0);

        // a negative axis floors at pristine instead of cancelling the others
        let negative = grader.grade(DefectScores::new(-5.0, 1.0, 1.0, 1.0));
        assert_eq!(negative.defects().corners(), 0.0);
        assert!((negative.severity() - 0.7).abs() < 1e-6);
        assert_eq!(negative.estimated_condition(), ConditionGrade::Damaged);
    }
}
