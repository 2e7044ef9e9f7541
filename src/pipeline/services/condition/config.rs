use serde::Deserialize;

use crate::pipeline::types::DefectAxis;

/// Relative importance of each defect axis in the aggregate severity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DefectWeights {
    pub corners: f32,
    pub edges: f32,
    pub surface: f32,
    pub centering: f32,
}

impl Default for DefectWeights {
    fn default() -> Self {
        Self {
            corners: 0.30,
            edges: 0.25,
            surface: 0.30,
            centering: 0.15,
        }
    }
}

impl DefectWeights {
    pub fn get(&self, axis: DefectAxis) -> f32 {
        match axis {
            DefectAxis::Corners => self.corners,
            DefectAxis::Edges => self.edges,
            DefectAxis::Surface => self.surface,
            DefectAxis::Centering => self.centering,
        }
    }

    pub fn total(&self) -> f32 {
        self.corners + self.edges + self.surface + self.centering
    }
}

/// Configuration for condition grading with tunable parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    pub weights: DefectWeights,
    /// Upper severity bound of Mint, Near Mint, Lightly Played, Moderately
    /// Played and Heavily Played; anything at or above the last is Damaged.
    pub thresholds: [f32; 5],
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            weights: DefectWeights::default(),
            thresholds: [0.05, 0.15, 0.30, 0.45, 0.65],
        }
    }
}

impl GradingConfig {
    /// Grading that only looks at physical wear, ignoring print centering
    pub fn wear_only() -> Self {
        Self {
            weights: DefectWeights {
                centering: 0.0,
                ..DefectWeights::default()
            },
            ..Self::default()
        }
    }

    pub fn with_weights(mut self, weights: DefectWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_thresholds(mut self, thresholds: [f32; 5]) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        let weights = [
            self.weights.corners,
            self.weights.edges,
            self.weights.surface,
            self.weights.centering,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("Defect weights must be finite and non-negative".to_string());
        }

        if self.weights.total() <= 0.0 {
            return Err("At least one defect weight must be positive".to_string());
        }

        if self.thresholds.iter().any(|t| !(*t > 0.0 && *t < 1.0)) {
            return Err("Grade thresholds must lie strictly between 0.0 and 1.0".to_string());
        }

        if self.thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err("Grade thresholds must be strictly increasing".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GradingConfig::default().validate().is_ok());
        assert!(GradingConfig::wear_only().validate().is_ok());
    }

    #[test]
    fn test_unordered_thresholds_are_rejected() {
        let config = GradingConfig::default().with_thresholds([0.1, 0.05, 0.3, 0.45, 0.65]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_all_zero_weights_are_rejected() {
        let config = GradingConfig::default().with_weights(DefectWeights {
            corners: 0.0,
            edges: 0.0,
            surface: 0.0,
            centering: 0.0,
        });
        assert!(config.validate().is_err());
    }
}
