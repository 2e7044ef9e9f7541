use serde::Deserialize;

/// Recognition tuning applied by the orchestrator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Minimum confidence for a match to be reported as recognized. Must be
    /// above zero so an unrecognized result (confidence 0) never passes.
    pub acceptance_threshold: f32,
    /// Ranked candidates kept in the report.
    pub top_k: usize,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.7,
            top_k: 5,
        }
    }
}

impl RecognitionConfig {
    pub fn with_acceptance_threshold(mut self, acceptance_threshold: f32) -> Self {
        self.acceptance_threshold = acceptance_threshold;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.acceptance_threshold > 0.0 && self.acceptance_threshold <= 1.0) {
            return Err("Acceptance threshold must be in (0.0, 1.0]".to_string());
        }

        if self.top_k == 0 {
            return Err("top_k must be at least 1".to_string());
        }

        Ok(())
    }
}
