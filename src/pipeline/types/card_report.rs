use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::pipeline::types::{Candidate, ConditionAnalysis, RecognitionResult};

/// Everything the display side needs for one identified photo.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardReport {
    pub request_id: Uuid,
    pub recognition: RecognitionResult,
    pub condition: ConditionAnalysis,
    pub candidates: Vec<Candidate>,
    pub analyzed_at: DateTime<Utc>,
}

impl CardReport {
    pub fn new(
        request_id: Uuid,
        recognition: RecognitionResult,
        condition: ConditionAnalysis,
        candidates: Vec<Candidate>,
    ) -> Self {
        Self {
            request_id,
            recognition,
            condition,
            candidates,
            analyzed_at: Utc::now(),
        }
    }
}
