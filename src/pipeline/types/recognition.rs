use serde::{Deserialize, Serialize};

/// Outcome of the recognition chain.
///
/// `card_id` is present iff `confidence` reached the acceptance threshold, and
/// `card_name` only ever accompanies a `card_id`. Fields are private so the
/// constructors below are the only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResult {
    card_id: Option<String>,
    confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    card_name: Option<String>,
}

impl RecognitionResult {
    /// Fallback for any recognition-side failure.
    pub fn unrecognized() -> Self {
        Self {
            card_id: None,
            confidence: 0.0,
            card_name: None,
        }
    }

    /// Apply the acceptance threshold to the best candidate.
    pub fn from_confidence(
        card_id: impl Into<String>,
        card_name: impl Into<String>,
        confidence: f32,
        threshold: f32,
    ) -> Self {
        let confidence = clamp_unit(confidence);
        if confidence >= threshold {
            Self {
                card_id: Some(card_id.into()),
                confidence,
                card_name: Some(card_name.into()),
            }
        } else {
            Self {
                card_id: None,
                confidence,
                card_name: None,
            }
        }
    }

    pub fn card_id(&self) -> Option<&str> {
        self.card_id.as_deref()
    }

    pub fn card_name(&self) -> Option<&str> {
        self.card_name.as_deref()
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn is_recognized(&self) -> bool {
        self.card_id.is_some()
    }
}

/// A ranked catalog match kept for display alongside the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub card_id: String,
    pub card_name: String,
    pub confidence: f32,
}

/// Cosine similarity to confidence: negative similarity means no match.
pub fn similarity_to_confidence(similarity: f32) -> f32 {
    clamp_unit(similarity)
}

pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
