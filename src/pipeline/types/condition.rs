use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered condition grades, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConditionGrade {
    #[serde(rename = "Mint (M)")]
    Mint,
    #[serde(rename = "Near Mint (NM)")]
    NearMint,
    #[serde(rename = "Lightly Played (LP)")]
    LightlyPlayed,
    #[serde(rename = "Moderately Played (MP)")]
    ModeratelyPlayed,
    #[serde(rename = "Heavily Played (HP)")]
    HeavilyPlayed,
    #[serde(rename = "Damaged (D)")]
    Damaged,
}

impl ConditionGrade {
    pub const ALL: [ConditionGrade; 6] = [
        ConditionGrade::Mint,
        ConditionGrade::NearMint,
        ConditionGrade::LightlyPlayed,
        ConditionGrade::ModeratelyPlayed,
        ConditionGrade::HeavilyPlayed,
        ConditionGrade::Damaged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionGrade::Mint => "Mint (M)",
            ConditionGrade::NearMint => "Near Mint (NM)",
            ConditionGrade::LightlyPlayed => "Lightly Played (LP)",
            ConditionGrade::ModeratelyPlayed => "Moderately Played (MP)",
            ConditionGrade::HeavilyPlayed => "Heavily Played (HP)",
            ConditionGrade::Damaged => "Damaged (D)",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            ConditionGrade::Mint => "M",
            ConditionGrade::NearMint => "NM",
            ConditionGrade::LightlyPlayed => "LP",
            ConditionGrade::ModeratelyPlayed => "MP",
            ConditionGrade::HeavilyPlayed => "HP",
            ConditionGrade::Damaged => "D",
        }
    }

    /// Grade for the band at `index` (0 = Mint); indices past the end are Damaged.
    pub(crate) fn from_band(index: usize) -> Self {
        Self::ALL
            .get(index)
            .copied()
            .unwrap_or(ConditionGrade::Damaged)
    }
}

impl fmt::Display for ConditionGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefectAxis {
    Corners,
    Edges,
    Surface,
    Centering,
}

impl DefectAxis {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefectAxis::Corners => "corners",
            DefectAxis::Edges => "edges",
            DefectAxis::Surface => "surface",
            DefectAxis::Centering => "centering",
        }
    }
}

/// Per-axis severities in [0, 1], 0 = pristine.
///
/// Fields are private so every value, deserialized ones included, goes
/// through the clamp in `new`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "UncheckedScores")]
pub struct DefectScores {
    corners: f32,
    edges: f32,
    surface: f32,
    centering: f32,
}

#[derive(Deserialize)]
struct UncheckedScores {
    corners: f32,
    edges: f32,
    surface: f32,
    centering: f32,
}

impl From<UncheckedScores> for DefectScores {
    fn from(raw: UncheckedScores) -> Self {
        Self::new(raw.corners, raw.edges, raw.surface, raw.centering)
    }
}

impl DefectScores {
    /// Clamps every axis into [0, 1]; NaN counts as maximally defective.
    pub fn new(corners: f32, edges: f32, surface: f32, centering: f32) -> Self {
        Self {
            corners: clamp_severity(corners),
            edges: clamp_severity(edges),
            surface: clamp_severity(surface),
            centering: clamp_severity(centering),
        }
    }

    pub fn corners(&self) -> f32 {
        self.corners
    }

    pub fn edges(&self) -> f32 {
        self.edges
    }

    pub fn surface(&self) -> f32 {
        self.surface
    }

    pub fn centering(&self) -> f32 {
        self.centering
    }

    pub fn get(&self, axis: DefectAxis) -> f32 {
        match axis {
            DefectAxis::Corners => self.corners,
            DefectAxis::Edges => self.edges,
            DefectAxis::Surface => self.surface,
            DefectAxis::Centering => self.centering,
        }
    }

    pub fn set(&mut self, axis: DefectAxis, value: f32) {
        let value = clamp_severity(value);
        match axis {
            DefectAxis::Corners => self.corners = value,
            DefectAxis::Edges => self.edges = value,
            DefectAxis::Surface => self.surface = value,
            DefectAxis::Centering => self.centering = value,
        }
    }

    pub fn as_array(&self) -> [f32; 4] {
        [self.corners, self.edges, self.surface, self.centering]
    }
}

impl Default for DefectScores {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

/// Graded condition. Only produced by the grader, so the grade always follows
/// from the defect scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionAnalysis {
    estimated_condition: ConditionGrade,
    confidence: f32,
    defects: DefectScores,
    #[serde(skip)]
    severity: f32,
}

impl ConditionAnalysis {
    pub(crate) fn new(
        estimated_condition: ConditionGrade,
        confidence: f32,
        defects: DefectScores,
        severity: f32,
    ) -> Self {
        Self {
            estimated_condition,
            confidence,
            defects,
            severity,
        }
    }

    pub fn estimated_condition(&self) -> ConditionGrade {
        self.estimated_condition
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn defects(&self) -> &DefectScores {
        &self.defects
    }

    /// Weighted aggregate the grade was derived from.
    pub fn severity(&self) -> f32 {
        self.severity
    }
}

fn clamp_severity(value: f32) -> f32 {
    if value.is_nan() {
        return 1.0;
    }
    value.clamp(0.0, 1.0)
}
