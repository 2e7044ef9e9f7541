/// Classical sub-detectors for the four defect axes
use super::core::{DefectDetector, GradingContext, PixelRect};
use crate::pipeline::types::DefectAxis;

/// Reported when the printed border cannot be located.
pub const UNCERTAIN_CENTERING: f32 = 0.5;

/// Whitening and wear in the four corner squares.
pub struct CornerWearDetector {
    deviation_threshold: f32,
    gain: f32,
}

impl CornerWearDetector {
    pub fn new() -> Self {
        Self {
            deviation_threshold: 60.0,
            gain: 2.0,
        }
    }

    pub fn with_threshold(mut self, deviation_threshold: f32) -> Self {
        self.deviation_threshold = deviation_threshold;
        self
    }
}

impl DefectDetector for CornerWearDetector {
    fn axis(&self) -> DefectAxis {
        DefectAxis::Corners
    }

    fn score(&self, context: &GradingContext) -> f32 {
        let s = context.corner_size();
        let (w, h) = (context.width, context.height);
        let corners = [
            PixelRect::new(0, 0, s, s),
            PixelRect::new(w - s, 0, w, s),
            PixelRect::new(0, h - s, s, h),
            PixelRect::new(w - s, h - s, w, h),
        ];

        let mean = corners
            .iter()
            .map(|rect| context.deviating_fraction(*rect, self.deviation_threshold))
            .sum::<f32>()
            / corners.len() as f32;

        (mean * self.gain).clamp(0.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "CornerWearDetector"
    }
}

/// Chipping and whitening along the outer strips, corners excluded.
pub struct EdgeWearDetector {
    deviation_threshold: f32,
    gain: f32,
}

impl EdgeWearDetector {
    pub fn new() -> Self {
        Self {
            deviation_threshold: 60.0,
            gain: 3.0,
        }
    }

    pub fn with_threshold(mut self, deviation_threshold: f32) -> Self {
        self.deviation_threshold = deviation_threshold;
        self
    }
}

impl DefectDetector for EdgeWearDetector {
    fn axis(&self) -> DefectAxis {
        DefectAxis::Edges
    }

    fn score(&self, context: &GradingContext) -> f32 {
        let s = context.corner_size();
        let t = context.strip();
        let (w, h) = (context.width, context.height);
        if w <= 2 * s || h <= 2 * s {
            return 0.0;
        }

        let strips = [
            PixelRect::new(s, 0, w - s, t),
            PixelRect::new(s, h - t, w - s, h),
            PixelRect::new(0, s, t, h - s),
            PixelRect::new(w - t, s, w, h - s),
        ];

        let (deviating, total) = strips.iter().fold((0.0, 0.0), |(dev, total), rect| {
            let area = rect.area() as f32;
            (
                dev + context.deviating_fraction(*rect, self.deviation_threshold) * area,
                total + area,
            )
        });
        if total == 0.0 {
            return 0.0;
        }

        (deviating / total * self.gain).clamp(0.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "EdgeWearDetector"
    }
}

/// Scratches and print lines: isolated high-frequency outliers in the artwork.
pub struct SurfaceDetector {
    floor: f32,
    median_factor: f32,
    gain: f32,
}

impl SurfaceDetector {
    pub fn new() -> Self {
        Self {
            floor: 48.0,
            median_factor: 6.0,
            gain: 8.0,
        }
    }
}

impl DefectDetector for SurfaceDetector {
    fn axis(&self) -> DefectAxis {
        DefectAxis::Surface
    }

    fn score(&self, context: &GradingContext) -> f32 {
        let interior = context.interior();
        // the 3x3 kernel needs one pixel of context on every side
        let x0 = interior.x0.max(1);
        let y0 = interior.y0.max(1);
        let x1 = interior.x1.min(context.width.saturating_sub(1));
        let y1 = interior.y1.min(context.height.saturating_sub(1));
        if x1 <= x0 || y1 <= y0 {
            return 0.0;
        }

        let mut responses = Vec::with_capacity(((x1 - x0) * (y1 - y0)) as usize);
        for y in y0..y1 {
            for x in x0..x1 {
                let center = context.luma_at(x, y);
                let laplacian = context.luma_at(x - 1, y)
                    + context.luma_at(x + 1, y)
                    + context.luma_at(x, y - 1)
                    + context.luma_at(x, y + 1)
                    - 4.0 * center;
                responses.push(laplacian.abs());
            }
        }

        let mut sorted = responses.clone();
        sorted.sort_unstable_by(|a, b| a.total_cmp(b));
        let median = sorted[sorted.len() / 2];
        let threshold = self.floor.max(median * self.median_factor);

        let outliers = responses.iter().filter(|&&r| r > threshold).count();
        let fraction = outliers as f32 / responses.len() as f32;
        (fraction * self.gain).clamp(0.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "SurfaceDetector"
    }
}

/// Border imbalance: `max(|L-R|/(L+R), |T-B|/(T+B))`, so a 60/40 split scores 0.2.
pub struct CenteringDetector;

impl CenteringDetector {
    pub fn new() -> Self {
        Self
    }
}

impl DefectDetector for CenteringDetector {
    fn axis(&self) -> DefectAxis {
        DefectAxis::Centering
    }

    fn score(&self, context: &GradingContext) -> f32 {
        let Some(b) = context.borders else {
            return UNCERTAIN_CENTERING;
        };

        let imbalance = |a: u32, b: u32| {
            let total = (a + b) as f32;
            if total == 0.0 {
                0.0
            } else {
                (a as f32 - b as f32).abs() / total
            }
        };

        imbalance(b.left, b.right)
            .max(imbalance(b.top, b.bottom))
            .clamp(0.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "CenteringDetector"
    }
}

/// One detector per axis, in axis order.
pub fn default_detectors() -> Vec<Box<dyn DefectDetector>> {
    vec![
        Box::new(CornerWearDetector::new()),
        Box::new(EdgeWearDetector::new()),
        Box::new(SurfaceDetector::new()),
        Box::new(CenteringDetector::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::services::condition::test_cards::{CardLayout, synthetic_card};

    fn score(detector: &dyn DefectDetector, layout: CardLayout) -> f32 {
        let context = GradingContext::new(&synthetic_card(layout)).unwrap();
        detector.score(&context)
    }

    #[test]
    fn test_pristine_card_scores_low_on_every_axis() {
        for detector in default_detectors() {
            let value = score(detector.as_ref(), CardLayout::pristine());
            assert!(value < 0.05, "{} scored {}", detector.name(), value);
        }
    }

    #[test]
    fn test_whitened_corners_are_detected() {
        let layout = CardLayout {
            whitened_corners: true,
            ..CardLayout::pristine()
        };
        assert!(score(&CornerWearDetector::new(), layout) > 0.8);
        assert!(score(&EdgeWearDetector::new(), layout) < 0.05);
    }

    #[test]
    fn test_nicked_edges_are_detected() {
        let layout = CardLayout {
            nicked_edges: true,
            ..CardLayout::pristine()
        };
        assert!(score(&EdgeWearDetector::new(), layout) > 0.5);
    }

    #[test]
    fn test_scratches_are_detected() {
        let layout = CardLayout {
            scratches: 12,
            ..CardLayout::pristine()
        };
        assert!(score(&SurfaceDetector::new(), layout) > 0.3);
    }

    #[test]
    fn test_off_center_print_is_detected() {
        let layout = CardLayout {
            left_border: 12,
            right_border: 36,
            ..CardLayout::pristine()
        };
        let value = score(&CenteringDetector::new(), layout);
        assert!((value - 0.5).abs() < 0.05, "centering scored {}", value);
    }

    #[test]
    fn test_borderless_card_is_uncertain() {
        let layout = CardLayout {
            left_border: 0,
            right_border: 0,
            top_border: 0,
            bottom_border: 0,
            ..CardLayout::pristine()
        };
        assert_eq!(score(&CenteringDetector::new(), layout), UNCERTAIN_CENTERING);
    }
}
