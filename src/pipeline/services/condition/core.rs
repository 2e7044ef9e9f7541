use image::RgbImage;

use crate::error::PipelineError;
use crate::pipeline::types::{DefectAxis, RawImage};

/// Color distance that separates the printed border from the artwork.
const BORDER_EDGE_DELTA: f32 = 40.0;

/// Shared measurements every defect detector reads from.
///
/// The photo is assumed to be framed on the card: the outermost pixel ring is
/// card border, not background.
pub struct GradingContext {
    pub rgb: RgbImage,
    pub luma: Vec<f32>,
    pub width: u32,
    pub height: u32,
    /// Median color of the outermost ring, the reference for wear.
    pub border_reference: [f32; 3],
    /// Printed border widths, `None` when no border could be located.
    pub borders: Option<BorderWidths>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderWidths {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

/// Axis-aligned pixel rectangle, `x1`/`y1` exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelRect {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn area(&self) -> u32 {
        self.x1.saturating_sub(self.x0) * self.y1.saturating_sub(self.y0)
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }
}

impl GradingContext {
    pub fn new(image: &RawImage) -> Result<Self, PipelineError> {
        let rgb = image.to_rgb8()?;
        let (width, height) = rgb.dimensions();
        let luma = rgb
            .pixels()
            .map(|p| {
                let [r, g, b] = p.0;
                // Rec. 709 luminance
                0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32
            })
            .collect();

        let mut context = Self {
            rgb,
            luma,
            width,
            height,
            border_reference: [0.0; 3],
            borders: None,
        };
        context.border_reference = context.ring_median();
        context.borders = context.locate_borders();
        Ok(context)
    }

    pub fn min_side(&self) -> u32 {
        self.width.min(self.height)
    }

    /// Thickness of the outer strip inspected for edge wear.
    pub fn strip(&self) -> u32 {
        (self.min_side() / 40).max(1)
    }

    /// Side of the square inspected at each corner.
    pub fn corner_size(&self) -> u32 {
        (self.min_side() / 16).max(2).min(self.min_side())
    }

    pub fn luma_at(&self, x: u32, y: u32) -> f32 {
        self.luma[(y * self.width + x) as usize]
    }

    pub fn deviation(&self, x: u32, y: u32) -> f32 {
        color_distance(self.rgb.get_pixel(x, y).0, self.border_reference)
    }

    /// Fraction of pixels in `rect` whose color is further than `threshold`
    /// from the border reference.
    pub fn deviating_fraction(&self, rect: PixelRect, threshold: f32) -> f32 {
        if rect.is_empty() {
            return 0.0;
        }
        let mut deviating = 0u32;
        for y in rect.y0..rect.y1 {
            for x in rect.x0..rect.x1 {
                if self.deviation(x, y) > threshold {
                    deviating += 1;
                }
            }
        }
        deviating as f32 / rect.area() as f32
    }

    /// Artwork area inside the printed border, or the central half of the
    /// image when no border was found.
    pub fn interior(&self) -> PixelRect {
        let margin = (self.min_side() / 100).max(2);
        if let Some(b) = self.borders {
            let rect = PixelRect::new(
                b.left + margin,
                b.top + margin,
                self.width.saturating_sub(b.right + margin),
                self.height.saturating_sub(b.bottom + margin),
            );
            if rect.x1 > rect.x0 + 4 && rect.y1 > rect.y0 + 4 {
                return rect;
            }
        }
        PixelRect::new(
            self.width / 4,
            self.height / 4,
            self.width - self.width / 4,
            self.height - self.height / 4,
        )
    }

    fn ring_median(&self) -> [f32; 3] {
        let strip = self.strip();
        let mut channels: [Vec<u8>; 3] = [Vec::new(), Vec::new(), Vec::new()];

        for (x, y, pixel) in self.rgb.enumerate_pixels() {
            let in_ring = x < strip
                || y < strip
                || x >= self.width.saturating_sub(strip)
                || y >= self.height.saturating_sub(strip);
            if in_ring {
                for (c, values) in channels.iter_mut().enumerate() {
                    values.push(pixel.0[c]);
                }
            }
        }

        median_per_channel(&mut channels)
    }

    /// Border widths from column/row median colors over the central half of
    /// the card, which keeps corner and edge wear out of the profile.
    fn locate_borders(&self) -> Option<BorderWidths> {
        let (w, h) = (self.width, self.height);
        let (row_lo, row_hi) = (h / 4, (h - h / 4).max(h / 4 + 1));
        let (col_lo, col_hi) = (w / 4, (w - w / 4).max(w / 4 + 1));

        let columns: Vec<[f32; 3]> = (0..w)
            .map(|x| self.median_color((row_lo..row_hi).map(|y| (x, y))))
            .collect();
        let rows: Vec<[f32; 3]> = (0..h)
            .map(|y| self.median_color((col_lo..col_hi).map(|x| (x, y))))
            .collect();

        let left = self.first_departure(columns.iter())?;
        let right = self.first_departure(columns.iter().rev())?;
        let top = self.first_departure(rows.iter())?;
        let bottom = self.first_departure(rows.iter().rev())?;

        if left + right == 0 || top + bottom == 0 {
            return None;
        }
        Some(BorderWidths {
            left,
            right,
            top,
            bottom,
        })
    }

    fn first_departure<'a>(&self, profile: impl Iterator<Item = &'a [f32; 3]>) -> Option<u32> {
        let profile: Vec<&[f32; 3]> = profile.collect();
        let limit = profile.len() / 2;
        profile
            .iter()
            .take(limit)
            .position(|c| distance(**c, self.border_reference) > BORDER_EDGE_DELTA)
            .map(|p| p as u32)
    }

    fn median_color(&self, coords: impl Iterator<Item = (u32, u32)>) -> [f32; 3] {
        let mut channels: [Vec<u8>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for (x, y) in coords {
            let p = self.rgb.get_pixel(x, y).0;
            for (c, values) in channels.iter_mut().enumerate() {
                values.push(p[c]);
            }
        }
        median_per_channel(&mut channels)
    }
}

/// Scores one defect axis, 0 pristine to 1 maximally defective.
pub trait DefectDetector: Send + Sync {
    fn axis(&self) -> DefectAxis;
    fn score(&self, context: &GradingContext) -> f32;
    fn name(&self) -> &'static str;
}

fn median_per_channel(channels: &mut [Vec<u8>; 3]) -> [f32; 3] {
    let mut median = [0.0; 3];
    for (c, values) in channels.iter_mut().enumerate() {
        values.sort_unstable();
        median[c] = values.get(values.len() / 2).copied().unwrap_or(0) as f32;
    }
    median
}

pub fn color_distance(pixel: [u8; 3], reference: [f32; 3]) -> f32 {
    distance(pixel.map(|v| v as f32), reference)
}

fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}
