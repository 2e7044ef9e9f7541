use image::{RgbImage, imageops, imageops::FilterType};
use serde::Deserialize;
use tracing::debug;

use crate::error::PipelineError;
use crate::pipeline::types::{
    INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH, PreprocessedTensor, RawImage,
};

/// How a photo with a different aspect ratio is fitted into the model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectPolicy {
    /// Crop the largest centered region with the target aspect, then resize.
    #[default]
    CenterCrop,
    /// Scale to fit and pad the remainder with mid-gray.
    Letterbox,
}

/// Normalized value used for letterbox padding (mid-gray).
const PAD_VALUE: f32 = 0.0;

#[derive(Debug, Clone)]
pub struct Preprocessor {
    policy: AspectPolicy,
    height: u32,
    width: u32,
}

impl Preprocessor {
    pub fn new(policy: AspectPolicy) -> Self {
        Self {
            policy,
            height: INPUT_HEIGHT as u32,
            width: INPUT_WIDTH as u32,
        }
    }

    pub fn with_shape(mut self, height: u32, width: u32) -> Self {
        self.height = height.max(1);
        self.width = width.max(1);
        self
    }

    pub fn policy(&self) -> AspectPolicy {
        self.policy
    }

    pub fn preprocess(&self, image: &RawImage) -> Result<PreprocessedTensor, PipelineError> {
        let rgb = image.to_rgb8()?;
        debug!(
            "Preprocessing {}x{} {:?} image with {:?}",
            image.width(),
            image.height(),
            image.layout(),
            self.policy
        );

        let data = match self.policy {
            AspectPolicy::CenterCrop => self.center_crop(&rgb),
            AspectPolicy::Letterbox => self.letterbox(&rgb),
        };

        PreprocessedTensor::new(
            self.height as usize,
            self.width as usize,
            INPUT_CHANNELS,
            data,
        )
        .ok_or_else(|| PipelineError::inference("preprocessed buffer has the wrong length"))
    }

    fn center_crop(&self, rgb: &RgbImage) -> Vec<f32> {
        let (w, h) = rgb.dimensions();
        let target_aspect = self.width as f64 / self.height as f64;
        let source_aspect = w as f64 / h as f64;

        let (crop_w, crop_h) = if source_aspect > target_aspect {
            let crop_w = ((h as f64 * target_aspect).round() as u32).clamp(1, w);
            (crop_w, h)
        } else {
            let crop_h = ((w as f64 / target_aspect).round() as u32).clamp(1, h);
            (w, crop_h)
        };
        let x0 = (w - crop_w) / 2;
        let y0 = (h - crop_h) / 2;

        let cropped = imageops::crop_imm(rgb, x0, y0, crop_w, crop_h).to_image();
        let resized = imageops::resize(&cropped, self.width, self.height, FilterType::Triangle);
        resized.as_raw().iter().map(|&v| normalize(v)).collect()
    }

    fn letterbox(&self, rgb: &RgbImage) -> Vec<f32> {
        let (w, h) = rgb.dimensions();
        let scale = (self.width as f64 / w as f64).min(self.height as f64 / h as f64);
        let new_w = ((w as f64 * scale).round() as u32).clamp(1, self.width);
        let new_h = ((h as f64 * scale).round() as u32).clamp(1, self.height);
        let resized = imageops::resize(rgb, new_w, new_h, FilterType::Triangle);

        let x0 = ((self.width - new_w) / 2) as usize;
        let y0 = ((self.height - new_h) / 2) as usize;
        let width = self.width as usize;
        let mut data = vec![PAD_VALUE; self.height as usize * width * INPUT_CHANNELS];

        for (x, y, pixel) in resized.enumerate_pixels() {
            let base = ((y0 + y as usize) * width + x0 + x as usize) * INPUT_CHANNELS;
            for c in 0..INPUT_CHANNELS {
                data[base + c] = normalize(pixel.0[c]);
            }
        }
        data
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(AspectPolicy::default())
    }
}

fn normalize(value: u8) -> f32 {
    value as f32 / 255.0 * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::ChannelLayout;
    use image::{ImageBuffer, Rgb};

    fn three_band_image() -> RawImage {
        // 300x100: red | white | blue
        let buffer = ImageBuffer::from_fn(300, 100, |x, _| {
            if x < 100 {
                Rgb([255u8, 0, 0])
            } else if x < 200 {
                Rgb([255u8, 255, 255])
            } else {
                Rgb([0u8, 0, 255])
            }
        });
        RawImage::from_raw(300, 100, ChannelLayout::Rgb, buffer.into_raw())
    }

    #[test]
    fn test_zero_dimension_image_is_rejected() {
        let image = RawImage::from_raw(0, 0, ChannelLayout::Rgb, vec![]);
        let result = Preprocessor::default().preprocess(&image);
        assert!(matches!(result, Err(PipelineError::InvalidImage(_))));
    }

    #[test]
    fn test_output_has_model_shape_and_range() {
        let tensor = Preprocessor::default()
            .preprocess(&three_band_image())
            .unwrap();
        assert_eq!(tensor.shape(), (INPUT_HEIGHT, INPUT_WIDTH, INPUT_CHANNELS));
        assert!(tensor.as_slice().iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_center_crop_keeps_the_middle() {
        let tensor = Preprocessor::new(AspectPolicy::CenterCrop)
            .preprocess(&three_band_image())
            .unwrap();
        // the middle third is white, so the whole crop should be close to 1.0
        let center = tensor.get(INPUT_HEIGHT / 2, INPUT_WIDTH / 2, 2);
        let left = tensor.get(INPUT_HEIGHT / 2, 2, 1);
        assert!(center > 0.99);
        assert!(left > 0.9);
    }

    #[test]
    fn test_letterbox_pads_with_mid_gray() {
        let tensor = Preprocessor::new(AspectPolicy::Letterbox)
            .preprocess(&three_band_image())
            .unwrap();
        // the 3:1 photo occupies the vertical middle; the first row is padding
        assert_eq!(tensor.get(0, INPUT_WIDTH / 2, 0), PAD_VALUE);
        // left band stays red
        let red = tensor.get(INPUT_HEIGHT / 2, 5, 0);
        let green = tensor.get(INPUT_HEIGHT / 2, 5, 1);
        assert!(red > 0.9 && green < -0.9);
    }

    #[test]
    fn test_preprocessing_is_deterministic() {
        let preprocessor = Preprocessor::default();
        let image = three_band_image();
        assert_eq!(
            preprocessor.preprocess(&image).unwrap(),
            preprocessor.preprocess(&image).unwrap()
        );
    }
}
