use std::sync::Arc;

use image::{DynamicImage, ImageBuffer, Luma, LumaA, Rgb, RgbImage, Rgba};

use crate::error::PipelineError;

/// Channel layout of a [`RawImage`] buffer, interleaved 8-bit samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl ChannelLayout {
    pub fn channels(&self) -> usize {
        match self {
            ChannelLayout::Gray => 1,
            ChannelLayout::GrayAlpha => 2,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Srgb,
    LinearRgb,
}

/// Caller-owned pixel data for a single request.
///
/// Building a `RawImage` from raw parts does not validate anything; the
/// preprocessor and the condition analyzer reject malformed buffers with
/// [`PipelineError::InvalidImage`]. Cloning is cheap, the pixel bytes are
/// shared.
#[derive(Debug, Clone)]
pub struct RawImage {
    width: u32,
    height: u32,
    layout: ChannelLayout,
    color_space: ColorSpace,
    data: Arc<[u8]>,
}

impl RawImage {
    pub fn from_raw(width: u32, height: u32, layout: ChannelLayout, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            layout,
            color_space: ColorSpace::Srgb,
            data: Arc::from(data),
        }
    }

    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = color_space;
        self
    }

    /// Decode an encoded image (PNG, JPEG, ...) held in memory.
    pub fn from_encoded(bytes: &[u8]) -> Result<Self, PipelineError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| PipelineError::invalid_image(format!("undecodable image: {}", e)))?;
        Ok(Self::from(decoded))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.width == 0 || self.height == 0 {
            return Err(PipelineError::invalid_image(format!(
                "image has zero area ({}x{})",
                self.width, self.height
            )));
        }

        let expected = self.width as usize * self.height as usize * self.layout.channels();
        if self.data.len() != expected {
            return Err(PipelineError::invalid_image(format!(
                "buffer holds {} bytes, {}x{} {:?} needs {}",
                self.data.len(),
                self.width,
                self.height,
                self.layout,
                expected
            )));
        }

        Ok(())
    }

    /// Validated sRGB view of the pixels, alpha dropped and gray replicated.
    pub fn to_rgb8(&self) -> Result<RgbImage, PipelineError> {
        self.validate()?;
        let (w, h) = (self.width, self.height);
        let data = self.data.to_vec();
        let corrupt = || PipelineError::invalid_image("pixel buffer does not match dimensions");

        let dynamic = match self.layout {
            ChannelLayout::Gray => DynamicImage::ImageLuma8(
                ImageBuffer::<Luma<u8>, _>::from_raw(w, h, data).ok_or_else(corrupt)?,
            ),
            ChannelLayout::GrayAlpha => DynamicImage::ImageLumaA8(
                ImageBuffer::<LumaA<u8>, _>::from_raw(w, h, data).ok_or_else(corrupt)?,
            ),
            ChannelLayout::Rgb => DynamicImage::ImageRgb8(
                ImageBuffer::<Rgb<u8>, _>::from_raw(w, h, data).ok_or_else(corrupt)?,
            ),
            ChannelLayout::Rgba => DynamicImage::ImageRgba8(
                ImageBuffer::<Rgba<u8>, _>::from_raw(w, h, data).ok_or_else(corrupt)?,
            ),
        };

        let mut rgb = dynamic.to_rgb8();
        if self.color_space == ColorSpace::LinearRgb {
            for pixel in rgb.pixels_mut() {
                for channel in pixel.0.iter_mut() {
                    *channel = linear_to_srgb(*channel);
                }
            }
        }
        Ok(rgb)
    }
}

impl From<DynamicImage> for RawImage {
    fn from(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(buf) => {
                let (w, h) = buf.dimensions();
                Self::from_raw(w, h, ChannelLayout::Gray, buf.into_raw())
            }
            DynamicImage::ImageLumaA8(buf) => {
                let (w, h) = buf.dimensions();
                Self::from_raw(w, h, ChannelLayout::GrayAlpha, buf.into_raw())
            }
            DynamicImage::ImageRgba8(buf) => {
                let (w, h) = buf.dimensions();
                Self::from_raw(w, h, ChannelLayout::Rgba, buf.into_raw())
            }
            other => {
                let buf = other.to_rgb8();
                let (w, h) = buf.dimensions();
                Self::from_raw(w, h, ChannelLayout::Rgb, buf.into_raw())
            }
        }
    }
}

fn linear_to_srgb(value: u8) -> u8 {
    let v = value as f32 / 255.0;
    let encoded = if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_area_is_invalid() {
        let image = RawImage::from_raw(0, 10, ChannelLayout::Rgb, vec![]);
        assert!(matches!(
            image.validate(),
            Err(PipelineError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_channel_mismatch_is_invalid() {
        // 2x2 RGBA needs 16 bytes, this is an RGB-sized buffer
        let image = RawImage::from_raw(2, 2, ChannelLayout::Rgba, vec![0; 12]);
        assert!(matches!(image.to_rgb8(), Err(PipelineError::InvalidImage(_))));
    }

    #[test]
    fn test_gray_is_replicated() {
        let image = RawImage::from_raw(1, 1, ChannelLayout::Gray, vec![77]);
        let rgb = image.to_rgb8().unwrap();
        assert_eq!(rgb.get_pixel(0, 0).0, [77, 77, 77]);
    }

    #[test]
    fn test_corrupt_bytes_fail_to_decode() {
        let result = RawImage::from_encoded(b"definitely not a png");
        assert!(matches!(result, Err(PipelineError::InvalidImage(_))));
    }

    #[test]
    fn test_linear_input_is_gamma_encoded() {
        let image = RawImage::from_raw(1, 1, ChannelLayout::Rgb, vec![64, 64, 64])
            .with_color_space(ColorSpace::LinearRgb);
        let rgb = image.to_rgb8().unwrap();
        assert!(rgb.get_pixel(0, 0).0[0] > 64);
    }
}
