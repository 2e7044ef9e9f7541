/// Model input height.
pub const INPUT_HEIGHT: usize = 224;
/// Model input width.
pub const INPUT_WIDTH: usize = 224;
/// Model input channels (RGB).
pub const INPUT_CHANNELS: usize = 3;

/// Fixed-shape HWC tensor with values normalized to [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessedTensor {
    height: usize,
    width: usize,
    channels: usize,
    data: Box<[f32]>,
}

impl PreprocessedTensor {
    /// Returns `None` when the buffer does not hold `height * width * channels` values.
    pub fn new(height: usize, width: usize, channels: usize, data: Vec<f32>) -> Option<Self> {
        if data.len() != height * width * channels {
            return None;
        }
        Some(Self {
            height,
            width,
            channels,
            data: data.into_boxed_slice(),
        })
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn get(&self, y: usize, x: usize, c: usize) -> f32 {
        self.data[(y * self.width + x) * self.channels + c]
    }
}
