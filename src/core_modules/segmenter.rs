// THEORY:
// The segmenter separates moving foreground from a learned background. It is the only
// stateful stage before association: every pixel keeps a running estimate of its
// background level, and a pixel is foreground when the current frame strays from
// that estimate by more than a fixed cut-off.
//
// Key architectural principles:
// 1.  **Temporal Memory**: Like a chunk that learns its own normal, each pixel's
//     background is an exponential moving average. Frames must therefore be fed in
//     order, exactly once.
// 2.  **Cold Start**: The first frame (or a frame whose size differs from the model)
//     only seeds the background and yields an empty mask.
// 3.  **Cleanup**: The raw mask is closed (fills pin holes inside bodies) then opened
//     (removes isolated speckles) with square kernels.
// 4.  **Swappable**: Consumers depend on the `ForegroundSegmenter` trait, not on this
//     particular model.

use crate::error::ConfigError;
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use serde::Deserialize;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Turns a grayscale frame into a binary foreground mask of the same size.
pub trait ForegroundSegmenter {
    fn segment(&mut self, frame: &GrayImage) -> GrayImage;
}

/// Tunables for `RunningAverageSegmenter`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Weight of the newest frame in the background estimate, in [0, 1]. Zero freezes
    /// the model after the seeding frame.
    pub learning_rate: f32,
    /// Minimum absolute difference from the background for a pixel to be foreground.
    pub difference_threshold: u8,
    /// Side of the square closing kernel. Zero or one disables closing.
    pub close_kernel: u32,
    /// Side of the square opening kernel. Zero or one disables opening.
    pub open_kernel: u32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.002,
            difference_threshold: 30,
            close_kernel: 5,
            open_kernel: 3,
        }
    }
}

impl SegmenterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.learning_rate) {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        Ok(())
    }
}

pub struct RunningAverageSegmenter {
    config: SegmenterConfig,
    width: u32,
    height: u32,
    background: Vec<f32>,
}

impl RunningAverageSegmenter {
    pub fn new(config: SegmenterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::unchecked(config))
    }

    fn unchecked(config: SegmenterConfig) -> Self {
        Self {
            config,
            width: 0,
            height: 0,
            background: Vec::new(),
        }
    }

    fn seed(&mut self, frame: &GrayImage) {
        self.width = frame.width();
        self.height = frame.height();
        self.background = frame.as_raw().iter().map(|&v| v as f32).collect();
    }

    /// The current background estimate, rounded to whole levels.
    pub fn background(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let value = self.background[(y * self.width + x) as usize];
            Luma([value.round().clamp(0.0, 255.0) as u8])
        })
    }
}

impl Default for RunningAverageSegmenter {
    fn default() -> Self {
        Self::unchecked(SegmenterConfig::default())
    }
}

impl ForegroundSegmenter for RunningAverageSegmenter {
    fn segment(&mut self, frame: &GrayImage) -> GrayImage {
        if self.background.is_empty() || frame.dimensions() != (self.width, self.height) {
            self.seed(frame);
            return GrayImage::from_pixel(frame.width(), frame.height(), Luma([BACKGROUND]));
        }

        let alpha = self.config.learning_rate;
        let threshold = self.config.difference_threshold as f32;
        let mut mask = GrayImage::new(frame.width(), frame.height());

        for ((value, background), mask_pixel) in frame
            .as_raw()
            .iter()
            .zip(self.background.iter_mut())
            .zip(mask.pixels_mut())
        {
            let value = *value as f32;
            if (value - *background).abs() > threshold {
                mask_pixel.0[0] = FOREGROUND;
            }
            *background += alpha * (value - *background);
        }

        clean_mask(&mask, &self.config)
    }
}

/// Closes then opens a raw foreground mask with the configured square kernels.
///
/// A kernel of side `k` is the chessboard ball of radius `k / 2`, so odd sides map
/// exactly and sides of zero or one leave the mask untouched.
pub fn clean_mask(mask: &GrayImage, config: &SegmenterConfig) -> GrayImage {
    let closed = match kernel_radius(config.close_kernel) {
        0 => mask.clone(),
        radius => morphology::close(mask, Norm::LInf, radius),
    };
    match kernel_radius(config.open_kernel) {
        0 => closed,
        radius => morphology::open(&closed, Norm::LInf, radius),
    }
}

fn kernel_radius(side: u32) -> u8 {
    (side / 2).min(u8::MAX as u32) as u8
}
