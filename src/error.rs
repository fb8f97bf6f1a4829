use thiserror::Error;

/// Rejected tracker or segmenter configuration. Raised once, at construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("min_area_threshold must be a finite, non-negative number (got {0})")]
    InvalidAreaThreshold(f64),
    #[error("color_threshold must be a finite, non-negative number (got {0})")]
    InvalidColorThreshold(f64),
    #[error("signature_bands must be at least 1")]
    ZeroBands,
    #[error("learning_rate must lie in [0, 1] (got {0})")]
    InvalidLearningRate(f32),
}

/// Why a color signature could not be computed for a region.
///
/// Both variants mean "drop this candidate for this frame"; neither is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("band {band} of a {width}x{height} region has zero area")]
    DegenerateBand { band: usize, width: u32, height: u32 },
    #[error("region ({x}, {y}, {width}x{height}) lies outside a {image_width}x{image_height} frame")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
}

/// Frame-level failures of `TrackingEngine::process_frame`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    #[error("frame is {frame_width}x{frame_height} but mask is {mask_width}x{mask_height}")]
    DimensionMismatch {
        frame_width: u32,
        frame_height: u32,
        mask_width: u32,
        mask_height: u32,
    },
    #[error("frame {received} arrived after frame {previous}; frames must be strictly increasing")]
    FrameOutOfOrder { previous: u64, received: u64 },
}
