// THEORY:
// Frames arrive in color but the segmenter and the color signatures both work on a
// single channel. The luma (Y of YCrCb, Rec. 601 weights) keeps brightness and drops
// chroma; a global histogram equalization then stretches the contrast so that dim
// scenes still give the background model something to work with.

use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::equalize_histogram;

/// Rec. 601 luma of an RGB frame, rounded to the nearest level.
pub fn luma(frame: &RgbImage) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let [r, g, b] = frame.get_pixel(x, y).0;
        let value = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// The grayscale input the segmenter expects.
pub fn preprocess(frame: &RgbImage) -> GrayImage {
    equalize_histogram(&luma(frame))
}
