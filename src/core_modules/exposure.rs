// Isolates foreground pixels before color signatures are taken, so background that
// falls inside a loose bounding box does not pollute the band averages.

use image::GrayImage;

/// The frame minus the inverted mask, saturating at zero.
///
/// Foreground pixels (mask 255) keep their value and background pixels (mask 0) go
/// to black. `frame` and `mask` must have the same dimensions.
pub fn expose(frame: &GrayImage, mask: &GrayImage) -> GrayImage {
    debug_assert_eq!(frame.dimensions(), mask.dimensions());

    let mut exposed = frame.clone();
    for (pixel, mask_pixel) in exposed.pixels_mut().zip(mask.pixels()) {
        pixel.0[0] = pixel.0[0].saturating_sub(u8::MAX - mask_pixel.0[0]);
    }
    exposed
}
