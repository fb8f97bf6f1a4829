// THEORY:
// A `ColorSignature` is a coarse re-identification cue. The candidate's bounding box
// is cut into N horizontal bands (head / torso / limbs for N = 3) and each band is
// reduced to its mean pixel value, per channel. Two detections of the same person
// in consecutive frames should produce signatures that agree band by band within a
// small tolerance.
//
// Band boundaries use a fixed step of floor(h / N) rows. The last band absorbs the
// remainder, so the bands are contiguous, never overlap, and cover every row.

use crate::core_modules::blob::BoundingBox;
use crate::error::SignatureError;
use image::{ImageBuffer, Pixel};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Head, torso and limbs.
pub const DEFAULT_BANDS: usize = 3;

/// An ordered sequence of per-band averages. Each band holds one mean per channel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorSignature {
    bands: Vec<Vec<f64>>,
}

impl ColorSignature {
    pub fn from_bands(bands: Vec<Vec<f64>>) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &[Vec<f64>] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// True when every band and channel of `other` lies within `threshold` of ours.
    ///
    /// Signatures with a different shape never match.
    pub fn within_tolerance(&self, other: &ColorSignature, threshold: f64) -> bool {
        self.bands.len() == other.bands.len()
            && self.bands.iter().zip(&other.bands).all(|(ours, theirs)| {
                ours.len() == theirs.len()
                    && ours
                        .iter()
                        .zip(theirs)
                        .all(|(a, b)| (a - b).abs() <= threshold)
            })
    }
}

/// Single-channel signatures, one value per band.
impl From<Vec<f64>> for ColorSignature {
    fn from(values: Vec<f64>) -> Self {
        Self {
            bands: values.into_iter().map(|v| vec![v]).collect(),
        }
    }
}

/// Row ranges, relative to the top of the region, for each of `bands` bands.
pub fn band_rows(height: u32, bands: usize) -> Vec<Range<u32>> {
    if bands == 0 {
        return Vec::new();
    }
    let step = height / bands as u32;
    (0..bands as u32)
        .map(|i| {
            let start = step * i;
            let end = if i as usize == bands - 1 {
                height
            } else {
                step * (i + 1)
            };
            start..end
        })
        .collect()
}

/// Computes the banded mean of `region` on `image`.
pub fn compute<P>(
    image: &ImageBuffer<P, Vec<u8>>,
    region: BoundingBox,
    bands: usize,
) -> Result<ColorSignature, SignatureError>
where
    P: Pixel<Subpixel = u8>,
{
    if region.right() > image.width() || region.bottom() > image.height() {
        return Err(SignatureError::OutOfBounds {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            image_width: image.width(),
            image_height: image.height(),
        });
    }

    let channels = P::CHANNEL_COUNT as usize;
    let mut averages = Vec::with_capacity(bands);

    for (band, rows) in band_rows(region.height, bands).into_iter().enumerate() {
        let num_pixels = rows.len() as u64 * region.width as u64;
        if num_pixels == 0 {
            return Err(SignatureError::DegenerateBand {
                band,
                width: region.width,
                height: region.height,
            });
        }

        let mut sums = vec![0u64; channels];
        for y in rows {
            for x in 0..region.width {
                let pixel = image.get_pixel(region.x + x, region.y + y);
                for (sum, value) in sums.iter_mut().zip(pixel.channels()) {
                    *sum += *value as u64;
                }
            }
        }

        averages.push(
            sums.into_iter()
                .map(|sum| sum as f64 / num_pixels as f64)
                .collect(),
        );
    }

    Ok(ColorSignature { bands: averages })
}
