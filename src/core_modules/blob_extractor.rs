// THEORY:
// The blob extractor is the spatial grouping stage. It takes a binary foreground mask
// and finds every region bounded by an outer contour, summarizing each into a `Blob`:
// area, tightest bounding box, and the region's center of mass.
//
// Only outer contours count. Holes inside a region belong to it, so their pixels add
// to its area and centroid, and anything sitting inside a hole is swallowed rather
// than reported on its own. A gap is a hole when its background pixels cannot reach
// the frame border through 4-connected steps; foreground connects through all 8
// neighbours, so a diagonal seam in a wall still closes it.
//
// It is a stateless utility with no memory of earlier frames. The order of the
// returned blobs is a labelling artifact and carries no meaning; association never
// depends on it.

use crate::core_modules::blob::{Blob, BoundingBox, Point};
use crate::core_modules::segmenter::{BACKGROUND, FOREGROUND};
use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use std::collections::HashSet;

/// Turns a binary mask into the blobs it contains.
pub trait BlobExtractor {
    fn extract(&self, mask: &GrayImage) -> Vec<Blob>;
}

/// 8-connected outer-contour regions, holes filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectedComponentExtractor {
    /// A mask pixel is foreground when strictly above this value.
    pub cutoff: u8,
}

impl Default for ConnectedComponentExtractor {
    fn default() -> Self {
        Self { cutoff: 127 }
    }
}

impl ConnectedComponentExtractor {
    fn binarize(&self, mask: &GrayImage) -> GrayImage {
        GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
            if mask.get_pixel(x, y).0[0] > self.cutoff {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        })
    }
}

/// Marks every background pixel that cannot reach the border as foreground.
fn fill_holes(binary: &GrayImage) -> GrayImage {
    let (width, height) = binary.dimensions();
    let gaps = connected_components(binary, Connectivity::Four, Luma([FOREGROUND]));

    let outside: HashSet<u32> = gaps
        .enumerate_pixels()
        .filter(|(x, y, _)| *x == 0 || *y == 0 || *x + 1 == width || *y + 1 == height)
        .map(|(_, _, label)| label.0[0])
        .filter(|&label| label != 0)
        .collect();

    GrayImage::from_fn(width, height, |x, y| {
        let label = gaps.get_pixel(x, y).0[0];
        if label == 0 || !outside.contains(&label) {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Running totals for one labelled region.
struct Region {
    count: u64,
    sum_x: u64,
    sum_y: u64,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl Region {
    fn starting_at(x: u32, y: u32) -> Self {
        Self {
            count: 0,
            sum_x: 0,
            sum_y: 0,
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn add(&mut self, x: u32, y: u32) {
        self.count += 1;
        self.sum_x += x as u64;
        self.sum_y += y as u64;
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn into_blob(self) -> Blob {
        Blob::new(
            self.count as f64,
            BoundingBox::new(
                self.min_x,
                self.min_y,
                self.max_x - self.min_x + 1,
                self.max_y - self.min_y + 1,
            ),
            Point::new(
                (self.sum_x / self.count) as i32,
                (self.sum_y / self.count) as i32,
            ),
        )
    }
}

impl BlobExtractor for ConnectedComponentExtractor {
    fn extract(&self, mask: &GrayImage) -> Vec<Blob> {
        let filled = fill_holes(&self.binarize(mask));
        let labels = connected_components(&filled, Connectivity::Eight, Luma([BACKGROUND]));

        let mut regions: Vec<Option<Region>> = Vec::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label.0[0] as usize;
            if label == 0 {
                continue;
            }
            if regions.len() < label {
                regions.resize_with(label, || None);
            }
            regions[label - 1]
                .get_or_insert_with(|| Region::starting_at(x, y))
                .add(x, y);
        }

        regions.into_iter().flatten().map(Region::into_blob).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paint(mask: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn empty_mask_has_no_blobs() {
        let extractor = ConnectedComponentExtractor::default();
        assert!(extractor.extract(&GrayImage::new(20, 20)).is_empty());
    }

    #[test]
    fn separate_regions_become_separate_blobs() {
        let mut mask = GrayImage::new(40, 40);
        paint(&mut mask, 2, 3, 4, 6);
        paint(&mut mask, 20, 20, 10, 5);

        let mut blobs = ConnectedComponentExtractor::default().extract(&mask);
        blobs.sort_by(|a, b| a.area.total_cmp(&b.area));
        assert_eq!(blobs.len(), 2);

        assert_eq!(blobs[0].area, 24.0);
        assert_eq!(blobs[0].bounding_box, BoundingBox::new(2, 3, 4, 6));
        assert_eq!(blobs[0].centroid, Point::new(3, 5));

        assert_eq!(blobs[1].area, 50.0);
        assert_eq!(blobs[1].bounding_box, BoundingBox::new(20, 20, 10, 5));
        assert_eq!(blobs[1].centroid, Point::new(24, 22));
    }

    #[test]
    fn diagonal_neighbors_are_connected() {
        let mut mask = GrayImage::new(5, 5);
        for i in 0..5 {
            mask.put_pixel(i, i, Luma([255]));
        }
        let blobs = ConnectedComponentExtractor::default().extract(&mask);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].bounding_box, BoundingBox::new(0, 0, 5, 5));
        assert_eq!(blobs[0].centroid, Point::new(2, 2));
    }

    fn ring(mask: &mut GrayImage, x0: u32, y0: u32, side: u32, wall: u32) {
        paint(mask, x0, y0, side, wall);
        paint(mask, x0, y0 + side - wall, side, wall);
        paint(mask, x0, y0, wall, side);
        paint(mask, x0 + side - wall, y0, wall, side);
    }

    #[test]
    fn holes_belong_to_the_enclosing_region() {
        let mut mask = GrayImage::new(30, 30);
        ring(&mut mask, 5, 5, 20, 5);
        paint(&mut mask, 14, 14, 2, 2);

        let blobs = ConnectedComponentExtractor::default().extract(&mask);
        assert_eq!(blobs.len(), 1, "{blobs:?}");
        assert_eq!(blobs[0].area, 400.0);
        assert_eq!(blobs[0].bounding_box, BoundingBox::new(5, 5, 20, 20));
        assert_eq!(blobs[0].centroid, Point::new(14, 14));
    }

    #[test]
    fn a_ring_on_the_frame_edge_still_encloses_its_hole() {
        let mut mask = GrayImage::new(20, 20);
        ring(&mut mask, 0, 0, 20, 3);

        let blobs = ConnectedComponentExtractor::default().extract(&mask);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].area, 400.0);
    }

    #[test]
    fn an_open_cavity_is_not_a_hole() {
        let mut mask = GrayImage::new(30, 30);
        ring(&mut mask, 5, 5, 20, 5);
        paint(&mut mask, 14, 14, 2, 2);
        // Cut a one-pixel channel through the top wall.
        for y in 5..10 {
            mask.put_pixel(15, y, Luma([0]));
        }

        let mut blobs = ConnectedComponentExtractor::default().extract(&mask);
        blobs.sort_by(|a, b| a.area.total_cmp(&b.area));
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].area, 4.0);
        assert_eq!(blobs[0].bounding_box, BoundingBox::new(14, 14, 2, 2));
        assert_eq!(blobs[1].area, 295.0);
    }

    #[test]
    fn values_at_the_cutoff_are_background() {
        let mask = GrayImage::from_pixel(3, 3, Luma([127]));
        assert!(ConnectedComponentExtractor::default().extract(&mask).is_empty());
    }
}
