// THEORY:
// The `blob` module holds the plain geometry shared by every layer. A `Blob` is a
// single connected foreground region detected in one frame. It is a "dumb" data
// container: it has no memory of earlier frames and is discarded once the frame
// has been processed. Persistence over time is the job of `Person`.

use serde::{Deserialize, Serialize};

/// An integer pixel coordinate. Signed so displacements can be taken directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance, in `i64` so large frames cannot overflow.
    pub fn distance_squared(&self, other: &Point) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

/// An axis-aligned rectangle: top-left corner plus size, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// One past the last column covered by the box.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// One past the last row covered by the box.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }
}

/// A single connected foreground region detected in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blob {
    /// The region's area in pixels.
    pub area: f64,
    /// The tightest box enclosing the region.
    pub bounding_box: BoundingBox,
    /// The region's center of mass, truncated to whole pixels.
    pub centroid: Point,
}

impl Blob {
    pub fn new(area: f64, bounding_box: BoundingBox, centroid: Point) -> Self {
        Self {
            area,
            bounding_box,
            centroid,
        }
    }
}
