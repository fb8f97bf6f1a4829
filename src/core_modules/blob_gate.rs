// THEORY:
// The `BlobGate` is the cheapest filter in the stack: anything smaller than a person
// is noise. It is a pure predicate with an inclusive threshold, so a blob whose area
// equals the threshold is a candidate.

use crate::core_modules::blob::Blob;

/// The gate's verdict for a single blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobClass {
    /// Large enough to be matched against known persons.
    Candidate,
    /// Too small; reported for display only.
    Noise,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlobGate {
    min_area_threshold: f64,
}

impl BlobGate {
    pub fn new(min_area_threshold: f64) -> Self {
        Self { min_area_threshold }
    }

    pub fn min_area_threshold(&self) -> f64 {
        self.min_area_threshold
    }

    pub fn classify(&self, blob: &Blob) -> BlobClass {
        if blob.area >= self.min_area_threshold {
            BlobClass::Candidate
        } else {
            BlobClass::Noise
        }
    }

    pub fn is_candidate(&self, blob: &Blob) -> bool {
        self.classify(blob) == BlobClass::Candidate
    }
}
