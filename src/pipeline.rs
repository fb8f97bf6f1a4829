// THEORY:
// The `pipeline` module is the top-level API of the tracking library. It wires the
// association layer together for one frame at a time:
//
//   blobs -> BlobGate -> exposure + ColorSignature -> PersonRegistry -> FrameReport
//
// Key architectural principles:
// 1.  **Single Writer**: The `TrackingEngine` owns the one `PersonRegistry` of a run.
//     Frames are processed strictly in increasing index order because matching
//     depends on the state left behind by the previous frame.
// 2.  **Frame-Level Failure**: A blob whose signature cannot be computed is dropped
//     for that frame and reported as such; the rest of the frame, and every later
//     frame, carries on.
// 3.  **Validated Once**: Configuration is checked when the engine is built, never
//     mid-run.

use crate::core_modules::blob::Blob;
use crate::core_modules::blob_gate::{BlobClass, BlobGate};
use crate::core_modules::color_signature::{self, DEFAULT_BANDS};
use crate::core_modules::exposure::expose;
use crate::core_modules::person::{Candidate, PersonId};
use crate::core_modules::person_registry::{MatchOutcome, PersonRegistry};
use crate::error::{ConfigError, SignatureError, TrackingError};
use image::GrayImage;
use serde::Deserialize;
use tracing::warn;

pub use crate::core_modules::person::Person;
pub use crate::core_modules::person_registry::MatchPolicy;

/// Configuration for the `TrackingEngine`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Smallest blob area, in pixels, treated as a person. Inclusive.
    pub min_area_threshold: f64,
    /// Largest per-band, per-channel difference between two color signatures that
    /// still counts as the same person.
    pub color_threshold: f64,
    /// Number of horizontal bands in a color signature.
    pub signature_bands: usize,
    /// Frames a person may go unseen before it is retired. `None` keeps everyone.
    pub max_age: Option<u64>,
    pub match_policy: MatchPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_area_threshold: 400.0,
            color_threshold: 5.0,
            signature_bands: DEFAULT_BANDS,
            max_age: None,
            match_policy: MatchPolicy::FirstMatch,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_area_threshold.is_finite() || self.min_area_threshold < 0.0 {
            return Err(ConfigError::InvalidAreaThreshold(self.min_area_threshold));
        }
        if !self.color_threshold.is_finite() || self.color_threshold < 0.0 {
            return Err(ConfigError::InvalidColorThreshold(self.color_threshold));
        }
        if self.signature_bands == 0 {
            return Err(ConfigError::ZeroBands);
        }
        Ok(())
    }
}

/// What happened to one blob during a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    /// Below the area threshold; no tracking consequence.
    Noise,
    /// A candidate whose color signature could not be computed.
    Dropped(SignatureError),
    /// Absorbed by an existing person.
    Matched(PersonId),
    /// Minted a new person.
    Created(PersonId),
}

impl DetectionOutcome {
    pub fn person_id(&self) -> Option<PersonId> {
        match self {
            DetectionOutcome::Matched(id) | DetectionOutcome::Created(id) => Some(*id),
            DetectionOutcome::Noise | DetectionOutcome::Dropped(_) => None,
        }
    }
}

/// A blob paired with its outcome, for rendering and reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub blob: Blob,
    pub outcome: DetectionOutcome,
}

/// The per-frame output of the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    /// One entry per input blob, in input order.
    pub detections: Vec<Detection>,
    /// Persons moved to the retired partition at the end of this frame.
    pub retired: Vec<PersonId>,
}

impl FrameReport {
    pub fn matched(&self) -> usize {
        self.count(|outcome| matches!(outcome, DetectionOutcome::Matched(_)))
    }

    pub fn created(&self) -> usize {
        self.count(|outcome| matches!(outcome, DetectionOutcome::Created(_)))
    }

    pub fn noise(&self) -> usize {
        self.count(|outcome| matches!(outcome, DetectionOutcome::Noise))
    }

    pub fn dropped(&self) -> usize {
        self.count(|outcome| matches!(outcome, DetectionOutcome::Dropped(_)))
    }

    fn count(&self, predicate: impl Fn(&DetectionOutcome) -> bool) -> usize {
        self.detections
            .iter()
            .filter(|detection| predicate(&detection.outcome))
            .count()
    }
}

/// The main, top-level struct for person tracking.
pub struct TrackingEngine {
    config: TrackerConfig,
    gate: BlobGate,
    registry: PersonRegistry,
    last_frame: Option<u64>,
}

impl TrackingEngine {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            gate: BlobGate::new(config.min_area_threshold),
            registry: PersonRegistry::new(config.color_threshold, config.match_policy, config.max_age),
            config,
            last_frame: None,
        })
    }

    /// Associates one frame's blobs with known persons.
    ///
    /// `frame` is the grayscale source frame and `mask` its foreground mask; both must
    /// share dimensions. `frame_index` must be strictly greater than the previous one.
    pub fn process_frame(
        &mut self,
        frame_index: u64,
        frame: &GrayImage,
        mask: &GrayImage,
        blobs: &[Blob],
    ) -> Result<FrameReport, TrackingError> {
        if frame.dimensions() != mask.dimensions() {
            return Err(TrackingError::DimensionMismatch {
                frame_width: frame.width(),
                frame_height: frame.height(),
                mask_width: mask.width(),
                mask_height: mask.height(),
            });
        }
        if let Some(previous) = self.last_frame {
            if frame_index <= previous {
                return Err(TrackingError::FrameOutOfOrder {
                    previous,
                    received: frame_index,
                });
            }
        }
        self.last_frame = Some(frame_index);

        let exposed = expose(frame, mask);
        let detections = blobs
            .iter()
            .map(|blob| Detection {
                blob: *blob,
                outcome: self.associate(frame_index, &exposed, blob),
            })
            .collect();

        let retired = self.registry.retire_stale(frame_index);

        Ok(FrameReport {
            frame_index,
            detections,
            retired,
        })
    }

    fn associate(&mut self, frame_index: u64, exposed: &GrayImage, blob: &Blob) -> DetectionOutcome {
        if self.gate.classify(blob) == BlobClass::Noise {
            return DetectionOutcome::Noise;
        }

        let color_signature =
            match color_signature::compute(exposed, blob.bounding_box, self.config.signature_bands) {
                Ok(signature) => signature,
                Err(err) => {
                    warn!(frame = frame_index, error = %err, "dropping candidate");
                    return DetectionOutcome::Dropped(err);
                }
            };

        let candidate = Candidate {
            centroid: blob.centroid,
            bounding_box: blob.bounding_box,
            color_signature,
            frame_index,
        };

        match self.registry.update_or_create(candidate) {
            (MatchOutcome::Matched, person) => DetectionOutcome::Matched(person.id()),
            (MatchOutcome::Created, person) => DetectionOutcome::Created(person.id()),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn registry(&self) -> &PersonRegistry {
        &self.registry
    }

    /// Index of the last frame processed, if any.
    pub fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }
}
