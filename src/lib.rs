// THEORY:
// This file is the main entry point for the `loiter_vision` library crate.
//
// The crate turns a stream of still frames into persistent "person" tracks. The
// heavy lifting is split into layers, leaves first:
// 1.  **Segmentation** (`core_modules::preprocess`, `core_modules::segmenter`,
//     `core_modules::blob_extractor`): frame -> grayscale -> foreground mask -> blobs.
// 2.  **Description** (`core_modules::exposure`, `core_modules::color_signature`):
//     each candidate blob gets a banded color signature computed on the frame with
//     its background blanked out.
// 3.  **Association** (`core_modules::person_registry`): the registry decides whether
//     a candidate is someone already known or a new person.
//
// `pipeline::TrackingEngine` is the public face of the whole stack. Frame I/O and
// rendering live in the `frame_runner` binary.

pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use crate::error::{ConfigError, SignatureError, TrackingError};
pub use crate::pipeline::{
    Detection, DetectionOutcome, FrameReport, MatchPolicy, TrackerConfig, TrackingEngine,
};
