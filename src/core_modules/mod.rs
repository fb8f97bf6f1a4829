pub mod blob;
pub mod blob_extractor;
pub mod blob_gate;
pub mod color_signature;
pub mod exposure;
pub mod person;
pub mod person_registry;
pub mod preprocess;
pub mod segmenter;
