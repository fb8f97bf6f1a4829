use anyhow::{Context, Result};
use loiter_vision::TrackerConfig;
use loiter_vision::core_modules::segmenter::SegmenterConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Everything a run needs, as loaded from a TOML file.
///
/// ```toml
/// [source]
/// template = "samples/thirdView{NUMBER}.jpg"
/// frame_count = 999
///
/// [tracker]
/// min_area_threshold = 400.0
/// color_threshold = 5.0
///
/// [render]
/// output_dir = "out"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub source: SourceConfig,
    pub tracker: TrackerConfig,
    pub segmenter: SegmenterConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Path template; `{NUMBER}` is replaced with the six-digit frame index.
    pub template: String,
    pub start: u64,
    pub frame_count: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            template: String::from("frames/frame{NUMBER}.jpg"),
            start: 0,
            frame_count: 999,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Where annotated frames are written. Nothing is rendered when unset.
    pub output_dir: Option<PathBuf>,
}

pub fn load(path: &Path) -> Result<RunConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}
