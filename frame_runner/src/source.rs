use anyhow::{Context, Result, bail};
use image::RgbImage;
use std::ops::Range;
use std::path::PathBuf;

pub const NUMBER_PLACEHOLDER: &str = "{NUMBER}";

/// Frames stored one file per index, e.g. `thirdView000042.jpg`.
#[derive(Debug, Clone)]
pub struct NumberedFrameSource {
    template: String,
    start: u64,
    frame_count: u64,
}

impl NumberedFrameSource {
    pub fn new(template: impl Into<String>, start: u64, frame_count: u64) -> Result<Self> {
        let template = template.into();
        if !template.contains(NUMBER_PLACEHOLDER) {
            bail!("frame template {template:?} has no {NUMBER_PLACEHOLDER} placeholder");
        }
        Ok(Self {
            template,
            start,
            frame_count,
        })
    }

    pub fn indices(&self) -> Range<u64> {
        self.start..self.start.saturating_add(self.frame_count)
    }

    pub fn path_for(&self, index: u64) -> PathBuf {
        PathBuf::from(self.template.replace(NUMBER_PLACEHOLDER, &format!("{index:06}")))
    }

    /// Decodes frame `index`. `None` marks the end of the sequence: the index is out of
    /// range or its file does not exist.
    pub fn load(&self, index: u64) -> Result<Option<RgbImage>> {
        if !self.indices().contains(&index) {
            return Ok(None);
        }
        let path = self.path_for(index);
        if !path.exists() {
            return Ok(None);
        }
        let frame = image::open(&path)
            .with_context(|| format!("decoding frame {}", path.display()))?
            .to_rgb8();
        Ok(Some(frame))
    }
}
