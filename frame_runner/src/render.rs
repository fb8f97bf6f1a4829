use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use loiter_vision::core_modules::blob::BoundingBox;
use loiter_vision::core_modules::person::PersonId;
use loiter_vision::core_modules::person_registry::PersonRegistry;
use loiter_vision::{DetectionOutcome, FrameReport};
use std::path::{Path, PathBuf};

/// Persons seen within this many frames get a position marker.
pub const RECENTLY_SEEN_FRAMES: u64 = 5;

const CANDIDATE: Rgb<u8> = Rgb([0, 0, 255]);
const NOISE: Rgb<u8> = Rgb([0, 255, 0]);
const DROPPED: Rgb<u8> = Rgb([255, 255, 0]);
const CENTROID: Rgb<u8> = Rgb([255, 0, 0]);
const CENTROID_RADIUS: i32 = 5;
const MARKER_RADIUS: i32 = 3;

/// A stable per-person color. Each id steps one channel by 256/8, cycling through
/// the channels, and wraps a channel back to zero once it overflows.
pub fn palette(id: PersonId) -> Rgb<u8> {
    const STEP: u32 = 256 / 8;
    let mut channels = [0u32; 3];
    for i in 0..id {
        let channel = (i % 3) as usize;
        channels[channel] += STEP;
        if channels[channel] > 256 {
            channels[channel] = 0;
        }
    }
    Rgb(channels.map(|c| c.min(255) as u8))
}

fn to_rect(bbox: BoundingBox) -> Option<Rect> {
    (bbox.width > 0 && bbox.height > 0)
        .then(|| Rect::at(bbox.x as i32, bbox.y as i32).of_size(bbox.width, bbox.height))
}

/// Draws one frame's detections and every active person's trajectory over `frame`.
pub fn annotate(frame: &RgbImage, report: &FrameReport, registry: &PersonRegistry) -> RgbImage {
    let mut canvas = frame.clone();

    for person in registry.active() {
        let color = palette(person.id());
        let mut points = person.tracks().to_vec();
        points.push(person.position());
        for segment in points.windows(2) {
            draw_line_segment_mut(
                &mut canvas,
                (segment[0].x as f32, segment[0].y as f32),
                (segment[1].x as f32, segment[1].y as f32),
                color,
            );
        }

        if person.age(report.frame_index) < RECENTLY_SEEN_FRAMES {
            let position = person.position();
            draw_filled_circle_mut(&mut canvas, (position.x + 5, position.y), MARKER_RADIUS, color);
        }
    }

    for detection in &report.detections {
        let color = match detection.outcome {
            DetectionOutcome::Noise => NOISE,
            DetectionOutcome::Dropped(_) => DROPPED,
            DetectionOutcome::Matched(_) | DetectionOutcome::Created(_) => CANDIDATE,
        };
        if let Some(rect) = to_rect(detection.blob.bounding_box) {
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
        if detection.outcome.person_id().is_some() {
            let centroid = detection.blob.centroid;
            draw_filled_circle_mut(&mut canvas, (centroid.x, centroid.y), CENTROID_RADIUS, CENTROID);
        }
    }

    canvas
}

/// Writes annotated frames as `frame_NNNNNN.png` into one directory.
pub struct Renderer {
    output_dir: PathBuf,
}

impl Renderer {
    pub fn new(output_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("creating output directory {}", output_dir.display()))?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn path_for(&self, frame_index: u64) -> PathBuf {
        self.output_dir.join(format!("frame_{frame_index:06}.png"))
    }

    pub fn render(
        &self,
        frame: &RgbImage,
        report: &FrameReport,
        registry: &PersonRegistry,
    ) -> Result<PathBuf> {
        let path = self.path_for(report.frame_index);
        annotate(frame, report, registry)
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}
