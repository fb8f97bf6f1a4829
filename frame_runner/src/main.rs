// Drives the tracking engine over a directory of numbered still frames.
//
// Frames are decoded ahead of time on the blocking pool, but they are yielded in
// index order and association runs on this task alone. Ctrl-C is honoured between
// frames, never in the middle of one.

mod config;
mod render;
mod source;

use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use loiter_vision::core_modules::blob_extractor::{BlobExtractor, ConnectedComponentExtractor};
use loiter_vision::core_modules::preprocess::preprocess;
use loiter_vision::core_modules::segmenter::{ForegroundSegmenter, RunningAverageSegmenter};
use loiter_vision::{MatchPolicy, TrackingEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::RunConfig;
use crate::render::Renderer;
use crate::source::NumberedFrameSource;

#[derive(Parser, Debug)]
#[command(name = "frame_runner", about = "Track people across a sequence of numbered frames")]
struct Args {
    /// TOML run configuration. Command-line flags override its values.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Frame path template; `{NUMBER}` becomes the six-digit frame index.
    #[arg(long)]
    template: Option<String>,
    #[arg(long)]
    start: Option<u64>,
    /// Number of frames to process.
    #[arg(long)]
    frames: Option<u64>,
    /// Smallest blob area, in pixels, treated as a person.
    #[arg(long)]
    min_area: Option<f64>,
    /// Per-band color tolerance for re-identification.
    #[arg(long)]
    color_threshold: Option<f64>,
    /// Retire persons unseen for more than this many frames.
    #[arg(long)]
    max_age: Option<u64>,
    /// Associate with the closest gated person instead of the first one.
    #[arg(long)]
    best_match: bool,
    /// Write annotated frames into this directory.
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// Frames decoded ahead of the tracker. Defaults to the number of CPUs.
    #[arg(long)]
    decode_workers: Option<usize>,
    /// Log every processed frame.
    #[arg(long)]
    progress: bool,
}

impl Args {
    fn resolve(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => config::load(path)?,
            None => RunConfig::default(),
        };

        if let Some(template) = &self.template {
            config.source.template = template.clone();
        }
        if let Some(start) = self.start {
            config.source.start = start;
        }
        if let Some(frames) = self.frames {
            config.source.frame_count = frames;
        }
        if let Some(min_area) = self.min_area {
            config.tracker.min_area_threshold = min_area;
        }
        if let Some(color_threshold) = self.color_threshold {
            config.tracker.color_threshold = color_threshold;
        }
        if self.max_age.is_some() {
            config.tracker.max_age = self.max_age;
        }
        if self.best_match {
            config.tracker.match_policy = MatchPolicy::BestMatch;
        }
        if self.output_dir.is_some() {
            config.render.output_dir = self.output_dir.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    let config = args.resolve()?;
    let workers = args.decode_workers.unwrap_or_else(num_cpus::get).max(1);

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(true);
        }
    });

    run(config, workers, args.progress, stop_rx).await?;
    Ok(())
}

/// Tracks the configured sequence until it ends or `stop` flips, and hands back the
/// engine with everything it saw.
async fn run(
    config: RunConfig,
    workers: usize,
    progress: bool,
    stop: watch::Receiver<bool>,
) -> Result<TrackingEngine> {
    let source = Arc::new(NumberedFrameSource::new(
        config.source.template.clone(),
        config.source.start,
        config.source.frame_count,
    )?);
    let mut engine = TrackingEngine::new(config.tracker.clone()).context("invalid tracker configuration")?;
    let mut segmenter =
        RunningAverageSegmenter::new(config.segmenter).context("invalid segmenter configuration")?;
    let extractor = ConnectedComponentExtractor::default();
    let renderer = config
        .render
        .output_dir
        .as_deref()
        .map(Renderer::new)
        .transpose()?;

    info!(
        template = %config.source.template,
        frames = config.source.frame_count,
        min_area = config.tracker.min_area_threshold,
        color_threshold = config.tracker.color_threshold,
        policy = ?config.tracker.match_policy,
        workers,
        "start processing"
    );

    let mut frames = stream::iter(source.indices())
        .map(|index| {
            let source = Arc::clone(&source);
            tokio::task::spawn_blocking(move || source.load(index).map(|frame| (index, frame)))
        })
        .buffered(workers);

    let mut processed = 0u64;
    while let Some(decoded) = frames.next().await {
        if *stop.borrow() {
            info!("stop requested");
            break;
        }

        let (index, frame) = decoded.context("frame decoder panicked")??;
        let Some(frame) = frame else {
            info!(frame = index, "end of frame sequence");
            break;
        };

        let gray = preprocess(&frame);
        let mask = segmenter.segment(&gray);
        let blobs = extractor.extract(&mask);

        let report = match engine.process_frame(index, &gray, &mask, &blobs) {
            Ok(report) => report,
            Err(err) => {
                warn!(frame = index, error = %err, "skipping frame");
                continue;
            }
        };

        if progress {
            info!(
                frame = index,
                blobs = blobs.len(),
                matched = report.matched(),
                created = report.created(),
                noise = report.noise(),
                dropped = report.dropped(),
                "processed frame"
            );
        } else {
            debug!(frame = index, blobs = blobs.len(), "processed frame");
        }

        if let Some(renderer) = &renderer {
            renderer.render(&frame, &report, engine.registry())?;
        }
        processed += 1;
    }

    let registry = engine.registry();
    info!(
        frames = processed,
        persons = registry.len(),
        active = registry.active().len(),
        retired = registry.retired().len(),
        "completed processing"
    );
    for person in registry.all() {
        debug!(
            id = person.id(),
            first_seen = person.first_seen_frame(),
            last_seen = person.last_seen_frame(),
            track_points = person.tracks().len(),
            "person summary"
        );
    }
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_file() {
        let args = Args::parse_from([
            "frame_runner",
            "--template",
            "samples/thirdView{NUMBER}.jpg",
            "--frames",
            "50",
            "--color-threshold",
            "25",
            "--max-age",
            "10",
            "--best-match",
        ]);
        let config = args.resolve().unwrap();
        assert_eq!(config.source.template, "samples/thirdView{NUMBER}.jpg");
        assert_eq!(config.source.frame_count, 50);
        assert_eq!(config.tracker.color_threshold, 25.0);
        assert_eq!(config.tracker.min_area_threshold, 400.0);
        assert_eq!(config.tracker.max_age, Some(10));
        assert_eq!(config.tracker.match_policy, MatchPolicy::BestMatch);
    }

    #[tokio::test]
    async fn runs_to_the_end_of_a_short_sequence() {
        let dir = std::env::temp_dir().join(format!("frame_runner_run_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let template = dir.join("in{NUMBER}.png").to_string_lossy().into_owned();

        for index in 0..4u32 {
            let frame = image::RgbImage::from_fn(64, 48, |x, y| {
                let left = 8 + index * 4;
                if index > 0 && x >= left && x < left + 12 && (10..40).contains(&y) {
                    image::Rgb([240, 240, 240])
                } else {
                    image::Rgb([20, 20, 20])
                }
            });
            frame.save(template.replace("{NUMBER}", &format!("{index:06}"))).unwrap();
        }

        let mut config = RunConfig::default();
        config.source.template = template;
        config.source.frame_count = 10;
        config.tracker.min_area_threshold = 100.0;
        config.render.output_dir = Some(dir.join("out"));

        let (_stop_tx, stop_rx) = watch::channel(false);
        let engine = run(config, 2, true, stop_rx).await.unwrap();

        assert_eq!(engine.last_frame(), Some(3));
        assert!(dir.join("out").join("frame_000003.png").exists());
        assert!(!dir.join("out").join("frame_000004.png").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn a_raised_stop_flag_halts_before_the_next_frame() {
        let dir = std::env::temp_dir().join(format!("frame_runner_stop_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let template = dir.join("in{NUMBER}.png").to_string_lossy().into_owned();
        for index in 0..3u32 {
            image::RgbImage::from_pixel(16, 16, image::Rgb([30, 30, 30]))
                .save(template.replace("{NUMBER}", &format!("{index:06}")))
                .unwrap();
        }

        let mut config = RunConfig::default();
        config.source.template = template;
        config.source.frame_count = 3;
        config.render.output_dir = Some(dir.join("out"));

        let (stop_tx, stop_rx) = watch::channel(false);
        stop_tx.send(true).unwrap();
        let engine = run(config, 1, false, stop_rx).await.unwrap();

        assert_eq!(engine.last_frame(), None);
        assert!(engine.registry().is_empty());
        assert!(!dir.join("out").join("frame_000000.png").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
