use image::{GrayImage, Luma, Rgb, RgbImage};
use loiter_vision::core_modules::blob::{BoundingBox, Point};
use loiter_vision::core_modules::blob_extractor::{BlobExtractor, ConnectedComponentExtractor};
use loiter_vision::core_modules::color_signature::ColorSignature;
use loiter_vision::core_modules::person::Candidate;
use loiter_vision::core_modules::person_registry::{MatchOutcome, MatchPolicy, PersonRegistry};
use loiter_vision::core_modules::preprocess::preprocess;
use loiter_vision::core_modules::segmenter::{
    ForegroundSegmenter, RunningAverageSegmenter, SegmenterConfig,
};
use loiter_vision::{DetectionOutcome, TrackerConfig, TrackingEngine};

fn candidate(centroid: (i32, i32), bbox: (u32, u32, u32, u32), colors: [f64; 3], frame: u64) -> Candidate {
    Candidate {
        centroid: Point::new(centroid.0, centroid.1),
        bounding_box: BoundingBox::new(bbox.0, bbox.1, bbox.2, bbox.3),
        color_signature: ColorSignature::from(colors.to_vec()),
        frame_index: frame,
    }
}

#[test]
fn two_people_three_frames() {
    let mut registry = PersonRegistry::new(50.0, MatchPolicy::FirstMatch, None);

    let (outcome, person) =
        registry.update_or_create(candidate((100, 100), (90, 80, 20, 40), [10.0, 12.0, 11.0], 1));
    assert_eq!(outcome, MatchOutcome::Created);
    assert_eq!(person.id(), 1);
    assert_eq!(person.position(), Point::new(100, 100));
    assert!(person.tracks().is_empty());

    let (outcome, person) =
        registry.update_or_create(candidate((105, 102), (88, 78, 22, 42), [15.0, 18.0, 14.0], 2));
    assert_eq!(outcome, MatchOutcome::Matched);
    assert_eq!(person.id(), 1);
    assert_eq!(person.position(), Point::new(105, 102));
    assert_eq!(person.tracks(), &[Point::new(100, 100)]);
    assert_eq!(person.last_seen_frame(), 2);

    let (outcome, person) = registry.update_or_create(candidate(
        (400, 400),
        (390, 380, 20, 40),
        [200.0, 210.0, 205.0],
        3,
    ));
    assert_eq!(outcome, MatchOutcome::Created);
    assert_eq!(person.id(), 2);

    let ids: Vec<u64> = registry.all().map(|p| p.id()).collect();
    assert_eq!(ids, vec![1, 2]);
}

/// A dark corridor with a bright walker stepping right by `step` pixels per frame.
fn corridor_frame(index: u32, step: u32) -> RgbImage {
    let left = 20 + index * step;
    RgbImage::from_fn(160, 120, |x, y| {
        // A faint gradient keeps the histogram non-trivial.
        let base = 30 + (x / 40) as u8;
        if x >= left && x < left + 16 && (30..90).contains(&y) {
            Rgb([230, 220, 210])
        } else {
            Rgb([base, base, base])
        }
    })
}

#[test]
fn segment_extract_and_track_a_walker() {
    let mut segmenter = RunningAverageSegmenter::new(SegmenterConfig {
        learning_rate: 0.0,
        ..SegmenterConfig::default()
    })
    .unwrap();
    let extractor = ConnectedComponentExtractor::default();
    let mut engine = TrackingEngine::new(TrackerConfig {
        min_area_threshold: 400.0,
        color_threshold: 20.0,
        ..TrackerConfig::default()
    })
    .unwrap();

    // Empty scene to seed the background model.
    let empty = RgbImage::from_fn(160, 120, |x, _| {
        let base = 30 + (x / 40) as u8;
        Rgb([base, base, base])
    });
    let gray = preprocess(&empty);
    let mask = segmenter.segment(&gray);
    let blobs = extractor.extract(&mask);
    assert!(blobs.is_empty());
    engine.process_frame(0, &gray, &mask, &blobs).unwrap();

    let mut seen = Vec::new();
    for index in 1..6u32 {
        let gray = preprocess(&corridor_frame(index, 6));
        let mask = segmenter.segment(&gray);
        let blobs = extractor.extract(&mask);
        let report = engine.process_frame(index as u64, &gray, &mask, &blobs).unwrap();

        let ids: Vec<u64> = report
            .detections
            .iter()
            .filter_map(|d| d.outcome.person_id())
            .collect();
        assert_eq!(ids.len(), 1, "frame {index}: {:?}", report.detections);
        seen.push(ids[0]);
    }

    assert!(seen.iter().all(|&id| id == 1), "identities drifted: {seen:?}");
    let walker = engine.registry().get(1).unwrap();
    assert_eq!(walker.tracks().len(), 4);
    assert!(walker.position().x > walker.tracks()[0].x);
}

#[test]
fn small_specks_never_become_people() {
    let mut engine = TrackingEngine::new(TrackerConfig::default()).unwrap();
    let frame = GrayImage::from_pixel(64, 64, Luma([90]));
    let mut mask = GrayImage::new(64, 64);
    for y in 10..20 {
        for x in 10..20 {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    let blobs = ConnectedComponentExtractor::default().extract(&mask);
    let report = engine.process_frame(0, &frame, &mask, &blobs).unwrap();
    assert_eq!(report.detections.len(), 1);
    assert_eq!(report.detections[0].outcome, DetectionOutcome::Noise);
    assert!(engine.registry().is_empty());
}
