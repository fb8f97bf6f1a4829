// THEORY:
// A `Person` is a tracked subject: the memory that survives between frames. Where a
// `Blob` is a snapshot, a `Person` accumulates a trajectory, keeps the most recent
// geometry and color signature, and remembers when it was last seen.
//
// Only the `PersonRegistry` mutates a `Person`, so the mutators are crate-private.
// The invariants it keeps:
// - `id` is fixed at creation.
// - `tracks` only grows, by exactly one point per update: the position being
//   replaced. Creation records no track point.
// - `last_seen_frame` never decreases.

use crate::core_modules::blob::{BoundingBox, Point};
use crate::core_modules::color_signature::ColorSignature;
use serde::Serialize;

pub type PersonId = u64;

/// Everything the registry needs to know about one candidate blob.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub centroid: Point,
    pub bounding_box: BoundingBox,
    pub color_signature: ColorSignature,
    pub frame_index: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    id: PersonId,
    position: Point,
    bounding_box: BoundingBox,
    color_signature: ColorSignature,
    tracks: Vec<Point>,
    first_seen_frame: u64,
    last_seen_frame: u64,
    updates: u64,
}

impl Person {
    pub(crate) fn new(id: PersonId, candidate: Candidate) -> Self {
        Self {
            id,
            position: candidate.centroid,
            bounding_box: candidate.bounding_box,
            color_signature: candidate.color_signature,
            tracks: Vec::new(),
            first_seen_frame: candidate.frame_index,
            last_seen_frame: candidate.frame_index,
            updates: 1,
        }
    }

    /// Folds a matched candidate into this person.
    pub(crate) fn absorb(&mut self, candidate: Candidate) {
        self.tracks.push(self.position);
        self.position = candidate.centroid;
        self.bounding_box = candidate.bounding_box;
        self.color_signature = candidate.color_signature;
        self.last_seen_frame = self.last_seen_frame.max(candidate.frame_index);
        self.updates += 1;
    }

    pub fn id(&self) -> PersonId {
        self.id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    pub fn color_signature(&self) -> &ColorSignature {
        &self.color_signature
    }

    /// Past centroids in chronological order, excluding the current position.
    pub fn tracks(&self) -> &[Point] {
        &self.tracks
    }

    pub fn first_seen_frame(&self) -> u64 {
        self.first_seen_frame
    }

    pub fn last_seen_frame(&self) -> u64 {
        self.last_seen_frame
    }

    /// Number of detections folded into this person, creation included.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Frames elapsed since this person was last seen.
    pub fn age(&self, current_frame: u64) -> u64 {
        current_frame.saturating_sub(self.last_seen_frame)
    }

    /// The spatial gate: displacement is bounded by the candidate's own box size.
    pub fn within_reach(&self, candidate: &Candidate) -> bool {
        let dx = (candidate.centroid.x as i64 - self.position.x as i64).abs();
        let dy = (candidate.centroid.y as i64 - self.position.y as i64).abs();
        dx <= candidate.bounding_box.width as i64 && dy <= candidate.bounding_box.height as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(cx: i32, cy: i32, frame_index: u64) -> Candidate {
        Candidate {
            centroid: Point::new(cx, cy),
            bounding_box: BoundingBox::new(cx as u32 - 10, cy as u32 - 20, 20, 40),
            color_signature: ColorSignature::from(vec![10.0, 12.0, 11.0]),
            frame_index,
        }
    }

    #[test]
    fn creation_records_no_track() {
        let person = Person::new(1, candidate(100, 100, 0));
        assert!(person.tracks().is_empty());
        assert_eq!(person.position(), Point::new(100, 100));
        assert_eq!(person.updates(), 1);
    }

    #[test]
    fn each_update_appends_the_previous_position() {
        let mut person = Person::new(1, candidate(100, 100, 0));
        person.absorb(candidate(105, 102, 1));
        person.absorb(candidate(110, 104, 2));
        assert_eq!(person.tracks(), &[Point::new(100, 100), Point::new(105, 102)]);
        assert_eq!(person.position(), Point::new(110, 104));
        assert_eq!(person.tracks().len() as u64, person.updates() - 1);
        assert_eq!(person.last_seen_frame(), 2);
        assert_eq!(person.first_seen_frame(), 0);
    }

    #[test]
    fn last_seen_never_goes_backwards() {
        let mut person = Person::new(1, candidate(100, 100, 7));
        person.absorb(candidate(101, 100, 3));
        assert_eq!(person.last_seen_frame(), 7);
    }

    #[test]
    fn reach_is_bounded_by_the_candidate_box() {
        let person = Person::new(1, candidate(100, 100, 0));
        // Box is 20x40.
        assert!(person.within_reach(&candidate(120, 140, 1)));
        assert!(!person.within_reach(&candidate(121, 100, 1)));
        assert!(!person.within_reach(&candidate(100, 141, 1)));
        assert!(person.within_reach(&candidate(80, 60, 1)));
    }

    #[test]
    fn age_counts_frames_since_last_seen() {
        let person = Person::new(1, candidate(100, 100, 4));
        assert_eq!(person.age(4), 0);
        assert_eq!(person.age(9), 5);
        assert_eq!(person.age(2), 0);
    }
}
