// THEORY:
// The `PersonRegistry` solves the data association problem for this system: is the
// candidate in front of us somebody we already know?
//
// Key architectural principles:
// 1.  **Single Owner**: The registry exclusively owns every `Person` for the lifetime of
//     a run, together with the id counter. Nothing is process-wide, so independent
//     runs (and tests) never interfere.
// 2.  **Two Gates**: A known person matches a candidate only if the candidate's
//     centroid is within one box-width / box-height of the person's last position
//     (spatial gate) AND every band of the color signatures agrees within the
//     configured tolerance (color gate).
// 3.  **First Match**: By default the first gated person in creation order wins, even
//     when a later one would be closer. This keeps behavior stable and predictable
//     for crossing paths; `MatchPolicy::BestMatch` is available as an explicit opt-in.
// 4.  **Lifecycle**: Persons are born in `update_or_create` and, when a `max_age` is
//     configured, moved to a retired partition once they go unseen for too long.
//     Only active persons are scanned. Ids are never reused.

use crate::core_modules::person::{Candidate, Person, PersonId};
use serde::Deserialize;
use tracing::debug;

/// How to choose among several persons that pass both gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// The earliest-created gated person wins.
    #[default]
    FirstMatch,
    /// The gated person closest to the candidate's centroid wins; ties go to the
    /// earliest-created.
    BestMatch,
}

/// What `update_or_create` did with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched,
    Created,
}

pub struct PersonRegistry {
    /// Persons eligible for matching, in creation order.
    active: Vec<Person>,
    /// Persons that aged out, in retirement order.
    retired: Vec<Person>,
    /// The id handed to the next new person.
    next_id: PersonId,
    color_threshold: f64,
    match_policy: MatchPolicy,
    max_age: Option<u64>,
}

impl PersonRegistry {
    pub fn new(color_threshold: f64, match_policy: MatchPolicy, max_age: Option<u64>) -> Self {
        Self {
            active: Vec::new(),
            retired: Vec::new(),
            next_id: 1,
            color_threshold,
            match_policy,
            max_age,
        }
    }

    fn passes_gates(&self, person: &Person, candidate: &Candidate) -> bool {
        person.within_reach(candidate)
            && person
                .color_signature()
                .within_tolerance(&candidate.color_signature, self.color_threshold)
    }

    fn match_index(&self, candidate: &Candidate) -> Option<usize> {
        assert!(
            !candidate.color_signature.is_empty(),
            "candidate reached the registry without a color signature"
        );

        let mut gated = self
            .active
            .iter()
            .enumerate()
            .filter(|(_, person)| self.passes_gates(person, candidate));

        match self.match_policy {
            MatchPolicy::FirstMatch => gated.next().map(|(index, _)| index),
            // `min_by_key` keeps the first of equal keys, so ties go to creation order.
            MatchPolicy::BestMatch => gated
                .min_by_key(|(_, person)| person.position().distance_squared(&candidate.centroid))
                .map(|(index, _)| index),
        }
    }

    /// The active person this candidate would be associated with, if any.
    pub fn find_match(&self, candidate: &Candidate) -> Option<&Person> {
        self.match_index(candidate).map(|index| &self.active[index])
    }

    /// Folds the candidate into its matching person, or mints a new person for it.
    pub fn update_or_create(&mut self, candidate: Candidate) -> (MatchOutcome, &Person) {
        match self.match_index(&candidate) {
            Some(index) => {
                let person = &mut self.active[index];
                person.absorb(candidate);
                debug!(
                    id = person.id(),
                    x = person.position().x,
                    y = person.position().y,
                    "matched person"
                );
                (MatchOutcome::Matched, &self.active[index])
            }
            None => {
                let id = self.next_id;
                self.next_id += 1;
                let person = Person::new(id, candidate);
                debug!(
                    id,
                    x = person.position().x,
                    y = person.position().y,
                    "new person"
                );
                self.active.push(person);
                (MatchOutcome::Created, &self.active[self.active.len() - 1])
            }
        }
    }

    /// Moves persons unseen for more than `max_age` frames into the retired partition.
    /// Returns the ids retired by this call. A no-op when no `max_age` is configured.
    pub fn retire_stale(&mut self, current_frame: u64) -> Vec<PersonId> {
        let Some(max_age) = self.max_age else {
            return Vec::new();
        };

        let (stale, active): (Vec<Person>, Vec<Person>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(|person| person.age(current_frame) > max_age);
        self.active = active;

        let ids: Vec<PersonId> = stale.iter().map(Person::id).collect();
        if !ids.is_empty() {
            debug!(frame = current_frame, ?ids, "retired persons");
        }
        self.retired.extend(stale);
        ids
    }

    /// Every person ever created: active ones first (creation order), then retired.
    pub fn all(&self) -> impl Iterator<Item = &Person> {
        self.active.iter().chain(self.retired.iter())
    }

    pub fn active(&self) -> &[Person] {
        &self.active
    }

    pub fn retired(&self) -> &[Person] {
        &self.retired
    }

    pub fn get(&self, id: PersonId) -> Option<&Person> {
        self.all().find(|person| person.id() == id)
    }

    /// Total persons ever created.
    pub fn len(&self) -> usize {
        self.active.len() + self.retired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
