//! Post-solve hill climbing over same-class slot swaps.
//!
//! A swap exchanges the (subject, teacher) payloads of two slots of one
//! class. Slot positions never change, so break periods stay empty and a
//! class never gets two lessons in one slot; teacher clashes and weekly
//! counts are re-derived from scratch for every candidate.

use crate::data::{
    Class, ClassPriorityConfig, ClassSubjectInfo, SchoolConfig, Timetable, class_subject_info,
};
use crate::scoring::compute_timetable_score;
use crate::validation::{teacher_clashes, weekly_count_mismatches};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for the improver.
///
/// ```
/// use timetable_solver::improver::ImproverConfig;
///
/// let config = ImproverConfig::default().with_max_iterations(500).with_seed(7);
/// assert_eq!(config.max_iterations, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImproverConfig {
    /// Number of swap attempts.
    pub max_iterations: usize,

    /// Seed for reproducible runs; `None` draws a random seed.
    pub seed: Option<u64>,
}

impl Default for ImproverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            seed: None,
        }
    }
}

impl ImproverConfig {
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Teacher slots are exclusive and every (class, subject) count still
/// matches its weekly requirement.
pub fn is_valid_swap(candidate: &Timetable, class_subject_info: &ClassSubjectInfo) -> bool {
    teacher_clashes(candidate).is_empty()
        && weekly_count_mismatches(candidate, class_subject_info).is_empty()
}

/// Swaps two random slots of `class_id` in a copy of the timetable.
/// Returns `None` when the class has fewer than two slots or the swap is invalid.
pub fn try_swap<R: Rng + ?Sized>(
    timetable: &Timetable,
    class_id: &str,
    class_subject_info: &ClassSubjectInfo,
    rng: &mut R,
) -> Option<Timetable> {
    let slots = timetable.slots_of_class(class_id);
    if slots.len() < 2 {
        return None;
    }
    let picked = index::sample(rng, slots.len(), 2);
    let (a, b) = (&slots[picked.index(0)], &slots[picked.index(1)]);

    let mut candidate = timetable.clone();
    let lesson_a = timetable.get(a)?.clone();
    let lesson_b = timetable.get(b)?.clone();
    if lesson_a == lesson_b {
        return None;
    }
    candidate.insert(a.clone(), lesson_b);
    candidate.insert(b.clone(), lesson_a);

    if is_valid_swap(&candidate, class_subject_info) {
        Some(candidate)
    } else {
        trace!("Rejected swap of {:?} and {:?}.", a, b);
        None
    }
}

/// Hill-climbs with a generator seeded from `config`.
pub fn improve_timetable(
    timetable: &Timetable,
    school: &SchoolConfig,
    classes: &[Class],
    priority_configs: &[ClassPriorityConfig],
    config: &ImproverConfig,
) -> Timetable {
    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    improve_timetable_with_rng(
        timetable,
        school,
        classes,
        priority_configs,
        config.max_iterations,
        &mut rng,
    )
}

/// Accepts a swap only when it strictly raises the score; returns the best
/// timetable seen, which is the input when no swap ever helped.
pub fn improve_timetable_with_rng<R: Rng + ?Sized>(
    timetable: &Timetable,
    school: &SchoolConfig,
    classes: &[Class],
    priority_configs: &[ClassPriorityConfig],
    max_iterations: usize,
    rng: &mut R,
) -> Timetable {
    let info = class_subject_info(classes);
    let mut best = timetable.clone();
    let mut best_score = compute_timetable_score(&best, school, priority_configs);
    let start_score = best_score;

    // slot positions are fixed, so the swappable classes never change
    let candidates: Vec<String> = best
        .class_ids()
        .into_iter()
        .filter(|c| best.slots_of_class(c).len() >= 2)
        .cloned()
        .collect();
    if candidates.is_empty() {
        debug!("No class has two slots to swap; returning input unchanged.");
        return best;
    }

    let mut accepted = 0usize;
    for _ in 0..max_iterations {
        let class_id = &candidates[rng.random_range(0..candidates.len())];
        let Some(swapped) = try_swap(&best, class_id, &info, rng) else {
            continue;
        };
        let new_score = compute_timetable_score(&swapped, school, priority_configs);
        if new_score > best_score {
            trace!("Accepted swap in class {class_id}: {best_score} -> {new_score}");
            best = swapped;
            best_score = new_score;
            accepted += 1;
        }
    }

    debug!(
        "Improver finished {} iterations: score {} -> {} ({} swaps accepted).",
        max_iterations, start_score, best_score, accepted
    );
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ClassSlot, ClassSubject, Lesson};
    use std::collections::BTreeSet;

    fn school() -> SchoolConfig {
        SchoolConfig {
            days: vec!["Mon".into()],
            periods_per_day: 4,
            break_period_indices: vec![],
        }
    }

    fn classes() -> Vec<Class> {
        vec![Class {
            class_id: "7A".into(),
            subjects: vec![
                ClassSubject {
                    subject: "Math".into(),
                    weekly_periods: 2,
                    teacher_id: "T1".into(),
                },
                ClassSubject {
                    subject: "Art".into(),
                    weekly_periods: 2,
                    teacher_id: "T2".into(),
                },
            ],
        }]
    }

    fn late_math() -> Timetable {
        [
            (ClassSlot::new("7A", 0, 0), Lesson::new("Art", "T2")),
            (ClassSlot::new("7A", 0, 1), Lesson::new("Art", "T2")),
            (ClassSlot::new("7A", 0, 2), Lesson::new("Math", "T1")),
            (ClassSlot::new("7A", 0, 3), Lesson::new("Math", "T1")),
        ]
        .into_iter()
        .collect()
    }

    fn math_priority() -> Vec<ClassPriorityConfig> {
        vec![ClassPriorityConfig {
            class_id: "7A".into(),
            priority_subjects: BTreeSet::from(["Math".to_string()]),
            heavy_subjects: BTreeSet::new(),
        }]
    }

    #[test]
    fn climbs_to_priority_first() {
        let input = late_math();
        let configs = math_priority();
        let config = ImproverConfig::default().with_max_iterations(200).with_seed(42);

        let out = improve_timetable(&input, &school(), &classes(), &configs, &config);

        assert_eq!(compute_timetable_score(&input, &school(), &configs), 1.0);
        assert_eq!(compute_timetable_score(&out, &school(), &configs), 5.0);
        assert!(is_valid_swap(&out, &class_subject_info(&classes())));
        // the input is untouched
        assert_eq!(input, late_math());
    }

    #[test]
    fn same_seed_same_result() {
        let configs = math_priority();
        let config = ImproverConfig::default().with_max_iterations(3).with_seed(9);
        let a = improve_timetable(&late_math(), &school(), &classes(), &configs, &config);
        let b = improve_timetable(&late_math(), &school(), &classes(), &configs, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn single_slot_classes_returned_unchanged() {
        let tt: Timetable = [(ClassSlot::new("7A", 0, 0), Lesson::new("Math", "T1"))]
            .into_iter()
            .collect();
        let mut rng = StdRng::seed_from_u64(1);
        let out = improve_timetable_with_rng(&tt, &school(), &classes(), &math_priority(), 50, &mut rng);
        assert_eq!(out, tt);
    }

    #[test]
    fn swap_creating_teacher_clash_is_invalid() {
        // T1 teaches 7A at period 0 and 7B at period 1; swapping 7A's
        // periods 0 and 1 puts T1 in both classes at period 1
        let tt: Timetable = [
            (ClassSlot::new("7A", 0, 0), Lesson::new("Math", "T1")),
            (ClassSlot::new("7A", 0, 1), Lesson::new("Art", "T2")),
            (ClassSlot::new("7B", 0, 1), Lesson::new("Math", "T1")),
        ]
        .into_iter()
        .collect();
        let mut swapped = tt.clone();
        swapped.insert(ClassSlot::new("7A", 0, 0), Lesson::new("Art", "T2"));
        swapped.insert(ClassSlot::new("7A", 0, 1), Lesson::new("Math", "T1"));

        let subject = |s: &str, t: &str| ClassSubject {
            subject: s.into(),
            weekly_periods: 1,
            teacher_id: t.into(),
        };
        let info = class_subject_info(&[
            Class {
                class_id: "7A".into(),
                subjects: vec![subject("Math", "T1"), subject("Art", "T2")],
            },
            Class {
                class_id: "7B".into(),
                subjects: vec![subject("Math", "T1")],
            },
        ]);
        assert!(is_valid_swap(&tt, &info));
        assert!(!is_valid_swap(&swapped, &info));

        // the only swap in 7A is this one, so try_swap must refuse it
        let mut rng = StdRng::seed_from_u64(3);
        assert!(try_swap(&tt, "7A", &info, &mut rng).is_none());
    }
}
