//! Soft-preference score of a timetable. Higher is better.
//!
//! - Bonus: priority subjects early in the day (`max(0, 3 - period)`)
//! - Penalty: 2.0 for each pair of back-to-back heavy periods of a class

use crate::data::{ClassPriorityConfig, ClassSlot, SchoolConfig, Timetable};
use serde::Serialize;
use std::collections::HashMap;

const EARLY_PERIOD_WINDOW: u32 = 3;
const HEAVY_ADJACENCY_PENALTY: f64 = 2.0;

/// Both score terms, with the penalty as a non-negative magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub priority_bonus: f64,
    pub heavy_penalty: f64,
    pub total: f64,
}

pub fn compute_timetable_score(
    timetable: &Timetable,
    school: &SchoolConfig,
    priority_configs: &[ClassPriorityConfig],
) -> f64 {
    score_breakdown(timetable, school, priority_configs).total
}

pub fn score_breakdown(
    timetable: &Timetable,
    school: &SchoolConfig,
    priority_configs: &[ClassPriorityConfig],
) -> ScoreBreakdown {
    let priority_map: HashMap<&str, &ClassPriorityConfig> = priority_configs
        .iter()
        .map(|pc| (pc.class_id.as_str(), pc))
        .collect();

    let mut priority_bonus = 0.0;
    for (slot, lesson) in timetable {
        let Some(pc) = priority_map.get(slot.class_id.as_str()) else {
            continue;
        };
        if pc.priority_subjects.contains(&lesson.subject) {
            priority_bonus += f64::from(EARLY_PERIOD_WINDOW.saturating_sub(slot.period));
        }
    }

    let teaching_periods = school.teaching_periods();
    let mut heavy_penalty = 0.0;
    for class_id in timetable.class_ids() {
        let Some(pc) = priority_map.get(class_id.as_str()) else {
            continue;
        };
        if pc.heavy_subjects.is_empty() {
            continue;
        }
        for day in 0..school.num_days() {
            let heavy_periods: Vec<u32> = teaching_periods
                .iter()
                .copied()
                .filter(|&period| {
                    timetable
                        .get(&ClassSlot::new(class_id.clone(), day, period))
                        .is_some_and(|lesson| pc.heavy_subjects.contains(&lesson.subject))
                })
                .collect();
            let back_to_back = heavy_periods
                .windows(2)
                .filter(|pair| pair[1] == pair[0] + 1)
                .count();
            heavy_penalty += HEAVY_ADJACENCY_PENALTY * back_to_back as f64;
        }
    }

    ScoreBreakdown {
        priority_bonus,
        heavy_penalty,
        total: priority_bonus - heavy_penalty,
    }
}
