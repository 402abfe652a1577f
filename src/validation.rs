//! Independent re-check of the hard rules over a finished timetable.
//!
//! Nothing here consults the solver model; every count is derived from the
//! timetable itself.

use crate::context::effective_daily_caps;
use crate::data::{
    Class, ClassId, ClassSubjectInfo, Day, SchoolConfig, Slot, Subject, Teacher, TeacherId,
    Timetable, class_subject_info,
};
use std::collections::BTreeMap;
use std::fmt;

/// One broken hard rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    WeeklyCount {
        class_id: ClassId,
        subject: Subject,
        expected: u32,
        actual: u32,
    },
    /// Only seen while decoding: a `Timetable` holds one lesson per class slot.
    ClassClash {
        class_id: ClassId,
        slot: Slot,
        subjects: Vec<Subject>,
    },
    TeacherClash {
        teacher_id: TeacherId,
        slot: Slot,
        classes: Vec<ClassId>,
    },
    DailyCapExceeded {
        teacher_id: TeacherId,
        day: Day,
        assigned: u32,
        cap: u32,
    },
    BreakOccupied {
        class_id: ClassId,
        slot: Slot,
    },
    OutsideCalendar {
        class_id: ClassId,
        slot: Slot,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::WeeklyCount {
                class_id,
                subject,
                expected,
                actual,
            } => write!(
                f,
                "[Weekly Periods] class {class_id} has {actual} periods of {subject}, expected {expected}"
            ),
            Violation::ClassClash {
                class_id,
                slot,
                subjects,
            } => write!(
                f,
                "[Class Clash] class {class_id} has {} at day {} period {}",
                subjects.join(", "),
                slot.day,
                slot.period
            ),
            Violation::TeacherClash {
                teacher_id,
                slot,
                classes,
            } => write!(
                f,
                "[Teacher Clash] teacher {teacher_id} teaches {} at day {} period {}",
                classes.join(", "),
                slot.day,
                slot.period
            ),
            Violation::DailyCapExceeded {
                teacher_id,
                day,
                assigned,
                cap,
            } => write!(
                f,
                "[Daily Cap] teacher {teacher_id} teaches {assigned} periods on day {day}, cap is {cap}"
            ),
            Violation::BreakOccupied { class_id, slot } => write!(
                f,
                "[Break] class {class_id} has a lesson in break period {} on day {}",
                slot.period, slot.day
            ),
            Violation::OutsideCalendar { class_id, slot } => write!(
                f,
                "[Calendar] class {class_id} has a lesson at day {} period {}, outside the week",
                slot.day, slot.period
            ),
        }
    }
}

/// Checks every hard rule and returns all violations found (empty when valid).
pub fn validate_timetable(
    timetable: &Timetable,
    school: &SchoolConfig,
    teachers: &[Teacher],
    classes: &[Class],
) -> Vec<Violation> {
    let info = class_subject_info(classes);
    let caps = effective_daily_caps(school, teachers, &info);

    let mut violations = weekly_count_mismatches(timetable, &info);
    violations.extend(teacher_clashes(timetable));
    violations.extend(daily_cap_violations(timetable, &caps));
    violations.extend(calendar_violations(timetable, school));
    violations
}

/// Compares assigned slot counts per (class, subject) against the requirement.
/// Subjects the class does not declare are expected zero times.
pub fn weekly_count_mismatches(timetable: &Timetable, info: &ClassSubjectInfo) -> Vec<Violation> {
    let mut counts: BTreeMap<(&str, &str), u32> = BTreeMap::new();
    for (slot, lesson) in timetable {
        *counts
            .entry((slot.class_id.as_str(), lesson.subject.as_str()))
            .or_default() += 1;
    }

    let mut violations = Vec::new();
    for ((class_id, subject), req) in info {
        let actual = counts
            .remove(&(class_id.as_str(), subject.as_str()))
            .unwrap_or(0);
        if actual != req.weekly_periods {
            violations.push(Violation::WeeklyCount {
                class_id: class_id.clone(),
                subject: subject.clone(),
                expected: req.weekly_periods,
                actual,
            });
        }
    }
    for ((class_id, subject), actual) in counts {
        violations.push(Violation::WeeklyCount {
            class_id: class_id.to_string(),
            subject: subject.to_string(),
            expected: 0,
            actual,
        });
    }
    violations
}

/// Finds every slot where a teacher is booked into more than one class.
pub fn teacher_clashes(timetable: &Timetable) -> Vec<Violation> {
    let mut occupancy: BTreeMap<(&str, Slot), Vec<ClassId>> = BTreeMap::new();
    for (slot, lesson) in timetable {
        occupancy
            .entry((lesson.teacher_id.as_str(), slot.slot()))
            .or_default()
            .push(slot.class_id.clone());
    }
    occupancy
        .into_iter()
        .filter(|(_, classes)| classes.len() > 1)
        .map(|((teacher_id, slot), classes)| Violation::TeacherClash {
            teacher_id: teacher_id.to_string(),
            slot,
            classes,
        })
        .collect()
}

pub fn daily_cap_violations(
    timetable: &Timetable,
    caps: &BTreeMap<TeacherId, u32>,
) -> Vec<Violation> {
    let mut per_day: BTreeMap<(&str, Day), u32> = BTreeMap::new();
    for (slot, lesson) in timetable {
        *per_day
            .entry((lesson.teacher_id.as_str(), slot.day))
            .or_default() += 1;
    }
    per_day
        .into_iter()
        .filter_map(|((teacher_id, day), assigned)| {
            let cap = *caps.get(teacher_id)?;
            (assigned > cap).then(|| Violation::DailyCapExceeded {
                teacher_id: teacher_id.to_string(),
                day,
                assigned,
                cap,
            })
        })
        .collect()
}

pub fn calendar_violations(timetable: &Timetable, school: &SchoolConfig) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (slot, _) in timetable {
        if slot.day >= school.num_days() || slot.period >= school.periods_per_day {
            violations.push(Violation::OutsideCalendar {
                class_id: slot.class_id.clone(),
                slot: slot.slot(),
            });
        } else if school.is_break(slot.period) {
            violations.push(Violation::BreakOccupied {
                class_id: slot.class_id.clone(),
                slot: slot.slot(),
            });
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ClassSlot, ClassSubject, Lesson};

    fn school() -> SchoolConfig {
        SchoolConfig {
            days: vec!["Mon".into()],
            periods_per_day: 4,
            break_period_indices: vec![3],
        }
    }

    fn teachers() -> Vec<Teacher> {
        vec![
            Teacher {
                teacher_id: "T1".into(),
                max_periods_per_day: 1,
            },
            Teacher {
                teacher_id: "T2".into(),
                max_periods_per_day: 3,
            },
        ]
    }

    fn classes() -> Vec<Class> {
        vec![
            Class {
                class_id: "7A".into(),
                subjects: vec![
                    ClassSubject {
                        subject: "Math".into(),
                        weekly_periods: 1,
                        teacher_id: "T1".into(),
                    },
                    ClassSubject {
                        subject: "Art".into(),
                        weekly_periods: 1,
                        teacher_id: "T2".into(),
                    },
                ],
            },
            Class {
                class_id: "7B".into(),
                subjects: vec![ClassSubject {
                    subject: "Art".into(),
                    weekly_periods: 1,
                    teacher_id: "T2".into(),
                }],
            },
        ]
    }

    #[test]
    fn valid_timetable_has_no_violations() {
        let tt: Timetable = [
            (ClassSlot::new("7A", 0, 0), Lesson::new("Math", "T1")),
            (ClassSlot::new("7A", 0, 1), Lesson::new("Art", "T2")),
            (ClassSlot::new("7B", 0, 2), Lesson::new("Art", "T2")),
        ]
        .into_iter()
        .collect();
        assert!(validate_timetable(&tt, &school(), &teachers(), &classes()).is_empty());
    }

    #[test]
    fn reports_every_broken_rule() {
        let tt: Timetable = [
            (ClassSlot::new("7A", 0, 1), Lesson::new("Art", "T2")),
            (ClassSlot::new("7B", 0, 1), Lesson::new("Art", "T2")),
            (ClassSlot::new("7B", 0, 3), Lesson::new("Gym", "T2")),
            (ClassSlot::new("7B", 2, 0), Lesson::new("Gym", "T2")),
        ]
        .into_iter()
        .collect();
        let violations = validate_timetable(&tt, &school(), &teachers(), &classes());

        assert!(violations.contains(&Violation::WeeklyCount {
            class_id: "7A".into(),
            subject: "Math".into(),
            expected: 1,
            actual: 0,
        }));
        assert!(violations.contains(&Violation::WeeklyCount {
            class_id: "7B".into(),
            subject: "Gym".into(),
            expected: 0,
            actual: 2,
        }));
        assert!(violations.contains(&Violation::TeacherClash {
            teacher_id: "T2".into(),
            slot: Slot { day: 0, period: 1 },
            classes: vec!["7A".into(), "7B".into()],
        }));
        assert!(violations.iter().any(|v| matches!(v, Violation::BreakOccupied { .. })));
        assert!(violations.iter().any(|v| matches!(v, Violation::OutsideCalendar { .. })));
    }

    #[test]
    fn daily_cap_uses_relaxed_caps() {
        let caps = BTreeMap::from([("T1".to_string(), 1)]);
        let tt: Timetable = [
            (ClassSlot::new("7A", 0, 0), Lesson::new("Math", "T1")),
            (ClassSlot::new("7B", 0, 1), Lesson::new("Math", "T1")),
        ]
        .into_iter()
        .collect();
        let violations = daily_cap_violations(&tt, &caps);
        assert_eq!(
            violations,
            vec![Violation::DailyCapExceeded {
                teacher_id: "T1".into(),
                day: 0,
                assigned: 2,
                cap: 1,
            }]
        );
        assert!(violations[0].to_string().starts_with("[Daily Cap]"));
    }
}
