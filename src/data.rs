use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// Type aliases for clarity
pub type ClassId = String;
pub type TeacherId = String;
pub type Subject = String;
pub type Day = u32;
pub type Period = u32;

/// Calendar shape shared by every class and teacher.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolConfig {
    pub days: Vec<String>,
    pub periods_per_day: u32,
    #[serde(default)]
    pub break_period_indices: Vec<Period>,
}

impl SchoolConfig {
    pub fn num_days(&self) -> u32 {
        self.days.len() as u32
    }

    pub fn breaks(&self) -> BTreeSet<Period> {
        self.break_period_indices.iter().copied().collect()
    }

    pub fn is_break(&self, period: Period) -> bool {
        self.break_period_indices.contains(&period)
    }

    /// Non-break period indices of a day, in ascending order.
    pub fn teaching_periods(&self) -> Vec<Period> {
        let breaks = self.breaks();
        (0..self.periods_per_day)
            .filter(|p| !breaks.contains(p))
            .collect()
    }
}

/// A staff member and their preferred daily load.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub teacher_id: TeacherId,
    pub max_periods_per_day: u32,
}

/// One subject a class has to be taught each week.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSubject {
    pub subject: Subject,
    pub weekly_periods: u32,
    pub teacher_id: TeacherId,
}

/// A student group with its weekly curriculum.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub class_id: ClassId,
    pub subjects: Vec<ClassSubject>,
}

/// Soft preferences for one class.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPriorityConfig {
    pub class_id: ClassId,
    #[serde(default)]
    pub priority_subjects: BTreeSet<Subject>,
    #[serde(default)]
    pub heavy_subjects: BTreeSet<Subject>,
}

/// Weekly requirement of one (class, subject) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRequirement {
    pub weekly_periods: u32,
    pub teacher_id: TeacherId,
}

/// (class id, subject) -> weekly requirement and teacher.
pub type ClassSubjectInfo = BTreeMap<(ClassId, Subject), SubjectRequirement>;

/// Flattens the class list into its per-(class, subject) requirements.
pub fn class_subject_info(classes: &[Class]) -> ClassSubjectInfo {
    classes
        .iter()
        .flat_map(|c| {
            c.subjects.iter().map(|cs| {
                (
                    (c.class_id.clone(), cs.subject.clone()),
                    SubjectRequirement {
                        weekly_periods: cs.weekly_periods,
                        teacher_id: cs.teacher_id.clone(),
                    },
                )
            })
        })
        .collect()
}

/// A (day, period) coordinate in the calendar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct Slot {
    pub day: Day,
    pub period: Period,
}

/// A (class, day, period) key of the class-centric timetable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassSlot {
    pub class_id: ClassId,
    pub day: Day,
    pub period: Period,
}

impl ClassSlot {
    pub fn new(class_id: impl Into<ClassId>, day: Day, period: Period) -> Self {
        Self {
            class_id: class_id.into(),
            day,
            period,
        }
    }

    pub fn slot(&self) -> Slot {
        Slot {
            day: self.day,
            period: self.period,
        }
    }
}

/// The payload occupying a class slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lesson {
    pub subject: Subject,
    pub teacher_id: TeacherId,
}

impl Lesson {
    pub fn new(subject: impl Into<Subject>, teacher_id: impl Into<TeacherId>) -> Self {
        Self {
            subject: subject.into(),
            teacher_id: teacher_id.into(),
        }
    }
}

/// Flat wire form of one timetable entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledLesson {
    pub class_id: ClassId,
    pub day: Day,
    pub period: Period,
    pub subject: Subject,
    pub teacher_id: TeacherId,
}

/// Class-centric schedule: (class, day, period) -> (subject, teacher).
///
/// Values are never mutated in place by the solver pipeline; every
/// transformation produces a fresh copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "Vec<ScheduledLesson>", into = "Vec<ScheduledLesson>")]
pub struct Timetable(BTreeMap<ClassSlot, Lesson>);

impl Timetable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: ClassSlot, lesson: Lesson) -> Option<Lesson> {
        self.0.insert(slot, lesson)
    }

    pub fn get(&self, slot: &ClassSlot) -> Option<&Lesson> {
        self.0.get(slot)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClassSlot, &Lesson)> {
        self.0.iter()
    }

    /// Distinct class ids present in the timetable, ascending.
    pub fn class_ids(&self) -> BTreeSet<&ClassId> {
        self.0.keys().map(|k| &k.class_id).collect()
    }

    /// All occupied slots of one class, ascending by (day, period).
    pub fn slots_of_class(&self, class_id: &str) -> Vec<ClassSlot> {
        self.0
            .keys()
            .filter(|k| k.class_id == class_id)
            .cloned()
            .collect()
    }
}

impl FromIterator<(ClassSlot, Lesson)> for Timetable {
    fn from_iter<I: IntoIterator<Item = (ClassSlot, Lesson)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Timetable {
    type Item = (&'a ClassSlot, &'a Lesson);
    type IntoIter = std::collections::btree_map::Iter<'a, ClassSlot, Lesson>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<ScheduledLesson>> for Timetable {
    fn from(entries: Vec<ScheduledLesson>) -> Self {
        entries
            .into_iter()
            .map(|e| {
                (
                    ClassSlot::new(e.class_id, e.day, e.period),
                    Lesson::new(e.subject, e.teacher_id),
                )
            })
            .collect()
    }
}

impl From<Timetable> for Vec<ScheduledLesson> {
    fn from(timetable: Timetable) -> Self {
        timetable
            .0
            .into_iter()
            .map(|(k, v)| ScheduledLesson {
                class_id: k.class_id,
                day: k.day,
                period: k.period,
                subject: v.subject,
                teacher_id: v.teacher_id,
            })
            .collect()
    }
}

/// What a teacher is doing in one slot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherLesson {
    pub class_id: ClassId,
    pub subject: Subject,
}

/// Teacher-centric view: teacher id -> (day, period) -> (class, subject).
pub type TeacherTimetable = BTreeMap<TeacherId, BTreeMap<Slot, TeacherLesson>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teaching_periods_skip_breaks() {
        let school = SchoolConfig {
            days: vec!["Mon".into(), "Tue".into()],
            periods_per_day: 6,
            break_period_indices: vec![2, 4],
        };
        assert_eq!(school.teaching_periods(), vec![0, 1, 3, 5]);
        assert!(school.is_break(4));
        assert_eq!(school.num_days(), 2);
    }

    #[test]
    fn timetable_serializes_as_flat_list() {
        let mut tt = Timetable::new();
        tt.insert(ClassSlot::new("7A", 1, 0), Lesson::new("Art", "T2"));
        tt.insert(ClassSlot::new("7A", 0, 3), Lesson::new("Math", "T1"));

        let json = serde_json::to_value(&tt).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"classId": "7A", "day": 0, "period": 3, "subject": "Math", "teacherId": "T1"},
                {"classId": "7A", "day": 1, "period": 0, "subject": "Art", "teacherId": "T2"},
            ])
        );

        let back: Timetable = serde_json::from_value(json).unwrap();
        assert_eq!(back, tt);
    }

    #[test]
    fn class_subject_info_keys_by_class_and_subject() {
        let classes = vec![Class {
            class_id: "7A".into(),
            subjects: vec![ClassSubject {
                subject: "Math".into(),
                weekly_periods: 4,
                teacher_id: "T1".into(),
            }],
        }];
        let info = class_subject_info(&classes);
        let req = &info[&("7A".to_string(), "Math".to_string())];
        assert_eq!(req.weekly_periods, 4);
        assert_eq!(req.teacher_id, "T1");
    }
}
