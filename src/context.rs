use crate::data::{
    Class, ClassId, ClassSlot, ClassSubjectInfo, Day, Lesson, Period, SchoolConfig, Subject,
    Teacher, TeacherId, Timetable, class_subject_info,
};
use crate::error::ConfigError;
use crate::validation::Violation;
use good_lp::{ProblemVariables, Solution, Variable, variable};
use itertools::Itertools;
use log::{debug, info, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Decision variables of one (class, subject) pair, keyed by (day, period).
type WeekVars = BTreeMap<(Day, Period), Variable>;

/// Solver output read back into a class timetable.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub timetable: Timetable,
    /// Class slots the solver filled with more than one subject. The timetable
    /// keeps only the last of them.
    pub collisions: Vec<Violation>,
}

/// Everything the constraint modules need: decision variables, curriculum
/// lookups and the relaxed teacher caps. Built fresh for every solve.
#[derive(Debug)]
pub struct ModelContext {
    num_days: u32,
    teaching_periods: Vec<Period>,
    class_ids: Vec<ClassId>,
    teacher_ids: Vec<TeacherId>,
    class_subject_info: ClassSubjectInfo,
    assign: BTreeMap<ClassId, BTreeMap<Subject, WeekVars>>,
    effective_caps: BTreeMap<TeacherId, u32>,
}

impl ModelContext {
    /// Validates the inputs, creates one binary variable per
    /// (class, subject, day, non-break period) and computes effective caps.
    pub fn build(
        school: &SchoolConfig,
        teachers: &[Teacher],
        classes: &[Class],
        problem: &mut ProblemVariables,
    ) -> Result<Self, ConfigError> {
        validate_config(school, teachers, classes)?;

        let class_subject_info = class_subject_info(classes);
        let teaching_periods = school.teaching_periods();
        let num_days = school.num_days();

        // x_csdp = 1 if class c has subject s on day d in period p
        //          0 otherwise
        // break periods never get a variable
        let mut assign: BTreeMap<ClassId, BTreeMap<Subject, WeekVars>> = BTreeMap::new();
        let mut created = 0usize;
        for (class_id, subject) in class_subject_info.keys() {
            let week = assign
                .entry(class_id.clone())
                .or_default()
                .entry(subject.clone())
                .or_default();
            for day in 0..num_days {
                for &period in &teaching_periods {
                    let var = problem.add(
                        variable()
                            .binary()
                            .name(format!("assign_{class_id}_{subject}_{day}_{period}")),
                    );
                    week.insert((day, period), var);
                    created += 1;
                }
            }
        }
        info!(
            "Created {} assignment variables for {} class subjects over {} days x {} teaching periods.",
            created,
            class_subject_info.len(),
            num_days,
            teaching_periods.len()
        );

        let effective_caps = effective_daily_caps(school, teachers, &class_subject_info);

        Ok(Self {
            num_days,
            teaching_periods,
            class_ids: classes.iter().map(|c| c.class_id.clone()).collect(),
            teacher_ids: teachers.iter().map(|t| t.teacher_id.clone()).collect(),
            class_subject_info,
            assign,
            effective_caps,
        })
    }

    pub fn num_days(&self) -> u32 {
        self.num_days
    }

    pub fn teaching_periods(&self) -> &[Period] {
        &self.teaching_periods
    }

    pub fn class_ids(&self) -> &[ClassId] {
        &self.class_ids
    }

    pub fn teacher_ids(&self) -> &[TeacherId] {
        &self.teacher_ids
    }

    pub fn class_subject_info(&self) -> &ClassSubjectInfo {
        &self.class_subject_info
    }

    pub fn variable_count(&self) -> usize {
        self.assign
            .values()
            .flat_map(|subjects| subjects.values())
            .map(BTreeMap::len)
            .sum()
    }

    fn week_of(&self, class_id: &str, subject: &str) -> Option<&WeekVars> {
        self.assign.get(class_id)?.get(subject)
    }

    pub fn var(&self, class_id: &str, subject: &str, day: Day, period: Period) -> Option<Variable> {
        self.week_of(class_id, subject)?.get(&(day, period)).copied()
    }

    /// Every variable of one (class, subject) pair across the week.
    pub fn vars_of(&self, class_id: &str, subject: &str) -> Vec<Variable> {
        self.week_of(class_id, subject)
            .map(|week| week.values().copied().collect())
            .unwrap_or_default()
    }

    pub fn subjects_of_class<'a>(&'a self, class_id: &'a str) -> impl Iterator<Item = &'a Subject> {
        self.class_subject_info
            .keys()
            .filter(move |(c, _)| c == class_id)
            .map(|(_, s)| s)
    }

    /// (class, subject) pairs taught by one teacher.
    pub fn pairs_taught_by<'a>(
        &'a self,
        teacher_id: &'a str,
    ) -> impl Iterator<Item = &'a (ClassId, Subject)> {
        self.class_subject_info
            .iter()
            .filter(move |(_, req)| req.teacher_id == teacher_id)
            .map(|(key, _)| key)
    }

    pub fn effective_cap(&self, teacher_id: &str) -> Option<u32> {
        self.effective_caps.get(teacher_id).copied()
    }

    pub fn effective_caps(&self) -> &BTreeMap<TeacherId, u32> {
        &self.effective_caps
    }

    /// Reads the solved variable values back into a class timetable.
    pub fn decode<S: Solution>(&self, solution: &S) -> Decoded {
        self.decode_with(|var| solution.value(var))
    }

    pub fn decode_with(&self, value_of: impl Fn(Variable) -> f64) -> Decoded {
        let mut by_slot: BTreeMap<ClassSlot, Vec<&Subject>> = BTreeMap::new();
        for (class_id, subjects) in &self.assign {
            for (subject, week) in subjects {
                for (&(day, period), var) in week {
                    if value_of(*var) > 0.9 {
                        by_slot
                            .entry(ClassSlot::new(class_id.clone(), day, period))
                            .or_default()
                            .push(subject);
                    }
                }
            }
        }

        let mut timetable = Timetable::new();
        let mut collisions = Vec::new();
        for (slot, subjects) in by_slot {
            if subjects.len() > 1 {
                collisions.push(Violation::ClassClash {
                    class_id: slot.class_id.clone(),
                    slot: slot.slot(),
                    subjects: subjects.iter().map(|s| s.to_string()).collect(),
                });
            }
            let Some(&subject) = subjects.last() else {
                continue;
            };
            let Some(req) = self
                .class_subject_info
                .get(&(slot.class_id.clone(), subject.clone()))
            else {
                continue;
            };
            let lesson = Lesson::new(subject.clone(), req.teacher_id.clone());
            timetable.insert(slot, lesson);
        }
        trace!(
            "Decoded {} lessons from solver output ({} class slot collisions).",
            timetable.len(),
            collisions.len()
        );
        Decoded {
            timetable,
            collisions,
        }
    }
}

/// Per-teacher daily ceiling after relaxing the declared preference against
/// the weekly load: `max(declared, ceil(load / days))`, clamped to the number
/// of teaching periods per day when that number is non-zero.
pub fn effective_daily_caps(
    school: &SchoolConfig,
    teachers: &[Teacher],
    class_subject_info: &ClassSubjectInfo,
) -> BTreeMap<TeacherId, u32> {
    let num_days = school.num_days();
    let available_per_day = school.teaching_periods().len() as u32;

    let weekly_load: HashMap<&str, u32> = class_subject_info
        .values()
        .map(|req| (req.teacher_id.as_str(), req.weekly_periods))
        .into_grouping_map()
        .sum();

    teachers
        .iter()
        .map(|t| {
            let load = weekly_load.get(t.teacher_id.as_str()).copied().unwrap_or(0);
            let required_daily = if num_days == 0 { 0 } else { load.div_ceil(num_days) };
            let mut cap = t.max_periods_per_day.max(required_daily);
            if cap > t.max_periods_per_day {
                debug!(
                    "Relaxed daily cap of teacher {} from {} to {} (weekly load {}).",
                    t.teacher_id, t.max_periods_per_day, cap, load
                );
            }
            if available_per_day > 0 && cap > available_per_day {
                debug!(
                    "Clamped daily cap of teacher {} from {} to {} teaching periods.",
                    t.teacher_id, cap, available_per_day
                );
                cap = available_per_day;
            }
            (t.teacher_id.clone(), cap)
        })
        .collect()
}

fn validate_config(
    school: &SchoolConfig,
    teachers: &[Teacher],
    classes: &[Class],
) -> Result<(), ConfigError> {
    if let Some(&period) = school
        .break_period_indices
        .iter()
        .find(|&&p| p >= school.periods_per_day)
    {
        return Err(ConfigError::BreakOutOfRange {
            period,
            periods_per_day: school.periods_per_day,
        });
    }

    let mut teacher_ids = HashSet::new();
    for t in teachers {
        if !teacher_ids.insert(t.teacher_id.as_str()) {
            return Err(ConfigError::DuplicateTeacher(t.teacher_id.clone()));
        }
    }

    let mut class_ids = HashSet::new();
    for c in classes {
        if !class_ids.insert(c.class_id.as_str()) {
            return Err(ConfigError::DuplicateClass(c.class_id.clone()));
        }
        let mut subjects = BTreeSet::new();
        for cs in &c.subjects {
            if !subjects.insert(cs.subject.as_str()) {
                return Err(ConfigError::DuplicateSubject {
                    class_id: c.class_id.clone(),
                    subject: cs.subject.clone(),
                });
            }
            if !teacher_ids.contains(cs.teacher_id.as_str()) {
                return Err(ConfigError::UnknownTeacher {
                    class_id: c.class_id.clone(),
                    subject: cs.subject.clone(),
                    teacher_id: cs.teacher_id.clone(),
                });
            }
        }
    }
    Ok(())
}
