//! Hard rules of the timetable model.
//!
//! Each rule is a [`ConstraintModule`] that reads the [`ModelContext`] and
//! pushes linear constraints into a [`ConstraintSink`]. The solve step drains
//! the sink into the solver model, so a module never talks to the solver.

mod class_clash;
mod registry;
mod teacher_clash;
mod teacher_daily_cap;
mod weekly_periods;

pub use class_clash::ClassClash;
pub use registry::ConstraintRegistry;
pub use teacher_clash::TeacherClash;
pub use teacher_daily_cap::TeacherDailyCap;
pub use weekly_periods::WeeklyPeriods;

use crate::context::ModelContext;
use good_lp::Constraint;

/// A named, independently toggleable rule.
pub trait ConstraintModule: Send + Sync {
    fn name(&self) -> &str;

    fn is_hard(&self) -> bool {
        true
    }

    /// Asserts this rule's constraints. Must not depend on any other module
    /// having been applied.
    fn apply(&self, ctx: &ModelContext, sink: &mut ConstraintSink);
}

/// Ordered buffer of constraints waiting to be added to the solver model.
#[derive(Default)]
pub struct ConstraintSink {
    constraints: Vec<Constraint>,
}

impl ConstraintSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn into_constraints(self) -> Vec<Constraint> {
        self.constraints
    }
}

/// Registry with the four built-in hard rules, all enabled.
pub fn default_registry() -> ConstraintRegistry {
    let mut registry = ConstraintRegistry::new();
    registry
        .register(WeeklyPeriods)
        .register(ClassClash)
        .register(TeacherClash)
        .register(TeacherDailyCap);
    registry
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::context::ModelContext;
    use crate::data::{Class, ClassSubject, SchoolConfig, Teacher};
    use good_lp::ProblemVariables;

    /// Two days of four periods with a break at period 2, two classes
    /// sharing teacher T1, and an idle teacher T3.
    pub fn small_context() -> ModelContext {
        let school = SchoolConfig {
            days: vec!["Mon".into(), "Tue".into()],
            periods_per_day: 4,
            break_period_indices: vec![2],
        };
        let teachers = vec![
            Teacher {
                teacher_id: "T1".into(),
                max_periods_per_day: 2,
            },
            Teacher {
                teacher_id: "T2".into(),
                max_periods_per_day: 3,
            },
            Teacher {
                teacher_id: "T3".into(),
                max_periods_per_day: 3,
            },
        ];
        let subject = |s: &str, w: u32, t: &str| ClassSubject {
            subject: s.into(),
            weekly_periods: w,
            teacher_id: t.into(),
        };
        let classes = vec![
            Class {
                class_id: "7A".into(),
                subjects: vec![subject("Math", 2, "T1"), subject("Art", 2, "T2")],
            },
            Class {
                class_id: "7B".into(),
                subjects: vec![subject("Math", 2, "T1")],
            },
        ];
        ModelContext::build(&school, &teachers, &classes, &mut ProblemVariables::new())
            .expect("valid test configuration")
    }
}
