use crate::constraints::{ConstraintRegistry, ConstraintSink, default_registry};
use crate::context::{Decoded, ModelContext};
use crate::data::{
    Class, ClassId, SchoolConfig, Slot, Teacher, TeacherLesson, TeacherTimetable, Timetable,
};
use crate::error::ConfigError;
use crate::validation::{Violation, validate_timetable};
use good_lp::{Expression, ProblemVariables, ResolutionError, SolverModel, default_solver};
use log::{info, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;

/// HiGHS options for one solve.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolverSettings {
    pub time_limit_secs: f64,
    pub threads: i32,
    pub random_seed: i32,
    pub log_to_console: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            time_limit_secs: 30.0,
            threads: 1,
            random_seed: 1234,
            log_to_console: false,
        }
    }
}

impl SolverSettings {
    pub fn with_time_limit_secs(mut self, secs: f64) -> Self {
        self.time_limit_secs = secs;
        self
    }

    pub fn with_threads(mut self, threads: i32) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_random_seed(mut self, seed: i32) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_log_to_console(mut self, on: bool) -> Self {
        self.log_to_console = on;
        self
    }
}

/// How the solver finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    NoSolutionInBudget,
}

/// Result of a solve that got past configuration checks.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Solved { timetable: Timetable, status: SolveStatus },
    NoSolution { status: SolveStatus },
}

impl SolveOutcome {
    pub fn status(&self) -> SolveStatus {
        match self {
            SolveOutcome::Solved { status, .. } | SolveOutcome::NoSolution { status } => *status,
        }
    }

    pub fn timetable(&self) -> Option<&Timetable> {
        match self {
            SolveOutcome::Solved { timetable, .. } => Some(timetable),
            SolveOutcome::NoSolution { .. } => None,
        }
    }

    pub fn into_timetable(self) -> Option<Timetable> {
        match self {
            SolveOutcome::Solved { timetable, .. } => Some(timetable),
            SolveOutcome::NoSolution { .. } => None,
        }
    }
}

/// Solves with the given registry (all built-ins when `None`) and default settings.
pub fn solve_timetable(
    school: &SchoolConfig,
    teachers: &[Teacher],
    classes: &[Class],
    registry: Option<&ConstraintRegistry>,
) -> Result<SolveOutcome, ConfigError> {
    solve_timetable_with(school, teachers, classes, registry, &SolverSettings::default())
}

/// Builds the model, applies the active constraint modules and runs HiGHS.
pub fn solve_timetable_with(
    school: &SchoolConfig,
    teachers: &[Teacher],
    classes: &[Class],
    registry: Option<&ConstraintRegistry>,
    settings: &SolverSettings,
) -> Result<SolveOutcome, ConfigError> {
    let start_time = Instant::now();
    let default;
    let registry = match registry {
        Some(r) => r,
        None => {
            default = default_registry();
            &default
        }
    };

    //model setup
    info!(
        "Setting up ILP model with {} classes, {} teachers, {} days and {} periods per day...",
        classes.len(),
        teachers.len(),
        school.num_days(),
        school.periods_per_day
    );
    let mut problem = ProblemVariables::new();
    let ctx = ModelContext::build(school, teachers, classes, &mut problem)?;
    trace!("Effective teacher caps: {:?}", ctx.effective_caps());

    if ctx.variable_count() == 0 {
        // nothing to place; only unmet weekly requirements can make this infeasible
        let unmet = registry.is_enabled("weekly_periods")
            && ctx.class_subject_info().values().any(|req| req.weekly_periods > 0);
        info!("Model has no assignment variables (unmet requirements: {}).", unmet);
        return Ok(if unmet {
            SolveOutcome::NoSolution {
                status: SolveStatus::Infeasible,
            }
        } else {
            SolveOutcome::Solved {
                timetable: Timetable::new(),
                status: SolveStatus::Optimal,
            }
        });
    }

    let mut sink = ConstraintSink::new();
    registry.apply_active(&ctx, &mut sink);
    info!("{} constraints asserted by {} active modules.", sink.len(), registry.active().count());

    // pure feasibility problem
    let mut model = problem
        .minimise(Expression::from(0.0))
        .using(default_solver)
        .set_option("time_limit", settings.time_limit_secs)
        .set_option("threads", settings.threads) // 1 thread for reproducibility
        .set_option("random_seed", settings.random_seed)
        .set_option("log_to_console", if settings.log_to_console { "true" } else { "false" });
    for constraint in sink.into_constraints() {
        model.add_constraint(constraint);
    }

    //solve
    info!("Starting ILP solver with a {:.1}s budget...", settings.time_limit_secs);
    let solution = match model.solve() {
        Ok(s) => s,
        Err(ResolutionError::Infeasible) => {
            info!("Solver proved the model infeasible after {:.2?}.", start_time.elapsed());
            return Ok(SolveOutcome::NoSolution {
                status: SolveStatus::Infeasible,
            });
        }
        Err(e) => {
            warn!("No solution found. Solver error: {}", e);
            return Ok(SolveOutcome::NoSolution {
                status: SolveStatus::NoSolutionInBudget,
            });
        }
    };
    let duration = start_time.elapsed();

    let Decoded {
        timetable,
        collisions,
    } = ctx.decode(&solution);

    // a collided slot keeps one lesson, so that class's weekly counts say nothing
    let collided: BTreeSet<ClassId> = collisions
        .iter()
        .filter_map(|v| match v {
            Violation::ClassClash { class_id, .. } => Some(class_id.clone()),
            _ => None,
        })
        .collect();

    // HiGHS reports a time-limit stop as success even without an incumbent
    let violations = validate_timetable(&timetable, school, teachers, classes)
        .into_iter()
        .filter(|v| {
            !matches!(v, Violation::WeeklyCount { class_id, .. } if collided.contains(class_id))
        })
        .chain(collisions)
        .filter(|v| registry_enforces(registry, v))
        .collect::<Vec<_>>();
    if !violations.is_empty() {
        for v in &violations {
            trace!("{}", v);
        }
        warn!(
            "Solver returned after {:.2?} without a valid incumbent ({} violations).",
            duration,
            violations.len()
        );
        return Ok(SolveOutcome::NoSolution {
            status: SolveStatus::NoSolutionInBudget,
        });
    }

    let status = if duration.as_secs_f64() < settings.time_limit_secs {
        SolveStatus::Optimal
    } else {
        SolveStatus::Feasible
    };
    info!("Solution with {} lessons found in {:.2?} ({:?}).", timetable.len(), duration, status);
    Ok(SolveOutcome::Solved { timetable, status })
}

// A disabled module's rule is not expected to hold in the decoded timetable.
fn registry_enforces(registry: &ConstraintRegistry, violation: &Violation) -> bool {
    let rule = match violation {
        Violation::WeeklyCount { .. } => "weekly_periods",
        Violation::ClassClash { .. } => "class_clash",
        Violation::TeacherClash { .. } => "teacher_clash",
        Violation::DailyCapExceeded { .. } => "teacher_daily_cap",
        Violation::BreakOccupied { .. } | Violation::OutsideCalendar { .. } => return true,
    };
    registry.is_enabled(rule)
}

/// Teacher-centric view of a class timetable. Never fails; when two classes
/// share a teacher slot the later class in key order wins.
pub fn invert_to_teacher_timetable(timetable: &Timetable) -> TeacherTimetable {
    let mut teacher_schedules = TeacherTimetable::new();
    for (slot, lesson) in timetable {
        teacher_schedules
            .entry(lesson.teacher_id.clone())
            .or_default()
            .insert(
                Slot {
                    day: slot.day,
                    period: slot.period,
                },
                TeacherLesson {
                    class_id: slot.class_id.clone(),
                    subject: lesson.subject.clone(),
                },
            );
    }
    teacher_schedules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ClassSlot, Lesson};

    #[test]
    fn inversion_groups_by_teacher() {
        let tt: Timetable = [
            (ClassSlot::new("7A", 0, 0), Lesson::new("Math", "T1")),
            (ClassSlot::new("7B", 0, 1), Lesson::new("Math", "T1")),
            (ClassSlot::new("7A", 0, 1), Lesson::new("Art", "T2")),
        ]
        .into_iter()
        .collect();

        let by_teacher = invert_to_teacher_timetable(&tt);
        assert_eq!(by_teacher.len(), 2);
        assert_eq!(by_teacher["T1"].len(), 2);
        assert_eq!(
            by_teacher["T1"][&Slot { day: 0, period: 1 }],
            TeacherLesson {
                class_id: "7B".into(),
                subject: "Math".into(),
            }
        );
        assert_eq!(by_teacher["T2"].len(), 1);
    }

    #[test]
    fn disabled_rules_are_not_verified() {
        let mut registry = default_registry();
        let clash = Violation::ClassClash {
            class_id: "7A".into(),
            slot: Slot { day: 0, period: 0 },
            subjects: vec!["Art".into(), "Math".into()],
        };
        assert!(registry_enforces(&registry, &clash));

        registry.disable("class_clash");
        assert!(!registry_enforces(&registry, &clash));
        assert!(registry_enforces(
            &registry,
            &Violation::OutsideCalendar {
                class_id: "7A".into(),
                slot: Slot { day: 9, period: 0 },
            }
        ));
    }

    #[test]
    fn inversion_of_empty_timetable_is_empty() {
        assert!(invert_to_teacher_timetable(&Timetable::new()).is_empty());
    }

    #[test]
    fn settings_builder_and_defaults() {
        let settings = SolverSettings::default().with_time_limit_secs(5.0).with_threads(2);
        assert_eq!(settings.time_limit_secs, 5.0);
        assert_eq!(settings.threads, 2);
        assert_eq!(settings.random_seed, 1234);

        let parsed: SolverSettings = serde_json::from_str(r#"{"timeLimitSecs": 10.0}"#).unwrap();
        assert_eq!(parsed.time_limit_secs, 10.0);
        assert!(!parsed.log_to_console);
    }

    #[test]
    fn status_serializes_upper_snake() {
        assert_eq!(
            serde_json::to_string(&SolveStatus::NoSolutionInBudget).unwrap(),
            "\"NO_SOLUTION_IN_BUDGET\""
        );
    }
}
