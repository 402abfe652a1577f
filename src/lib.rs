//! School timetable solver.
//!
//! Builds a 0/1 ILP over (class, subject, day, period) indicators, solves it
//! with HiGHS through `good_lp`, then polishes the result against soft
//! preferences and derives rotated weeks.

pub mod constraints;
pub mod context;
pub mod data;
pub mod error;
pub mod improver;
pub mod rotation;
pub mod scoring;
pub mod server;
pub mod solver;
pub mod validation;

pub use constraints::{ConstraintModule, ConstraintRegistry, ConstraintSink, default_registry};
pub use context::ModelContext;
pub use data::{
    Class, ClassPriorityConfig, ClassSlot, ClassSubject, Lesson, SchoolConfig, Teacher,
    TeacherTimetable, Timetable,
};
pub use error::ConfigError;
pub use improver::{ImproverConfig, improve_timetable};
pub use rotation::generate_rotations;
pub use scoring::compute_timetable_score;
pub use solver::{
    SolveOutcome, SolveStatus, SolverSettings, invert_to_teacher_timetable, solve_timetable,
};
