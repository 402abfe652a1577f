use thiserror::Error;

use crate::data::{ClassId, Period, Subject, TeacherId};

/// Structural problems in the school data, detected before any model is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("class {class_id} subject {subject} references unknown teacher {teacher_id}")]
    UnknownTeacher {
        class_id: ClassId,
        subject: Subject,
        teacher_id: TeacherId,
    },

    #[error("teacher {0} is declared more than once")]
    DuplicateTeacher(TeacherId),

    #[error("class {0} is declared more than once")]
    DuplicateClass(ClassId),

    #[error("class {class_id} lists subject {subject} more than once")]
    DuplicateSubject { class_id: ClassId, subject: Subject },

    #[error("break period {period} is outside 0..{periods_per_day}")]
    BreakOutOfRange { period: Period, periods_per_day: u32 },
}
