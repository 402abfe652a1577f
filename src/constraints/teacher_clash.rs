use super::{ConstraintModule, ConstraintSink};
use crate::context::ModelContext;
use good_lp::{Expression, constraint};

/// A teacher is in at most one class per (day, period).
pub struct TeacherClash;

impl ConstraintModule for TeacherClash {
    fn name(&self) -> &str {
        "teacher_clash"
    }

    fn apply(&self, ctx: &ModelContext, sink: &mut ConstraintSink) {
        for teacher_id in ctx.teacher_ids() {
            let pairs: Vec<_> = ctx.pairs_taught_by(teacher_id).collect();
            if pairs.is_empty() {
                continue;
            }
            for day in 0..ctx.num_days() {
                for &period in ctx.teaching_periods() {
                    let busy: Expression = pairs
                        .iter()
                        .filter_map(|(class_id, subject)| ctx.var(class_id, subject, day, period))
                        .sum();
                    sink.add(constraint!(busy <= 1));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::test_support::small_context;

    #[test]
    fn idle_teachers_get_no_rows() {
        let ctx = small_context();
        let mut sink = ConstraintSink::new();
        TeacherClash.apply(&ctx, &mut sink);
        // T1 and T2 teach, T3 is idle: 2 teachers x 2 days x 3 teaching periods
        assert_eq!(sink.len(), 12);
    }
}
