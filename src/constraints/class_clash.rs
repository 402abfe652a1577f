use super::{ConstraintModule, ConstraintSink};
use crate::context::ModelContext;
use good_lp::{Expression, constraint};

/// A class sits at most one subject per (day, period).
pub struct ClassClash;

impl ConstraintModule for ClassClash {
    fn name(&self) -> &str {
        "class_clash"
    }

    fn apply(&self, ctx: &ModelContext, sink: &mut ConstraintSink) {
        for class_id in ctx.class_ids() {
            for day in 0..ctx.num_days() {
                for &period in ctx.teaching_periods() {
                    let vars_here: Vec<_> = ctx
                        .subjects_of_class(class_id)
                        .filter_map(|subject| ctx.var(class_id, subject, day, period))
                        .collect();
                    if vars_here.is_empty() {
                        continue;
                    }
                    let occupied: Expression = vars_here.into_iter().sum();
                    sink.add(constraint!(occupied <= 1));
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
    fn one_row_per_class_and_teaching_slot() {
        let ctx = small_context();
        let mut sink = ConstraintSink::new();
        ClassClash.apply(&ctx, &mut sink);
        // 2 classes x 2 days x 3 teaching periods
        assert_eq!(sink.len(), 12);
    }
}
