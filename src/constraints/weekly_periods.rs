use super::{ConstraintModule, ConstraintSink};
use crate::context::ModelContext;
use good_lp::{Expression, constraint};

/// Each (class, subject) is taught exactly its required number of periods per week.
pub struct WeeklyPeriods;

impl ConstraintModule for WeeklyPeriods {
    fn name(&self) -> &str {
        "weekly_periods"
    }

    fn apply(&self, ctx: &ModelContext, sink: &mut ConstraintSink) {
        for ((class_id, subject), req) in ctx.class_subject_info() {
            let scheduled: Expression = ctx.vars_of(class_id, subject).into_iter().sum();
            let weekly = f64::from(req.weekly_periods);
            sink.add(constraint!(scheduled == weekly));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::test_support::small_context;

    #[test]
    fn one_equality_per_class_subject() {
        let ctx = small_context();
        let mut sink = ConstraintSink::new();
        WeeklyPeriods.apply(&ctx, &mut sink);
        assert_eq!(sink.len(), ctx.class_subject_info().len());
        assert_eq!(sink.len(), 3);
    }
}
