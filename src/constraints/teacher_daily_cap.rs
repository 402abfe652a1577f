use super::{ConstraintModule, ConstraintSink};
use crate::context::ModelContext;
use good_lp::{Expression, constraint};
use log::warn;

/// A teacher never exceeds their effective (relaxed) daily cap.
pub struct TeacherDailyCap;

impl ConstraintModule for TeacherDailyCap {
    fn name(&self) -> &str {
        "teacher_daily_cap"
    }

    fn apply(&self, ctx: &ModelContext, sink: &mut ConstraintSink) {
        for teacher_id in ctx.teacher_ids() {
            let pairs: Vec<_> = ctx.pairs_taught_by(teacher_id).collect();
            if pairs.is_empty() {
                continue;
            }
            let Some(cap) = ctx.effective_cap(teacher_id) else {
                warn!("No effective cap computed for teacher {teacher_id}; skipping.");
                continue;
            };
            let cap = f64::from(cap);
            for day in 0..ctx.num_days() {
                let teaching_today: Expression = pairs
                    .iter()
                    .flat_map(|(class_id, subject)| {
                        ctx.teaching_periods()
                            .iter()
                            .filter_map(move |&period| ctx.var(class_id, subject, day, period))
                    })
                    .sum();
                sink.add(constraint!(teaching_today <= cap));
            }
        }
    }
}
