use crate::data::{ClassSlot, SchoolConfig, Timetable};

/// Shifts every lesson `shift_days` days forward, wrapping around the week.
/// Periods, subjects and teachers are carried over unchanged.
pub fn rotate_timetable(timetable: &Timetable, num_days: u32, shift_days: u32) -> Timetable {
    if num_days == 0 {
        return timetable.clone();
    }
    timetable
        .iter()
        .map(|(slot, lesson)| {
            let day = (slot.day + shift_days % num_days) % num_days;
            (
                ClassSlot::new(slot.class_id.clone(), day, slot.period),
                lesson.clone(),
            )
        })
        .collect()
}

/// Week 1 is the input; week k is the input shifted by k - 1 days.
pub fn generate_rotations(
    timetable: &Timetable,
    school: &SchoolConfig,
    num_weeks: usize,
) -> Vec<Timetable> {
    let num_days = school.num_days();
    (0..num_weeks)
        .map(|week| rotate_timetable(timetable, num_days, week_shift(week, num_days)))
        .collect()
}

/// Day shift of the zero-based `week`, reduced modulo the week length.
fn week_shift(week: usize, num_days: u32) -> u32 {
    if num_days == 0 {
        return 0;
    }
    // the remainder is below num_days, so it fits back into u32
    (week % num_days as usize) as u32
}
