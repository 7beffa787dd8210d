use chrono::NaiveDate;

/// Whole days a return is past its due date, never negative
pub fn days_late(due_date: NaiveDate, returned_on: NaiveDate) -> i64 {
    (returned_on - due_date).num_days().max(0)
}

/// Fine owed for a return: days late times the per-day rate.
/// Returning on or before the due date owes nothing.
pub fn fine_for(due_date: NaiveDate, returned_on: NaiveDate, fine_per_day: i64) -> i64 {
    days_late(due_date, returned_on) * fine_per_day
}
