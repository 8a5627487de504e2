//! crates/recurring_core/src/occurrence.rs
//!
//! Next-occurrence date arithmetic. Everything here is pure and works on
//! calendar dates only.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::domain::{ExecutionDay, Frequency, RecurringExpense};

/// Upper bound on catch-up iterations. A weekly schedule hits this after
/// roughly 96 years of missed occurrences.
pub const MAX_CATCH_UP_STEPS: u32 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("Catching up from {base} to {reference} needs more than {} steps", MAX_CATCH_UP_STEPS)]
    CatchUpLimit {
        base: NaiveDate,
        reference: NaiveDate,
    },
    #[error("Date arithmetic overflowed after {0}")]
    OutOfRange(NaiveDate),
}

/// Advances `from` by exactly one period of `frequency`.
///
/// Month-based steps that land past the end of a shorter month clamp to its
/// last day. `Monthly` ignores the day of `from` and lands on `execution_day`
/// (clamped) in the following month.
pub fn step(frequency: Frequency, execution_day: ExecutionDay, from: NaiveDate) -> Option<NaiveDate> {
    match frequency {
        Frequency::Weekly => from.checked_add_days(Days::new(7)),
        Frequency::Biweekly => from.checked_add_days(Days::new(15)),
        Frequency::Monthly => monthly_step(from, execution_day),
        Frequency::Bimonthly => from.checked_add_months(Months::new(2)),
        Frequency::Quarterly => from.checked_add_months(Months::new(3)),
        Frequency::Semiannual => from.checked_add_months(Months::new(6)),
        Frequency::Annual => from.checked_add_months(Months::new(12)),
    }
}

fn monthly_step(from: NaiveDate, execution_day: ExecutionDay) -> Option<NaiveDate> {
    let target_month = from.with_day(1)?.checked_add_months(Months::new(1))?;
    let last_day = last_day_of_month(target_month)?;
    target_month.with_day(execution_day.get().min(last_day))
}

/// Last day-of-month of the month containing `date`.
pub fn last_day_of_month(date: NaiveDate) -> Option<u32> {
    date.with_day(1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
        .map(|d| d.day())
}

/// Steps once from `base`, then keeps stepping until the result is not before
/// `reference`.
pub fn next_occurrence(
    frequency: Frequency,
    execution_day: ExecutionDay,
    base: NaiveDate,
    reference: NaiveDate,
) -> Result<NaiveDate, ScheduleError> {
    let mut next = step(frequency, execution_day, base).ok_or(ScheduleError::OutOfRange(base))?;
    let mut steps = 1;
    while next < reference {
        if steps >= MAX_CATCH_UP_STEPS {
            return Err(ScheduleError::CatchUpLimit { base, reference });
        }
        next = step(frequency, execution_day, next).ok_or(ScheduleError::OutOfRange(next))?;
        steps += 1;
    }
    Ok(next)
}

impl RecurringExpense {
    /// Next due date for this definition's schedule, as seen from `reference`.
    pub fn compute_next_due(&self, reference: NaiveDate) -> Result<NaiveDate, ScheduleError> {
        next_occurrence(
            self.frequency,
            self.execution_day,
            self.schedule_base(),
            reference,
        )
    }
}
