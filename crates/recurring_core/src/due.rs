//! crates/recurring_core/src/due.rs
//!
//! Selects the recurring expenses that are actionable on a given day.

use chrono::NaiveDate;

use crate::domain::RecurringExpense;

/// Active and scheduled for `today` or earlier.
pub fn is_due(expense: &RecurringExpense, today: NaiveDate) -> bool {
    expense.active && expense.next_due_date <= today
}

/// The due subset of `expenses`, in their stored order.
pub fn due_set(expenses: &[RecurringExpense], today: NaiveDate) -> Vec<RecurringExpense> {
    expenses
        .iter()
        .filter(|e| is_due(e, today))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExecutionDay, Frequency, RecurringExpenseId};
    use chrono::Utc;

    fn expense(id: &str, next_due: NaiveDate, active: bool) -> RecurringExpense {
        RecurringExpense {
            id: RecurringExpenseId::from(id),
            description: format!("expense {id}"),
            amount: 10.0,
            frequency: Frequency::Monthly,
            execution_day: ExecutionDay::FIRST,
            payment_method_id: 1,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            active,
            notes: None,
            last_executed_date: None,
            next_due_date: next_due,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn due_today_included_tomorrow_excluded() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let tomorrow = today.succ_opt().unwrap();
        let list = vec![expense("a", today, true), expense("b", tomorrow, true)];

        let due = due_set(&list, today);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id.as_str(), "a");
    }

    #[test]
    fn inactive_and_overdue_are_skipped() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let overdue = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let list = vec![
            expense("paused", overdue, false),
            expense("late", overdue, true),
        ];

        let due = due_set(&list, today);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id.as_str(), "late");
    }

    #[test]
    fn repeated_evaluation_is_stable() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let list = vec![
            expense("c", today, true),
            expense("a", NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), true),
            expense("b", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), true),
        ];

        let first = due_set(&list, today);
        let second = due_set(&list, today);
        assert_eq!(first, second);
        let ids: Vec<_> = first.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }
}
