//! crates/recurring_core/src/executor.rs
//!
//! Turns due recurring expenses into real expenses on the backend and
//! advances their schedules.
//!
//! Items run strictly one after another: each backend call is awaited and the
//! store write for that item finishes before the next item starts. One
//! execution lock, shared by clones, keeps batches and manual runs from
//! overlapping, and a batch re-reads each item before charging it.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::domain::{
    BatchReport, ExecutionConfirmation, ExecutionFailure, ExpenseRequest, RecurringExpense,
    RecurringExpenseId,
};
use crate::due::is_due;
use crate::ports::{ExpenseService, PortError};
use crate::store::{ScheduleStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Recurring expense {0} not found")]
    NotFound(RecurringExpenseId),
    #[error("Amount and description were not confirmed")]
    NotConfirmed,
    #[error("Expense was not created: {0}")]
    Rejected(#[source] PortError),
    #[error("Expense was created but the schedule was not updated: {0}")]
    Store(#[source] StoreError),
}

#[derive(Clone)]
pub struct ExecutionCoordinator {
    store: ScheduleStore,
    expenses: Arc<dyn ExpenseService>,
    running: Arc<Mutex<()>>,
}

impl ExecutionCoordinator {
    pub fn new(store: ScheduleStore, expenses: Arc<dyn ExpenseService>) -> Self {
        Self {
            store,
            expenses,
            running: Arc::new(Mutex::new(())),
        }
    }

    /// Creates the expense for one definition and, on success, records the
    /// execution on `today`. A rejected call leaves the definition untouched.
    pub async fn execute_one(
        &self,
        expense: &RecurringExpense,
        executed_at: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<RecurringExpense, ExecutionError> {
        let _running = self.running.lock().await;
        self.charge(expense, executed_at, today).await
    }

    async fn charge(
        &self,
        expense: &RecurringExpense,
        executed_at: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<RecurringExpense, ExecutionError> {
        let request = ExpenseRequest {
            date: executed_at,
            amount: expense.amount,
            payment_method_id: expense.payment_method_id,
            description: expense.recurring_description(),
        };

        let created = self
            .expenses
            .create_expense(&request)
            .await
            .map_err(ExecutionError::Rejected)?;
        info!(
            "Recorded recurring expense {} as expense {:?}",
            expense.id, created.id
        );

        self.store
            .record_execution(&expense.id, today)
            .await
            .map_err(ExecutionError::Store)
    }

    /// Runs every item in order. Failures are collected, never propagated.
    ///
    /// Each item is re-read first; one that was deleted, paused or already
    /// advanced past `today` since `due` was taken is skipped.
    pub async fn execute_batch(
        &self,
        due: &[RecurringExpense],
        executed_at: DateTime<Utc>,
        today: NaiveDate,
    ) -> BatchReport {
        let _running = self.running.lock().await;
        let mut report = BatchReport::default();
        for snapshot in due {
            let expense = match self.store.get(&snapshot.id).await {
                Ok(Some(current)) if is_due(&current, today) => current,
                Ok(_) => {
                    info!("Recurring expense {} is no longer due, skipping", snapshot.id);
                    continue;
                }
                Err(e) => {
                    error!("Recurring expense {} could not be re-read: {}", snapshot.id, e);
                    report.failed += 1;
                    report.failures.push(ExecutionFailure {
                        id: snapshot.id.clone(),
                        description: snapshot.description.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            match self.charge(&expense, executed_at, today).await {
                Ok(updated) => {
                    report.succeeded += 1;
                    report.executed.push(updated);
                }
                Err(e) => {
                    error!("Recurring expense {} failed: {}", expense.id, e);
                    report.failed += 1;
                    report.failures.push(ExecutionFailure {
                        id: expense.id.clone(),
                        description: expense.description.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(
            "Recurring batch finished: {} succeeded, {} failed",
            report.succeeded, report.failed
        );
        report
    }

    /// Manual "run now" for a single item. The confirmation must repeat the
    /// stored amount and description.
    pub async fn execute_confirmed(
        &self,
        id: &RecurringExpenseId,
        confirmation: &ExecutionConfirmation,
        executed_at: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<RecurringExpense, ExecutionError> {
        let _running = self.running.lock().await;
        let expense = self
            .store
            .get(id)
            .await
            .map_err(ExecutionError::Store)?
            .ok_or_else(|| ExecutionError::NotFound(id.clone()))?;

        if !expense.confirms(confirmation) {
            return Err(ExecutionError::NotConfirmed);
        }
        self.charge(&expense, executed_at, today).await
    }
}
