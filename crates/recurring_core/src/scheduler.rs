//! crates/recurring_core/src/scheduler.rs
//!
//! `RecurringScheduler` wires the store, the daily prompt gate, the execution
//! coordinator and a clock into the operations a front end calls.

use std::sync::Arc;
use tracing::info;

use crate::domain::{
    BatchReport, ExecutionConfirmation, PendingCheck, RecurringExpense, RecurringExpenseDraft,
    RecurringExpenseId,
};
use crate::due::due_set;
use crate::executor::{ExecutionCoordinator, ExecutionError};
use crate::ports::{Clock, ExpenseService, KeyValueStorage, PortResult};
use crate::prompt_gate::DailyPromptGate;
use crate::store::{ScheduleStore, StoreResult};

#[derive(Clone)]
pub struct RecurringScheduler {
    store: ScheduleStore,
    gate: DailyPromptGate,
    coordinator: ExecutionCoordinator,
    clock: Arc<dyn Clock>,
}

impl RecurringScheduler {
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        expenses: Arc<dyn ExpenseService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = ScheduleStore::new(storage.clone());
        Self {
            gate: DailyPromptGate::new(storage),
            coordinator: ExecutionCoordinator::new(store.clone(), expenses),
            store,
            clock,
        }
    }

    pub async fn list(&self) -> StoreResult<Vec<RecurringExpense>> {
        self.store.load().await
    }

    pub async fn create(&self, draft: &RecurringExpenseDraft) -> StoreResult<RecurringExpense> {
        self.store.create(draft, self.clock.today()).await
    }

    pub async fn update(
        &self,
        id: &RecurringExpenseId,
        draft: &RecurringExpenseDraft,
    ) -> StoreResult<RecurringExpense> {
        self.store.update(id, draft, self.clock.today()).await
    }

    pub async fn delete(&self, id: &RecurringExpenseId) -> StoreResult<RecurringExpense> {
        self.store.delete(id).await
    }

    pub async fn set_active(
        &self,
        id: &RecurringExpenseId,
        active: bool,
    ) -> StoreResult<RecurringExpense> {
        self.store.set_active(id, active).await
    }

    /// Due items for today and whether the user should be asked about them.
    /// The gate is not touched; loading may still write back repaired records.
    pub async fn pending(&self) -> StoreResult<PendingCheck> {
        let today = self.clock.today();
        let due = due_set(&self.store.load().await?, today);
        let should_prompt = !due.is_empty() && self.gate.should_prompt(today).await?;
        Ok(PendingCheck { due, should_prompt })
    }

    /// Marks today's prompt as shown, whatever the user answers.
    pub async fn acknowledge_prompt(&self) -> PortResult<()> {
        self.gate.record_prompted(self.clock.today()).await
    }

    /// `pending`, recording the prompt when one is warranted.
    pub async fn begin_prompt(&self) -> StoreResult<PendingCheck> {
        let check = self.pending().await?;
        if check.should_prompt {
            self.acknowledge_prompt().await?;
            info!("Prompting for {} pending recurring expenses", check.due.len());
        }
        Ok(check)
    }

    /// Executes everything due today, in stored order. Overlapping calls run
    /// one after the other, and the later one skips what the earlier one ran.
    pub async fn run_pending(&self) -> StoreResult<BatchReport> {
        let today = self.clock.today();
        let due = due_set(&self.store.load().await?, today);
        Ok(self
            .coordinator
            .execute_batch(&due, self.clock.now(), today)
            .await)
    }

    pub async fn run_one(
        &self,
        id: &RecurringExpenseId,
        confirmation: &ExecutionConfirmation,
    ) -> Result<RecurringExpense, ExecutionError> {
        self.coordinator
            .execute_confirmed(id, confirmation, self.clock.now(), self.clock.today())
            .await
    }
}
