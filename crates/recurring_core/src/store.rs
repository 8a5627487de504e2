//! crates/recurring_core/src/store.rs
//!
//! The Schedule Store: the list of recurring expense definitions, kept as one
//! JSON array under a single key of a `KeyValueStorage`.
//!
//! Data is validated on load. Records written by older or buggy clients are
//! repaired where possible and dropped otherwise, so a bad record never turns
//! into bad date arithmetic further down.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::{
    DraftError, ExecutionDay, Frequency, RecurringExpense, RecurringExpenseDraft,
    RecurringExpenseId,
};
use crate::occurrence::{next_occurrence, ScheduleError};
use crate::ports::{KeyValueStorage, PortError};

/// Storage key of the definition list.
pub const RECURRING_EXPENSES_KEY: &str = "recurringExpenses";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Recurring expense {0} not found")]
    NotFound(RecurringExpenseId),
    #[error("Invalid recurring expense: {0}")]
    Invalid(#[from] DraftError),
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("Storage error: {0}")]
    Storage(#[from] PortError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

//=========================================================================================
// The Store
//=========================================================================================

/// Clones share one write lock. Every read-modify-write of the list, and the
/// repair write-back on load, runs while holding it.
#[derive(Clone)]
pub struct ScheduleStore {
    storage: Arc<dyn KeyValueStorage>,
    write_lock: Arc<Mutex<()>>,
}

impl ScheduleStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Reads every stored definition, in storage order.
    ///
    /// A blob that is not a JSON array is discarded and the key reset to `[]`;
    /// repaired or dropped records are written back.
    pub async fn load(&self) -> StoreResult<Vec<RecurringExpense>> {
        let _guard = self.write_lock.lock().await;
        self.load_locked().await
    }

    async fn load_locked(&self) -> StoreResult<Vec<RecurringExpense>> {
        let Some(raw) = self.storage.get(RECURRING_EXPENSES_KEY).await? else {
            return Ok(Vec::new());
        };

        let values: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(e) => {
                warn!("Stored recurring expenses are unreadable, resetting: {}", e);
                self.storage.set(RECURRING_EXPENSES_KEY, "[]").await?;
                return Ok(Vec::new());
            }
        };

        let mut expenses = Vec::with_capacity(values.len());
        let mut repaired = false;
        for (index, value) in values.into_iter().enumerate() {
            let record = match serde_json::from_value::<RecurringExpenseRecord>(value) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Dropping stored recurring expense #{}: {}", index, e);
                    repaired = true;
                    continue;
                }
            };
            match record.to_domain() {
                Ok((expense, fixed)) => {
                    if fixed {
                        warn!("Repaired stored recurring expense {}", expense.id);
                    }
                    repaired |= fixed;
                    expenses.push(expense);
                }
                Err(reason) => {
                    warn!("Dropping stored recurring expense #{}: {}", index, reason);
                    repaired = true;
                }
            }
        }

        if repaired {
            self.save_locked(&expenses).await?;
        }
        Ok(expenses)
    }

    /// Replaces the whole stored list.
    pub async fn save(&self, expenses: &[RecurringExpense]) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.save_locked(expenses).await
    }

    async fn save_locked(&self, expenses: &[RecurringExpense]) -> StoreResult<()> {
        let json = serde_json::to_string(expenses)?;
        self.storage.set(RECURRING_EXPENSES_KEY, &json).await?;
        Ok(())
    }

    pub async fn get(&self, id: &RecurringExpenseId) -> StoreResult<Option<RecurringExpense>> {
        Ok(self.load().await?.into_iter().find(|e| &e.id == id))
    }

    /// Validates the draft and stores a new definition scheduled from its start date.
    pub async fn create(
        &self,
        draft: &RecurringExpenseDraft,
        today: NaiveDate,
    ) -> StoreResult<RecurringExpense> {
        draft.validate()?;
        let execution_day = draft.resolved_execution_day();
        let next_due_date =
            next_occurrence(draft.frequency, execution_day, draft.start_date, today)?;

        let expense = RecurringExpense {
            id: RecurringExpenseId::new(),
            description: draft.description.trim().to_string(),
            amount: draft.amount,
            frequency: draft.frequency,
            execution_day,
            payment_method_id: draft.payment_method_id.ok_or(DraftError::MissingPaymentMethod)?,
            start_date: draft.start_date,
            active: draft.active,
            notes: draft.cleaned_notes(),
            last_executed_date: None,
            next_due_date,
            created_at: Utc::now(),
        };

        let _guard = self.write_lock.lock().await;
        let mut expenses = self.load_locked().await?;
        expenses.push(expense.clone());
        self.save_locked(&expenses).await?;
        info!("Created recurring expense {} ({})", expense.id, expense.frequency);
        Ok(expense)
    }

    /// Applies an edit. Execution history and creation time are kept; the
    /// next due date is recomputed from the schedule base.
    pub async fn update(
        &self,
        id: &RecurringExpenseId,
        draft: &RecurringExpenseDraft,
        today: NaiveDate,
    ) -> StoreResult<RecurringExpense> {
        draft.validate()?;
        let payment_method_id = draft
            .payment_method_id
            .ok_or(DraftError::MissingPaymentMethod)?;

        self.modify(id, |expense| {
            expense.description = draft.description.trim().to_string();
            expense.amount = draft.amount;
            expense.frequency = draft.frequency;
            expense.execution_day = draft.resolved_execution_day();
            expense.payment_method_id = payment_method_id;
            expense.start_date = draft.start_date;
            expense.active = draft.active;
            expense.notes = draft.cleaned_notes();
            expense.next_due_date = expense.compute_next_due(today)?;
            Ok(())
        })
        .await
    }

    pub async fn delete(&self, id: &RecurringExpenseId) -> StoreResult<RecurringExpense> {
        let _guard = self.write_lock.lock().await;
        let mut expenses = self.load_locked().await?;
        let index = expenses
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let removed = expenses.remove(index);
        self.save_locked(&expenses).await?;
        info!("Deleted recurring expense {}", id);
        Ok(removed)
    }

    pub async fn set_active(
        &self,
        id: &RecurringExpenseId,
        active: bool,
    ) -> StoreResult<RecurringExpense> {
        self.modify(id, |expense| {
            expense.active = active;
            Ok(())
        })
        .await
    }

    /// Marks a successful execution on `executed_on` and advances the schedule
    /// to the next occurrence after it. Written through immediately.
    pub async fn record_execution(
        &self,
        id: &RecurringExpenseId,
        executed_on: NaiveDate,
    ) -> StoreResult<RecurringExpense> {
        self.modify(id, |expense| {
            expense.last_executed_date = Some(executed_on);
            expense.next_due_date = expense.compute_next_due(executed_on)?;
            Ok(())
        })
        .await
    }

    /// Read-modify-write of a single definition.
    async fn modify<F>(&self, id: &RecurringExpenseId, change: F) -> StoreResult<RecurringExpense>
    where
        F: FnOnce(&mut RecurringExpense) -> Result<(), ScheduleError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut expenses = self.load_locked().await?;
        let expense = expenses
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        change(expense)?;
        let updated = expense.clone();
        self.save_locked(&expenses).await?;
        Ok(updated)
    }
}

//=========================================================================================
// "Impure" Stored Record
//=========================================================================================

/// The loosely-typed shape found in storage. Every field is optional so one
/// bad record can be repaired or dropped without failing the whole list.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecurringExpenseRecord {
    id: Option<Value>,
    description: Option<String>,
    amount: Option<Value>,
    frequency: Option<String>,
    execution_day: Option<Value>,
    payment_method_id: Option<Value>,
    start_date: Option<String>,
    active: Option<bool>,
    notes: Option<String>,
    last_executed_date: Option<String>,
    next_due_date: Option<String>,
    created_at: Option<String>,
}

impl RecurringExpenseRecord {
    /// Converts to a domain value. The flag reports whether anything was repaired.
    fn to_domain(self) -> Result<(RecurringExpense, bool), &'static str> {
        let mut repaired = false;

        let id = match &self.id {
            Some(Value::String(s)) if !s.trim().is_empty() => RecurringExpenseId::from(s.as_str()),
            Some(Value::Number(n)) => RecurringExpenseId::from(n.to_string()),
            _ => return Err("missing id"),
        };
        let start_date = self
            .start_date
            .as_deref()
            .and_then(parse_date)
            .ok_or("missing or malformed startDate")?;
        let amount = self
            .amount
            .as_ref()
            .and_then(number)
            .filter(|a| a.is_finite() && *a > 0.0)
            .ok_or("amount is not a positive number")?;
        let payment_method_id = self
            .payment_method_id
            .as_ref()
            .and_then(number)
            .filter(|n| n.fract() == 0.0 && *n >= 1.0 && *n <= i64::MAX as f64)
            .map(|n| n as i64)
            .ok_or("paymentMethodId is not a positive integer")?;

        let frequency = match self.frequency.as_deref() {
            Some(raw) => {
                let parsed = Frequency::parse_lenient(raw);
                repaired |= !parsed.as_str().eq_ignore_ascii_case(raw.trim());
                parsed
            }
            None => {
                repaired = true;
                Frequency::Monthly
            }
        };

        let execution_day = match self.execution_day.as_ref().and_then(number) {
            Some(day) if day.fract() == 0.0 && (1.0..=31.0).contains(&day) => {
                ExecutionDay::from(day as i64)
            }
            Some(_) => {
                repaired = true;
                ExecutionDay::FIRST
            }
            None => {
                repaired |= frequency == Frequency::Monthly;
                ExecutionDay::FIRST
            }
        };

        let last_executed_date = self.last_executed_date.as_deref().and_then(parse_date);
        repaired |= self.last_executed_date.is_some() && last_executed_date.is_none();

        let created_at = self
            .created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| start_date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()))
            .ok_or("malformed createdAt")?;

        let mut expense = RecurringExpense {
            id,
            description: self.description.unwrap_or_default(),
            amount,
            frequency,
            execution_day,
            payment_method_id,
            start_date,
            active: self.active.unwrap_or(true),
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            last_executed_date,
            next_due_date: start_date,
            created_at,
        };

        expense.next_due_date = match self.next_due_date.as_deref().and_then(parse_date) {
            Some(date) => date,
            None => {
                repaired = true;
                let base = expense.schedule_base();
                expense
                    .compute_next_due(base)
                    .map_err(|_| "cannot compute nextDueDate")?
            }
        };

        Ok((expense, repaired))
    }
}

/// Accepts `YYYY-MM-DD` or anything that starts with it (e.g. an ISO timestamp).
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
