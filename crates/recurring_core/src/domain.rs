//! crates/recurring_core/src/domain.rs
//!
//! Defines the pure, core data structures for recurring expenses.
//! Field names serialize in camelCase to match the layout kept in local storage.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Frequency and Execution Day
//=========================================================================================

/// How often a recurring expense falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Bimonthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl Frequency {
    pub const ALL: [Frequency; 7] = [
        Frequency::Weekly,
        Frequency::Biweekly,
        Frequency::Monthly,
        Frequency::Bimonthly,
        Frequency::Quarterly,
        Frequency::Semiannual,
        Frequency::Annual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "WEEKLY",
            Frequency::Biweekly => "BIWEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Bimonthly => "BIMONTHLY",
            Frequency::Quarterly => "QUARTERLY",
            Frequency::Semiannual => "SEMIANNUAL",
            Frequency::Annual => "ANNUAL",
        }
    }

    /// Case-insensitive parse. Anything unrecognized falls back to `Monthly`.
    pub fn parse_lenient(value: &str) -> Self {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(value))
            .unwrap_or(Frequency::Monthly)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day of the month a `Monthly` expense runs on, always within 1..=31.
///
/// Out-of-range input normalizes to day 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u32")]
pub struct ExecutionDay(u32);

impl ExecutionDay {
    pub const FIRST: ExecutionDay = ExecutionDay(1);

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl From<i64> for ExecutionDay {
    fn from(value: i64) -> Self {
        if (1..=31).contains(&value) {
            ExecutionDay(value as u32)
        } else {
            ExecutionDay::FIRST
        }
    }
}

impl From<u32> for ExecutionDay {
    fn from(value: u32) -> Self {
        ExecutionDay::from(i64::from(value))
    }
}

impl From<ExecutionDay> for u32 {
    fn from(day: ExecutionDay) -> Self {
        day.0
    }
}

//=========================================================================================
// Recurring Expense Definition
//=========================================================================================

/// Opaque identifier of a recurring expense definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecurringExpenseId(String);

impl RecurringExpenseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecurringExpenseId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for RecurringExpenseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RecurringExpenseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for RecurringExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user-authored template for an expense that repeats on a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringExpense {
    pub id: RecurringExpenseId,
    pub description: String,
    pub amount: f64,
    pub frequency: Frequency,
    pub execution_day: ExecutionDay,
    pub payment_method_id: i64,
    pub start_date: NaiveDate,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_executed_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl RecurringExpense {
    /// The date the schedule rolls forward from: the later of the start date
    /// and the last execution.
    pub fn schedule_base(&self) -> NaiveDate {
        match self.last_executed_date {
            Some(last) if last > self.start_date => last,
            _ => self.start_date,
        }
    }

    /// Description sent to the expense backend, marked as coming from a schedule.
    pub fn recurring_description(&self) -> String {
        format!("{} (recurring)", self.description)
    }

    /// Whether the user acknowledged this exact amount and description.
    pub fn confirms(&self, confirmation: &ExecutionConfirmation) -> bool {
        (self.amount - confirmation.amount).abs() < 0.005
            && self.description.trim() == confirmation.description.trim()
    }
}

//=========================================================================================
// Drafts (create / edit input)
//=========================================================================================

/// Validation failures on a draft. Raised before any storage or network call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DraftError {
    #[error("Description must not be empty")]
    EmptyDescription,
    #[error("Amount must be a positive number, got {0}")]
    InvalidAmount(f64),
    #[error("A payment method is required")]
    MissingPaymentMethod,
    #[error("Execution day must be between 1 and 31, got {0}")]
    InvalidExecutionDay(u32),
}

fn default_active() -> bool {
    true
}

/// The fields a user supplies when creating or editing a recurring expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringExpenseDraft {
    pub description: String,
    pub amount: f64,
    pub frequency: Frequency,
    #[serde(default)]
    pub execution_day: Option<u32>,
    #[serde(default)]
    pub payment_method_id: Option<i64>,
    pub start_date: NaiveDate,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RecurringExpenseDraft {
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.description.trim().is_empty() {
            return Err(DraftError::EmptyDescription);
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(DraftError::InvalidAmount(self.amount));
        }
        if !matches!(self.payment_method_id, Some(id) if id > 0) {
            return Err(DraftError::MissingPaymentMethod);
        }
        if let Some(day) = self.execution_day {
            if !(1..=31).contains(&day) {
                return Err(DraftError::InvalidExecutionDay(day));
            }
        }
        Ok(())
    }

    /// Execution day to store; defaults to the start date's day of month.
    pub fn resolved_execution_day(&self) -> ExecutionDay {
        self.execution_day
            .map(ExecutionDay::from)
            .unwrap_or_else(|| ExecutionDay::from(self.start_date.day()))
    }

    pub(crate) fn cleaned_notes(&self) -> Option<String> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }
}

//=========================================================================================
// External Collaborator Payloads
//=========================================================================================

/// Body of the backend's "create expense" call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRequest {
    pub date: DateTime<Utc>,
    pub amount: f64,
    pub payment_method_id: i64,
    pub description: String,
}

/// The expense record the backend returns. Only the fields the scheduler reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedExpense {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: i64,
    pub name: String,
}

//=========================================================================================
// Execution Results
//=========================================================================================

/// The acknowledgment a user gives before running a single item by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfirmation {
    pub amount: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionFailure {
    pub id: RecurringExpenseId,
    pub description: String,
    pub reason: String,
}

/// Summary of one batch run, reported once after every item was attempted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<ExecutionFailure>,
    pub executed: Vec<RecurringExpense>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// The result of the on-open due check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCheck {
    pub due: Vec<RecurringExpense>,
    pub should_prompt: bool,
}
