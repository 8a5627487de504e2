//! services/api/src/web/protocol.rs
//!
//! Defines the JSON request and response bodies of the REST API. These mirror
//! the core domain types and carry the OpenAPI schema annotations.

use chrono::{DateTime, NaiveDate, Utc};
use recurring_core::domain::{
    BatchReport, ExecutionConfirmation, ExecutionFailure, Frequency, PaymentMethod, PendingCheck,
    RecurringExpense, RecurringExpenseDraft,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn default_active() -> bool {
    true
}

//=========================================================================================
// Requests
//=========================================================================================

/// Fields of a recurring expense as entered in the create/edit form.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecurringExpenseRequest {
    pub description: String,
    pub amount: f64,
    /// One of WEEKLY, BIWEEKLY, MONTHLY, BIMONTHLY, QUARTERLY, SEMIANNUAL, ANNUAL.
    #[schema(value_type = String, example = "MONTHLY")]
    pub frequency: Frequency,
    /// Day of month (1-31); only used by MONTHLY schedules.
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

impl From<RecurringExpenseRequest> for RecurringExpenseDraft {
    fn from(req: RecurringExpenseRequest) -> Self {
        RecurringExpenseDraft {
            description: req.description,
            amount: req.amount,
            frequency: req.frequency,
            execution_day: req.execution_day,
            payment_method_id: req.payment_method_id,
            start_date: req.start_date,
            active: req.active,
            notes: req.notes,
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// The amount and description the user acknowledged before a manual run.
#[derive(Deserialize, Debug, ToSchema)]
pub struct ConfirmationRequest {
    pub amount: f64,
    pub description: String,
}

impl From<ConfirmationRequest> for ExecutionConfirmation {
    fn from(req: ConfirmationRequest) -> Self {
        ExecutionConfirmation {
            amount: req.amount,
            description: req.description,
        }
    }
}

//=========================================================================================
// Responses
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecurringExpenseResponse {
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub frequency: String,
    pub execution_day: u32,
    pub payment_method_id: i64,
    pub start_date: NaiveDate,
    pub active: bool,
    pub notes: Option<String>,
    pub last_executed_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<RecurringExpense> for RecurringExpenseResponse {
    fn from(e: RecurringExpense) -> Self {
        Self {
            id: e.id.to_string(),
            description: e.description,
            amount: e.amount,
            frequency: e.frequency.to_string(),
            execution_day: e.execution_day.get(),
            payment_method_id: e.payment_method_id,
            start_date: e.start_date,
            active: e.active,
            notes: e.notes,
            last_executed_date: e.last_executed_date,
            next_due_date: e.next_due_date,
            created_at: e.created_at,
        }
    }
}

/// Result of the on-open due check.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingResponse {
    pub due: Vec<RecurringExpenseResponse>,
    /// True when the user has not yet been asked today and something is due.
    pub should_prompt: bool,
}

impl From<PendingCheck> for PendingResponse {
    fn from(check: PendingCheck) -> Self {
        Self {
            due: check.due.into_iter().map(Into::into).collect(),
            should_prompt: check.should_prompt,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct FailureResponse {
    pub id: String,
    pub description: String,
    pub reason: String,
}

impl From<ExecutionFailure> for FailureResponse {
    fn from(f: ExecutionFailure) -> Self {
        Self {
            id: f.id.to_string(),
            description: f.description,
            reason: f.reason,
        }
    }
}

/// End-of-batch summary.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct BatchReportResponse {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<FailureResponse>,
    pub executed: Vec<RecurringExpenseResponse>,
}

impl From<BatchReport> for BatchReportResponse {
    fn from(report: BatchReport) -> Self {
        Self {
            succeeded: report.succeeded,
            failed: report.failed,
            failures: report.failures.into_iter().map(Into::into).collect(),
            executed: report.executed.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct PaymentMethodResponse {
    pub id: i64,
    pub name: String,
}

impl From<PaymentMethod> for PaymentMethodResponse {
    fn from(m: PaymentMethod) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}
