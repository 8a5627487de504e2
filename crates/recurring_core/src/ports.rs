//! crates/recurring_core/src/ports.rs
//!
//! Defines the service contracts (traits) the scheduler depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! scheduling logic independent of where data is stored or how the expense
//! backend is reached.

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use std::sync::Mutex;

use crate::domain::{CreatedExpense, ExpenseRequest, PaymentMethod};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., storage, network).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Durable key-value storage holding serialized strings.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    async fn remove(&self, key: &str) -> PortResult<()>;
}

#[async_trait]
pub trait ExpenseService: Send + Sync {
    /// Records a real expense on the backend. Any error means the expense was not created.
    async fn create_expense(&self, request: &ExpenseRequest) -> PortResult<CreatedExpense>;
}

#[async_trait]
pub trait PaymentMethodService: Send + Sync {
    async fn list_payment_methods(&self) -> PortResult<Vec<PaymentMethod>>;
}

/// Source of "today" and "now".
pub trait Clock: Send + Sync {
    /// The local calendar date.
    fn today(&self) -> NaiveDate;

    fn now(&self) -> DateTime<Utc>;
}

//=========================================================================================
// Clock Implementations
//=========================================================================================

/// Reads the system clock; `today` uses the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a given day, movable by hand.
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set_today(&self, today: NaiveDate) {
        *self.today.lock().unwrap_or_else(|e| e.into_inner()) = today;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn now(&self) -> DateTime<Utc> {
        self.today()
            .and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default())
            .and_utc()
    }
}
