pub mod domain;
pub mod due;
pub mod executor;
pub mod memory;
pub mod occurrence;
pub mod ports;
pub mod prompt_gate;
pub mod scheduler;
pub mod store;

#[cfg(test)]
mod testing;

pub use domain::{
    BatchReport, CreatedExpense, DraftError, ExecutionConfirmation, ExecutionDay,
    ExecutionFailure, ExpenseRequest, Frequency, PaymentMethod, PendingCheck, RecurringExpense,
    RecurringExpenseDraft, RecurringExpenseId,
};
pub use executor::{ExecutionCoordinator, ExecutionError};
pub use memory::MemoryStorage;
pub use occurrence::{next_occurrence, ScheduleError};
pub use ports::{
    Clock, ExpenseService, FixedClock, KeyValueStorage, PaymentMethodService, PortError,
    PortResult, SystemClock,
};
pub use prompt_gate::DailyPromptGate;
pub use scheduler::RecurringScheduler;
pub use store::{ScheduleStore, StoreError, StoreResult};
