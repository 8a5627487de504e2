//! crates/recurring_core/src/prompt_gate.rs
//!
//! At-most-once-per-day gate for asking the user to run pending expenses.
//! The last prompt date lives in durable storage, so the gate holds across
//! restarts and repeated page loads.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::warn;

use crate::ports::{KeyValueStorage, PortResult};

/// Storage key of the last prompt date, stored as `YYYY-MM-DD`.
pub const LAST_PROMPT_DATE_KEY: &str = "lastRecurringExpensePromptDate";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct DailyPromptGate {
    storage: Arc<dyn KeyValueStorage>,
}

impl DailyPromptGate {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    pub async fn last_prompted(&self) -> PortResult<Option<NaiveDate>> {
        let Some(raw) = self.storage.get(LAST_PROMPT_DATE_KEY).await? else {
            return Ok(None);
        };
        match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
            Ok(date) => Ok(Some(date)),
            Err(_) => {
                warn!("Ignoring malformed last prompt date '{}'", raw);
                Ok(None)
            }
        }
    }

    /// True unless the prompt was already shown on `today`.
    pub async fn should_prompt(&self, today: NaiveDate) -> PortResult<bool> {
        Ok(self.last_prompted().await? != Some(today))
    }

    /// Call when the prompt is shown, before the user answers.
    pub async fn record_prompted(&self, today: NaiveDate) -> PortResult<()> {
        self.storage
            .set(LAST_PROMPT_DATE_KEY, &today.format(DATE_FORMAT).to_string())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStorage;

    #[tokio::test]
    async fn suppresses_same_day_and_reopens_next_day() {
        let gate = DailyPromptGate::new(Arc::new(MemoryStorage::new()));
        let today = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();

        assert!(gate.should_prompt(today).await.unwrap());
        gate.record_prompted(today).await.unwrap();
        assert!(!gate.should_prompt(today).await.unwrap());
        assert!(gate.should_prompt(today.succ_opt().unwrap()).await.unwrap());
    }

    #[tokio::test]
    async fn stores_plain_iso_date() {
        let storage = Arc::new(MemoryStorage::new());
        let gate = DailyPromptGate::new(storage.clone());
        let today = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();

        gate.record_prompted(today).await.unwrap();
        assert_eq!(storage.raw(LAST_PROMPT_DATE_KEY).as_deref(), Some("2024-08-01"));
    }

    #[tokio::test]
    async fn malformed_stored_date_counts_as_never_prompted() {
        let storage =
            Arc::new(MemoryStorage::new().with_entry(LAST_PROMPT_DATE_KEY, "Thu Aug 01 2024"));
        let gate = DailyPromptGate::new(storage);
        let today = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();

        assert!(gate.should_prompt(today).await.unwrap());
    }
}
