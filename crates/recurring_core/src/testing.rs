//! Test doubles shared by the core's unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::{CreatedExpense, ExpenseRequest};
use crate::memory::MemoryStorage;
use crate::ports::{ExpenseService, KeyValueStorage, PortError, PortResult};

/// Records every request and rejects those whose description contains a marker.
pub struct ScriptedExpenses {
    fail_marker: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<ExpenseRequest>>,
}

impl ScriptedExpenses {
    pub fn accepting() -> Self {
        Self {
            fail_marker: None,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::accepting()
        }
    }

    /// Accepts everything, after waiting `delay` on each call.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::accepting()
        }
    }

    pub fn calls(&self) -> Vec<ExpenseRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExpenseService for ScriptedExpenses {
    async fn create_expense(&self, request: &ExpenseRequest) -> PortResult<CreatedExpense> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut calls = self.calls.lock().unwrap();
        calls.push(request.clone());
        match &self.fail_marker {
            Some(marker) if request.description.contains(marker.as_str()) => {
                Err(PortError::Rejected("payment method is closed".to_string()))
            }
            _ => Ok(CreatedExpense {
                id: Some(calls.len() as i64),
                description: Some(request.description.clone()),
            }),
        }
    }
}

/// `MemoryStorage` that yields to the scheduler around every access, the way
/// file or network I/O suspends, and can be told to fail upcoming writes.
#[derive(Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    failing_writes: AtomicUsize,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw value, bypassing failure injection.
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        Self {
            inner: self.inner.with_entry(key, value),
            ..self
        }
    }

    /// The next `count` calls to `set` fail.
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStorage for FlakyStorage {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        tokio::task::yield_now().await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        tokio::task::yield_now().await;
        let failing = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PortError::Unexpected("disk full".to_string()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.inner.remove(key).await
    }
}
