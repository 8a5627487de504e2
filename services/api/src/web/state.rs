//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use recurring_core::ports::PaymentMethodService;
use recurring_core::RecurringScheduler;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<RecurringScheduler>,
    pub payment_methods: Arc<dyn PaymentMethodService>,
    pub config: Arc<Config>,
}
