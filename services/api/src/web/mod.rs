pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use rest::ApiDoc;
use rest::{
    acknowledge_prompt_handler, create_recurring_handler, delete_recurring_handler,
    execute_one_handler, list_payment_methods_handler, list_recurring_handler, pending_handler,
    run_pending_handler, set_active_handler, update_recurring_handler,
};
use state::AppState;

/// Builds the API router. CORS and Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/payment-methods", get(list_payment_methods_handler))
        .route(
            "/recurring-expenses",
            get(list_recurring_handler).post(create_recurring_handler),
        )
        .route("/recurring-expenses/pending", get(pending_handler))
        .route("/recurring-expenses/prompt", post(acknowledge_prompt_handler))
        .route("/recurring-expenses/run", post(run_pending_handler))
        .route(
            "/recurring-expenses/{id}",
            put(update_recurring_handler).delete(delete_recurring_handler),
        )
        .route("/recurring-expenses/{id}/active", post(set_active_handler))
        .route("/recurring-expenses/{id}/execute", post(execute_one_handler))
        .with_state(app_state)
}
