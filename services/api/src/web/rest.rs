//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::{
    BatchReportResponse, ConfirmationRequest, FailureResponse, PaymentMethodResponse,
    PendingResponse, RecurringExpenseRequest, RecurringExpenseResponse, SetActiveRequest,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use recurring_core::{ExecutionError, RecurringExpenseDraft, RecurringExpenseId, StoreError};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_payment_methods_handler,
        list_recurring_handler,
        create_recurring_handler,
        update_recurring_handler,
        delete_recurring_handler,
        set_active_handler,
        pending_handler,
        acknowledge_prompt_handler,
        run_pending_handler,
        execute_one_handler,
    ),
    components(
        schemas(
            RecurringExpenseRequest,
            RecurringExpenseResponse,
            SetActiveRequest,
            ConfirmationRequest,
            PendingResponse,
            FailureResponse,
            BatchReportResponse,
            PaymentMethodResponse,
        )
    ),
    tags(
        (name = "Recurring Expenses API", description = "Recurring expense schedules and their execution.")
    )
)]
pub struct ApiDoc;

type HandlerError = (StatusCode, String);

//=========================================================================================
// Error Mapping
//=========================================================================================

fn store_error(e: StoreError) -> HandlerError {
    match e {
        StoreError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            format!("Recurring expense {} not found", id),
        ),
        StoreError::Invalid(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        StoreError::Schedule(e) => {
            warn!("Schedule could not be computed: {}", e);
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        other => {
            error!("Recurring expense storage failed: {:?}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to access recurring expenses".to_string(),
            )
        }
    }
}

fn execution_error(e: ExecutionError) -> HandlerError {
    match e {
        ExecutionError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            format!("Recurring expense {} not found", id),
        ),
        ExecutionError::NotConfirmed => (StatusCode::CONFLICT, e.to_string()),
        ExecutionError::Rejected(_) => (StatusCode::BAD_GATEWAY, e.to_string()),
        ExecutionError::Store(_) => {
            error!("Recurring expense execution failed: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the payment methods a recurring expense can be charged to.
#[utoipa::path(
    get,
    path = "/payment-methods",
    responses(
        (status = 200, description = "Payment methods", body = [PaymentMethodResponse]),
        (status = 502, description = "The backend could not be reached")
    )
)]
pub async fn list_payment_methods_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let methods = app_state
        .payment_methods
        .list_payment_methods()
        .await
        .map_err(|e| {
            error!("Failed to list payment methods: {:?}", e);
            (
                StatusCode::BAD_GATEWAY,
                "Failed to load payment methods".to_string(),
            )
        })?;
    let body: Vec<PaymentMethodResponse> = methods.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// List every stored recurring expense.
#[utoipa::path(
    get,
    path = "/recurring-expenses",
    responses(
        (status = 200, description = "All recurring expenses", body = [RecurringExpenseResponse])
    )
)]
pub async fn list_recurring_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let expenses = app_state.scheduler.list().await.map_err(store_error)?;
    let body: Vec<RecurringExpenseResponse> = expenses.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// Create a recurring expense.
#[utoipa::path(
    post,
    path = "/recurring-expenses",
    request_body = RecurringExpenseRequest,
    responses(
        (status = 201, description = "Recurring expense created", body = RecurringExpenseResponse),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create_recurring_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<RecurringExpenseRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let draft = RecurringExpenseDraft::from(req);
    let created = app_state
        .scheduler
        .create(&draft)
        .await
        .map_err(store_error)?;
    Ok((
        StatusCode::CREATED,
        Json(RecurringExpenseResponse::from(created)),
    ))
}

/// Edit a recurring expense. Execution history is kept.
#[utoipa::path(
    put,
    path = "/recurring-expenses/{id}",
    request_body = RecurringExpenseRequest,
    params(("id" = String, Path, description = "Recurring expense id")),
    responses(
        (status = 200, description = "Recurring expense updated", body = RecurringExpenseResponse),
        (status = 404, description = "Unknown id"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn update_recurring_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RecurringExpenseRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let draft = RecurringExpenseDraft::from(req);
    let updated = app_state
        .scheduler
        .update(&RecurringExpenseId::from(id), &draft)
        .await
        .map_err(store_error)?;
    Ok(Json(RecurringExpenseResponse::from(updated)))
}

/// Delete a recurring expense.
#[utoipa::path(
    delete,
    path = "/recurring-expenses/{id}",
    params(("id" = String, Path, description = "Recurring expense id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn delete_recurring_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    app_state
        .scheduler
        .delete(&RecurringExpenseId::from(id))
        .await
        .map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pause or resume a recurring expense.
#[utoipa::path(
    post,
    path = "/recurring-expenses/{id}/active",
    request_body = SetActiveRequest,
    params(("id" = String, Path, description = "Recurring expense id")),
    responses(
        (status = 200, description = "Updated", body = RecurringExpenseResponse),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn set_active_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SetActiveRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let updated = app_state
        .scheduler
        .set_active(&RecurringExpenseId::from(id), req.active)
        .await
        .map_err(store_error)?;
    Ok(Json(RecurringExpenseResponse::from(updated)))
}

/// Items due today and whether the user should be asked to run them.
///
/// Read-only; call `POST /recurring-expenses/prompt` once the prompt is shown.
#[utoipa::path(
    get,
    path = "/recurring-expenses/pending",
    responses(
        (status = 200, description = "Due items", body = PendingResponse)
    )
)]
pub async fn pending_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let check = app_state.scheduler.pending().await.map_err(store_error)?;
    Ok(Json(PendingResponse::from(check)))
}

/// Record that today's prompt was shown.
#[utoipa::path(
    post,
    path = "/recurring-expenses/prompt",
    responses(
        (status = 204, description = "Recorded")
    )
)]
pub async fn acknowledge_prompt_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    app_state
        .scheduler
        .acknowledge_prompt()
        .await
        .map_err(|e| store_error(StoreError::from(e)))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Execute every item due today.
#[utoipa::path(
    post,
    path = "/recurring-expenses/run",
    responses(
        (status = 200, description = "Batch summary, including per-item failures", body = BatchReportResponse)
    )
)]
pub async fn run_pending_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let report = app_state
        .scheduler
        .run_pending()
        .await
        .map_err(store_error)?;
    Ok(Json(BatchReportResponse::from(report)))
}

/// Execute one recurring expense now, after the user confirmed amount and description.
#[utoipa::path(
    post,
    path = "/recurring-expenses/{id}/execute",
    request_body = ConfirmationRequest,
    params(("id" = String, Path, description = "Recurring expense id")),
    responses(
        (status = 200, description = "Executed; schedule advanced", body = RecurringExpenseResponse),
        (status = 404, description = "Unknown id"),
        (status = 409, description = "Confirmation does not match"),
        (status = 502, description = "The backend rejected the expense")
    )
)]
pub async fn execute_one_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ConfirmationRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let updated = app_state
        .scheduler
        .run_one(&RecurringExpenseId::from(id), &req.into())
        .await
        .map_err(execution_error)?;
    Ok(Json(RecurringExpenseResponse::from(updated)))
}
