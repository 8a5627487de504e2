//! End-to-end tests of the REST router with in-memory storage, a fixed clock,
//! and a mock expense backend.

use api_lib::adapters::BackendClient;
use api_lib::config::Config;
use api_lib::web::{self, protocol::*, state::AppState};
use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use recurring_core::{FixedClock, MemoryStorage, RecurringScheduler};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    app: Router,
    clock: Arc<FixedClock>,
    _server: MockServer,
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The backend accepts every expense except the one described as "Water".
async fn harness() -> Harness {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/expenses"))
        .and(body_partial_json(json!({"description": "Water (recurring)"})))
        .respond_with(ResponseTemplate::new(422).set_body_string("account closed"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/expenses"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/payment-methods"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "Cash"}])),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let config = Config::from_lookup(|key| match key {
        "BACKEND_URL" => Some(uri.clone()),
        "STORAGE_BACKEND" => Some("memory".to_string()),
        _ => None,
    })
    .unwrap();
    let backend = Arc::new(BackendClient::new(config.backend_url.clone(), None, None).unwrap());
    let clock = Arc::new(FixedClock::new(date(2024, 5, 1)));
    let scheduler = Arc::new(RecurringScheduler::new(
        Arc::new(MemoryStorage::new()),
        backend.clone(),
        clock.clone(),
    ));
    let state = Arc::new(AppState {
        scheduler,
        payment_methods: backend,
        config: Arc::new(config),
    });

    Harness {
        app: web::router(state),
        clock,
        _server: server,
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).unwrap()
}

fn weekly(description: &str) -> Value {
    json!({
        "description": description,
        "amount": 25.0,
        "frequency": "WEEKLY",
        "paymentMethodId": 1,
        "startDate": "2024-05-01"
    })
}

async fn create(app: &Router, body: Value) -> RecurringExpenseResponse {
    let (status, bytes) = send(app, "POST", "/recurring-expenses", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    parse(&bytes)
}

#[tokio::test]
async fn create_list_update_delete() {
    let h = harness().await;

    let created = create(&h.app, weekly("Cleaning")).await;
    assert_eq!(created.next_due_date, date(2024, 5, 8));
    assert_eq!(created.frequency, "WEEKLY");

    let (status, bytes) = send(&h.app, "GET", "/recurring-expenses", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<RecurringExpenseResponse> = parse(&bytes);
    assert_eq!(listed.len(), 1);

    let mut edit = weekly("Office cleaning");
    edit["amount"] = json!(30.0);
    let uri = format!("/recurring-expenses/{}", created.id);
    let (status, bytes) = send(&h.app, "PUT", &uri, Some(edit)).await;
    assert_eq!(status, StatusCode::OK);
    let updated: RecurringExpenseResponse = parse(&bytes);
    assert_eq!(updated.description, "Office cleaning");
    assert_eq!(updated.amount, 30.0);

    let (status, _) = send(&h.app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&h.app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_draft_is_unprocessable() {
    let h = harness().await;

    let mut body = weekly("Cleaning");
    body["amount"] = json!(-3.0);
    let (status, _) = send(&h.app, "POST", "/recurring-expenses", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut body = weekly("Cleaning");
    body.as_object_mut().unwrap().remove("paymentMethodId");
    let (status, bytes) = send(&h.app, "POST", "/recurring-expenses", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(String::from_utf8_lossy(&bytes).contains("payment method"));

    let (_, bytes) = send(&h.app, "GET", "/recurring-expenses", None).await;
    let listed: Vec<RecurringExpenseResponse> = parse(&bytes);
    assert!(listed.is_empty());
}

#[tokio::test]
async fn pending_prompt_is_gated_per_day() {
    let h = harness().await;
    create(&h.app, weekly("Cleaning")).await;

    let (_, bytes) = send(&h.app, "GET", "/recurring-expenses/pending", None).await;
    let pending: PendingResponse = parse(&bytes);
    assert!(pending.due.is_empty());
    assert!(!pending.should_prompt);

    h.clock.set_today(date(2024, 5, 8));
    let (_, bytes) = send(&h.app, "GET", "/recurring-expenses/pending", None).await;
    let pending: PendingResponse = parse(&bytes);
    assert_eq!(pending.due.len(), 1);
    assert!(pending.should_prompt);

    let (status, _) = send(&h.app, "POST", "/recurring-expenses/prompt", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, bytes) = send(&h.app, "GET", "/recurring-expenses/pending", None).await;
    let pending: PendingResponse = parse(&bytes);
    assert_eq!(pending.due.len(), 1);
    assert!(!pending.should_prompt);

    h.clock.set_today(date(2024, 5, 9));
    let (_, bytes) = send(&h.app, "GET", "/recurring-expenses/pending", None).await;
    let pending: PendingResponse = parse(&bytes);
    assert!(pending.should_prompt);
}

#[tokio::test]
async fn batch_run_reports_partial_failure() {
    let h = harness().await;
    let rent = create(&h.app, weekly("Rent")).await;
    let water = create(&h.app, weekly("Water")).await;
    let phone = create(&h.app, weekly("Phone")).await;

    h.clock.set_today(date(2024, 5, 8));
    let (status, bytes) = send(&h.app, "POST", "/recurring-expenses/run", None).await;
    assert_eq!(status, StatusCode::OK);
    let report: BatchReportResponse = parse(&bytes);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].description, "Water");
    assert!(report.failures[0].reason.contains("account closed"));

    let (_, bytes) = send(&h.app, "GET", "/recurring-expenses", None).await;
    let listed: Vec<RecurringExpenseResponse> = parse(&bytes);
    let by_id = |id: &str| listed.iter().find(|e| e.id == id).unwrap();
    assert_eq!(by_id(rent.id.as_str()).last_executed_date, Some(date(2024, 5, 8)));
    assert_eq!(by_id(rent.id.as_str()).next_due_date, date(2024, 5, 15));
    assert_eq!(by_id(water.id.as_str()).last_executed_date, None);
    assert_eq!(by_id(water.id.as_str()).next_due_date, date(2024, 5, 8));
    assert_eq!(by_id(phone.id.as_str()).last_executed_date, Some(date(2024, 5, 8)));
}

#[tokio::test]
async fn manual_execution_checks_confirmation_and_backend() {
    let h = harness().await;
    let rent = create(&h.app, weekly("Rent")).await;
    let water = create(&h.app, weekly("Water")).await;

    let uri = format!("/recurring-expenses/{}/execute", rent.id);
    let (status, _) = send(
        &h.app,
        "POST",
        &uri,
        Some(json!({"amount": 99.0, "description": "Rent"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, bytes) = send(
        &h.app,
        "POST",
        &uri,
        Some(json!({"amount": 25.0, "description": "Rent"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let executed: RecurringExpenseResponse = parse(&bytes);
    assert_eq!(executed.last_executed_date, Some(date(2024, 5, 1)));
    assert_eq!(executed.next_due_date, date(2024, 5, 8));

    let uri = format!("/recurring-expenses/{}/execute", water.id);
    let (status, _) = send(
        &h.app,
        "POST",
        &uri,
        Some(json!({"amount": 25.0, "description": "Water"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, _) = send(
        &h.app,
        "POST",
        "/recurring-expenses/unknown/execute",
        Some(json!({"amount": 25.0, "description": "Water"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pausing_excludes_from_pending() {
    let h = harness().await;
    let created = create(&h.app, weekly("Cleaning")).await;

    let uri = format!("/recurring-expenses/{}/active", created.id);
    let (status, bytes) = send(&h.app, "POST", &uri, Some(json!({"active": false}))).await;
    assert_eq!(status, StatusCode::OK);
    let paused: RecurringExpenseResponse = parse(&bytes);
    assert!(!paused.active);

    h.clock.set_today(date(2024, 6, 1));
    let (_, bytes) = send(&h.app, "GET", "/recurring-expenses/pending", None).await;
    let pending: PendingResponse = parse(&bytes);
    assert!(pending.due.is_empty());
}

#[tokio::test]
async fn payment_methods_come_from_the_backend() {
    let h = harness().await;
    let (status, bytes) = send(&h.app, "GET", "/payment-methods", None).await;
    assert_eq!(status, StatusCode::OK);
    let methods: Vec<PaymentMethodResponse> = parse(&bytes);
    assert_eq!(methods[0].name, "Cash");
}
