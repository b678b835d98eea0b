//! Client flow against an in-process mock of the CRM backend.

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use crm_api_client::{ApiError, CrmClient};
use crm_core::config::ApiConfig;
use crm_core::types::{
    CampaignKind, CampaignSend, NewCampaign, NewCustomer, NewOrder, OrderStatus,
};
use crm_core::RecordId;
use crm_segmentation::{Logic, RuleDraft, RuleEvaluator, RuleSetDraft, SegmentBuilder};
use serde_json::{json, Value};

const TOKEN: &str = "test-token";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == format!("Bearer {TOKEN}"))
}

async fn customers(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "customers": [
                { "_id": "c-1", "name": "Asha", "email": "asha@example.com", "totalSpend": 12000, "visits": 3 },
                { "_id": "c-2", "name": "Ben", "email": "ben@example.com", "totalSpend": 5000, "visits": 12 },
                { "_id": "c-3", "name": "Cy", "email": "cy@example.com" }
            ]
        })),
    )
}

async fn create_customer(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut customer = body;
    customer["_id"] = json!(41);
    (StatusCode::CREATED, Json(json!({ "customer": customer })))
}

async fn orders() -> Json<Value> {
    Json(json!({
        "data": [
            { "_id": "o-1", "customer": "c-1", "items": [{ "product": "Tea", "quantity": 2, "price": 40 }], "totalAmount": 80, "status": "pending" }
        ]
    }))
}

async fn create_order(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut order = body;
    order["_id"] = json!("o-2");
    order["status"] = json!("pending");
    (StatusCode::CREATED, Json(json!({ "order": order })))
}

async fn update_status(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "order": { "_id": id, "customer": "c-1", "status": body["status"], "totalAmount": 80 }
    }))
}

async fn segments() -> Json<Value> {
    Json(json!([
        { "_id": "s-1", "name": "Regulars", "rules": { "minVisits": 5 }, "customerCount": 12 }
    ]))
}

async fn create_segment(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut segment = body;
    segment["_id"] = json!("s-9");
    segment["customerIds"] = json!(["c-1"]);
    (StatusCode::CREATED, Json(json!({ "segment": segment })))
}

async fn campaigns() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "Campaign store unavailable" })),
    )
}

async fn create_campaign(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    assert_eq!(body.as_object().map(|o| o.len()), Some(2));
    let mut campaign = body;
    campaign["_id"] = json!("cmp-1");
    campaign["status"] = json!("draft");
    (StatusCode::CREATED, Json(json!({ "data": campaign })))
}

async fn send_campaign(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["type"], "email");
    Json(json!({
        "campaign": { "sentCount": 9, "failedCount": 1, "recipients": ["c-1", "c-2"] }
    }))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn spawn_backend() -> String {
    let api = Router::new()
        .route("/customers", get(customers).post(create_customer))
        .route("/orders", get(orders).post(create_order))
        .route("/orders/:id/status", patch(update_status))
        .route("/segments", get(segments).post(create_segment))
        .route("/campaigns", get(campaigns).post(create_campaign))
        .route("/campaigns/send", post(send_campaign))
        .route("/health", get(health));
    let app = Router::new().nest("/api", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn client(base_url: &str, token: Option<&str>) -> CrmClient {
    CrmClient::new(&ApiConfig {
        base_url: base_url.to_string(),
        timeout_ms: 5_000,
        token: token.map(str::to_string),
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_customers_and_preview_audience() {
    let base = spawn_backend().await;
    let client = client(&base, Some(TOKEN));

    let customers = client.fetch_customers().await.unwrap();
    assert_eq!(customers.len(), 3);
    assert_eq!(customers[2].total_spend, None);

    let draft = RuleSetDraft::new(vec![RuleDraft::new("minSpend", ">", 10000)], Logic::And);
    let result = RuleEvaluator::new().preview(&customers, &draft).unwrap();
    assert_eq!(result.count, 1);
    assert_eq!(result.customers[0].id.as_str(), "c-1");
}

#[tokio::test]
async fn test_missing_token_surfaces_backend_error() {
    let base = spawn_backend().await;
    let err = client(&base, None).fetch_customers().await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "Unauthorized");
}

#[tokio::test]
async fn test_with_token_sets_bearer_header() {
    let base = spawn_backend().await;
    let customers = client(&base, None)
        .with_token(TOKEN)
        .fetch_customers()
        .await
        .unwrap();
    assert_eq!(customers.len(), 3);
}

#[tokio::test]
async fn test_create_customer_normalizes_numeric_id() {
    let base = spawn_backend().await;
    let new_customer = NewCustomer {
        total_spend: 2500.0,
        visits: 4,
        ..NewCustomer::new("Dee", "dee@example.com")
    };
    let created = client(&base, Some(TOKEN))
        .create_customer(&new_customer)
        .await
        .unwrap();

    assert_eq!(created.id.as_str(), "41");
    assert_eq!(created.email, "dee@example.com");
    assert_eq!(created.total_spend, Some(2500.0));
    assert_eq!(created.visits, Some(4));
}

#[tokio::test]
async fn test_orders_round() {
    let base = spawn_backend().await;
    let client = client(&base, Some(TOKEN));

    let orders = client.fetch_orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].customer.id().as_str(), "c-1");

    let created = client
        .create_order(&NewOrder::single(RecordId::new("c-2"), "Coffee", 300.0, 2))
        .await
        .unwrap();
    assert_eq!(created.id.as_str(), "o-2");
    assert_eq!(created.total_amount, 600.0);

    let updated = client
        .update_order_status("o-1", OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Shipped);
}

#[tokio::test]
async fn test_segment_creation_and_listing() {
    let base = spawn_backend().await;
    let client = client(&base, Some(TOKEN));

    let new_segment = SegmentBuilder::new(" High value ")
        .draft(RuleDraft::new("minSpend", ">", "10000"))
        .created_by("user-1")
        .build()
        .unwrap();
    let created = client.create_segment(&new_segment).await.unwrap();

    assert_eq!(created.id.as_str(), "s-9");
    assert_eq!(created.name, "High value");
    assert_eq!(created.created_by.as_deref(), Some("user-1"));
    assert_eq!(created.audience_size(), Some(1));
    let now = RuleEvaluator::new().now();
    assert_eq!(created.rule_set(now).unwrap(), new_segment.rule_set());

    let segments = client.fetch_segments().await.unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].audience_size(), Some(12));
    assert_eq!(segments[0].rule_set(now).unwrap().rules[0].label(), "Min Visits >= 5");
}

#[tokio::test]
async fn test_campaign_errors_and_send() {
    let base = spawn_backend().await;
    let client = client(&base, Some(TOKEN));

    match client.fetch_campaigns().await {
        Err(ApiError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Campaign store unavailable");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    let created = client
        .create_campaign(&NewCampaign::new("Spring sale", "Ten percent off"))
        .await
        .unwrap();
    assert_eq!(created.id.as_str(), "cmp-1");
    assert_eq!(created.title, "Spring sale");
    assert_eq!(created.status, "draft");

    let result = client
        .send_campaign(&CampaignSend {
            name: "Welcome back".to_string(),
            kind: CampaignKind::Email,
            segment_id: RecordId::new("s-1"),
            message: "We miss you".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(result.sent_count, 9);
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.recipients.len(), 2);
}

#[tokio::test]
async fn test_health() {
    let base = spawn_backend().await;
    let status = client(&base, None).health().await;
    assert!(status.connected);
    assert_eq!(status.status, 200);

    let down = client("http://127.0.0.1:1/api", None).health().await;
    assert!(!down.connected);
    assert_eq!(down.status, 0);
    assert!(down.message.starts_with("API connection error"));
}
