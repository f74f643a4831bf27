//! End-to-end tests driving the router with in-memory SQLite.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use sanj_dashboard_api::{router, ApiConfig, AppState};
use sanj_db::{Database, DbConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    router(AppState::new(db, ApiConfig::default()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn product_body(name: &str, opening_stock: i64) -> Value {
    json!({
        "name": name,
        "batch": "B101",
        "expiry": "2027-06-30",
        "mrp": 20000,
        "gst": 1200,
        "supplier_price": 9000,
        "opening_stock": opening_stock,
        "category": "Tablet"
    })
}

async fn create_product(app: &Router, name: &str, opening_stock: i64) -> Value {
    let (status, product) = send_json(app, Method::POST, "/api/products", Some(product_body(name, opening_stock))).await;
    assert_eq!(status, StatusCode::CREATED);
    product
}

#[tokio::test]
async fn test_health_reports_migrations() {
    let app = app().await;

    let (status, body) = send_json(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
    assert_eq!(body["migrations_applied"], body["migrations_total"]);
}

#[tokio::test]
async fn test_create_and_list_products() {
    let app = app().await;
    let product = create_product(&app, "FOL D3 TAB", 25).await;
    assert_eq!(product["current_stock"], 25);

    let (status, list) = send_json(&app, Method::GET, "/api/products?search=fol", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let id = product["id"].as_str().unwrap();
    let (status, batches) = send_json(&app, Method::GET, &format!("/api/products/{}/batches", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(batches[0]["batch"], "B101");
    assert_eq!(batches[0]["quantity"], 25);
}

#[tokio::test]
async fn test_missing_product_is_404() {
    let app = app().await;

    let (status, body) = send_json(&app, Method::GET, "/api/products/does-not-exist", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_invalid_product_is_400() {
    let app = app().await;
    let body = product_body("   ", 0);

    let (status, error) = send_json(&app, Method::POST, "/api/products", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_stock_sale_beyond_batch_is_422() {
    let app = app().await;
    let product = create_product(&app, "FOL D3 TAB", 10).await;

    let sale = json!({
        "product_id": product["id"],
        "batch": "B101",
        "quantity": 11,
        "unit_price": 16000,
        "date": "2026-10-01"
    });
    let (status, body) = send_json(&app, Method::POST, "/api/stock/sale", Some(sale)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    // Nothing moved
    let id = product["id"].as_str().unwrap();
    let (_, product) = send_json(&app, Method::GET, &format!("/api/products/{}", id), None).await;
    assert_eq!(product["current_stock"], 10);
}

#[tokio::test]
async fn test_sale_transaction_posts_finance_rows() {
    let app = app().await;
    let product = create_product(&app, "FOL D3 TAB", 50).await;

    let input = json!({
        "product_id": product["id"],
        "kind": "sale",
        "quantity": 5,
        "unit_price": 16000,
        "cnf_commission": 1000,
        "date": "2026-10-02"
    });
    let (status, transaction) = send_json(&app, Method::POST, "/api/transactions", Some(input)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(transaction["total_amount"], 81_000);
    assert_eq!(transaction["customer_name"], "Walk-in");

    let (_, page) = send_json(&app, Method::GET, "/api/finance", None).await;
    assert_eq!(page["total_count"], 2);

    let (_, summary) = send_json(&app, Method::GET, "/api/transactions/summary", None).await;
    assert_eq!(summary["total_sales"], 81_000);
    assert_eq!(summary["transaction_count"], 1);
}

#[tokio::test]
async fn test_customer_with_transactions_cannot_be_deleted() {
    let app = app().await;
    let product = create_product(&app, "VITA C", 20).await;
    let (status, customer) = send_json(
        &app,
        Method::POST,
        "/api/customers",
        Some(json!({ "name": "City Medicals", "customer_type": "retailer" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let input = json!({
        "customer_id": customer["id"],
        "product_id": product["id"],
        "kind": "sale",
        "quantity": 2,
        "unit_price": 5000,
        "date": "2026-10-03"
    });
    let (status, _) = send_json(&app, Method::POST, "/api/transactions", Some(input)).await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/customers/{}", customer["id"].as_str().unwrap());
    let (status, body) = send_json(&app, Method::DELETE, &uri, None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_stock_csv_download() {
    let app = app().await;
    create_product(&app, "FOL D3 TAB", 12).await;

    let request = Request::builder()
        .uri("/api/stock/export.csv")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "text/csv; charset=utf-8"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"stock-report-"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("Product Name,Batch No.,Available Quantity,Purchase Rate,Sale Rate,Stock Value,Supplier,Last Updated")
    );
    assert!(lines.next().unwrap().starts_with("FOL D3 TAB,B101,12,"));
}

#[tokio::test]
async fn test_emi_preview() {
    let app = app().await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/debts/emi-preview",
        Some(json!({ "loan_amount": 10_000_000, "interest_rate": 1200, "tenure_months": 12 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["monthly_emi"], 888_488);
    assert_eq!(body["total_payable"], 888_488 * 12);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/debts/emi-preview",
        Some(json!({ "loan_amount": 10_000_000, "interest_rate": 1200, "tenure_months": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "BUSINESS_LOGIC");
}

#[tokio::test]
async fn test_finance_snapshot_and_dashboard() {
    let app = app().await;
    let income = json!({
        "kind": "income",
        "source": "Walk-in",
        "category": "Sales",
        "amount": 50_000,
        "date": "2026-10-05"
    });
    let (status, _) = send_json(&app, Method::POST, "/api/finance", Some(income)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, snapshot) = send_json(&app, Method::POST, "/api/finance/snapshots", Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(snapshot["total_income"], 50_000);
    assert_eq!(snapshot["exported_by"], "Unknown");

    let (_, snapshots) = send_json(&app, Method::GET, "/api/finance/snapshots", None).await;
    assert_eq!(snapshots.as_array().unwrap().len(), 1);

    let (status, dashboard) = send_json(&app, Method::GET, "/api/reports/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["finance"]["total_income"], 50_000);
    // Only months with records appear
    assert_eq!(dashboard["monthly"].as_array().unwrap().len(), 1);
    assert_eq!(dashboard["monthly"][0]["month"], "2026-10");
}

#[tokio::test]
async fn test_transaction_sale_respects_batch_balances() {
    let app = app().await;
    let product = create_product(&app, "FOL D3 TAB", 0).await;
    let id = product["id"].as_str().unwrap().to_string();

    let purchase = json!({
        "product_id": id,
        "batch": "B202",
        "quantity": 50,
        "unit_price": 9000,
        "date": "2026-10-04"
    });
    let (status, _) = send_json(&app, Method::POST, "/api/stock/purchase", Some(purchase)).await;
    assert_eq!(status, StatusCode::CREATED);

    // The product's own batch B101 is empty
    let sale = json!({
        "product_id": id,
        "kind": "sale",
        "quantity": 30,
        "unit_price": 16000,
        "date": "2026-10-05"
    });
    let (status, body) = send_json(&app, Method::POST, "/api/transactions", Some(sale.clone())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    let mut from_b202 = sale;
    from_b202["batch"] = json!("B202");
    let (status, transaction) = send_json(&app, Method::POST, "/api/transactions", Some(from_b202)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(transaction["batch"], "B202");

    let (_, product) = send_json(&app, Method::GET, &format!("/api/products/{}", id), None).await;
    let (_, batches) = send_json(&app, Method::GET, &format!("/api/products/{}/batches", id), None).await;
    assert_eq!(product["current_stock"], 20);
    assert_eq!(batches.as_array().unwrap().len(), 1);
    assert_eq!(batches[0]["batch"], "B202");
    assert_eq!(batches[0]["quantity"], 20);

    let (_, bytes) = send(&app, Method::GET, "/api/stock/export.csv", None).await;
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.lines().nth(1).unwrap().starts_with("FOL D3 TAB,B202,20,"));
}

#[tokio::test]
async fn test_oversized_amounts_are_rejected() {
    let app = app().await;
    let product = create_product(&app, "FOL D3 TAB", 0).await;

    let purchase = json!({
        "product_id": product["id"],
        "batch": "B101",
        "quantity": 2,
        "unit_price": i64::MAX,
        "date": "2026-10-04"
    });
    let (status, body) = send_json(&app, Method::POST, "/api/stock/purchase", Some(purchase)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let sale = json!({
        "product_id": product["id"],
        "kind": "purchase",
        "quantity": 2,
        "unit_price": i64::MAX,
        "date": "2026-10-04"
    });
    let (status, body) = send_json(&app, Method::POST, "/api/transactions", Some(sale)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // Nothing was booked
    let (_, page) = send_json(&app, Method::GET, "/api/finance", None).await;
    assert_eq!(page["total_count"], 0);
}

#[tokio::test]
async fn test_expiry_window_is_bounded() {
    let app = app().await;
    create_product(&app, "FOL D3 TAB", 5).await;

    let (status, list) = send_json(&app, Method::GET, "/api/products/expiring?days=3650", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let uri = format!("/api/products/expiring?days={}", i64::MAX);
    let (status, body) = send_json(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send_json(&app, Method::GET, "/api/products/expiring?days=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_requests_answer_with_error_body() {
    let app = app().await;

    let (status, body) = send_json(&app, Method::POST, "/api/products", Some(json!({ "name": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("deserialize"));

    let (status, body) = send_json(&app, Method::GET, "/api/transactions?kind=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send_json(&app, Method::GET, "/api/products/expiring?days=soon", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // No content type at all
    let (status, body) = send_json(&app, Method::POST, "/api/customers", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_doctor_picklist() {
    let app = app().await;
    let agreement = json!({
        "doctor_name": "Dr. Mehta",
        "agreement_start": "2026-01-01",
        "agreement_end": "2026-12-31",
        "agreement_amount": 800_000,
        "paid_amount": 150_000,
        "status": "active",
        "payment_frequency": "quarterly"
    });
    let (status, _) = send_json(&app, Method::POST, "/api/marketing", Some(agreement)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, doctors) = send_json(&app, Method::GET, "/api/marketing/doctors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doctors, json!(["Dr. Mehta"]));
}
