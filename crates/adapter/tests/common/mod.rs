#![allow(dead_code)]

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use unrelated_order_adapter::{AppState, app};
use unrelated_order_tools::client::{ClientSettings, WooClient};
use unrelated_order_tools::tenants::TenantRegistry;
use unrelated_order_tools::tool::OrderDetailsTool;
use unrelated_test_support::{TestServer, spawn_router};

pub const ORDER_ID: u64 = 266_600;
pub const ORDER_EMAIL: &str = "Test@Example.com";
pub const TENANT_KEY: &str = "ck_test_key";
pub const TENANT_SECRET: &str = "cs_test_secret";
/// Order id whose upstream lookup fails with a 500.
pub const BROKEN_ID: u64 = 500;
/// Order id whose upstream lookup never answers in time.
pub const SLOW_ID: u64 = 777;

pub fn sample_order() -> Value {
    json!({
        "id": ORDER_ID,
        "number": "266600",
        "status": "processing",
        "currency": "EUR",
        "date_created": "2024-05-01T10:00:00",
        "date_paid": "2024-05-01T10:05:00",
        "total": "59.90",
        "subtotal": "55.00",
        "shipping_total": "4.90",
        "discount_total": "0.00",
        "total_tax": "0.00",
        "billing": {
            "first_name": "Jane",
            "last_name": "Doe",
            "address_1": "Main Street 1",
            "city": "Vilnius",
            "postcode": "01100",
            "country": "LT",
            "email": ORDER_EMAIL,
            "phone": "+37060000000"
        },
        "shipping": {
            "first_name": "Jane",
            "last_name": "Doe",
            "address_1": "Main Street 1",
            "city": "Vilnius",
            "country": "LT"
        },
        "line_items": [
            { "id": 1, "name": "Mug", "sku": "MUG-1", "quantity": 2, "subtotal": "55.00", "total": "55.00", "total_tax": "0.00" }
        ],
        "shipping_lines": [
            { "method_id": "flat_rate", "method_title": "Courier", "total": "4.90", "total_tax": "0.00" }
        ],
        "meta_data": [
            {
                "id": 9,
                "key": "_wc_shipment_tracking_items",
                "value": [
                    { "tracking_number": "LT123", "tracking_provider": "dpd", "date_shipped": "1714557600" }
                ]
            }
        ]
    })
}

/// Requests seen by the fake upstream, as `path?query`.
#[derive(Clone, Default)]
pub struct Hits(Arc<Mutex<Vec<String>>>);

impl Hits {
    fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

fn record(hits: &Hits, path: &str, query: &HashMap<String, String>) {
    let mut pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    hits.push(format!("{path}?{}", pairs.join("&")));
}

/// Minimal WooCommerce REST stand-in.
pub fn fake_store(hits: Hits) -> Router {
    let by_id = {
        let hits = hits.clone();
        move |Path(id): Path<u64>, Query(q): Query<HashMap<String, String>>| {
            let hits = hits.clone();
            async move {
                record(&hits, &format!("/orders/{id}"), &q);
                let resp: Response = match id {
                    ORDER_ID => Json(sample_order()).into_response(),
                    BROKEN_ID => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "code": "internal_server_error" })),
                    )
                        .into_response(),
                    SLOW_ID => {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        Json(sample_order()).into_response()
                    }
                    _ => (
                        StatusCode::NOT_FOUND,
                        Json(json!({ "code": "woocommerce_rest_shop_order_invalid_id" })),
                    )
                        .into_response(),
                };
                resp
            }
        }
    };

    let list = move |Query(q): Query<HashMap<String, String>>| {
        let hits = hits.clone();
        async move {
            record(&hits, "/orders", &q);
            let mut by_number = sample_order();
            by_number["id"] = json!(31);
            by_number["number"] = json!("INV-77");
            match q.get("search").map(String::as_str) {
                Some("INV-77") => Json(json!([by_number])),
                _ => Json(json!([])),
            }
        }
    };

    Router::new()
        .route("/wp-json/wc/v3/orders", get(list))
        .route("/wp-json/wc/v3/orders/{id}", get(by_id))
}

pub struct Harness {
    pub upstream: TestServer,
    pub adapter: TestServer,
    pub hits: Hits,
    pub http: reqwest::Client,
}

impl Harness {
    pub fn url(&self, path: &str) -> String {
        self.adapter.url(path)
    }
}

/// Fake store plus an in-process adapter wired to it as tenant `demo`.
pub async fn start() -> anyhow::Result<Harness> {
    let hits = Hits::default();
    let upstream = spawn_router(fake_store(hits.clone())).await?;

    let registry = TenantRegistry::from_vars([
        ("WOO_DEMO_URL", upstream.base_url.as_str()),
        ("WOO_DEMO_KEY", TENANT_KEY),
        ("WOO_DEMO_SECRET", TENANT_SECRET),
        ("WOO_HALF_URL", "http://half.invalid"),
    ]);
    let client = WooClient::new(ClientSettings {
        timeout: Duration::from_secs(1),
        ..ClientSettings::default()
    })?;
    let tool = OrderDetailsTool::new(Arc::new(registry), Arc::new(client));
    let adapter = spawn_router(app(AppState::new(tool))).await?;

    Ok(Harness {
        upstream,
        adapter,
        hits,
        http: reqwest::Client::new(),
    })
}

pub fn call_args(order_ref: &str, email: &str) -> Value {
    json!({ "tenant": "demo", "orderRef": order_ref, "email": email })
}
