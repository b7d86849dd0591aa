mod common;

use common::{BROKEN_ID, ORDER_ID, SLOW_ID, TENANT_SECRET, call_args, start};
use reqwest::StatusCode;
use serde_json::{Value, json};

fn allow_origin(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get("access-control-allow-origin")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[tokio::test]
async fn discovery_endpoints_advertise_the_tool() -> anyhow::Result<()> {
    let h = start().await?;

    for path in ["/.well-known/mcp", "/mcp/discovery", "/mcp", "/mcp?m=discovery"] {
        let resp = h.http.get(h.url(path)).send().await?;
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
        let body: Value = resp.json().await?;
        assert_eq!(body["mcp_version"], json!("1.0"), "{path}");
        assert_eq!(body["tools"][0]["name"], json!("getOrderDetails"));
        assert_eq!(
            body["tools"][0]["input_schema"]["properties"]["tenant"]["enum"],
            json!(["demo"])
        );
    }

    let body: Value = h
        .http
        .post(h.url("/mcp/list_tools"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["tools"].as_array().map(Vec::len), Some(1));
    assert!(body.get("mcp_version").is_none());

    let body: Value = h
        .http
        .get(h.url("/mcp"))
        .header("openai-mcp-action", "list_tools")
        .send()
        .await?
        .json()
        .await?;
    assert!(body.get("mcp_version").is_none());
    assert_eq!(body["tools"][0]["name"], json!("getOrderDetails"));
    Ok(())
}

#[tokio::test]
async fn tool_call_returns_masked_normalized_order() -> anyhow::Result<()> {
    let h = start().await?;

    let resp = h
        .http
        .post(h.url("/mcp/tool.call"))
        .json(&json!({
            "name": "getOrderDetails",
            "arguments": call_args("266600", "test@example.com"),
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(allow_origin(&resp).as_deref(), Some("*"));

    let body: Value = resp.json().await?;
    let order = &body["result"];
    assert_eq!(order["ok"], json!(true));
    assert_eq!(order["id"], json!(ORDER_ID));
    assert_eq!(order["number"], json!("266600"));
    assert_eq!(order["totals"]["items_total"], json!("55.00"));
    assert_eq!(order["totals"]["shipping"], json!("4.90"));
    assert_eq!(order["items"][0]["qty"], json!(2));
    assert_eq!(order["tracking"][0]["tracking_number"], json!("LT123"));
    assert_eq!(order["eta"], Value::Null);

    let text = body.to_string();
    assert!(!text.contains("Test@Example.com"));
    assert!(!text.contains("+37060000000"));
    assert!(!text.contains(TENANT_SECRET));

    let hits = h.hits.all();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].starts_with("/orders/266600?"));
    assert!(hits[0].contains("consumer_key=ck_test_key"));
    Ok(())
}

#[tokio::test]
async fn query_routed_call_and_legacy_name_match_rest_call() -> anyhow::Result<()> {
    let h = start().await?;
    let request = json!({
        "name": "get_order_details",
        "arguments": { "tenant": "demo", "orderId": 266600, "email": "TEST@example.com" },
    });

    let via_query: Value = h
        .http
        .post(h.url("/mcp?m=tool.call"))
        .json(&request)
        .send()
        .await?
        .json()
        .await?;
    let via_header: Value = h
        .http
        .post(h.url("/mcp"))
        .header("x-mcp-action", "tool.call")
        .json(&request)
        .send()
        .await?
        .json()
        .await?;
    let via_rest: Value = h
        .http
        .post(h.url("/mcp/tool.call"))
        .json(&request)
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(via_query["result"]["number"], json!("266600"));
    assert_eq!(via_query, via_header);
    assert_eq!(via_query, via_rest);
    Ok(())
}

#[tokio::test]
async fn business_outcomes_are_successful_responses() -> anyhow::Result<()> {
    let h = start().await?;

    let resp = h
        .http
        .post(h.url("/mcp/tool.call"))
        .json(&json!({ "name": "getOrderDetails", "arguments": call_args("266600", "someone@else.com") }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body, json!({ "result": { "ok": false, "reason": "email_mismatch" } }));

    let resp = h
        .http
        .post(h.url("/mcp/tool.call"))
        .json(&json!({ "name": "getOrderDetails", "arguments": call_args("404404", "a@b.c") }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body, json!({ "result": { "ok": false, "reason": "order_not_found" } }));

    // Direct id miss, then search, then recent orders.
    let hits = h.hits.all();
    assert!(hits[1].starts_with("/orders/404404?"));
    assert!(hits[2].contains("search=404404"));
    assert!(hits[2].contains("per_page=20"));
    assert!(hits[3].contains("orderby=date"));
    assert!(hits[3].contains("per_page=30"));
    Ok(())
}

#[tokio::test]
async fn order_number_resolves_through_search() -> anyhow::Result<()> {
    let h = start().await?;
    let body: Value = h
        .http
        .post(h.url("/mcp/tool.call"))
        .json(&json!({ "name": "getOrderDetails", "arguments": call_args("INV-77", "test@example.com") }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["result"]["id"], json!(31));
    assert_eq!(body["result"]["number"], json!("INV-77"));
    assert!(h.hits.all()[0].contains("search=INV-77"));
    Ok(())
}

#[tokio::test]
async fn caller_errors_are_rejected_before_upstream() -> anyhow::Result<()> {
    let h = start().await?;

    let cases = [
        (
            json!({ "name": "getOrderDetails", "arguments": { "tenant": "nope", "orderRef": "1", "email": "a@b.c" } }),
            "unknown_tenant",
        ),
        (
            json!({ "name": "getOrderDetails", "arguments": { "tenant": "half", "orderRef": "1", "email": "a@b.c" } }),
            "bad_tenant_config",
        ),
        (
            json!({ "name": "getOrderDetails", "arguments": { "tenant": "demo" } }),
            "missing_arguments",
        ),
        (
            json!({ "name": "getOrderDetails", "arguments": { "tenant": "demo", "orderRef": "1", "email": "nope" } }),
            "invalid_arguments",
        ),
        (json!({ "name": "deleteOrder", "arguments": {} }), "unknown_tool"),
    ];

    for (request, code) in cases {
        let resp = h.http.post(h.url("/mcp/tool.call")).json(&request).send().await?;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{code}");
        let body: Value = resp.json().await?;
        assert_eq!(body["error"], json!(code));
        if code == "unknown_tenant" {
            assert_eq!(body["tenants"], json!(["demo"]));
        }
    }

    let resp = h
        .http
        .post(h.url("/mcp/tool.call"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(allow_origin(&resp).as_deref(), Some("*"));
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], json!("invalid_json"));

    assert!(h.hits.all().is_empty());
    Ok(())
}

#[tokio::test]
async fn upstream_failures_map_to_gateway_errors() -> anyhow::Result<()> {
    let h = start().await?;

    let resp = h
        .http
        .post(h.url("/mcp/tool.call"))
        .json(&json!({ "name": "getOrderDetails", "arguments": call_args(&BROKEN_ID.to_string(), "a@b.c") }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(allow_origin(&resp).as_deref(), Some("*"));
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], json!("upstream_error"));
    assert_eq!(body["status"], json!(500));
    assert!(!body.to_string().contains(TENANT_SECRET));

    let resp = h
        .http
        .post(h.url("/mcp/tool.call"))
        .json(&json!({ "name": "getOrderDetails", "arguments": call_args(&SLOW_ID.to_string(), "a@b.c") }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], json!("upstream_timeout"));
    Ok(())
}

#[tokio::test]
async fn routing_errors_and_preflight() -> anyhow::Result<()> {
    let h = start().await?;

    let resp = h.http.get(h.url("/nowhere")).send().await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(allow_origin(&resp).as_deref(), Some("*"));
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], json!("no_route"));

    let resp = h.http.get(h.url("/mcp?m=delete")).send().await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = h.http.get(h.url("/mcp/tool.call")).send().await?;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(allow_origin(&resp).as_deref(), Some("*"));
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], json!("method_not_allowed"));

    let resp = h.http.get(h.url("/mcp?m=tool.call")).send().await?;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    for path in ["/mcp/tool.call", "/mcp", "/anything"] {
        let resp = h
            .http
            .request(reqwest::Method::OPTIONS, h.url(path))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT, "{path}");
        let allow_headers = resp
            .headers()
            .get("access-control-allow-headers")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(allow_headers.contains("openai-mcp-action"));
        assert_eq!(allow_origin(&resp).as_deref(), Some("*"));
        assert!(resp.text().await?.is_empty());
    }

    // Browser-style preflight.
    let resp = h
        .http
        .request(reqwest::Method::OPTIONS, h.url("/mcp/rpc"))
        .header("origin", "https://chat.example")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type, x-mcp-action")
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(allow_origin(&resp).as_deref(), Some("*"));
    let allow_methods = resp
        .headers()
        .get("access-control-allow-methods")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(allow_methods.contains("POST"));

    let body: Value = h.http.get(h.url("/health")).send().await?.json().await?;
    assert_eq!(body, json!({ "status": "ok", "tenants": 1 }));
    Ok(())
}
