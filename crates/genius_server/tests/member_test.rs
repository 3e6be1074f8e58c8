mod common;

use axum::body::Body;
use axum::http::header::LOCATION;
use axum::http::{Method, Request, StatusCode};
use chrono::{DateTime, Duration, Utc};
use common::{TestHelper, SUCCESS_URL};
use serde_json::{json, Value};

fn expiry(body: &Value) -> DateTime<Utc> {
    serde_json::from_value(body["data"]["expiry_time"].clone()).unwrap()
}

async fn order_status(helper: &TestHelper, token: &str, order_id: &str) -> String {
    let (_, body) = helper.get("/api/v1/member/orders", Some(token)).await;
    body["data"]["orders"]
        .as_array()
        .unwrap()
        .iter()
        .find(|order| order["id"] == order_id)
        .and_then(|order| order["status"].as_str())
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_member_cards() {
    let helper = TestHelper::new().await;

    let (status, body) = helper.get("/api/v1/member/cards", None).await;
    assert_eq!(status, StatusCode::OK);

    let cards = body["data"]["cards"].as_array().unwrap();
    assert_eq!(cards.len(), 5);

    let day = cards.iter().find(|card| card["duration_days"] == 1).unwrap();
    assert_eq!(day["price"], 998);
}

#[tokio::test]
async fn test_daily_quota() {
    let helper = TestHelper::new().await;
    let (_, alice) = helper.register("alice").await;

    let (_, body) = helper.get("/api/v1/member/info", Some(&alice)).await;
    assert_eq!(body["data"]["is_member"], false);
    assert_eq!(body["data"]["daily_free_uses"], 1);
    assert_eq!(body["data"]["remaining_today"], 1);

    let (status, body) = helper.get("/api/v1/member/check", Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["allowed"], true);
    assert_eq!(body["data"]["remaining_today"], 0);

    let (status, body) = helper.get("/api/v1/member/check", Some(&alice)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 403);
    assert_eq!(body["data"]["allowed"], false);

    // reading the status does not spend anything
    let (_, body) = helper.get("/api/v1/member/info", Some(&alice)).await;
    assert_eq!(body["data"]["remaining_today"], 0);
}

#[tokio::test]
async fn test_orders() {
    let helper = TestHelper::new().await;
    let (_, alice) = helper.register("alice").await;
    let (_, bob) = helper.register("bob").await;
    let week = helper.card_id(7).await;

    let (status, body) = helper
        .post("/api/v1/member/order", Some(&alice), json!({"card_id": week}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "created");
    assert_eq!(body["data"]["amount"], 2998);
    let first = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = helper
        .post("/api/v1/member/order", Some(&alice), json!({"card_id": 9999}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = helper
        .post("/api/v1/member/order", Some(&alice), json!({"card_id": 0}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = helper.get("/api/v1/member/orders", Some(&alice)).await;
    assert_eq!(body["data"]["orders"].as_array().unwrap().len(), 1);

    let (_, body) = helper.get("/api/v1/member/orders", Some(&bob)).await;
    assert!(body["data"]["orders"].as_array().unwrap().is_empty());

    // only the owner sees the order
    let cancel = format!("/api/v1/member/order/{}/cancel", first);
    let (status, _) = helper.post(&cancel, Some(&bob), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = helper.post(&cancel, Some(&alice), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");

    let (status, _) = helper.post(&cancel, Some(&alice), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // a cancelled order cannot be settled
    let (status, _) = helper
        .post(
            &format!("/api/v1/member/order/{}/pay", first),
            Some(&helper.admin_token),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_manual_settlement() {
    let helper = TestHelper::new().await;
    let (_, alice) = helper.register("alice").await;
    let week = helper.card_id(7).await;

    let (_, body) = helper
        .post("/api/v1/member/order", Some(&alice), json!({"card_id": week}))
        .await;
    let order_id = body["data"]["id"].as_str().unwrap().to_string();
    let pay = format!("/api/v1/member/order/{}/pay", order_id);

    // regular users cannot settle their own orders
    let (status, _) = helper.post(&pay, Some(&alice), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = helper.post(&pay, Some(&helper.admin_token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["already_paid"], false);

    let (status, body) = helper.post(&pay, Some(&helper.admin_token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["already_paid"], true);

    let (_, body) = helper.get("/api/v1/member/info", Some(&alice)).await;
    assert_eq!(body["data"]["is_member"], true);
    let remaining = expiry(&body) - Utc::now();
    assert!(remaining > Duration::days(6) && remaining <= Duration::days(7));

    // members are never counted
    for _ in 0..3 {
        let (status, body) = helper.get("/api/v1/member/check", Some(&alice)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["is_member"], true);
    }

    let (status, _) = helper
        .post(
            "/api/v1/member/order/00000000-0000-4000-8000-000000000000/pay",
            Some(&helper.admin_token),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_payment_notification() {
    let helper = TestHelper::new().await;
    let (_, alice) = helper.register("alice").await;
    let week = helper.card_id(7).await;

    let (status, body) = helper
        .post("/api/v1/payment/create", Some(&alice), json!({"card_id": week}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let order_id = body["data"]["order_id"].as_str().unwrap().to_string();
    let pay_url = body["data"]["pay_url"].as_str().unwrap();
    assert!(pay_url.starts_with("https://openapi-sandbox.dl.alipaydev.com/gateway.do?"));
    assert!(pay_url.contains("sign="));

    let paid = helper.signed_params(&[
        ("out_trade_no", order_id.as_str()),
        ("trade_no", "2025030122001"),
        ("trade_status", "TRADE_SUCCESS"),
        ("total_amount", "29.98"),
    ]);

    // tampered after signing
    let mut tampered = paid.clone();
    tampered.insert("total_amount".to_string(), "0.01".to_string());
    let response = helper.notify(&tampered).await;
    assert_eq!(response.text, "fail");

    // correctly signed but for the wrong amount
    let wrong_amount = helper.signed_params(&[
        ("out_trade_no", order_id.as_str()),
        ("trade_status", "TRADE_SUCCESS"),
        ("total_amount", "0.01"),
    ]);
    let response = helper.notify(&wrong_amount).await;
    assert_eq!(response.text, "fail");
    assert_eq!(order_status(&helper, &alice, &order_id).await, "created");

    let response = helper.notify(&paid).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text, "success");
    assert_eq!(order_status(&helper, &alice, &order_id).await, "paid");

    let (_, body) = helper.get("/api/v1/member/info", Some(&alice)).await;
    assert_eq!(body["data"]["is_member"], true);
    let first_expiry = expiry(&body);

    // redelivery does not extend the membership again
    let response = helper.notify(&paid).await;
    assert_eq!(response.text, "success");
    let (_, body) = helper.get("/api/v1/member/info", Some(&alice)).await;
    assert_eq!(expiry(&body), first_expiry);

    // a second card stacks on top of the first
    let (_, body) = helper
        .post("/api/v1/payment/create", Some(&alice), json!({"card_id": week}))
        .await;
    let second = body["data"]["order_id"].as_str().unwrap().to_string();
    let response = helper
        .notify(&helper.signed_params(&[
            ("out_trade_no", second.as_str()),
            ("trade_status", "TRADE_FINISHED"),
            ("total_amount", "29.98"),
        ]))
        .await;
    assert_eq!(response.text, "success");

    let (_, body) = helper.get("/api/v1/member/info", Some(&alice)).await;
    assert_eq!(expiry(&body), first_expiry + Duration::days(7));
}

#[tokio::test]
async fn test_payment_closed_and_unknown_orders() {
    let helper = TestHelper::new().await;
    let (_, alice) = helper.register("alice").await;
    let day = helper.card_id(1).await;

    let (_, body) = helper
        .post("/api/v1/payment/create", Some(&alice), json!({"card_id": day}))
        .await;
    let order_id = body["data"]["order_id"].as_str().unwrap().to_string();

    let waiting = helper.signed_params(&[
        ("out_trade_no", order_id.as_str()),
        ("trade_status", "WAIT_BUYER_PAY"),
    ]);
    assert_eq!(helper.notify(&waiting).await.text, "success");
    assert_eq!(order_status(&helper, &alice, &order_id).await, "created");

    let closed = helper.signed_params(&[
        ("out_trade_no", order_id.as_str()),
        ("trade_status", "TRADE_CLOSED"),
    ]);
    assert_eq!(helper.notify(&closed).await.text, "success");
    assert_eq!(order_status(&helper, &alice, &order_id).await, "failed");

    let unknown = helper.signed_params(&[
        ("out_trade_no", "no-such-order"),
        ("trade_status", "TRADE_SUCCESS"),
        ("total_amount", "9.98"),
    ]);
    assert_eq!(helper.notify(&unknown).await.text, "fail");

    let mut unsigned = unknown;
    unsigned.remove("sign");
    assert_eq!(helper.notify(&unsigned).await.text, "fail");
}

#[tokio::test]
async fn test_payment_return_redirects() {
    let helper = TestHelper::new().await;
    let (_, alice) = helper.register("alice").await;
    let month = helper.card_id(30).await;

    let (_, body) = helper
        .post("/api/v1/payment/create", Some(&alice), json!({"card_id": month}))
        .await;
    let order_id = body["data"]["order_id"].as_str().unwrap().to_string();

    let params = helper.signed_params(&[
        ("out_trade_no", order_id.as_str()),
        ("trade_no", "2025030122002"),
        ("total_amount", "89.98"),
    ]);
    let request = Request::builder()
        .method(Method::GET)
        .uri(format!(
            "/api/v1/payment/return?{}",
            serde_urlencoded::to_string(&params).unwrap()
        ))
        .body(Body::empty())
        .unwrap();

    let response = helper.send(request).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.headers[LOCATION], SUCCESS_URL);
    assert_eq!(order_status(&helper, &alice, &order_id).await, "paid");

    let mut forged = params;
    forged.insert("total_amount".to_string(), "0.01".to_string());
    let request = Request::builder()
        .uri(format!(
            "/api/v1/payment/return?{}",
            serde_urlencoded::to_string(&forged).unwrap()
        ))
        .body(Body::empty())
        .unwrap();
    assert_eq!(helper.send(request).await.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_payment_unconfigured() {
    let helper = TestHelper::without_payment().await;
    let (_, alice) = helper.register("alice").await;
    let week = helper.card_id(7).await;

    let (status, body) = helper
        .post("/api/v1/payment/create", Some(&alice), json!({"card_id": week}))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], 503);

    let params = helper.signed_params(&[("out_trade_no", "x"), ("trade_status", "TRADE_SUCCESS")]);
    let response = helper.notify(&params).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.text, "fail");
}
