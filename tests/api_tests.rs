use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use order_book_engine::{
    api::{OrderAck, router},
    config,
    engine::MatchingEngine,
    facade::Facade,
    journal::InMemoryJournal,
    state::AppState,
};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

const CONTRACT: &str = "UK-BL-MAR-25";

fn test_app() -> Router {
    let contracts = config::contract_universe();
    let engine = MatchingEngine::new(&contracts, Arc::new(InMemoryJournal::new()));
    let state = AppState::new(Facade::new(engine));
    router(state)
}

async fn body_json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// `price`/`quantity` are passed as decimal strings, matching the wire
/// surface's own convention (spec §6) and avoiding binary-float round-trip
/// noise when the server parses them back into `Decimal`.
fn new_order_body(side: &str, order_type: &str, price: Option<&str>, quantity: &str) -> Value {
    json!({
        "contract_id": CONTRACT,
        "trader_id": Uuid::new_v4(),
        "side": side,
        "order_type": order_type,
        "price": price,
        "quantity": quantity,
    })
}

async fn post_order(app: &Router, body: Value) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

// Scenario 1 of spec §8: limit buy on an empty book rests untouched.
#[tokio::test]
async fn limit_buy_on_empty_book_rests_and_is_listed() {
    let app = test_app();

    let res = post_order(&app, new_order_body("buy", "limit", Some("100.0"), "10.0")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let ack: OrderAck = serde_json::from_value(body_json(res).await).unwrap();
    assert!(ack.trades.is_empty());
    assert_eq!(ack.order.status, order_book_engine::orders::OrderStatus::Open);

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{CONTRACT}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let orders = body_json(res).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

// Scenario 2: an exact-price cross produces one trade and empties the book.
#[tokio::test]
async fn exact_cross_produces_a_trade() {
    let app = test_app();

    post_order(&app, new_order_body("buy", "limit", Some("100.0"), "10.0")).await;
    let res = post_order(&app, new_order_body("sell", "limit", Some("100.0"), "10.0")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let ack: OrderAck = serde_json::from_value(body_json(res).await).unwrap();
    assert_eq!(ack.trades.len(), 1);
    assert_eq!(ack.trades[0].price, dec!(100.0));

    let res = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{CONTRACT}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let orders = body_json(res).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_contract_is_rejected_with_400() {
    let app = test_app();
    let body = json!({
        "contract_id": "NOPE",
        "trader_id": Uuid::new_v4(),
        "side": "buy",
        "order_type": "limit",
        "price": 10.0,
        "quantity": 1.0,
    });
    let res = post_order(&app, body).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let v = body_json(res).await;
    assert!(v["error"].as_str().unwrap().contains("unknown contract"));
}

#[tokio::test]
async fn zero_quantity_is_rejected_with_400() {
    let app = test_app();
    let res = post_order(&app, new_order_body("buy", "limit", Some("100.0"), "0.0")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let v = body_json(res).await;
    assert!(v["error"].as_str().unwrap().contains("invalid order"));
}

#[tokio::test]
async fn limit_order_missing_price_is_rejected_with_400() {
    let app = test_app();
    let res = post_order(&app, new_order_body("buy", "limit", None, "1.0")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_body_yields_422() {
    let app = test_app();
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn cancel_removes_resting_order_then_404s() {
    let app = test_app();
    let res = post_order(&app, new_order_body("buy", "limit", Some("48.0"), "10.0")).await;
    let ack: OrderAck = serde_json::from_value(body_json(res).await).unwrap();
    let order_id = ack.order.id;

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/orders/{CONTRACT}/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/orders/{CONTRACT}/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn market_order_residual_is_cancelled_not_rested() {
    let app = test_app();
    post_order(&app, new_order_body("sell", "limit", Some("100.0"), "5.0")).await;

    let res = post_order(&app, new_order_body("buy", "market", None, "10.0")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let ack: OrderAck = serde_json::from_value(body_json(res).await).unwrap();
    assert_eq!(ack.trades.len(), 1);
    assert_eq!(ack.trades[0].quantity, dec!(5.0));
    assert_eq!(ack.order.status, order_book_engine::orders::OrderStatus::Cancelled);
    assert_eq!(ack.order.remaining_quantity, dec!(5.0));
}

#[tokio::test]
async fn list_orders_filters_by_side_and_status() {
    let app = test_app();
    post_order(&app, new_order_body("buy", "limit", Some("99.0"), "1.0")).await;
    post_order(&app, new_order_body("sell", "limit", Some("101.0"), "1.0")).await;

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{CONTRACT}?side=buy"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let orders = body_json(res).await;
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["side"], "buy");

    let res = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{CONTRACT}?status=filled"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let orders = body_json(res).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn list_orders_rejects_inverted_time_window() {
    let app = test_app();
    let res = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/orders/{CONTRACT}?placed_at_or_after=2030-01-01T00:00:00Z&placed_before=2020-01-01T00:00:00Z"
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_orders_rejects_unknown_sort_field() {
    let app = test_app();
    let res = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{CONTRACT}?sort_by=price"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_orders_sorts_by_placed_at_descending() {
    let app = test_app();
    post_order(&app, new_order_body("buy", "limit", Some("90.0"), "1.0")).await;
    post_order(&app, new_order_body("buy", "limit", Some("91.0"), "1.0")).await;

    let res = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{CONTRACT}?sort_by=placed_at&sort_order=desc"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let orders = body_json(res).await;
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    let first = orders[0]["placed_at"].as_str().unwrap();
    let second = orders[1]["placed_at"].as_str().unwrap();
    assert!(first >= second);
}

#[tokio::test]
async fn list_trades_filters_by_buy_or_sell_order_id() {
    let app = test_app();
    let res = post_order(&app, new_order_body("sell", "limit", Some("100.0"), "5.0")).await;
    let ack: OrderAck = serde_json::from_value(body_json(res).await).unwrap();
    let sell_order_id = ack.order.id;
    let res = post_order(&app, new_order_body("buy", "limit", Some("100.0"), "5.0")).await;
    let ack: OrderAck = serde_json::from_value(body_json(res).await).unwrap();
    let buy_order_id = ack.order.id;

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/trades/{CONTRACT}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let trades = body_json(res).await;
    assert_eq!(trades.as_array().unwrap().len(), 1);

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/trades/{CONTRACT}?buy_order_id={buy_order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let trades = body_json(res).await;
    assert_eq!(trades.as_array().unwrap().len(), 1);

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/trades/{CONTRACT}?sell_order_id={sell_order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let trades = body_json(res).await;
    assert_eq!(trades.as_array().unwrap().len(), 1);

    // buy_order_id filters only on the buy side: the sell order's id does
    // not match it, even though both sides share the same trade.
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/trades/{CONTRACT}?buy_order_id={sell_order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let trades = body_json(res).await;
    assert!(trades.as_array().unwrap().is_empty());

    let res = app
        .oneshot(
            Request::builder()
                .uri(format!("/trades/{CONTRACT}?buy_order_id={}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let trades = body_json(res).await;
    assert!(trades.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn list_contracts_returns_the_static_universe() {
    let app = test_app();
    let res = app
        .oneshot(Request::builder().uri("/contracts").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let contracts = body_json(res).await;
    let contracts = contracts.as_array().unwrap();
    assert!(contracts.iter().any(|c| c.as_str() == Some(CONTRACT)));
}

#[tokio::test]
async fn cancel_of_unknown_order_is_404() {
    let app = test_app();
    let res = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/orders/{CONTRACT}/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
