//! HTTP facade (spec §6), axum-based. Kept the teacher's `LoggedJson`
//! extractor (logs the request body on deserialization failure) and its
//! `TraceLayer` setup; dropped the whole WebSocket surface — consumers poll
//! the book instead of subscribing to a push feed (spec §1 Non-goals).

use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequest, Path, Query, Request, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::warn;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::filter::{OrderFilter, TradeFilter};
use crate::orders::{Order, OrderStatus, OrderType, Side};
use crate::state::AppState;
use crate::trade::Trade;

type ApiErr = (StatusCode, Json<serde_json::Value>);

fn err(status: StatusCode, msg: impl Into<String>) -> ApiErr {
    (status, Json(json!({ "error": msg.into() })))
}

fn engine_err(e: EngineError) -> ApiErr {
    let status = match &e {
        EngineError::UnknownContract(_) => StatusCode::BAD_REQUEST,
        EngineError::InvalidOrder(_) => StatusCode::BAD_REQUEST,
        EngineError::InvalidFilter(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound => StatusCode::NOT_FOUND,
        EngineError::JournalUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    err(status, e.to_string())
}

pub struct LoggedJson<T>(pub T);

impl<S, T> FromRequest<S> for LoggedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiErr;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let method = req.method().clone();
        let uri = req.uri().clone();
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| err(StatusCode::BAD_REQUEST, e.to_string()))?;

        match serde_json::from_slice::<T>(&bytes) {
            Ok(val) => Ok(LoggedJson(val)),
            Err(e) => {
                let preview = String::from_utf8_lossy(&bytes);
                let preview = &preview[..preview.len().min(4096)];
                warn!(
                    error = %e,
                    %method,
                    uri = %uri,
                    body_preview = %preview,
                    "order rejected: JSON deserialization failed"
                );
                Err(err(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
            }
        }
    }
}

/// Request payload for `POST /orders`.
#[derive(Deserialize)]
pub struct NewOrder {
    pub contract_id: String,
    pub trader_id: Uuid,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Option<rust_decimal::Decimal>,
    pub quantity: rust_decimal::Decimal,
}

/// Response for `POST /orders`.
#[derive(Serialize)]
pub struct OrderAck {
    pub order: Order,
    pub trades: Vec<Trade>,
}

#[derive(Deserialize, Default)]
pub struct OrderQuery {
    pub trader_id: Option<Uuid>,
    pub side: Option<Side>,
    #[serde(rename = "type")]
    pub order_type: Option<OrderType>,
    pub status: Option<OrderStatus>,
    pub price: Option<rust_decimal::Decimal>,
    pub quantity: Option<rust_decimal::Decimal>,
    pub placed_at_or_after: Option<chrono::DateTime<chrono::Utc>>,
    pub placed_before: Option<chrono::DateTime<chrono::Utc>>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl From<OrderQuery> for OrderFilter {
    fn from(q: OrderQuery) -> Self {
        OrderFilter {
            trader_id: q.trader_id,
            side: q.side,
            order_type: q.order_type,
            status: q.status,
            price: q.price,
            quantity: q.quantity,
            placed_at_or_after: q.placed_at_or_after,
            placed_before: q.placed_before,
        }
    }
}

#[derive(Deserialize, Default)]
pub struct TradeQuery {
    pub buy_order_id: Option<Uuid>,
    pub sell_order_id: Option<Uuid>,
    pub min_price: Option<rust_decimal::Decimal>,
    pub max_price: Option<rust_decimal::Decimal>,
    pub generated_at_or_after: Option<chrono::DateTime<chrono::Utc>>,
    pub generated_before: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<TradeQuery> for TradeFilter {
    fn from(q: TradeQuery) -> Self {
        TradeFilter {
            buy_order_id: q.buy_order_id,
            sell_order_id: q.sell_order_id,
            min_price: q.min_price,
            max_price: q.max_price,
            generated_at_or_after: q.generated_at_or_after,
            generated_before: q.generated_before,
        }
    }
}

/// `POST /orders`
pub async fn create_order(
    State(state): State<AppState>,
    LoggedJson(payload): LoggedJson<NewOrder>,
) -> Result<Json<OrderAck>, ApiErr> {
    let (order, trades) = state
        .facade
        .place_order(
            payload.contract_id,
            payload.trader_id,
            payload.side,
            payload.order_type,
            payload.price,
            payload.quantity,
        )
        .await
        .map_err(engine_err)?;
    Ok(Json(OrderAck { order, trades }))
}

/// `DELETE /orders/{contract_id}/{order_id}`
pub async fn cancel_order(
    State(state): State<AppState>,
    Path((contract_id, order_id)): Path<(String, Uuid)>,
) -> Result<Json<Order>, ApiErr> {
    let order = state
        .facade
        .cancel_order(&contract_id, order_id)
        .await
        .map_err(engine_err)?;
    Ok(Json(order))
}

/// `GET /orders/{contract_id}`
pub async fn list_orders(
    State(state): State<AppState>,
    Path(contract_id): Path<String>,
    Query(q): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>, ApiErr> {
    let sort_by = q.sort_by.clone();
    let sort_order = q.sort_order;
    if let Some(field) = &sort_by {
        if field != "placed_at" {
            return Err(engine_err(EngineError::InvalidFilter(format!(
                "unknown sort field: {field}"
            ))));
        }
    }

    let filter: OrderFilter = q.into();
    let mut orders = state
        .facade
        .list_orders(&contract_id, &filter)
        .await
        .map_err(engine_err)?;

    if sort_by.is_some() || sort_order.is_some() {
        orders.sort_by_key(|o| o.placed_at);
        if sort_order == Some(SortOrder::Desc) {
            orders.reverse();
        }
    }
    Ok(Json(orders))
}

/// `GET /trades/{contract_id}`
pub async fn list_trades(
    State(state): State<AppState>,
    Path(contract_id): Path<String>,
    Query(q): Query<TradeQuery>,
) -> Result<Json<Vec<Trade>>, ApiErr> {
    let filter: TradeFilter = q.into();
    let trades = state
        .facade
        .list_trades(&contract_id, &filter)
        .map_err(engine_err)?;
    Ok(Json(trades))
}

/// `GET /contracts`
pub async fn list_contracts(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.facade.contract_ids())
}

/// Constructs the application's `Router` with all routes and shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/{contract_id}/{order_id}", delete(cancel_order))
        .route("/orders/{contract_id}", get(list_orders))
        .route("/trades/{contract_id}", get(list_trades))
        .route("/contracts", get(list_contracts))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .include_headers(false)
                        .level(tracing::Level::TRACE),
                )
                .on_response(DefaultOnResponse::new().level(tracing::Level::TRACE)),
        )
        .with_state(state)
}
