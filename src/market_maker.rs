//! Market-making bot, adapted from the teacher's `market_maker.rs`. Same
//! shape — poll the market, compute a mid-price, cancel stale quotes, post
//! fresh ones — but the market is read via a plain `GET /orders` poll
//! instead of a WebSocket subscription, since consumers of this engine poll
//! the book rather than subscribe to a push feed (spec §1 Non-goals).
//!
//! ## At a Glance (Non-Technical)
//! - **Always visible:** posts a buy order a little below the market
//!   mid-price, and a sell order a little above it, so anyone can trade
//!   immediately.
//! - **Lightweight:** only requotes when the midpoint actually moves.
//! - **Steady profit:** the spread between its buy and sell prices is how
//!   it earns a little on every fill.
//!
//! ## How It Works (Technical)
//! 1. Every `PACE_MS` milliseconds, polls `GET /orders/{contract_id}`
//!    filtered to open limit orders and derives the best bid/ask from what
//!    comes back.
//! 2. If the midpoint moved since the last tick, cancels the previous two
//!    quotes and posts a fresh buy at `mid - SPREAD` and sell at
//!    `mid + SPREAD`.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tokio::time;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::errors::MarketMakerError;
use crate::orders::{Order, OrderStatus, OrderType, Side};

const SPREAD: Decimal = dec!(0.02);
const PACE_MS: u64 = 500;

#[derive(Serialize)]
struct NewOrder {
    contract_id: String,
    trader_id: Uuid,
    side: Side,
    order_type: OrderType,
    price: Option<Decimal>,
    quantity: Decimal,
}

#[derive(Deserialize)]
struct OrderAck {
    order: Order,
}

fn best_bid_ask(orders: &[Order]) -> (Option<Decimal>, Option<Decimal>) {
    let best_bid = orders
        .iter()
        .filter(|o| o.side == Side::Buy)
        .filter_map(|o| o.price)
        .max();
    let best_ask = orders
        .iter()
        .filter(|o| o.side == Side::Sell)
        .filter_map(|o| o.price)
        .min();
    (best_bid, best_ask)
}

/// Runs the market-making loop against a REST API at `api_base` for a
/// single contract, until `token` is cancelled.
pub async fn run_market_maker(
    api_base: &str,
    contract_id: &str,
    trader_id: Uuid,
    token: CancellationToken,
) -> Result<(), MarketMakerError> {
    let client = reqwest::Client::new();
    let mut outstanding: Vec<Uuid> = Vec::new();
    let mut interval = time::interval(Duration::from_millis(PACE_MS));
    let mut last_mid: Option<Decimal> = None;

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::info!("market maker: shutdown requested, tearing down...");
                break;
            }
            _ = interval.tick() => {
                let resp = client
                    .get(format!("{api_base}/orders/{contract_id}"))
                    .query(&[("status", "open")])
                    .send()
                    .await?;
                let orders: Vec<Order> = resp.json().await?;
                let (Some(bid), Some(ask)) = best_bid_ask(&orders) else {
                    continue;
                };
                let mid = (bid + ask) / dec!(2);

                if Some(mid) == last_mid {
                    continue;
                }

                for id in outstanding.drain(..) {
                    let _ = client
                        .delete(format!("{api_base}/orders/{contract_id}/{id}"))
                        .send()
                        .await;
                }

                let buy_price = mid - SPREAD;
                tracing::info!(%buy_price, "placing bid");
                if let Ok(resp) = client
                    .post(format!("{api_base}/orders"))
                    .json(&NewOrder {
                        contract_id: contract_id.to_string(),
                        trader_id,
                        side: Side::Buy,
                        order_type: OrderType::Limit,
                        price: Some(buy_price),
                        quantity: dec!(1),
                    })
                    .send()
                    .await
                {
                    if let Ok(ack) = resp.json::<OrderAck>().await {
                        if ack.order.status != OrderStatus::Filled {
                            outstanding.push(ack.order.id);
                        }
                    }
                }

                let sell_price = mid + SPREAD;
                tracing::info!(%sell_price, "placing ask");
                if let Ok(resp) = client
                    .post(format!("{api_base}/orders"))
                    .json(&NewOrder {
                        contract_id: contract_id.to_string(),
                        trader_id,
                        side: Side::Sell,
                        order_type: OrderType::Limit,
                        price: Some(sell_price),
                        quantity: dec!(1),
                    })
                    .send()
                    .await
                {
                    if let Ok(ack) = resp.json::<OrderAck>().await {
                        if ack.order.status != OrderStatus::Filled {
                            outstanding.push(ack.order.id);
                        }
                    }
                }

                last_mid = Some(mid);
            }
        }
    }
    Ok(())
}
