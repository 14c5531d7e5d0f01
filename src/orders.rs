//! Order type and its lifecycle, per spec §3.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Limit,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
}

/// A resting or terminal order.
///
/// Invariants (spec §3):
/// - `order_type == Limit` implies `price.is_some()` and `price > 0`.
/// - `order_type == Market` on entry implies `price.is_none()`.
/// - `remaining_quantity == 0 <=> status == Filled` (or `Cancelled` if it was
///   cancelled before full fill).
/// - `remaining_quantity == quantity <=> status in {Open, Cancelled}`.
/// - `0 < remaining_quantity < quantity <=> status == PartiallyFilled`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub contract_id: String,
    pub trader_id: Uuid,
    pub side: Side,
    pub order_type: OrderType,
    /// `None` only for a market order that has not yet rested (it never
    /// does, per spec §4.4 step 4, except the defensive sentinel in
    /// `add_resting`).
    pub price: Option<Decimal>,
    pub quantity: Decimal,
    pub remaining_quantity: Decimal,
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
}

impl Order {
    pub fn is_resting(&self) -> bool {
        matches!(self.status, OrderStatus::Open | OrderStatus::PartiallyFilled)
    }
}
