//! Trade record, per spec §3. Immutable once recorded.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The price always comes from the *resting* order (price-improvement for
/// the aggressor, spec §4.4 trade price rule); a market order never sets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub contract_id: String,
    pub buy_order_id: Uuid,
    pub sell_order_id: Uuid,
    pub price: Decimal,
    pub quantity: Decimal,
    pub generated_at: DateTime<Utc>,
}
