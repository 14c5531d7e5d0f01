//! Component F: the Facade. Thin entry point the HTTP layer (and anything
//! else embedding the engine) drives instead of reaching into
//! [`MatchingEngine`] directly — mirrors the teacher's own split between
//! `state.rs` (shared handles) and `api.rs` (routing), except here the
//! intermediary also owns order construction so the engine never sees a
//! half-built `Order`.

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::engine::MatchingEngine;
use crate::errors::EngineError;
use crate::filter::{OrderFilter, TradeFilter};
use crate::orders::{Order, OrderStatus, OrderType, Side};
use crate::trade::Trade;

pub struct Facade {
    engine: MatchingEngine,
}

impl Facade {
    pub fn new(engine: MatchingEngine) -> Self {
        Self { engine }
    }

    /// Places a new order and runs it through matching. Returns the order's
    /// final state plus any trades it generated.
    #[allow(clippy::too_many_arguments)]
    pub async fn place_order(
        &self,
        contract_id: String,
        trader_id: Uuid,
        side: Side,
        order_type: OrderType,
        price: Option<Decimal>,
        quantity: Decimal,
    ) -> Result<(Order, Vec<Trade>), EngineError> {
        let order = Order {
            id: Uuid::new_v4(),
            contract_id,
            trader_id,
            side,
            order_type,
            price,
            quantity,
            remaining_quantity: quantity,
            status: OrderStatus::Open,
            placed_at: Utc::now(),
        };
        self.engine.add_order(order).await
    }

    pub async fn cancel_order(
        &self,
        contract_id: &str,
        order_id: Uuid,
    ) -> Result<Order, EngineError> {
        self.engine.cancel_order(contract_id, order_id).await
    }

    pub async fn get_order(&self, contract_id: &str, order_id: Uuid) -> Result<Order, EngineError> {
        self.engine.get_order(contract_id, order_id).await
    }

    pub async fn list_orders(
        &self,
        contract_id: &str,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, EngineError> {
        self.engine.list_orders(contract_id, filter).await
    }

    pub fn list_trades(
        &self,
        contract_id: &str,
        filter: &TradeFilter,
    ) -> Result<Vec<Trade>, EngineError> {
        self.engine.list_trades(contract_id, filter)
    }

    pub fn contract_ids(&self) -> Vec<String> {
        self.engine.contract_ids().map(str::to_string).collect()
    }
}
