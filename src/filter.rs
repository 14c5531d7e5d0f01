//! Order and trade filters, spec §6. Grounded on the original source's
//! `OrderFilterParams`: every field is optional and ANDed together, and the
//! `placed_at_or_after`/`placed_before` pair must describe a non-empty
//! window — constructing a filter with the window inverted is rejected
//! rather than silently returning nothing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::orders::{OrderStatus, OrderType, Side};

/// All fields are ANDed together; `None` means "don't filter on this".
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub trader_id: Option<Uuid>,
    pub side: Option<Side>,
    pub order_type: Option<OrderType>,
    pub status: Option<OrderStatus>,
    pub price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub placed_at_or_after: Option<DateTime<Utc>>,
    pub placed_before: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn validate(&self) -> Result<(), EngineError> {
        if let (Some(after), Some(before)) = (self.placed_at_or_after, self.placed_before) {
            if after >= before {
                return Err(EngineError::InvalidFilter(
                    "placed_at_or_after must be before placed_before".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn matches(&self, order: &crate::orders::Order) -> bool {
        if let Some(trader_id) = self.trader_id {
            if order.trader_id != trader_id {
                return false;
            }
        }
        if let Some(side) = self.side {
            if order.side != side {
                return false;
            }
        }
        if let Some(order_type) = self.order_type {
            if order.order_type != order_type {
                return false;
            }
        }
        if let Some(status) = self.status {
            if order.status != status {
                return false;
            }
        }
        if let Some(price) = self.price {
            if order.price != Some(price) {
                return false;
            }
        }
        if let Some(quantity) = self.quantity {
            if order.quantity != quantity {
                return false;
            }
        }
        if let Some(after) = self.placed_at_or_after {
            if order.placed_at < after {
                return false;
            }
        }
        if let Some(before) = self.placed_before {
            if order.placed_at >= before {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct TradeFilter {
    pub buy_order_id: Option<Uuid>,
    pub sell_order_id: Option<Uuid>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub generated_at_or_after: Option<DateTime<Utc>>,
    pub generated_before: Option<DateTime<Utc>>,
}

impl TradeFilter {
    pub fn validate(&self) -> Result<(), EngineError> {
        if let (Some(after), Some(before)) = (self.generated_at_or_after, self.generated_before) {
            if after >= before {
                return Err(EngineError::InvalidFilter(
                    "generated_at_or_after must be before generated_before".into(),
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(EngineError::InvalidFilter(
                    "min_price must not exceed max_price".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn matches(&self, trade: &crate::trade::Trade) -> bool {
        if let Some(buy_order_id) = self.buy_order_id {
            if trade.buy_order_id != buy_order_id {
                return false;
            }
        }
        if let Some(sell_order_id) = self.sell_order_id {
            if trade.sell_order_id != sell_order_id {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if trade.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if trade.price > max {
                return false;
            }
        }
        if let Some(after) = self.generated_at_or_after {
            if trade.generated_at < after {
                return false;
            }
        }
        if let Some(before) = self.generated_before {
            if trade.generated_at >= before {
                return false;
            }
        }
        true
    }
}
