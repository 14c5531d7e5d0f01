//! Component E: the Matching Engine. One [`OrderBook`] per contract, each
//! behind its own `tokio::sync::Mutex` (spec §4.6 "single writer per
//! contract, parallel across contracts"). Validation lives here, not in the
//! book: `OrderBook` trusts its caller, the same separation of concerns the
//! teacher draws between `state.rs` (owns shared mutable state) and
//! `orderbook.rs` (pure data structure).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::contract::Contract;
use crate::errors::EngineError;
use crate::filter::{OrderFilter, TradeFilter};
use crate::journal::TradeJournal;
use crate::order_book::OrderBook;
use crate::orders::{Order, OrderStatus, OrderType};
use crate::trade::Trade;

pub struct MatchingEngine {
    books: HashMap<String, Mutex<OrderBook>>,
    journal: Arc<dyn TradeJournal>,
}

impl MatchingEngine {
    pub fn new(contracts: &[Contract], journal: Arc<dyn TradeJournal>) -> Self {
        let books = contracts
            .iter()
            .map(|c| (c.id.clone(), Mutex::new(OrderBook::new(c.id.clone()))))
            .collect();
        Self { books, journal }
    }

    fn validate_new_order(&self, order: &Order) -> Result<(), EngineError> {
        if !self.books.contains_key(&order.contract_id) {
            return Err(EngineError::UnknownContract(order.contract_id.clone()));
        }
        if order.quantity <= Decimal::ZERO {
            return Err(EngineError::InvalidOrder(
                "quantity must be positive".into(),
            ));
        }
        match order.order_type {
            OrderType::Limit => match order.price {
                Some(price) if price > Decimal::ZERO => {}
                Some(_) => {
                    return Err(EngineError::InvalidOrder(
                        "limit price must be positive".into(),
                    ));
                }
                None => {
                    return Err(EngineError::InvalidOrder(
                        "limit order requires a price".into(),
                    ));
                }
            },
            OrderType::Market => {
                if order.price.is_some() {
                    return Err(EngineError::InvalidOrder(
                        "market order must not specify a price".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Submits a new order for matching (spec §4.4). Every generated trade
    /// is appended to the journal before this returns.
    pub async fn add_order(
        &self,
        mut order: Order,
    ) -> Result<(Order, Vec<Trade>), EngineError> {
        self.validate_new_order(&order)?;
        order.remaining_quantity = order.quantity;
        order.status = OrderStatus::Open;
        order.placed_at = Utc::now();

        let book = self
            .books
            .get(&order.contract_id)
            .ok_or_else(|| EngineError::UnknownContract(order.contract_id.clone()))?;

        let (final_order, trades) = {
            let mut book = book.lock().await;
            let (final_order, trades) = book.match_order(order);
            // Journal append happens while the per-contract lock is still
            // held, so a later `add_order` on this contract cannot journal
            // its trades ahead of this one's (spec §5 ordering guarantee).
            for trade in &trades {
                self.journal.append(trade)?;
            }
            (final_order, trades)
        };

        Ok((final_order, trades))
    }

    pub async fn cancel_order(
        &self,
        contract_id: &str,
        order_id: Uuid,
    ) -> Result<Order, EngineError> {
        let book = self
            .books
            .get(contract_id)
            .ok_or_else(|| EngineError::UnknownContract(contract_id.to_string()))?;
        let mut book = book.lock().await;
        book.cancel(order_id)
    }

    pub async fn list_orders(
        &self,
        contract_id: &str,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, EngineError> {
        filter.validate()?;
        let book = self
            .books
            .get(contract_id)
            .ok_or_else(|| EngineError::UnknownContract(contract_id.to_string()))?;
        let book = book.lock().await;
        Ok(book
            .get_orders()
            .into_iter()
            .filter(|o| filter.matches(o))
            .collect())
    }

    pub async fn get_order(
        &self,
        contract_id: &str,
        order_id: Uuid,
    ) -> Result<Order, EngineError> {
        let book = self
            .books
            .get(contract_id)
            .ok_or_else(|| EngineError::UnknownContract(contract_id.to_string()))?;
        let book = book.lock().await;
        book.get_order(order_id).cloned().ok_or(EngineError::NotFound)
    }

    pub fn list_trades(
        &self,
        contract_id: &str,
        filter: &TradeFilter,
    ) -> Result<Vec<Trade>, EngineError> {
        filter.validate()?;
        Ok(self
            .journal
            .list_by_contract(contract_id)
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect())
    }

    pub fn contract_ids(&self) -> impl Iterator<Item = &str> {
        self.books.keys().map(String::as_str)
    }
}
