//! Component C: the Order Book (spec §4.3) and the matching algorithm of
//! §4.4, which this module implements directly on [`OrderBook`] — grounded
//! on the teacher's own `orderbook.rs`, where `match_incoming_side` and
//! `OrderBook::match_order` lived together for the same reason: the loop
//! needs tight, repeated access to both side books and the shared order
//! arena, which is exactly what `OrderBook` encapsulates.
//!
//! The teacher's `match_incoming_side` had no crossing check at all — it
//! walked every opposing price level unconditionally until the incoming
//! order was exhausted, which is only correct for market orders. A limit
//! order away from the market would "match" straight through levels it
//! should never touch. [`OrderBook::match_order`] restores the crossing
//! predicate from spec §4.4 before consuming each level.

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::orders::{Order, OrderStatus, OrderType, Side};
use crate::price_level::{Slab, Slot};
use crate::side_book::SideBook;
use crate::trade::Trade;

/// Resting-price sentinel for a market order that (defensively) ends up in
/// `add_resting` — spec §4.3/§9. The engine never calls `add_resting` with
/// a market order that still has quantity; any residual is cancelled
/// instead (§4.4 step 4).
const MARKET_BUY_SENTINEL: Decimal = Decimal::MAX;
const MARKET_SELL_SENTINEL: Decimal = Decimal::ZERO;

struct Locator {
    side: Side,
    price: Decimal,
    slot: Slot,
}

/// One contract's two-sided book: bids, asks, and an id index giving O(1)
/// cancel/lookup (spec §4.3 invariants).
pub struct OrderBook {
    contract_id: String,
    bids: SideBook,
    asks: SideBook,
    slab: Slab,
    index: HashMap<Uuid, Locator>,
}

impl OrderBook {
    pub fn new(contract_id: impl Into<String>) -> Self {
        Self {
            contract_id: contract_id.into(),
            bids: SideBook::new(Side::Buy),
            asks: SideBook::new(Side::Sell),
            slab: Slab::default(),
            index: HashMap::new(),
        }
    }

    /// Places an order at a price level without matching. Fails with
    /// `InvalidOrder` if a limit order has no price.
    pub fn add_resting(&mut self, mut order: Order) -> Result<(), EngineError> {
        let price = match order.order_type {
            OrderType::Limit => order
                .price
                .ok_or_else(|| EngineError::InvalidOrder("limit order missing price".into()))?,
            OrderType::Market => {
                let sentinel = match order.side {
                    Side::Buy => MARKET_BUY_SENTINEL,
                    Side::Sell => MARKET_SELL_SENTINEL,
                };
                order.price = Some(sentinel);
                sentinel
            }
        };
        let id = order.id;
        let side = order.side;
        let side_book = self.side_book_mut(side);
        let slot = side_book.insert(&mut self.slab, price, order);
        self.index.insert(id, Locator { side, price, slot });
        Ok(())
    }

    /// Cancels a resting order. Already-filled or already-cancelled orders
    /// (no longer in the index) return `NotFound`.
    pub fn cancel(&mut self, order_id: Uuid) -> Result<Order, EngineError> {
        let locator = self.index.remove(&order_id).ok_or(EngineError::NotFound)?;
        let side_book = self.side_book_mut(locator.side);
        let mut order = side_book.remove(&mut self.slab, locator.price, locator.slot);
        order.status = OrderStatus::Cancelled;
        Ok(order)
    }

    pub fn best_bid_price(&self) -> Option<Decimal> {
        self.bids.best_price()
    }

    pub fn best_ask_price(&self) -> Option<Decimal> {
        self.asks.best_price()
    }

    pub fn best_bid_order(&self) -> Option<&Order> {
        let (_, level) = self.bids.best_level()?;
        level.peek_front(&self.slab)
    }

    pub fn best_ask_order(&self) -> Option<&Order> {
        let (_, level) = self.asks.best_level()?;
        level.peek_front(&self.slab)
    }

    /// Snapshot of all resting orders, unspecified order.
    pub fn get_orders(&self) -> Vec<Order> {
        self.bids
            .iter(&self.slab)
            .chain(self.asks.iter(&self.slab))
            .cloned()
            .collect()
    }

    pub fn get_order(&self, order_id: Uuid) -> Option<&Order> {
        let locator = self.index.get(&order_id)?;
        Some(self.slab.get(locator.slot))
    }

    fn side_book_mut(&mut self, side: Side) -> &mut SideBook {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// The central algorithm, spec §4.4. `order.remaining_quantity` must
    /// already be initialized to `order.quantity` by the caller (step 1 of
    /// the algorithm lives one layer up, in the matching engine, since it
    /// is the same regardless of which book services the order).
    ///
    /// Returns the order in its final state (never resting with
    /// `remaining_quantity == 0`, never a market order with leftover
    /// quantity) and the trades generated, oldest first.
    pub fn match_order(&mut self, mut order: Order) -> (Order, Vec<Trade>) {
        let mut trades = Vec::new();

        loop {
            let opp_best = match order.side {
                Side::Buy => self.asks.best_price(),
                Side::Sell => self.bids.best_price(),
            };
            let Some(opp_price) = opp_best else {
                break;
            };

            let crosses = match order.order_type {
                OrderType::Market => true,
                OrderType::Limit => {
                    let limit = order
                        .price
                        .expect("limit order reaching the match loop always has a price");
                    match order.side {
                        Side::Buy => opp_price <= limit,
                        Side::Sell => opp_price >= limit,
                    }
                }
            };
            if !crosses {
                break;
            }

            let (opposing, slab) = match order.side {
                Side::Buy => (&mut self.asks, &mut self.slab),
                Side::Sell => (&mut self.bids, &mut self.slab),
            };
            let slot = opposing
                .level_at(opp_price)
                .and_then(|lvl| lvl.front_slot())
                .expect("best price level always has a front order while it exists");

            let fill = {
                let resting = slab.get_mut(slot);
                let fill = order.remaining_quantity.min(resting.remaining_quantity);
                order.remaining_quantity -= fill;
                resting.remaining_quantity -= fill;
                resting.status = if resting.remaining_quantity.is_zero() {
                    OrderStatus::Filled
                } else {
                    OrderStatus::PartiallyFilled
                };
                fill
            };

            let resting_id = slab.get(slot).id;
            let resting_filled = slab.get(slot).remaining_quantity.is_zero();

            let (buy_order_id, sell_order_id) = match order.side {
                Side::Buy => (order.id, resting_id),
                Side::Sell => (resting_id, order.id),
            };
            trades.push(Trade {
                id: Uuid::new_v4(),
                contract_id: self.contract_id.clone(),
                buy_order_id,
                sell_order_id,
                price: opp_price,
                quantity: fill,
                generated_at: Utc::now(),
            });

            let level = opposing
                .level_at_mut(opp_price)
                .expect("level still present: we just read from it");
            level.debit(fill);
            if resting_filled {
                level.pop_front(slab);
                self.index.remove(&resting_id);
                opposing.prune_if_empty(opp_price);
            }

            if order.remaining_quantity.is_zero() {
                break;
            }
        }

        if order.remaining_quantity.is_zero() {
            order.status = OrderStatus::Filled;
        } else {
            match order.order_type {
                OrderType::Market => {
                    // A resting market order would match anything on the
                    // next inbound order with a meaningless sentinel price
                    // (spec §9) — the residual is cancelled instead of
                    // resting.
                    order.status = OrderStatus::Cancelled;
                }
                OrderType::Limit => {
                    order.status = if trades.is_empty() {
                        OrderStatus::Open
                    } else {
                        OrderStatus::PartiallyFilled
                    };
                    self.add_resting(order.clone())
                        .expect("limit order already validated by the caller");
                }
            }
        }

        (order, trades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn limit(side: Side, price: Decimal, qty: Decimal) -> Order {
        Order {
            id: Uuid::new_v4(),
            contract_id: "UK-BL-MAR-25".into(),
            trader_id: Uuid::new_v4(),
            side,
            order_type: OrderType::Limit,
            price: Some(price),
            quantity: qty,
            remaining_quantity: qty,
            status: OrderStatus::Open,
            placed_at: Utc::now(),
        }
    }

    fn market(side: Side, qty: Decimal) -> Order {
        Order {
            id: Uuid::new_v4(),
            contract_id: "UK-BL-MAR-25".into(),
            trader_id: Uuid::new_v4(),
            side,
            order_type: OrderType::Market,
            price: None,
            quantity: qty,
            remaining_quantity: qty,
            status: OrderStatus::Open,
            placed_at: Utc::now(),
        }
    }

    // Scenario 1: limit buy, empty book.
    #[test]
    fn limit_buy_on_empty_book_rests() {
        let mut book = OrderBook::new("UK-BL-MAR-25");
        let (order, trades) = book.match_order(limit(Side::Buy, dec!(100.00), dec!(10.00)));
        assert!(trades.is_empty());
        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(book.best_bid_price(), Some(dec!(100.00)));
        assert_eq!(book.best_ask_price(), None);
    }

    // Scenario 2: exact cross.
    #[test]
    fn exact_cross_fills_both_sides() {
        let mut book = OrderBook::new("UK-BL-MAR-25");
        book.match_order(limit(Side::Buy, dec!(100.00), dec!(10.00)));
        let (order, trades) = book.match_order(limit(Side::Sell, dec!(100.00), dec!(10.00)));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, dec!(100.00));
        assert_eq!(trades[0].quantity, dec!(10.00));
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(book.best_bid_price(), None);
        assert_eq!(book.best_ask_price(), None);
    }

    // Scenario 3: market order partially fills then residual is cancelled.
    #[test]
    fn market_buy_residual_is_cancelled_not_rested() {
        let mut book = OrderBook::new("UK-BL-MAR-25");
        book.match_order(limit(Side::Sell, dec!(100.00), dec!(5.00)));
        let (order, trades) = book.match_order(market(Side::Buy, dec!(10.00)));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, dec!(100.00));
        assert_eq!(trades[0].quantity, dec!(5.00));
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.remaining_quantity, dec!(5.00));
        assert_eq!(book.best_ask_price(), None);
        assert_eq!(book.best_bid_price(), None);
    }

    // Scenario 4: partial fill of resting order.
    #[test]
    fn resting_order_partially_filled_stays_at_head() {
        let mut book = OrderBook::new("UK-BL-MAR-25");
        book.match_order(limit(Side::Buy, dec!(100.00), dec!(10.00)));
        let (order, trades) = book.match_order(limit(Side::Sell, dec!(100.00), dec!(5.00)));
        assert_eq!(trades.len(), 1);
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(book.best_bid_price(), Some(dec!(100.00)));
        let resting = book.best_bid_order().unwrap();
        assert_eq!(resting.status, OrderStatus::PartiallyFilled);
        assert_eq!(resting.remaining_quantity, dec!(5.00));
    }

    // Scenario 5: walking the book with price-time priority.
    #[test]
    fn walks_book_with_price_time_priority() {
        let mut book = OrderBook::new("UK-BL-MAR-25");
        let (s1, _) = book.match_order(limit(Side::Sell, dec!(100.00), dec!(5.00)));
        let (s2, _) = book.match_order(limit(Side::Sell, dec!(100.00), dec!(5.00)));
        book.match_order(limit(Side::Sell, dec!(101.00), dec!(5.00)));

        let (order, trades) = book.match_order(market(Side::Buy, dec!(8.00)));
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].sell_order_id, s1.id);
        assert_eq!(trades[0].price, dec!(100.00));
        assert_eq!(trades[0].quantity, dec!(5.00));
        assert_eq!(trades[1].sell_order_id, s2.id);
        assert_eq!(trades[1].price, dec!(100.00));
        assert_eq!(trades[1].quantity, dec!(3.00));
        assert_eq!(order.status, OrderStatus::Filled);

        assert_eq!(book.best_ask_price(), Some(dec!(100.00)));
        let remaining = book.best_ask_order().unwrap();
        assert_eq!(remaining.id, s2.id);
        assert_eq!(remaining.remaining_quantity, dec!(2.00));
    }

    // Scenario 6: limit order that doesn't cross rests untouched.
    #[test]
    fn non_crossing_limit_rests_on_both_sides() {
        let mut book = OrderBook::new("UK-BL-MAR-25");
        book.match_order(limit(Side::Sell, dec!(100.00), dec!(5.00)));
        let (order, trades) = book.match_order(limit(Side::Buy, dec!(99.00), dec!(5.00)));
        assert!(trades.is_empty());
        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(book.best_bid_price(), Some(dec!(99.00)));
        assert_eq!(book.best_ask_price(), Some(dec!(100.00)));
    }

    #[test]
    fn cancel_round_trips_to_empty_book() {
        let mut book = OrderBook::new("UK-BL-MAR-25");
        let (order, _) = book.match_order(limit(Side::Buy, dec!(100.00), dec!(10.00)));
        let cancelled = book.cancel(order.id).unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(book.get_orders().is_empty());
        assert!(matches!(book.cancel(order.id), Err(EngineError::NotFound)));
    }

    #[test]
    fn limit_order_does_not_walk_past_its_own_price() {
        // Regression test for the teacher's bug: a limit order must stop
        // matching once the opposing book no longer crosses it, instead of
        // consuming every level unconditionally.
        let mut book = OrderBook::new("UK-BL-MAR-25");
        book.match_order(limit(Side::Sell, dec!(100.00), dec!(5.00)));
        book.match_order(limit(Side::Sell, dec!(105.00), dec!(5.00)));

        let (order, trades) = book.match_order(limit(Side::Buy, dec!(101.00), dec!(20.00)));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, dec!(100.00));
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.remaining_quantity, dec!(15.00));
        assert_eq!(book.best_ask_price(), Some(dec!(105.00)));
    }
}
