//! Component B: the Side Book (spec §4.2). An ordered map from price to
//! [`PriceLevelQueue`], with O(log P) insert/remove and O(1) best-price
//! access. Bid and ask sides are *the same structure with inverted
//! comparisons* (spec §9 "Polymorphism over order sides") — `Side` is a
//! tagged value read once at construction, not two separate types.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::orders::{Order, Side};
use crate::price_level::{PriceLevelQueue, Slab, Slot};

pub struct SideBook {
    side: Side,
    levels: BTreeMap<Decimal, PriceLevelQueue>,
}

impl SideBook {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// The improving-side top: highest price for bids, lowest for asks.
    pub fn best_price(&self) -> Option<Decimal> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    pub fn level_at(&self, price: Decimal) -> Option<&PriceLevelQueue> {
        self.levels.get(&price)
    }

    pub fn level_at_mut(&mut self, price: Decimal) -> Option<&mut PriceLevelQueue> {
        self.levels.get_mut(&price)
    }

    pub fn best_level(&self) -> Option<(Decimal, &PriceLevelQueue)> {
        let price = self.best_price()?;
        self.levels.get(&price).map(|lvl| (price, lvl))
    }

    pub fn best_level_mut(&mut self) -> Option<(Decimal, &mut PriceLevelQueue)> {
        let price = self.best_price()?;
        self.levels.get_mut(&price).map(|lvl| (price, lvl))
    }

    /// Inserts `order` into the level for its price, creating the level if
    /// absent. Returns the arena slot so the caller's id index can record
    /// the locator for O(1) removal later.
    pub fn insert(&mut self, slab: &mut Slab, price: Decimal, order: Order) -> Slot {
        self.levels
            .entry(price)
            .or_insert_with(PriceLevelQueue::new)
            .append(slab, order)
    }

    /// Removes the order at `slot` from the level at `price`, pruning the
    /// level if it becomes empty.
    pub fn remove(&mut self, slab: &mut Slab, price: Decimal, slot: Slot) -> Order {
        let order = {
            let level = self
                .levels
                .get_mut(&price)
                .expect("side book: price level vanished under a live order");
            level.remove(slab, slot)
        };
        if self.levels.get(&price).is_some_and(PriceLevelQueue::is_empty) {
            self.levels.remove(&price);
        }
        order
    }

    /// Removes the best level entirely if it is now empty. Called by the
    /// matching engine right after it pops the last order off the level.
    pub fn prune_if_empty(&mut self, price: Decimal) {
        if self.levels.get(&price).is_some_and(PriceLevelQueue::is_empty) {
            self.levels.remove(&price);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// All resting orders on this side, best price first.
    pub fn iter<'a>(&'a self, slab: &'a Slab) -> impl Iterator<Item = &'a Order> + 'a {
        let prices: Vec<Decimal> = match self.side {
            Side::Buy => self.levels.keys().rev().copied().collect(),
            Side::Sell => self.levels.keys().copied().collect(),
        };
        prices
            .into_iter()
            .flat_map(move |p| self.levels.get(&p).into_iter().flat_map(|lvl| lvl.iter(slab)))
    }
}
