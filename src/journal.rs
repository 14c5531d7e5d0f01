//! Component D: the Trade Journal (spec §4.5). Every executed trade is
//! appended exactly once, in generation order, before the matching engine
//! returns control to its caller.
//!
//! The in-memory journal is always present and authoritative for the
//! process's lifetime; the durable journal is an optional sink layered on
//! top of it, adapted from the teacher's ParityDB `Store`. Appending to the
//! durable sink is the one sanctioned synchronous I/O point inside the
//! matching path (spec §9) — there is no suspension point to cross, so it
//! does not need to be `async`.

use std::sync::Mutex;

use uuid::Uuid;

use crate::errors::EngineError;
use crate::store::Store;
use crate::trade::Trade;

/// Where executed trades are recorded. Implementors must preserve
/// generation order per contract.
pub trait TradeJournal: Send + Sync {
    fn append(&self, trade: &Trade) -> Result<(), EngineError>;

    /// All trades for a contract, oldest first.
    fn list_by_contract(&self, contract_id: &str) -> Vec<Trade>;

    /// All trades touching a given order, on either side, oldest first.
    fn list_by_order(&self, order_id: Uuid) -> Vec<Trade>;
}

/// In-process journal, backed by a plain `Vec` behind a mutex. Always
/// constructed alongside the engine; never fails to append.
#[derive(Default)]
pub struct InMemoryJournal {
    trades: Mutex<Vec<Trade>>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TradeJournal for InMemoryJournal {
    fn append(&self, trade: &Trade) -> Result<(), EngineError> {
        self.trades
            .lock()
            .expect("trade journal mutex poisoned")
            .push(trade.clone());
        Ok(())
    }

    fn list_by_contract(&self, contract_id: &str) -> Vec<Trade> {
        self.trades
            .lock()
            .expect("trade journal mutex poisoned")
            .iter()
            .filter(|t| t.contract_id == contract_id)
            .cloned()
            .collect()
    }

    fn list_by_order(&self, order_id: Uuid) -> Vec<Trade> {
        self.trades
            .lock()
            .expect("trade journal mutex poisoned")
            .iter()
            .filter(|t| t.buy_order_id == order_id || t.sell_order_id == order_id)
            .cloned()
            .collect()
    }
}

/// Durable journal backed by ParityDB (spec §4.5's optional durable sink).
/// Append failures surface as `EngineError::JournalUnavailable` rather than
/// panicking, since a full disk or I/O error here is an operational
/// condition, not a logic bug.
pub struct DurableJournal {
    store: Mutex<Store>,
}

impl DurableJournal {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, EngineError> {
        let store = Store::open(path).map_err(|e| EngineError::JournalUnavailable(e.to_string()))?;
        Ok(Self {
            store: Mutex::new(store),
        })
    }
}

impl TradeJournal for DurableJournal {
    fn append(&self, trade: &Trade) -> Result<(), EngineError> {
        self.store
            .lock()
            .expect("durable journal mutex poisoned")
            .insert_trade(trade)
            .map_err(|e| EngineError::JournalUnavailable(e.to_string()))
    }

    fn list_by_contract(&self, contract_id: &str) -> Vec<Trade> {
        let store = self.store.lock().expect("durable journal mutex poisoned");
        let mut out = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let (page, next) = match store.page_trade_asc(contract_id, after.as_deref(), 256) {
                Ok(p) => p,
                Err(_) => break,
            };
            out.extend(page);
            match next {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }
        out
    }

    fn list_by_order(&self, order_id: Uuid) -> Vec<Trade> {
        let store = self.store.lock().expect("durable journal mutex poisoned");
        store
            .iter_trades()
            .map(|it| {
                it.filter(|t| t.buy_order_id == order_id || t.sell_order_id == order_id)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Fans an append out to the in-memory journal plus an optional durable
/// sink, so callers always have one journal handle regardless of whether
/// durability is configured.
pub struct Journal {
    memory: InMemoryJournal,
    durable: Option<DurableJournal>,
}

impl Journal {
    pub fn in_memory_only() -> Self {
        Self {
            memory: InMemoryJournal::new(),
            durable: None,
        }
    }

    pub fn with_durable(durable: DurableJournal) -> Self {
        Self {
            memory: InMemoryJournal::new(),
            durable: Some(durable),
        }
    }
}

impl TradeJournal for Journal {
    fn append(&self, trade: &Trade) -> Result<(), EngineError> {
        self.memory.append(trade)?;
        if let Some(durable) = &self.durable {
            durable.append(trade)?;
        }
        Ok(())
    }

    fn list_by_contract(&self, contract_id: &str) -> Vec<Trade> {
        self.memory.list_by_contract(contract_id)
    }

    fn list_by_order(&self, order_id: Uuid) -> Vec<Trade> {
        self.memory.list_by_order(order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn trade(contract_id: &str) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            contract_id: contract_id.into(),
            buy_order_id: Uuid::new_v4(),
            sell_order_id: Uuid::new_v4(),
            price: dec!(100),
            quantity: dec!(1),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn in_memory_journal_filters_by_contract() {
        let journal = InMemoryJournal::new();
        let t1 = trade("UK-BL-MAR-25");
        let t2 = trade("UK-GAS-APR-25");
        journal.append(&t1).unwrap();
        journal.append(&t2).unwrap();

        let for_power = journal.list_by_contract("UK-BL-MAR-25");
        assert_eq!(for_power, vec![t1]);
    }

    #[test]
    fn in_memory_journal_filters_by_order() {
        let journal = InMemoryJournal::new();
        let t = trade("UK-BL-MAR-25");
        journal.append(&t).unwrap();

        assert_eq!(journal.list_by_order(t.buy_order_id), vec![t.clone()]);
        assert_eq!(journal.list_by_order(t.sell_order_id), vec![t]);
        assert!(journal.list_by_order(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn journal_with_durable_sink_fans_out_appends() {
        let dir = tempfile::tempdir().unwrap();
        let durable = DurableJournal::open(dir.path()).unwrap();
        let journal = Journal::with_durable(durable);
        let t = trade("UK-BL-MAR-25");
        journal.append(&t).unwrap();

        assert_eq!(journal.list_by_contract("UK-BL-MAR-25"), vec![t]);
    }
}
