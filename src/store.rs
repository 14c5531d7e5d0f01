//! Durable trade store, ParityDB-backed. Adapted from the teacher's
//! `store.rs`: same key-prefix-per-instrument / look-ahead-cursor-pagination
//! design, retargeted from a crypto `symbol` to a futures `contract_id` and
//! from raw `u64` price/quantity to [`rust_decimal::Decimal`].
//!
//! `Decimal` has no fixed-width big-endian encoding the way `u64` does, so
//! unlike the teacher's key (which packed `maker_id`/`taker_id`/`price`/
//! `quantity` directly into the key for a fully self-describing tie-break),
//! this key uses `generated_at` nanos plus the trade's own `Uuid` as the
//! tie-breaker. The id is already unique, so it is sufficient to make the
//! key unique without needing a decimal byte encoding.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use bincode::{
    config::{self, standard},
    error::{DecodeError, EncodeError},
};
use parity_db::{BTreeIterator, ColId, Db, Options};
use std::path::Path;
use thiserror::Error;

use crate::trade::Trade;

#[derive(serde::Serialize, serde::Deserialize)]
struct Cursor {
    v: u8,
    ts_nanos: i64,
    trade_id: u128,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ParityDB error: {0}")]
    Parity(#[from] parity_db::Error),
    #[error("Serialization/Deserialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Bincode encode error: {0}")]
    BincodeEncode(#[from] EncodeError),

    #[error("Bincode decode error: {0}")]
    BincodeDecode(#[from] DecodeError),

    #[error("Invalid cursor")]
    BadCursor,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A ParityDB-backed store for trades.
///
/// Key layout (big-endian for lexicographic ordering):
/// `"{contract_id}:" + ts_nanos(i64 as u64 bit pattern) + trade_id(u128)`
///
/// This guarantees chronological ordering under each `{contract_id}:` prefix
/// with a deterministic tie-breaker when timestamps collide.
pub struct Store {
    db: Db,
}

impl Store {
    /// Opens (or creates) a ParityDB at `path`, with a single column and a
    /// B-tree index for prefix scans.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let mut opts = Options::with_columns(path.as_ref(), 1);
        opts.columns[0].btree_index = true;
        let db = Db::open_or_create(&opts)?;
        Ok(Store { db })
    }

    #[inline]
    fn prefix(contract_id: &str) -> Vec<u8> {
        let mut k = Vec::with_capacity(contract_id.len() + 1);
        k.extend_from_slice(contract_id.as_bytes());
        k.push(b':');
        k
    }

    #[inline]
    fn ts_sort_key(ts_nanos: i64) -> u64 {
        // Flip the sign bit so two's-complement ordering matches numeric
        // ordering for lexicographic byte comparison.
        (ts_nanos as u64) ^ (1 << 63)
    }

    #[inline]
    fn encode_key(contract_id: &str, trade: &Trade) -> Vec<u8> {
        let mut key = Self::prefix(contract_id);
        let ts_nanos = trade
            .generated_at
            .timestamp_nanos_opt()
            .expect("trade timestamps stay within the representable range");
        key.extend_from_slice(&Self::ts_sort_key(ts_nanos).to_be_bytes());
        key.extend_from_slice(&trade.id.as_u128().to_be_bytes());
        key
    }

    #[inline]
    fn cursor_from_trade(t: &Trade) -> Cursor {
        Cursor {
            v: 1,
            ts_nanos: t
                .generated_at
                .timestamp_nanos_opt()
                .expect("trade timestamps stay within the representable range"),
            trade_id: t.id.as_u128(),
        }
    }

    #[inline]
    fn encode_cursor(c: &Cursor) -> String {
        B64.encode(serde_json::to_vec(c).unwrap())
    }

    #[inline]
    fn decode_cursor(s: &str) -> StoreResult<Cursor> {
        let bytes = B64.decode(s).map_err(|_| StoreError::BadCursor)?;
        let c: Cursor = serde_json::from_slice(&bytes).map_err(|_| StoreError::BadCursor)?;
        if c.v != 1 {
            return Err(StoreError::BadCursor);
        }
        Ok(c)
    }

    #[inline]
    fn key_from_cursor(contract_id: &str, c: &Cursor) -> Vec<u8> {
        let mut k = Self::prefix(contract_id);
        k.extend_from_slice(&Self::ts_sort_key(c.ts_nanos).to_be_bytes());
        k.extend_from_slice(&c.trade_id.to_be_bytes());
        k
    }

    /// Inserts a trade under the composite key described above.
    pub fn insert_trade(&mut self, trade: &Trade) -> StoreResult<()> {
        let config = config::standard();
        let col: ColId = 0;
        let key = Self::encode_key(&trade.contract_id, trade);
        let value = bincode::serde::encode_to_vec(trade, config)?;
        self.db.commit(vec![(col, key, Some(value))])?;
        Ok(())
    }

    /// Pages forward (ascending time) for a contract, starting *strictly
    /// after* `after`. Returns `(items, next_cursor)`; `next_cursor` is
    /// `Some(_)` only if at least one more item exists beyond the page
    /// (look-ahead pagination).
    pub fn page_trade_asc(
        &self,
        contract_id: &str,
        after: Option<&str>,
        limit: usize,
    ) -> StoreResult<(Vec<Trade>, Option<String>)> {
        let col: ColId = 0;
        let mut it: BTreeIterator<'_> = self.db.iter(col)?;
        let prefix = Self::prefix(contract_id);

        let after_decoded = match after {
            None => None,
            Some(s) => Some(Self::decode_cursor(s)?),
        };

        if let Some(ref c) = after_decoded {
            let full = Self::key_from_cursor(contract_id, c);
            it.seek(&full)?;
            match it.next()? {
                Some((k, _)) if k == full => {}
                _ => return Err(StoreError::BadCursor),
            }
        } else {
            it.seek(&prefix)?;
        }

        let mut items = Vec::with_capacity(limit.min(256));
        let mut last_cursor_for_page: Option<String> = None;
        let mut read = 0usize;

        while read < limit + 1 {
            match it.next()? {
                Some((k, v)) if k.starts_with(&prefix) => {
                    let (trade, _): (Trade, usize) =
                        bincode::serde::decode_from_slice(&v, standard())?;
                    if items.len() < limit {
                        last_cursor_for_page =
                            Some(Self::encode_cursor(&Self::cursor_from_trade(&trade)));
                        items.push(trade);
                    }
                    read += 1;
                }
                _ => break,
            }
        }

        let next = if read > limit && !items.is_empty() {
            last_cursor_for_page
        } else {
            None
        };

        Ok((items, next))
    }

    /// Deletes all trades recorded for a contract.
    pub fn delete_trades(&mut self, contract_id: &str) -> StoreResult<()> {
        let col: ColId = 0;
        let mut iter = self.db.iter(col)?;
        let prefix = Self::prefix(contract_id);
        iter.seek(&prefix)?;

        let mut batch = Vec::new();
        while let Some((key, _)) = iter.next()? {
            if !key.starts_with(&prefix) {
                break;
            }
            batch.push((col, key.to_vec(), None));
        }
        if !batch.is_empty() {
            self.db.commit(batch)?;
        }
        Ok(())
    }

    pub fn iter_trades(&self) -> Result<impl Iterator<Item = Trade>, StoreError> {
        let config = config::standard();
        let mut iter = self.db.iter(0).map_err(StoreError::Parity)?;

        iter.seek_to_first().map_err(StoreError::Parity)?;
        Ok(std::iter::from_fn(move || match iter.next() {
            Ok(Some((_key, raw))) => {
                let (decoded, _): (Trade, usize) =
                    bincode::serde::decode_from_slice(&raw[..], config).unwrap();
                Some(decoded)
            }
            _ => None,
        }))
    }
}
