//! The static contract universe: commodity futures contracts the engine
//! will accept orders for. Grounded on `original_source`'s
//! `ctenex.domain.entities.Contract` / `ctenex.domain.contracts`, reduced to
//! a plain value type (no ORM, no `Country` join table — `location` is a
//! string since the relational model itself is out of scope for the core).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Commodity traded under a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Commodity {
    Power,
    NaturalGas,
    CrudeOil,
}

/// Delivery window granularity for a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPeriod {
    Hourly,
    Daily,
    Monthly,
    Quarterly,
    Yearly,
}

/// A single entry in the fixed contract universe (spec §6 Environment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub commodity: Commodity,
    pub delivery_period: DeliveryPeriod,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    /// Smallest permissible price increment. The engine itself does not
    /// validate ticks (spec §6) — this is informational for the façade.
    pub tick_size: Decimal,
    pub contract_size: Decimal,
}
