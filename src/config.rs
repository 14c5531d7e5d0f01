//! Runtime configuration, patterned on the `dotenv` + `env::var` style used
//! throughout the pack. The contract universe itself is static (spec §2
//! treats contracts as a fixed catalogue, not something traders create at
//! runtime) but its durable-storage path and HTTP port are environment
//! overrides, same as the teacher's `Config::from_env`.

use std::env;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use dotenv::dotenv;
use rust_decimal_macros::dec;

use crate::contract::{Commodity, Contract, DeliveryPeriod};

const PORT: &str = "ORDER_BOOK_PORT";
const JOURNAL_PATH: &str = "ORDER_BOOK_JOURNAL_PATH";

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    /// `None` means journal durability is disabled and only the in-memory
    /// journal is kept.
    pub journal_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Config {
        dotenv().ok();

        let port = env::var(PORT)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let journal_path = env::var(JOURNAL_PATH).ok().map(PathBuf::from);

        Config { port, journal_path }
    }
}

/// The fixed catalogue of tradeable contracts (spec §2). In production this
/// would be loaded from a listings service; here it is hardcoded the way
/// the teacher hardcoded its own instrument pairs in `instrument.rs`.
pub fn contract_universe() -> Vec<Contract> {
    vec![
        Contract {
            id: "UK-BL-MAR-25".into(),
            commodity: Commodity::Power,
            delivery_period: DeliveryPeriod::Monthly,
            start_date: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap(),
            location: "GB".into(),
            tick_size: dec!(0.01),
            contract_size: dec!(1),
        },
        Contract {
            id: "UK-BL-Q2-25".into(),
            commodity: Commodity::Power,
            delivery_period: DeliveryPeriod::Quarterly,
            start_date: Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap(),
            location: "GB".into(),
            tick_size: dec!(0.01),
            contract_size: dec!(1),
        },
        Contract {
            id: "UK-GAS-APR-25".into(),
            commodity: Commodity::NaturalGas,
            delivery_period: DeliveryPeriod::Monthly,
            start_date: Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
            location: "GB".into(),
            tick_size: dec!(0.001),
            contract_size: dec!(1),
        },
        Contract {
            id: "NL-TTF-MAY-25".into(),
            commodity: Commodity::NaturalGas,
            delivery_period: DeliveryPeriod::Monthly,
            start_date: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            location: "NL".into(),
            tick_size: dec!(0.001),
            contract_size: dec!(1),
        },
        Contract {
            id: "US-WTI-JUN-25".into(),
            commodity: Commodity::CrudeOil,
            delivery_period: DeliveryPeriod::Monthly,
            start_date: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap(),
            location: "US".into(),
            tick_size: dec!(0.01),
            contract_size: dec!(1),
        },
        Contract {
            id: "DE-BL-YR-26".into(),
            commodity: Commodity::Power,
            delivery_period: DeliveryPeriod::Yearly,
            start_date: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap(),
            location: "DE".into(),
            tick_size: dec!(0.01),
            contract_size: dec!(1),
        },
    ]
}
