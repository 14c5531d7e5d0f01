//! Error taxonomy, spec §7. None of these are swallowed; they are surfaced
//! all the way to the caller. Internal invariant violations are bugs and
//! are left to panic rather than being folded into this enum.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unknown contract: {0}")]
    UnknownContract(String),

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("not found")]
    NotFound,

    #[error("journal unavailable: {0}")]
    JournalUnavailable(String),
}

/// Errors raised by the bot harness's HTTP client, kept separate from
/// `EngineError` since it lives outside the core (spec §1).
#[derive(Error, Debug)]
pub enum MarketMakerError {
    #[error("connection error: {0}")]
    ConnectError(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}
