//! Shared application state handed to every axum handler. The teacher kept
//! a bare order book and trade log behind separate locks; here everything
//! routes through a single [`Facade`], which already owns its own
//! per-contract locking, so the handlers hold no locks of their own.

use std::sync::Arc;

use crate::facade::Facade;

#[derive(Clone)]
pub struct AppState {
    pub facade: Arc<Facade>,
}

impl AppState {
    pub fn new(facade: Facade) -> Self {
        Self {
            facade: Arc::new(facade),
        }
    }
}
