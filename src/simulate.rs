//! Simulation harness for noisy order flow against the engine. Adapted from
//! the teacher's `simulate.rs`: same Poisson-arrival / Gaussian-drift noise
//! model, retargeted to a `contract_id` and `Decimal` price/quantity
//! instead of a crypto pair and raw `u64`s.

use rand::Rng;
use rand_distr::{Distribution, Exp, Exp1, Normal};
use reqwest::{Client, ClientBuilder};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct SimConfig {
    pub api_base: String,
    pub contract_id: String,
    pub trader_id: Uuid,
    pub run_secs: Option<u64>,
    pub attack_rate_hz: f64, // Poisson rate λ
    pub noise_sigma: f64,    // N(0, σ) drift applied to mid each tick
    pub mean_qty: f64,       // average order size (unit-exp * mean_qty)
}

#[derive(Deserialize)]
struct Ack {
    trades: Vec<AckTrade>,
}

#[derive(Deserialize)]
struct AckTrade {
    price: Decimal,
    quantity: Decimal,
}

/// Noisy limit-order simulation loop.
pub async fn run_simulation(cfg: SimConfig, cancel_token: CancellationToken) -> anyhow::Result<()> {
    let client: Client = ClientBuilder::new().timeout(Duration::from_secs(5)).build()?;

    let ia = Exp::new(cfg.attack_rate_hz).expect("attack_rate_hz must be > 0");
    let drift = Normal::new(0.0, cfg.noise_sigma).expect("noise_sigma >= 0");
    let size = Exp1;

    let mut iv: i64 = 0;
    let mut pnl: f64 = 0.0;
    let mut mid: f64 = 50.0;
    let start = Instant::now();
    let spread = 1.0_f64;

    loop {
        if let Some(max_secs) = cfg.run_secs {
            if start.elapsed().as_secs() >= max_secs {
                break;
            }
        }

        let wait_secs: f64 = ia.sample(&mut rand::rng());
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("received shutdown; exiting simulation loop");
                break;
            }
            _ = sleep(Duration::from_secs_f64(wait_secs)) => {}
        }

        let unit: f64 = size.sample(&mut rand::rng());
        let qty = (unit * cfg.mean_qty).max(1.0);

        mid += drift.sample(&mut rand::rng());

        let (price, side) = if rand::rng().random_bool(0.5) {
            (mid - spread, "buy")
        } else {
            (mid + spread, "sell")
        };
        let price = price.max(0.01);

        let price_dec = Decimal::from_str(&format!("{price:.2}")).unwrap_or(dec!(0.01));
        let qty_dec = Decimal::from_str(&format!("{qty:.2}")).unwrap_or(dec!(1));

        match client
            .post(format!("{}/orders", cfg.api_base))
            .json(&json!({
                "contract_id": cfg.contract_id,
                "trader_id": cfg.trader_id,
                "side": side,
                "order_type": "limit",
                "price": price_dec,
                "quantity": qty_dec,
            }))
            .send()
            .await
        {
            Ok(resp) => {
                if let Err(e) = resp.error_for_status_ref() {
                    warn!(error = %e, "order post returned non-success");
                    continue;
                }
                match resp.json::<Ack>().await {
                    Ok(ack) => {
                        for t in ack.trades {
                            let px = t.price.to_f64().unwrap_or(0.0);
                            let q = t.quantity.to_f64().unwrap_or(0.0);
                            if side == "buy" {
                                iv -= q as i64;
                                pnl += px * q;
                            } else {
                                iv += q as i64;
                                pnl -= px * q;
                            }
                        }
                        info!(
                            elapsed = format_args!("{:.1}s", start.elapsed().as_secs_f64()),
                            side,
                            %qty_dec,
                            %price_dec,
                            mid = format_args!("{:.2}", mid),
                            inventory = iv,
                            pnl = format_args!("{:.2}", pnl),
                            "sim tick"
                        );
                    }
                    Err(e) => warn!(error = %e, "failed to parse Ack JSON"),
                }
            }
            Err(e) => {
                warn!(error = %e, "HTTP request failed");
                continue;
            }
        }
    }

    info!(
        inventory = iv,
        pnl = format_args!("{:.2}", pnl),
        "simulation done"
    );
    Ok(())
}
