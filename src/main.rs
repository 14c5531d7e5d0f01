use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use order_book_engine::config::{self, Config};
use order_book_engine::engine::MatchingEngine;
use order_book_engine::facade::Facade;
use order_book_engine::journal::{DurableJournal, Journal, TradeJournal};
use order_book_engine::utils::shutdown_token;
use order_book_engine::{api, market_maker, simulate, state::AppState};

#[derive(Parser)]
#[command(name = "engine-cli")]
#[command(version = "0.1", about = "A continuous limit-order-book engine for commodity futures")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the server alongside a market maker and a synthetic order flow
    /// simulator, against the reference contract.
    Simulate { port: u16, secs: u64 },
    /// Runs the HTTP server only.
    Server { port: u16 },
}

fn build_state() -> anyhow::Result<AppState> {
    let cfg = Config::from_env();
    let journal: Arc<dyn TradeJournal> = match &cfg.journal_path {
        Some(path) => Arc::new(Journal::with_durable(DurableJournal::open(path)?)),
        None => Arc::new(Journal::in_memory_only()),
    };
    let engine = MatchingEngine::new(&config::contract_universe(), journal);
    Ok(AppState::new(Facade::new(engine)))
}

async fn wait_for_server(api_base: &str, contract_id: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    loop {
        match client
            .get(format!("{api_base}/orders/{contract_id}"))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => break,
            _ => tokio::time::sleep(Duration::from_millis(25)).await,
        };
    }
    Ok(())
}

async fn get_app_listener(port: u16, state: AppState) -> anyhow::Result<(TcpListener, Router)> {
    let app = api::router(state);
    let ep = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(ep.clone()).await?;
    Ok((listener, app))
}

const REFERENCE_CONTRACT: &str = "UK-BL-MAR-25";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let state = build_state()?;
    let token = shutdown_token();
    let server_token = token.clone();
    let mm_token = token.clone();
    let sim_token = token.clone();

    let cli = Cli::parse();
    let base = "http://127.0.0.1".to_string();
    match cli.command {
        Commands::Simulate { port, secs } => {
            let mut handlers = tokio::task::JoinSet::new();
            let (listener, app) = get_app_listener(port, state.clone()).await?;
            tracing::info!(port, secs, "spawning the server task");
            handlers.spawn(async move {
                tracing::info!("HTTP server listening on 0.0.0.0:{port}");
                axum::serve(listener, app)
                    .with_graceful_shutdown(server_token.cancelled_owned())
                    .await
                    .unwrap();
            });
            let ep = format!("{base}:{port}");
            wait_for_server(&ep, REFERENCE_CONTRACT).await?;

            let mmb = ep.clone();
            handlers.spawn(async move {
                if let Err(e) =
                    market_maker::run_market_maker(&mmb, REFERENCE_CONTRACT, Uuid::new_v4(), mm_token)
                        .await
                {
                    tracing::error!("market maker exited: {:?}", e);
                }
            });

            let sim_ep = ep.clone();
            handlers.spawn(async move {
                if let Err(e) = simulate::run_simulation(
                    simulate::SimConfig {
                        api_base: sim_ep,
                        contract_id: REFERENCE_CONTRACT.to_string(),
                        trader_id: Uuid::new_v4(),
                        run_secs: if secs == 0 { None } else { Some(secs) },
                        attack_rate_hz: 5.0,
                        noise_sigma: 0.5,
                        mean_qty: 2.0,
                    },
                    sim_token,
                )
                .await
                {
                    tracing::error!("simulation error: {:?}", e);
                }
            });
            handlers.join_all().await;
        }
        Commands::Server { port } => {
            let (listener, app) = get_app_listener(port, state.clone()).await?;
            let svh = tokio::spawn(async move {
                tracing::info!("HTTP server listening on 0.0.0.0:{port}");
                axum::serve(listener, app)
                    .with_graceful_shutdown(server_token.cancelled_owned())
                    .await
                    .unwrap();
            });
            svh.await?;
        }
    };
    Ok(())
}
