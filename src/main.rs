//! Dip-Rebound Trader - Main Entry Point
//!
//! Long-running batch process with no CLI surface: configuration comes from
//! `config.*` files and `DRT__`-prefixed environment variables, output goes
//! to stdout and an append-only log file under `logs/`.

use anyhow::Result;
use dip_rebound_trader::config::Config;
use dip_rebound_trader::exchange::BinanceClient;
use dip_rebound_trader::strategy::Trader;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    info!(
        "Dip-Rebound Trader v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::load()?;
    config.validate()?;
    log_config(&config);

    if config.binance.api_key.is_empty() || config.binance.secret_key.is_empty() {
        warn!("No API credentials configured; authenticated calls will be rejected");
    }

    let client = BinanceClient::new(&config.binance)?;

    // Ctrl-C flips the shutdown flag; the loop and the rebound wait both
    // check it, so an open position is never force-liquidated on exit.
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        shutdown_signal.store(true, Ordering::SeqCst);
    });

    let mut trader = Trader::new(client, config.strategy, shutdown);
    trader.run().await;

    Ok(())
}

fn init_logging() -> Result<()> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    std::fs::create_dir_all("logs")?;

    // Append-only file log alongside stdout.
    let file_appender = tracing_appender::rolling::daily("logs", "dip-rebound-trader.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer guard alive for the program duration.
    Box::leak(Box::new(guard));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("dip_rebound_trader=debug".parse()?)
                .add_directive(Level::INFO.into()),
        )
        .with_writer(std::io::stdout.and(file_writer))
        .with_target(true)
        .with_ansi(true)
        .init();

    Ok(())
}

/// Log the effective configuration on startup.
fn log_config(config: &Config) {
    let strategy = &config.strategy;
    info!("Configuration:");
    info!("   Watchlist: {}", strategy.watchlist.join(", "));
    info!("   Timeframe: {}", strategy.timeframe);
    info!(
        "   Quote asset: {} (min balance {})",
        strategy.quote_asset, strategy.min_quote_balance
    );
    info!(
        "   Kelly inputs: win probability {}, win/loss ratio {}",
        strategy.win_probability, strategy.win_loss_ratio
    );
    info!("   Target gain: {}x", strategy.target_gain);
    info!(
        "   Poll interval: {}s, cycle delay: {}s",
        strategy.poll_interval_secs, strategy.cycle_delay_secs
    );
    info!("   Testnet: {}", config.binance.testnet);
}
