//! The trading loop: a perpetual single-position state machine.
//!
//! Two states. `Idle` scans the watchlist, sizes a position, and buys the
//! steepest decliner; `Holding` waits for the rebound target and sells.
//! Errors never terminate the loop: a failed cycle is logged and retried
//! after a fixed delay, and a failed sell keeps the position (hold through
//! failure) rather than abandoning it.

use crate::config::StrategyConfig;
use crate::exchange::ExchangeApi;
use crate::strategy::executor::OrderExecutor;
use crate::strategy::monitor::ReboundMonitor;
use crate::strategy::scanner::MarketScanner;
use crate::strategy::sizer::PositionSizer;
use crate::utils::decimal::percent_change;
use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// The one position currently in flight, from buy fill to sell fill.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTrade {
    pub symbol: String,
    pub buy_price: Decimal,
    pub quantity: Decimal,
    pub opened_at: DateTime<Utc>,
}

/// Loop state. Holding owns the single [`ActiveTrade`], so at most one
/// position can exist by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum TraderState {
    Idle,
    Holding(ActiveTrade),
}

/// Sequences scan, size, buy, rebound wait, and sell into a perpetual
/// single-position cycle over any [`ExchangeApi`] implementation.
pub struct Trader<E> {
    exchange: E,
    config: StrategyConfig,
    scanner: MarketScanner,
    sizer: PositionSizer,
    executor: OrderExecutor,
    monitor: ReboundMonitor,
    shutdown: Arc<AtomicBool>,
    state: TraderState,
}

impl<E: ExchangeApi> Trader<E> {
    pub fn new(exchange: E, config: StrategyConfig, shutdown: Arc<AtomicBool>) -> Self {
        let scanner = MarketScanner::new(config.timeframe.clone());
        let sizer = PositionSizer::new(config.win_probability, config.win_loss_ratio);
        let monitor = ReboundMonitor::new(
            config.target_gain,
            Duration::from_secs(config.poll_interval_secs),
            shutdown.clone(),
        );

        Self {
            exchange,
            config,
            scanner,
            sizer,
            executor: OrderExecutor::new(),
            monitor,
            shutdown,
            state: TraderState::Idle,
        }
    }

    pub fn state(&self) -> &TraderState {
        &self.state
    }

    /// Run until shutdown. No error is fatal; each failed cycle is logged
    /// and retried from the current state after the cycle delay.
    pub async fn run(&mut self) {
        info!("Starting trading loop");

        while !self.shutdown.load(Ordering::SeqCst) {
            if let Err(e) = self.step().await {
                error!(error = %e, "Trading cycle failed; retrying after delay");
            }
            tokio::time::sleep(Duration::from_secs(self.config.cycle_delay_secs)).await;
        }

        if let TraderState::Holding(trade) = &self.state {
            warn!(
                symbol = %trade.symbol,
                quantity = %trade.quantity,
                buy_price = %trade.buy_price,
                "Shutting down with an open position; it remains on the exchange"
            );
        }
        info!("Trading loop stopped");
    }

    /// Advance the state machine by one cycle.
    pub async fn step(&mut self) -> Result<()> {
        let state = std::mem::replace(&mut self.state, TraderState::Idle);
        match state {
            TraderState::Idle => {
                self.state = self.try_enter().await?;
            }
            TraderState::Holding(trade) => {
                // Infallible by design: a sell failure keeps the trade.
                self.state = self.ride_out(trade).await;
            }
        }
        Ok(())
    }

    /// Idle phase: check balance, scan, size, buy.
    async fn try_enter(&mut self) -> Result<TraderState> {
        let balance = self.exchange.get_balance(&self.config.quote_asset).await?;
        if balance < self.config.min_quote_balance {
            warn!(
                %balance,
                min = %self.config.min_quote_balance,
                asset = %self.config.quote_asset,
                "Insufficient quote balance to trade; waiting"
            );
            return Ok(TraderState::Idle);
        }

        let Some(pick) = self
            .scanner
            .select_worst_performer(&self.exchange, &self.config.watchlist)
            .await
        else {
            warn!("No symbol selected by scan; retrying");
            return Ok(TraderState::Idle);
        };

        let amount = self.sizer.amount_to_invest(balance);
        if amount <= Decimal::ZERO {
            warn!(%balance, "Position size came out non-positive; skipping entry");
            return Ok(TraderState::Idle);
        }

        let fill = self.executor.buy(&self.exchange, &pick.symbol, amount).await?;
        let trade = ActiveTrade {
            symbol: pick.symbol,
            buy_price: fill.price,
            quantity: fill.quantity,
            opened_at: Utc::now(),
        };
        info!(
            symbol = %trade.symbol,
            buy_price = %trade.buy_price,
            quantity = %trade.quantity,
            drop_percent = %pick.change_percent,
            "Active trade started"
        );

        Ok(TraderState::Holding(trade))
    }

    /// Holding phase: wait for the rebound, then liquidate.
    async fn ride_out(&mut self, trade: ActiveTrade) -> TraderState {
        let Some(trigger_price) = self
            .monitor
            .wait_for_target(&self.exchange, &trade.symbol, trade.buy_price)
            .await
        else {
            // Shutdown requested mid-wait; keep the position.
            return TraderState::Holding(trade);
        };

        match self
            .executor
            .sell(&self.exchange, &trade.symbol, trade.quantity)
            .await
        {
            Ok(fill) => {
                let held = Utc::now() - trade.opened_at;
                info!(
                    symbol = %trade.symbol,
                    buy_price = %trade.buy_price,
                    sell_price = %fill.price,
                    %trigger_price,
                    realized_percent = %percent_change(trade.buy_price, fill.price),
                    held_secs = held.num_seconds(),
                    "Trade completed"
                );
                TraderState::Idle
            }
            Err(e) => {
                error!(
                    symbol = %trade.symbol,
                    error = %e,
                    "Failed to sell; holding the position for retry"
                );
                TraderState::Holding(trade)
            }
        }
    }
}
