//! # Dip-Rebound Trader
//!
//! A single-position automated trading loop on Binance spot: buy the
//! watchlist symbol with the steepest recent decline, sized by the Kelly
//! criterion, and sell once the price rebounds past a fixed gain target.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `exchange`: Binance REST client behind the `ExchangeApi` trait, plus a
//!   scriptable mock for tests
//! - `strategy`: Scanner, sizer, executor, rebound monitor, and the trading
//!   loop state machine
//! - `utils`: Decimal arithmetic helpers

pub mod config;
pub mod exchange;
pub mod strategy;
pub mod utils;

pub use config::Config;
