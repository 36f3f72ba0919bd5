//! Configuration management for the dip-rebound trader.
//!
//! Loads settings from environment variables and config files.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Binance API credentials
    #[serde(default)]
    pub binance: BinanceConfig,
    /// Strategy parameters
    #[serde(default)]
    pub strategy: StrategyConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BinanceConfig {
    /// API key for authentication
    #[serde(default)]
    pub api_key: String,
    /// Secret key for signing requests
    #[serde(default)]
    pub secret_key: String,
    /// Use testnet instead of production
    #[serde(default)]
    pub testnet: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Trading pairs scanned for the steepest recent decline
    #[serde(default = "default_watchlist")]
    pub watchlist: Vec<String>,
    /// Candle timeframe used for scanning (Binance interval string)
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    /// Quote currency all watchlist pairs settle in
    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,
    /// Minimum free quote balance required to open a trade
    #[serde(default = "default_min_quote_balance")]
    pub min_quote_balance: Decimal,
    /// Assumed probability of a winning trade (Kelly input)
    #[serde(default = "default_win_probability")]
    pub win_probability: Decimal,
    /// Assumed average-win to average-loss ratio (Kelly input)
    #[serde(default = "default_win_loss_ratio")]
    pub win_loss_ratio: Decimal,
    /// Sell trigger as a multiple of the buy price (1.005 = 0.5% gain)
    #[serde(default = "default_target_gain")]
    pub target_gain: Decimal,
    /// Seconds between price polls while waiting for the rebound
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Seconds between trading-loop iterations
    #[serde(default = "default_cycle_delay_secs")]
    pub cycle_delay_secs: u64,
}

// Default value functions

fn default_watchlist() -> Vec<String> {
    [
        "BTCUSDT", "ETHUSDT", "BNBUSDT", "XRPUSDT", "ADAUSDT", "SOLUSDT", "DOGEUSDT", "DOTUSDT",
        "AVAXUSDT", "LTCUSDT", "LINKUSDT",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_timeframe() -> String {
    "1h".to_string()
}

fn default_quote_asset() -> String {
    "USDT".to_string()
}

fn default_min_quote_balance() -> Decimal {
    Decimal::new(10, 0) // 10 USDT
}

fn default_win_probability() -> Decimal {
    Decimal::new(6, 1) // 0.6
}

fn default_win_loss_ratio() -> Decimal {
    Decimal::new(2, 0) // 2.0
}

fn default_target_gain() -> Decimal {
    Decimal::new(1005, 3) // 1.005 = sell at +0.5%
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_cycle_delay_secs() -> u64 {
    1
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::default().separator("__").prefix("DRT"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.strategy.watchlist.is_empty(),
            "watchlist must not be empty"
        );

        anyhow::ensure!(
            self.strategy.win_probability > Decimal::ZERO
                && self.strategy.win_probability < Decimal::ONE,
            "win_probability must be between 0 and 1 exclusive"
        );

        anyhow::ensure!(
            self.strategy.win_loss_ratio > Decimal::ZERO,
            "win_loss_ratio must be positive"
        );

        anyhow::ensure!(
            self.strategy.target_gain > Decimal::ONE,
            "target_gain must be greater than 1"
        );

        anyhow::ensure!(
            self.strategy.min_quote_balance >= Decimal::ZERO,
            "min_quote_balance must not be negative"
        );

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            binance: BinanceConfig::default(),
            strategy: StrategyConfig::default(),
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            watchlist: default_watchlist(),
            timeframe: default_timeframe(),
            quote_asset: default_quote_asset(),
            min_quote_balance: default_min_quote_balance(),
            win_probability: default_win_probability(),
            win_loss_ratio: default_win_loss_ratio(),
            target_gain: default_target_gain(),
            poll_interval_secs: default_poll_interval_secs(),
            cycle_delay_secs: default_cycle_delay_secs(),
        }
    }
}
