//! Exchange capability trait.
//!
//! The trading loop only ever talks to the exchange through this seam, so
//! every decision path can run against the deterministic [`MockExchange`]
//! in tests while production uses the REST [`BinanceClient`].
//!
//! [`MockExchange`]: crate::exchange::MockExchange
//! [`BinanceClient`]: crate::exchange::BinanceClient

use crate::exchange::types::{Candle, OrderFill, TradingRules};
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// The exchange operations the strategy depends on.
///
/// `market_buy` and `market_sell` place real, non-idempotent orders on live
/// implementations; callers must treat every invocation as irreversible.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    /// Fetch the `limit` most recent candles for a symbol, oldest first.
    async fn get_candles(&self, symbol: &str, interval: &str, limit: u16) -> Result<Vec<Candle>>;

    /// Current ticker price for a symbol.
    async fn get_price(&self, symbol: &str) -> Result<Decimal>;

    /// Free balance of one asset.
    async fn get_balance(&self, asset: &str) -> Result<Decimal>;

    /// Current quantity constraints for a symbol. Not cached by callers.
    async fn get_trading_rules(&self, symbol: &str) -> Result<TradingRules>;

    /// Submit a market buy for a base-asset quantity.
    async fn market_buy(&self, symbol: &str, quantity: Decimal) -> Result<OrderFill>;

    /// Submit a market sell for a base-asset quantity.
    async fn market_sell(&self, symbol: &str, quantity: Decimal) -> Result<OrderFill>;
}
